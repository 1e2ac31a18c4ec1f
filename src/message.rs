//! The message dispatched to every recipient in the batch.

/// The HTML body sent to every recipient. The batch sends one fixed message;
/// there is no templating.
const HTML_BODY: &str = r#"
    <!DOCTYPE html>
        <html>
        <head>
            <meta charset="utf-8">
            <link rel="stylesheet" href="https://fonts.googleapis.com/css2?family=IBM+Plex+Mono:wght@400&amp;display=swap">
            <title>Sample Email</title>
        </head>
        <body style="margin: 0; padding: 0; background-color: #000000; height: 100vh; display: flex; align-items: center; justify-content: center; font-family: IBM Plex Mono, monospace;">
            <div style="text-align: center;">
                <p style="color: #ffffff; margin: 0; font-size: 24px;">Blackmail by .less</p>
            </div>
        </body>
        </html>
    "#;

/// An immutable HTML message. Constructed once per batch and shared read-only
/// across all concurrent sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    subject: String,
    html_body: String,
    sender: String,
}

impl Message {
    /// The fixed message every batch dispatches: hardcoded subject and HTML
    /// body, from the given sender address. The configured `subject` field is
    /// deliberately not consulted here; see
    /// [`crate::config::Config::subject`].
    #[must_use]
    pub fn fixed(sender: impl Into<String>) -> Self {
        Self {
            subject: "Blackmail".to_string(),
            html_body: HTML_BODY.to_string(),
            sender: sender.into(),
        }
    }

    #[must_use]
    pub fn subject(&self) -> &str {
        &self.subject
    }

    #[must_use]
    pub fn sender(&self) -> &str {
        &self.sender
    }

    /// Render the message as RFC 822 wire text for a single recipient:
    /// headers, a blank line, then the HTML body with CRLF line endings.
    #[must_use]
    pub fn to_rfc822(&self, recipient: &str) -> String {
        let mut out = String::new();

        out.push_str(&format!("From: {}\r\n", self.sender));
        out.push_str(&format!("To: {recipient}\r\n"));
        out.push_str(&format!("Subject: {}\r\n", self.subject));
        out.push_str("MIME-Version: 1.0\r\n");
        out.push_str("Content-Type: text/html; charset=utf-8\r\n");
        out.push_str("\r\n");

        for line in self.html_body.lines() {
            out.push_str(line);
            out.push_str("\r\n");
        }

        out
    }
}
