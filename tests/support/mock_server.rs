//! A minimal in-process SMTP server for integration tests.
//!
//! Speaks just enough of the protocol for the client under test: greeting,
//! EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA and QUIT, over plain TCP on an
//! ephemeral port. Behaviour can be scripted to reject authentication or
//! individual recipients.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Scripted server behaviour.
#[derive(Debug, Clone, Default)]
pub struct MockBehaviour {
    /// Answer every AUTH attempt with 535.
    pub reject_auth: bool,
    /// Recipients answered with 550 at RCPT TO.
    pub reject_recipients: HashSet<String>,
}

/// A message the mock server accepted.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub sender: String,
    pub recipient: String,
    pub body: String,
}

/// Handle to a running mock server.
pub struct MockSmtpServer {
    port: u16,
    messages: Arc<Mutex<Vec<ReceivedMessage>>>,
    auth_attempts: Arc<AtomicUsize>,
}

impl MockSmtpServer {
    /// Bind to an ephemeral port and start accepting sessions.
    pub async fn start(behaviour: MockBehaviour) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let port = listener.local_addr()?.port();

        let messages = Arc::new(Mutex::new(Vec::new()));
        let auth_attempts = Arc::new(AtomicUsize::new(0));

        let accept_messages = Arc::clone(&messages);
        let accept_attempts = Arc::clone(&auth_attempts);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let behaviour = behaviour.clone();
                let messages = Arc::clone(&accept_messages);
                let auth_attempts = Arc::clone(&accept_attempts);

                tokio::spawn(async move {
                    let _ = handle_session(stream, behaviour, messages, auth_attempts).await;
                });
            }
        });

        Ok(Self {
            port,
            messages,
            auth_attempts,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Messages accepted so far, in acceptance order.
    pub async fn messages(&self) -> Vec<ReceivedMessage> {
        self.messages.lock().await.clone()
    }

    pub fn auth_attempts(&self) -> usize {
        self.auth_attempts.load(Ordering::SeqCst)
    }
}

fn angle_bracket_address(argument: &str) -> String {
    argument
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}

async fn handle_session(
    stream: TcpStream,
    behaviour: MockBehaviour,
    messages: Arc<Mutex<Vec<ReceivedMessage>>>,
    auth_attempts: Arc<AtomicUsize>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half).lines();

    write_half.write_all(b"220 mock.test ESMTP\r\n").await?;

    let mut sender = String::new();
    let mut recipient = String::new();

    while let Some(line) = reader.next_line().await? {
        let line = line.trim_end_matches('\r');
        let upper = line.to_ascii_uppercase();

        if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            write_half
                .write_all(b"250-mock.test Hello\r\n250 AUTH LOGIN PLAIN\r\n")
                .await?;
        } else if upper.starts_with("AUTH LOGIN") {
            auth_attempts.fetch_add(1, Ordering::SeqCst);

            // Username: / Password: challenges, base64-encoded.
            write_half.write_all(b"334 VXNlcm5hbWU6\r\n").await?;
            let _username = reader.next_line().await?;
            write_half.write_all(b"334 UGFzc3dvcmQ6\r\n").await?;
            let _password = reader.next_line().await?;

            if behaviour.reject_auth {
                write_half
                    .write_all(b"535 5.7.8 Authentication credentials invalid\r\n")
                    .await?;
            } else {
                write_half.write_all(b"235 2.7.0 Accepted\r\n").await?;
            }
        } else if upper.starts_with("MAIL FROM:") {
            sender = angle_bracket_address(&line["MAIL FROM:".len()..]);
            write_half.write_all(b"250 2.1.0 Ok\r\n").await?;
        } else if upper.starts_with("RCPT TO:") {
            recipient = angle_bracket_address(&line["RCPT TO:".len()..]);
            if behaviour.reject_recipients.contains(&recipient) {
                write_half
                    .write_all(b"550 5.1.1 No such user here\r\n")
                    .await?;
            } else {
                write_half.write_all(b"250 2.1.5 Ok\r\n").await?;
            }
        } else if upper == "DATA" {
            write_half
                .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                .await?;

            let mut body = String::new();
            while let Some(data_line) = reader.next_line().await? {
                let data_line = data_line.trim_end_matches('\r');
                if data_line == "." {
                    break;
                }
                body.push_str(data_line);
                body.push('\n');
            }

            messages.lock().await.push(ReceivedMessage {
                sender: sender.clone(),
                recipient: recipient.clone(),
                body,
            });
            write_half.write_all(b"250 2.0.0 Ok: queued\r\n").await?;
        } else if upper == "QUIT" {
            write_half.write_all(b"221 2.0.0 Bye\r\n").await?;
            break;
        } else {
            write_half
                .write_all(b"500 5.5.2 Command not recognized\r\n")
                .await?;
        }
    }

    Ok(())
}
