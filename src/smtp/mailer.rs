//! The SMTP-backed [`Mailer`] implementation.

use async_trait::async_trait;

use crate::config::SmtpConfig;
use crate::mailer::{DeliveryError, Mailer, TransportError};
use crate::message::Message;

use super::client::SmtpClient;
use super::error::{ClientError, Result};
use super::response::Response;

/// A mail transport backed by a configured SMTP relay.
///
/// Every operation opens a fresh session: connect, EHLO, optional STARTTLS
/// upgrade, AUTH LOGIN, then the operation itself, then QUIT. Connection-per-
/// operation keeps concurrent sends isolated from each other without any
/// shared socket state.
pub struct SmtpMailer {
    host: String,
    port: u16,
    username: String,
    password: String,
    ehlo_domain: String,
}

fn ensure_success(response: Response) -> Result<Response> {
    if response.is_success() {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedResponse {
            code: response.code,
            message: response.message(),
        })
    }
}

fn ensure_code(response: Response, code: u16) -> Result<Response> {
    if response.code == code {
        Ok(response)
    } else {
        Err(ClientError::UnexpectedResponse {
            code: response.code,
            message: response.message(),
        })
    }
}

impl SmtpMailer {
    #[must_use]
    pub fn new(config: &SmtpConfig) -> Self {
        let ehlo_domain = hostname::get()
            .ok()
            .and_then(|name| name.into_string().ok())
            .unwrap_or_else(|| "localhost".to_string());

        Self {
            host: config.host.clone(),
            port: config.port,
            username: config.username.clone(),
            password: config.password.clone(),
            ehlo_domain,
        }
    }

    /// Establish an authenticated session with the relay.
    ///
    /// Port 465 gets implicit TLS; any other port starts plain and upgrades
    /// via STARTTLS when the server advertises it.
    async fn open_session(&self) -> Result<SmtpClient> {
        let addr = format!("{}:{}", self.host, self.port);

        let mut client = if self.port == 465 {
            SmtpClient::connect_tls(&addr, self.host.clone()).await?
        } else {
            SmtpClient::connect(&addr, self.host.clone()).await?
        };

        ensure_code(client.read_greeting().await?, 220)?;

        let ehlo = ensure_success(client.ehlo(&self.ehlo_domain).await?)?;

        if !client.is_tls() && ehlo.advertises("STARTTLS") {
            ensure_success(client.starttls().await?)?;
            ensure_success(client.ehlo(&self.ehlo_domain).await?)?;
        }

        client.auth_login(&self.username, &self.password).await?;

        Ok(client)
    }

    async fn transact(&self, recipient: &str, message: &Message) -> Result<()> {
        let mut client = self.open_session().await?;

        ensure_success(client.mail_from(message.sender()).await?)?;
        ensure_success(client.rcpt_to(recipient).await?)?;
        ensure_code(client.data().await?, 354)?;
        ensure_success(client.send_data(&message.to_rfc822(recipient)).await?)?;

        // The message is accepted at this point; a failed QUIT is harmless.
        let _ = client.quit().await;

        Ok(())
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn verify_connection(&self) -> std::result::Result<bool, TransportError> {
        let mut client = self.open_session().await.map_err(|e| {
            if e.is_authentication_failure() {
                TransportError::AuthenticationFailed(e.to_string())
            } else {
                TransportError::Unavailable(e.to_string())
            }
        })?;

        let _ = client.quit().await;

        Ok(true)
    }

    async fn send(
        &self,
        recipient: &str,
        message: &Message,
    ) -> std::result::Result<(), DeliveryError> {
        self.transact(recipient, message)
            .await
            .map_err(|e| DeliveryError::new(e.to_string()))
    }
}
