//! Minimal SMTP client transport.
//!
//! This is the concrete [`crate::mailer::Mailer`] used in production: a small
//! SMTP client speaking EHLO, STARTTLS, AUTH LOGIN and the MAIL/RCPT/DATA
//! transaction against a configured relay. Implicit TLS is used on port 465;
//! on any other port the connection starts plain and upgrades via STARTTLS
//! when the server offers it.

mod client;
mod error;
mod mailer;
mod response;

pub use client::SmtpClient;
pub use error::{ClientError, Result};
pub use mailer::SmtpMailer;
pub use response::{Response, ResponseLine};
