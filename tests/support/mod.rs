//! Test support utilities for integration testing.
//!
//! Provides an in-process mock SMTP server so the real transport can be
//! exercised end to end without a network relay.

pub mod mock_server;

pub use mock_server::{MockBehaviour, MockSmtpServer, ReceivedMessage};
