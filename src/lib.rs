//! A one-shot SMTP batch mailer.
//!
//! `volley` loads a recipient list and SMTP credentials from a configuration
//! file, verifies that the transport is reachable, filters the recipients down
//! to syntactically valid addresses, and dispatches an identical HTML message
//! to every valid recipient concurrently. Each delivery succeeds or fails on
//! its own; the batch completes once every send has resolved, and the process
//! exits.
//!
//! The crate is organized leaf-first:
//!
//! - [`address`]: classification of candidate recipient addresses
//! - [`message`]: the immutable message shared across all sends
//! - [`mailer`]: the transport capability consumed by the pipeline
//! - [`smtp`]: the SMTP implementation of that capability
//! - [`pipeline`]: validation, connectivity gate, and concurrent fan-out
//! - [`runner`]: drives one batch and maps it to an exit status

pub mod address;
pub mod config;
pub mod logging;
pub mod mailer;
pub mod message;
pub mod pipeline;
pub mod runner;
pub mod smtp;
