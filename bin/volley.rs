#![deny(clippy::pedantic, clippy::all, clippy::nursery)]

#[cfg(not(unix))]
compile_error!("Only unix-like platforms are currently supported");

use std::sync::Arc;

use tokio::signal::unix::{SignalKind, signal};
use tracing::info;

use volley::config::Config;
use volley::runner::Runner;
use volley::smtp::SmtpMailer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    volley::logging::init();

    let config_path = Config::find()?;
    let config = Config::load(&config_path)?;

    info!(config = %config_path.display(), "Starting batch mailer");

    let mailer = Arc::new(SmtpMailer::new(&config.smtp));

    // SIGINT and SIGTERM both terminate immediately with exit code 0,
    // independent of any in-flight dispatch.
    let mut sigterm = signal(SignalKind::terminate())?;
    let shutdown = async move {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    };

    let status = Runner::new(config, mailer).execute(shutdown).await;

    std::process::exit(status.code());
}
