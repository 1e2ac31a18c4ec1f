//! Configuration loading and validation.
//!
//! The configuration is a TOML document holding the SMTP relay credentials
//! and the recipient list for the batch. It is loaded exactly once, before
//! any network activity; a missing or malformed required field is fatal.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur while locating, reading, or validating the
/// configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read configuration from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML or is missing required fields.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// A configuration value is present but invalid.
    #[error("Invalid configuration for {field}: {reason}")]
    InvalidConfiguration {
        field: &'static str,
        reason: &'static str,
    },

    /// No configuration file was found in any of the searched locations.
    #[error(
        "No configuration file found. Tried the VOLLEY_CONFIG environment variable, \
         ./volley.config.toml and /etc/volley/volley.config.toml"
    )]
    NotFound,

    /// `VOLLEY_CONFIG` was set but does not point at an existing file.
    #[error("VOLLEY_CONFIG points to non-existent file: {0}")]
    EnvPathMissing(PathBuf),
}

/// SMTP relay settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// The full batch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub smtp: SmtpConfig,

    /// Candidate recipient addresses, in dispatch order. Must be non-empty;
    /// addresses that fail the shape check are skipped at run time.
    pub recipients: Vec<String>,

    /// Accepted for forward compatibility. Dispatch currently always uses the
    /// fixed subject from [`crate::message::Message::fixed`] and ignores this
    /// value.
    #[serde(default)]
    pub subject: Option<String>,
}

impl Config {
    /// Locate the configuration file using the following precedence:
    /// 1. `VOLLEY_CONFIG` environment variable
    /// 2. ./volley.config.toml (current working directory)
    /// 3. /etc/volley/volley.config.toml (system-wide config)
    ///
    /// # Errors
    ///
    /// Returns an error if `VOLLEY_CONFIG` points at a missing file, or no
    /// candidate path exists.
    pub fn find() -> Result<PathBuf, ConfigError> {
        if let Ok(env_path) = std::env::var("VOLLEY_CONFIG") {
            let path = PathBuf::from(env_path);
            if path.exists() {
                return Ok(path);
            }
            return Err(ConfigError::EnvPathMissing(path));
        }

        [
            PathBuf::from("./volley.config.toml"),
            PathBuf::from("/etc/volley/volley.config.toml"),
        ]
        .into_iter()
        .find(|path| path.exists())
        .ok_or(ConfigError::NotFound)
    }

    /// Read and validate the configuration at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp.host.is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                field: "smtp.host",
                reason: "must not be empty",
            });
        }

        if self.smtp.username.is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                field: "smtp.username",
                reason: "must not be empty",
            });
        }

        if self.smtp.password.is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                field: "smtp.password",
                reason: "must not be empty",
            });
        }

        if self.recipients.is_empty() {
            return Err(ConfigError::InvalidConfiguration {
                field: "recipients",
                reason: "must contain at least one address",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
        recipients = ["one@example.com", "two@example.org"]

        [smtp]
        host = "smtp.example.com"
        port = 587
        username = "mailer"
        password = "hunter2"
    "#;

    #[test]
    fn parses_a_complete_config() {
        let config = Config::parse(VALID).unwrap();
        assert_eq!(config.smtp.host, "smtp.example.com");
        assert_eq!(config.smtp.port, 587);
        assert_eq!(config.recipients.len(), 2);
        assert!(config.subject.is_none());
    }

    #[test]
    fn subject_is_optional_and_accepted() {
        let content = format!("subject = \"Ignored\"\n{VALID}");
        let config = Config::parse(&content).unwrap();
        assert_eq!(config.subject.as_deref(), Some("Ignored"));
    }

    #[test]
    fn missing_smtp_section_is_a_parse_error() {
        let result = Config::parse("recipients = [\"one@example.com\"]");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn missing_password_is_a_parse_error() {
        let content = r#"
            recipients = ["one@example.com"]

            [smtp]
            host = "smtp.example.com"
            port = 587
            username = "mailer"
        "#;
        assert!(matches!(Config::parse(content), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn empty_recipient_list_is_rejected() {
        let content = r#"
            recipients = []

            [smtp]
            host = "smtp.example.com"
            port = 587
            username = "mailer"
            password = "hunter2"
        "#;
        assert!(matches!(
            Config::parse(content),
            Err(ConfigError::InvalidConfiguration {
                field: "recipients",
                ..
            })
        ));
    }

    #[test]
    fn empty_host_is_rejected() {
        let content = r#"
            recipients = ["one@example.com"]

            [smtp]
            host = ""
            port = 587
            username = "mailer"
            password = "hunter2"
        "#;
        assert!(matches!(
            Config::parse(content),
            Err(ConfigError::InvalidConfiguration {
                field: "smtp.host",
                ..
            })
        ));
    }

    #[test]
    fn load_reads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("volley.config.toml");
        std::fs::write(&path, VALID).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.smtp.username, "mailer");
    }

    #[test]
    fn load_surfaces_io_errors() {
        let result = Config::load(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }
}
