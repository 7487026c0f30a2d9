//! Configuration module for Flasky.

use serde::Deserialize;
use std::path::Path;

use crate::{FlaskyError, Result};

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number for the API.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    /// Secret key used to sign sessions and action tokens.
    ///
    /// Must stay stable across restarts, otherwise outstanding links stop working.
    #[serde(default)]
    pub secret_key: String,
    /// Session token lifetime in seconds.
    #[serde(default = "default_session_expiry")]
    pub session_expiry_secs: u64,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    5000
}

fn default_session_expiry() -> u64 {
    86400 // 1 day
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
            secret_key: String::new(),
            session_expiry_secs: default_session_expiry(),
        }
    }
}

/// Action token configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenConfig {
    /// Default lifetime of confirmation, reset and change-email tokens.
    #[serde(default = "default_token_ttl")]
    pub ttl_secs: u64,
}

fn default_token_ttl() -> u64 {
    900 // 15 minutes
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_token_ttl(),
        }
    }
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub path: String,
}

fn default_db_path() -> String {
    "data/flasky.db".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Which mail transport delivers outgoing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MailTransportKind {
    /// Write messages to the log only.
    #[default]
    Log,
    /// POST messages to a JSON mail API.
    Http,
}

/// Outgoing mail configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// Prefix prepended to every subject line.
    #[serde(default = "default_subject_prefix")]
    pub subject_prefix: String,
    /// Sender address.
    #[serde(default = "default_sender")]
    pub sender: String,
    /// Administrator address; a registrant with this email becomes Administrator.
    #[serde(default)]
    pub admin: Option<String>,
    /// Transport used for delivery.
    #[serde(default)]
    pub transport: MailTransportKind,
    /// Endpoint of the mail API (http transport).
    #[serde(default)]
    pub api_url: Option<String>,
    /// API key for the mail API (http transport).
    #[serde(default)]
    pub api_key: Option<String>,
    /// Public base URL used to build links in messages.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

fn default_subject_prefix() -> String {
    "[Flasky]".to_string()
}

fn default_sender() -> String {
    "Flasky Admin <flasky@example.com>".to_string()
}

fn default_base_url() -> String {
    "http://localhost:5000".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            subject_prefix: default_subject_prefix(),
            sender: default_sender(),
            admin: None,
            transport: MailTransportKind::default(),
            api_url: None,
            api_key: None,
            base_url: default_base_url(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/flasky.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Action token configuration.
    #[serde(default)]
    pub tokens: TokenConfig,
    /// Database configuration.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Mail configuration.
    #[serde(default)]
    pub mail: MailConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(FlaskyError::Io)?;
        Self::parse(&content)
    }

    /// Load configuration from a TOML file and apply environment variable overrides.
    pub fn load_with_env<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| FlaskyError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `FLASKY_SECRET_KEY`: signing secret
    /// - `FLASKY_ADMIN`: administrator email
    /// - `FLASKY_MAIL_API_KEY`: mail API key
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(secret) = non_empty("FLASKY_SECRET_KEY") {
            self.web.secret_key = secret;
        }
        if let Some(admin) = non_empty("FLASKY_ADMIN") {
            self.mail.admin = Some(admin);
        }
        if let Some(api_key) = non_empty("FLASKY_MAIL_API_KEY") {
            self.mail.api_key = Some(api_key);
        }
    }

    /// Validate the configuration.
    ///
    /// Returns an error if:
    /// - the secret key is empty
    /// - the http mail transport is selected without an api_url
    pub fn validate(&self) -> Result<()> {
        if self.web.secret_key.is_empty() {
            return Err(FlaskyError::Config(
                "secret_key is not set. \
                 Set it in config.toml or via FLASKY_SECRET_KEY environment variable."
                    .to_string(),
            ));
        }
        if self.mail.transport == MailTransportKind::Http && self.mail.api_url.is_none() {
            return Err(FlaskyError::Config(
                "mail transport is http but api_url is not set".to_string(),
            ));
        }
        Ok(())
    }
}
