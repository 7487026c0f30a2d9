//! API handlers and shared application state.

pub mod admin;
pub mod auth;
pub mod main;

pub use admin::*;
pub use auth::*;
pub use main::*;

use crate::auth::TokenCodec;
use crate::config::Config;
use crate::mail::{Composer, Email, MailQueue};
use crate::Database;

use super::middleware::SessionKeys;

/// Application state shared across handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database pool.
    pub db: Database,
    /// Action token codec.
    pub tokens: TokenCodec,
    /// Session token keys.
    pub sessions: SessionKeys,
    /// Outgoing mail queue.
    pub mail: MailQueue,
    /// Message composer.
    pub composer: Composer,
    /// Administrator address, notified of new registrations.
    pub admin_email: Option<String>,
}

impl AppState {
    /// Create the application state from configuration.
    pub fn new(db: Database, config: &Config, mail: MailQueue) -> Self {
        Self {
            db,
            tokens: TokenCodec::new(&config.web.secret_key, config.tokens.ttl_secs),
            sessions: SessionKeys::new(&config.web.secret_key, config.web.session_expiry_secs),
            mail,
            composer: Composer::new(&config.mail),
            admin_email: config
                .mail
                .admin
                .as_deref()
                .map(str::trim)
                .filter(|a| !a.is_empty())
                .map(str::to_lowercase),
        }
    }

    /// Queue an email; delivery happens in the background.
    pub fn send_mail(&self, email: Email) {
        self.mail.send(email);
    }
}
