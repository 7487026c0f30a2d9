//! Mail module for Flasky.
//!
//! This module provides outgoing email:
//! - Message composition for the account workflows
//! - Pluggable delivery transports (log, HTTP API, in-memory)
//! - A background queue so requests never wait on delivery

mod message;
mod queue;
mod transport;

use std::sync::Arc;

pub use message::{Composer, Email, Mailbox};
pub use queue::MailQueue;
pub use transport::{HttpTransport, LogTransport, MailError, MailTransport, RecordingTransport};

use crate::config::{MailConfig, MailTransportKind};

/// Build the transport selected in the mail settings.
pub fn transport_from_config(config: &MailConfig) -> Result<Arc<dyn MailTransport>, MailError> {
    match config.transport {
        MailTransportKind::Log => Ok(Arc::new(LogTransport)),
        MailTransportKind::Http => Ok(Arc::new(HttpTransport::new(config)?)),
    }
}
