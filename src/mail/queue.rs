//! Background mail delivery.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::message::Email;
use super::transport::MailTransport;

/// Handle for queueing mail to a background worker.
///
/// Enqueueing never blocks the caller. Delivery is best-effort: each
/// message is attempted once and failures are only logged.
#[derive(Clone, Debug)]
pub struct MailQueue {
    tx: mpsc::UnboundedSender<Email>,
}

impl MailQueue {
    /// Spawn the delivery worker on the current tokio runtime.
    ///
    /// The worker stops once every handle has been dropped.
    pub fn start(transport: Arc<dyn MailTransport>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Email>();

        tokio::spawn(async move {
            while let Some(email) = rx.recv().await {
                match transport.deliver(&email).await {
                    Ok(()) => debug!(to = %email.to, subject = %email.subject, "Mail delivered"),
                    Err(e) => warn!(
                        to = %email.to,
                        subject = %email.subject,
                        error = %e,
                        "Mail delivery failed"
                    ),
                }
            }
            debug!("Mail worker stopped");
        });

        Self { tx }
    }

    /// Queue a message for delivery.
    pub fn send(&self, email: Email) {
        if let Err(e) = self.tx.send(email) {
            warn!(to = %e.0.to, "Mail worker gone; message dropped");
        }
    }
}
