//! Trait definitions for the mail module.

use async_trait::async_trait;

use super::error::MailError;
use super::types::MailMessage;

/// A transport that can deliver a message with attachments.
#[async_trait]
pub trait Mailer: Send + Sync {
    /// Returns the name of this transport.
    fn name(&self) -> &str;

    /// Delivers the message. `Ok` means the transport accepted it.
    async fn send(&self, message: &MailMessage) -> Result<(), MailError>;
}
