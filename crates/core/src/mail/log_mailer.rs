//! Mailer that only logs, for local runs without a relay.

use async_trait::async_trait;
use tracing::info;

use super::error::MailError;
use super::traits::Mailer;
use super::types::MailMessage;

/// Accepts every message with at least one recipient and logs it.
#[derive(Debug, Default)]
pub struct LogMailer;

impl LogMailer {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Mailer for LogMailer {
    fn name(&self) -> &str {
        "log"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        info!(
            to = ?message.to,
            subject = %message.subject,
            from = message.from_header().unwrap_or("-"),
            attachments = ?message.attachments,
            "Mail not delivered (log transport)"
        );
        Ok(())
    }
}
