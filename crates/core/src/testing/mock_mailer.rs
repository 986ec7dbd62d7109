//! Mock mailer for testing.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::mail::{MailError, MailMessage, Mailer};

/// A message handed to the mock, for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedMail {
    pub message: MailMessage,
    /// Attachment contents read at send time, `None` if unreadable.
    pub attachment_contents: Vec<Option<String>>,
    /// Whether the mock reported success.
    pub success: bool,
}

/// Mock implementation of the `Mailer` trait.
///
/// Records every message together with the contents of its attachments,
/// which the pipeline removes right after sending.
///
/// ```rust,ignore
/// let mailer = MockMailer::new();
/// mailer.set_failure("relay refused").await;
/// // ... run the pipeline ...
/// assert_eq!(mailer.mail_count().await, 1);
/// ```
#[derive(Debug, Default)]
pub struct MockMailer {
    mails: Arc<RwLock<Vec<RecordedMail>>>,
    /// If set, every send fails with this transport error.
    failure: Arc<RwLock<Option<String>>>,
    /// Simulated transport latency.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded_mails(&self) -> Vec<RecordedMail> {
        self.mails.read().await.clone()
    }

    /// Number of send attempts, failed ones included.
    pub async fn mail_count(&self) -> usize {
        self.mails.read().await.len()
    }

    pub async fn clear_recorded_mails(&self) {
        self.mails.write().await.clear();
    }

    /// Make every following send fail.
    pub async fn set_failure(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    pub async fn clear_failure(&self) {
        *self.failure.write().await = None;
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn read_attachment(path: &Path) -> Option<String> {
        tokio::fs::read_to_string(path).await.ok()
    }
}

#[async_trait]
impl Mailer for MockMailer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let mut attachment_contents = Vec::with_capacity(message.attachments.len());
        for path in &message.attachments {
            attachment_contents.push(Self::read_attachment(path).await);
        }

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failure.read().await.clone();
        self.mails.write().await.push(RecordedMail {
            message: message.clone(),
            attachment_contents,
            success: failure.is_none(),
        });

        match failure {
            Some(reason) => Err(MailError::Transport(reason)),
            None => Ok(()),
        }
    }
}
