//! Error types for the mail module.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while building or delivering a message.
#[derive(Debug, Error)]
pub enum MailError {
    /// A recipient or sender address could not be parsed.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// The message has no recipients.
    #[error("Message has no recipients")]
    NoRecipients,

    /// An attachment could not be read.
    #[error("Failed to read attachment: {path}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The message could not be assembled.
    #[error("Failed to build message: {0}")]
    Build(String),

    /// The transport rejected or failed to deliver the message.
    #[error("Transport error: {0}")]
    Transport(String),
}
