//! Mail transport for CSV delivery.
//!
//! The `Mailer` trait is the seam between the transmission pipeline and the
//! outside world. Two implementations ship:
//!
//! - `SmtpMailer`: relays through an SMTP server (lettre)
//! - `LogMailer`: logs the message and reports success
//!
//! A mailer only reports whether the transport accepted the message; the
//! pipeline turns a failure into an admin notice and never retries.

mod error;
mod log_mailer;
mod smtp;
mod traits;
mod types;

pub use error::MailError;
pub use log_mailer::LogMailer;
pub use smtp::SmtpMailer;
pub use traits::Mailer;
pub use types::{from_header, MailMessage};

use std::sync::Arc;

use crate::config::{MailConfig, MailTransportKind};

/// Create the mailer selected by `[mail].transport`.
pub fn create_mailer(config: &MailConfig) -> Result<Arc<dyn Mailer>, MailError> {
    match config.transport {
        MailTransportKind::Smtp => Ok(Arc::new(SmtpMailer::from_config(config)?)),
        MailTransportKind::Log => Ok(Arc::new(LogMailer::new())),
    }
}
