//! SMTP transport built on lettre.

use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Address, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::error::MailError;
use super::traits::Mailer;
use super::types::MailMessage;
use crate::config::{MailConfig, SmtpConfig, SmtpTls};

/// Mailer that relays through an SMTP server.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
    /// Sender used when a message carries no `From` header.
    default_from: Mailbox,
}

impl SmtpMailer {
    /// Creates a mailer for the given relay and default sender.
    pub fn new(config: &SmtpConfig, default_from: Mailbox) -> Result<Self, MailError> {
        let builder = match config.tls {
            SmtpTls::Starttls => AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpTls::Tls => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| MailError::Transport(e.to_string()))?,
            SmtpTls::None => {
                AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(config.host.as_str())
            }
        };

        let mut builder = builder.port(config.port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            host: config.host.clone(),
            default_from,
        })
    }

    /// Creates a mailer from the `[mail]` section. Requires `[mail.smtp]`.
    pub fn from_config(config: &MailConfig) -> Result<Self, MailError> {
        let smtp = config
            .smtp
            .as_ref()
            .ok_or_else(|| MailError::Transport("missing [mail.smtp] section".to_string()))?;
        let address: Address = config
            .from_address
            .parse()
            .map_err(|_| MailError::InvalidAddress(config.from_address.clone()))?;
        Self::new(smtp, Mailbox::new(Some(config.from_name.clone()), address))
    }

    async fn build_message(&self, message: &MailMessage) -> Result<Message, MailError> {
        if message.to.is_empty() {
            return Err(MailError::NoRecipients);
        }

        let from = match message.from_header() {
            Some(value) => value
                .parse::<Mailbox>()
                .map_err(|_| MailError::InvalidAddress(value.to_string()))?,
            None => self.default_from.clone(),
        };

        let mut builder = Message::builder()
            .from(from)
            .subject(message.subject.clone());
        for to in &message.to {
            let mailbox = to
                .parse::<Mailbox>()
                .map_err(|_| MailError::InvalidAddress(to.clone()))?;
            builder = builder.to(mailbox);
        }

        let csv_type =
            ContentType::parse("text/csv").map_err(|e| MailError::Build(e.to_string()))?;

        let mut body = MultiPart::mixed().singlepart(SinglePart::plain(message.body.clone()));
        for path in &message.attachments {
            let content = tokio::fs::read(path)
                .await
                .map_err(|source| MailError::Attachment {
                    path: path.clone(),
                    source,
                })?;
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "order.csv".to_string());
            debug!(file = %filename, bytes = content.len(), "Attaching file");
            body = body.singlepart(Attachment::new(filename).body(content, csv_type.clone()));
        }

        builder
            .multipart(body)
            .map_err(|e| MailError::Build(e.to_string()))
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    fn name(&self) -> &str {
        "smtp"
    }

    async fn send(&self, message: &MailMessage) -> Result<(), MailError> {
        let email = self.build_message(message).await?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Transport(e.to_string()))?;

        info!(
            host = %self.host,
            recipients = message.to.len(),
            subject = %message.subject,
            "Mail relayed"
        );
        Ok(())
    }
}
