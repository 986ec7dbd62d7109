//! CSV build-and-send.

use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::error::TransmitError;
use super::hooks::TransmissionHooks;
use super::payload::build_payload;
use super::types::{OrderRef, Sender, TransmissionConfig, TransmissionResult};
use crate::audit::{AuditEvent, AuditHandle};
use crate::mail::{from_header, MailMessage, Mailer};
use crate::metrics::{MAIL_SEND_DURATION, TRANSMISSIONS_TOTAL};
use crate::notice::{Notice, NoticeQueue};
use crate::order::{Order, OrderStore};
use crate::settings::SettingsStore;

/// Builds an order's CSV, mails it to the configured recipients and records
/// the outcome on the order and in the notice queue.
///
/// `send` ignores the per-status guard; see `GuardedSender` for the
/// once-per-status path.
pub struct CsvTransmitter {
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingsStore>,
    mailer: Arc<dyn Mailer>,
    notices: Arc<NoticeQueue>,
    hooks: TransmissionHooks,
    sender: Sender,
    upload_dir: PathBuf,
    keep_files: bool,
    audit: Option<AuditHandle>,
}

impl CsvTransmitter {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        settings: Arc<dyn SettingsStore>,
        mailer: Arc<dyn Mailer>,
        notices: Arc<NoticeQueue>,
        sender: Sender,
        upload_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orders,
            settings,
            mailer,
            notices,
            hooks: TransmissionHooks::default(),
            sender,
            upload_dir: upload_dir.into(),
            keep_files: false,
            audit: None,
        }
    }

    pub fn with_hooks(mut self, hooks: TransmissionHooks) -> Self {
        self.hooks = hooks;
        self
    }

    /// Leave the written CSV in the upload directory instead of removing it.
    pub fn with_keep_files(mut self, keep_files: bool) -> Self {
        self.keep_files = keep_files;
        self
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn orders(&self) -> &Arc<dyn OrderStore> {
        &self.orders
    }

    pub fn settings(&self) -> &Arc<dyn SettingsStore> {
        &self.settings
    }

    pub fn upload_dir(&self) -> &Path {
        &self.upload_dir
    }

    /// Resolve a reference to a full order. `None` for unknown ids.
    pub fn resolve(&self, order: OrderRef) -> Result<Option<Order>, TransmitError> {
        match order {
            OrderRef::Loaded(order) => Ok(Some(*order)),
            OrderRef::Id(id) => Ok(self.orders.get(id)?),
        }
    }

    /// Run the pipeline once for `order`.
    ///
    /// Unknown orders are skipped without touching the filesystem. A write
    /// failure is returned as `TransmitError::Filesystem`; a mail failure is
    /// reported through the result and an error notice.
    pub async fn send(
        &self,
        order: impl Into<OrderRef>,
    ) -> Result<TransmissionResult, TransmitError> {
        let config = TransmissionConfig::load(self.settings.as_ref())?;

        let order_ref = order.into();
        let order_id = order_ref.id();
        let Some(order) = self.resolve(order_ref)? else {
            debug!(order_id = %order_id, "Order not found, nothing to transmit");
            return Ok(TransmissionResult::skipped(order_id, "Order not found"));
        };

        let subject = self.hooks.subject(&order);
        let body = self.hooks.message(&order);
        let filename = self.hooks.filename(&order);
        let filepath = self.confined_path(&filename)?;
        let payload = build_payload(&self.hooks.fields(&order));

        tokio::fs::write(&filepath, payload.as_bytes())
            .await
            .map_err(|e| TransmitError::filesystem(filepath.clone(), e))?;
        debug!(order_id = %order.id, path = %filepath.display(), bytes = payload.len(), "CSV written");

        let delivered = if config.recipients.is_empty() {
            debug!(order_id = %order.id, "No CSV recipients configured, mail skipped");
            Ok(TransmissionResult::skipped(
                order.id,
                "No CSV recipients configured",
            ))
        } else {
            let message = MailMessage {
                to: config.recipients.clone(),
                subject,
                body,
                headers: vec![from_header(&self.sender.name, &self.sender.address)],
                attachments: vec![filepath.clone()],
            };
            self.deliver(&order, &message).await
        };

        self.cleanup(&filepath).await;
        let result = delivered?;

        TRANSMISSIONS_TOTAL
            .with_label_values(&[result.outcome.as_str()])
            .inc();

        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::TransmissionAttempted {
                    order_id: order.id.0,
                    order_number: order.number.clone(),
                    status: order.status.to_string(),
                    outcome: result.outcome.as_str().to_string(),
                    recipients: config.recipients.len(),
                    message: result.message.clone(),
                })
                .await;
        }

        Ok(result)
    }

    async fn deliver(
        &self,
        order: &Order,
        message: &MailMessage,
    ) -> Result<TransmissionResult, TransmitError> {
        let started = Instant::now();
        let sent = self.mailer.send(message).await;
        let label = if sent.is_ok() { "success" } else { "error" };
        MAIL_SEND_DURATION
            .with_label_values(&[self.mailer.name(), label])
            .observe(started.elapsed().as_secs_f64());

        match sent {
            Ok(()) => {
                // Mail is already out; the note is best effort.
                if let Err(e) = self.orders.add_note(
                    order.id,
                    &format!("CSV successfully transmitted - {}", order.status),
                    false,
                ) {
                    warn!(order_id = %order.id, error = %e, "Failed to record transmission note");
                }
                let text = format!("CSV was successfully transmitted for Order {}.", order.number);
                self.notices.stage(order.id, Notice::updated(&text));
                info!(
                    order_id = %order.id,
                    recipients = message.to.len(),
                    transport = self.mailer.name(),
                    "CSV transmitted"
                );
                Ok(TransmissionResult::sent(order.id, text))
            }
            Err(e) => {
                warn!(order_id = %order.id, error = %e, "CSV transmission failed");
                let text = format!(
                    "There was an error when trying to transmit CSV for Order {}, please try again.",
                    order.number
                );
                self.notices.stage(order.id, Notice::error(&text));
                Ok(TransmissionResult::failed(order.id, text))
            }
        }
    }

    /// Join `filename` onto the upload directory, refusing anything that is
    /// not a single plain file name.
    fn confined_path(&self, filename: &str) -> Result<PathBuf, TransmitError> {
        let mut components = Path::new(filename).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => Ok(self.upload_dir.join(name)),
            _ => {
                warn!(filename = %filename, "CSV filename escapes the upload directory");
                Err(TransmitError::filesystem(
                    self.upload_dir.clone(),
                    io::Error::new(
                        io::ErrorKind::InvalidInput,
                        format!("invalid CSV filename {:?}", filename),
                    ),
                ))
            }
        }
    }

    async fn cleanup(&self, filepath: &Path) {
        if self.keep_files {
            return;
        }
        if let Err(e) = tokio::fs::remove_file(filepath).await {
            warn!(path = %filepath.display(), error = %e, "Failed to remove transmitted CSV");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use crate::order::{
        OrderError, OrderId, OrderNote, OrderStatus, SqliteOrderStore, UpsertOrderRequest,
    };
    use crate::settings::{save_transmission_settings, SqliteSettingsStore, TransmissionSettings};
    use crate::testing::{fixtures, MockMailer};
    use crate::transmit::TransmissionOutcome;
    use tempfile::TempDir;

    struct Harness {
        orders: Arc<SqliteOrderStore>,
        settings: Arc<SqliteSettingsStore>,
        mailer: Arc<MockMailer>,
        notices: Arc<NoticeQueue>,
        dir: TempDir,
    }

    impl Harness {
        fn new(recipients: &[&str]) -> Self {
            let settings = Arc::new(SqliteSettingsStore::in_memory().unwrap());
            save_transmission_settings(
                settings.as_ref(),
                &TransmissionSettings {
                    csv_recipients: recipients.iter().map(|r| r.to_string()).collect(),
                    ..Default::default()
                },
            )
            .unwrap();

            let orders = Arc::new(SqliteOrderStore::in_memory().unwrap());
            orders
                .upsert(fixtures::order_request(1, "1001", "complete"))
                .unwrap();

            Self {
                orders,
                settings,
                mailer: Arc::new(MockMailer::new()),
                notices: Arc::new(NoticeQueue::new()),
                dir: tempfile::tempdir().unwrap(),
            }
        }

        fn transmitter(&self) -> CsvTransmitter {
            CsvTransmitter::new(
                self.orders.clone(),
                self.settings.clone(),
                self.mailer.clone(),
                self.notices.clone(),
                Sender::new("Shop", "shop@example.com"),
                self.dir.path(),
            )
            .with_hooks(TransmissionHooks::new().with_fields(|_| {
                vec!["A".to_string(), "B".to_string(), "C".to_string()]
            }))
        }

        fn written_files(&self) -> usize {
            std::fs::read_dir(self.dir.path()).unwrap().count()
        }
    }

    /// Order store whose note log is unavailable.
    struct NoteRejectingStore(Arc<SqliteOrderStore>);

    impl OrderStore for NoteRejectingStore {
        fn get(&self, id: OrderId) -> Result<Option<Order>, OrderError> {
            self.0.get(id)
        }

        fn upsert(&self, request: UpsertOrderRequest) -> Result<Order, OrderError> {
            self.0.upsert(request)
        }

        fn set_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, OrderError> {
            self.0.set_status(id, status)
        }

        fn set_meta_flag(&self, id: OrderId, key: &str, value: bool) -> Result<(), OrderError> {
            self.0.set_meta_flag(id, key, value)
        }

        fn add_note(&self, _: OrderId, _: &str, _: bool) -> Result<OrderNote, OrderError> {
            Err(OrderError::Database("database is locked".to_string()))
        }
    }

    #[tokio::test]
    async fn test_send_mails_payload_and_records_success() {
        let h = Harness::new(&["ops@example.com", "warehouse@example.com"]);
        let result = h.transmitter().send(OrderId(1)).await.unwrap();

        assert_eq!(result.outcome, TransmissionOutcome::Sent);

        let mails = h.mailer.recorded_mails().await;
        assert_eq!(mails.len(), 1);
        let mail = &mails[0];
        assert_eq!(mail.message.to, vec!["ops@example.com", "warehouse@example.com"]);
        assert_eq!(mail.message.subject, "Order 1001");
        assert_eq!(mail.message.body, "Confirmation CSV attached for order 1001");
        assert_eq!(mail.message.headers, vec!["From: Shop <shop@example.com>"]);
        assert_eq!(mail.message.attachments, vec![h.dir.path().join("1001.csv")]);
        assert_eq!(mail.attachment_contents, vec![Some("A,B,C".to_string())]);

        let order = h.orders.get(OrderId(1)).unwrap().unwrap();
        assert_eq!(order.notes.len(), 1);
        assert_eq!(order.notes[0].content, "CSV successfully transmitted - complete");
        assert!(!order.notes[0].customer_note);

        let notice = h.notices.peek(OrderId(1)).unwrap();
        assert_eq!(notice.kind, NoticeKind::Updated);
        assert_eq!(notice.message, "CSV was successfully transmitted for Order 1001.");
    }

    #[tokio::test]
    async fn test_written_file_is_removed_after_send() {
        let h = Harness::new(&["ops@example.com"]);
        h.transmitter().send(OrderId(1)).await.unwrap();
        assert_eq!(h.written_files(), 0);
    }

    #[tokio::test]
    async fn test_keep_files_leaves_csv_in_place() {
        let h = Harness::new(&["ops@example.com"]);
        h.transmitter()
            .with_keep_files(true)
            .send(OrderId(1))
            .await
            .unwrap();

        let written = std::fs::read_to_string(h.dir.path().join("1001.csv")).unwrap();
        assert_eq!(written, "A,B,C");
    }

    #[tokio::test]
    async fn test_mail_failure_stages_error_notice_without_note() {
        let h = Harness::new(&["ops@example.com"]);
        h.mailer.set_failure("relay refused").await;

        let result = h.transmitter().send(OrderId(1)).await.unwrap();
        assert_eq!(result.outcome, TransmissionOutcome::Failed);

        let order = h.orders.get(OrderId(1)).unwrap().unwrap();
        assert!(order.notes.is_empty());

        let notice = h.notices.peek(OrderId(1)).unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(
            notice.message,
            "There was an error when trying to transmit CSV for Order 1001, please try again."
        );
        assert_eq!(h.written_files(), 0);
    }

    #[tokio::test]
    async fn test_empty_recipients_writes_file_but_sends_nothing() {
        let h = Harness::new(&[]);
        let result = h
            .transmitter()
            .with_keep_files(true)
            .send(OrderId(1))
            .await
            .unwrap();

        assert_eq!(result.outcome, TransmissionOutcome::Skipped);
        assert_eq!(h.mailer.mail_count().await, 0);
        assert!(h.notices.is_empty());
        assert!(h.orders.get(OrderId(1)).unwrap().unwrap().notes.is_empty());
        assert_eq!(
            std::fs::read_to_string(h.dir.path().join("1001.csv")).unwrap(),
            "A,B,C"
        );
    }

    #[tokio::test]
    async fn test_unknown_order_is_skipped_without_side_effects() {
        let h = Harness::new(&["ops@example.com"]);
        let result = h.transmitter().with_keep_files(true).send(OrderId(404)).await.unwrap();

        assert_eq!(result.outcome, TransmissionOutcome::Skipped);
        assert_eq!(result.order_id, OrderId(404));
        assert_eq!(h.mailer.mail_count().await, 0);
        assert_eq!(h.written_files(), 0);
    }

    #[tokio::test]
    async fn test_unwritable_upload_dir_propagates() {
        let h = Harness::new(&["ops@example.com"]);
        let transmitter = CsvTransmitter::new(
            h.orders.clone(),
            h.settings.clone(),
            h.mailer.clone(),
            h.notices.clone(),
            Sender::new("Shop", "shop@example.com"),
            h.dir.path().join("missing"),
        );

        let err = transmitter.send(OrderId(1)).await.unwrap_err();
        assert!(matches!(err, TransmitError::Filesystem { .. }));
        assert_eq!(h.mailer.mail_count().await, 0);
        assert!(h.notices.is_empty());
    }

    #[tokio::test]
    async fn test_default_field_provider_writes_empty_payload() {
        let h = Harness::new(&["ops@example.com"]);
        let transmitter = CsvTransmitter::new(
            h.orders.clone(),
            h.settings.clone(),
            h.mailer.clone(),
            h.notices.clone(),
            Sender::new("Shop", "shop@example.com"),
            h.dir.path(),
        );
        transmitter.send(OrderId(1)).await.unwrap();

        let mails = h.mailer.recorded_mails().await;
        assert_eq!(mails[0].attachment_contents, vec![Some(String::new())]);
    }

    #[tokio::test]
    async fn test_repeated_sends_are_independent() {
        let h = Harness::new(&["ops@example.com"]);
        let transmitter = h.transmitter();
        transmitter.send(OrderId(1)).await.unwrap();
        transmitter.send(OrderId(1)).await.unwrap();

        assert_eq!(h.mailer.mail_count().await, 2);
        let order = h.orders.get(OrderId(1)).unwrap().unwrap();
        assert_eq!(order.notes.len(), 2);
        assert!(order.meta.is_empty());
    }

    #[tokio::test]
    async fn test_order_number_cannot_leave_upload_dir() {
        let h = Harness::new(&["ops@example.com"]);
        let outside = tempfile::tempdir().unwrap();
        let absolute = outside.path().join("abs").display().to_string();
        h.orders
            .upsert(fixtures::order_request(2, "../escaped", "complete"))
            .unwrap();
        h.orders
            .upsert(fixtures::order_request(3, &absolute, "complete"))
            .unwrap();
        let transmitter = h.transmitter().with_keep_files(true);

        for id in [2, 3] {
            let err = transmitter.send(OrderId(id)).await.unwrap_err();
            assert!(matches!(err, TransmitError::Filesystem { .. }));
        }

        assert!(!h.dir.path().join("../escaped.csv").exists());
        assert!(!outside.path().join("abs.csv").exists());
        assert_eq!(h.written_files(), 0);
        assert_eq!(h.mailer.mail_count().await, 0);
        assert!(h.notices.is_empty());
    }

    #[tokio::test]
    async fn test_note_failure_after_mail_still_reports_sent() {
        let h = Harness::new(&["ops@example.com"]);
        let transmitter = CsvTransmitter::new(
            Arc::new(NoteRejectingStore(h.orders.clone())),
            h.settings.clone(),
            h.mailer.clone(),
            h.notices.clone(),
            Sender::new("Shop", "shop@example.com"),
            h.dir.path(),
        );

        let result = transmitter.send(OrderId(1)).await.unwrap();

        assert_eq!(result.outcome, TransmissionOutcome::Sent);
        assert_eq!(h.mailer.mail_count().await, 1);
        assert_eq!(h.notices.peek(OrderId(1)).unwrap().kind, NoticeKind::Updated);
        assert_eq!(h.written_files(), 0);
    }
}
