use std::sync::Arc;

use tracing::info;
use transmit_core::{
    load_transmission_settings, transmit::column_provider, AuditHandle, AuditStore,
    Authenticator, Config, CsvTransmitter, DirectTransmitHandler, EventRegistry, GuardedSender,
    GuardedTransmitHandler, Mailer, ManualTrigger, NoticeQueue, OrderStore, SanitizedConfig,
    Sender, SettingsError, SettingsStore, TransmissionHooks,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    audit_handle: AuditHandle,
    audit_store: Arc<dyn AuditStore>,
    orders: Arc<dyn OrderStore>,
    settings: Arc<dyn SettingsStore>,
    notices: Arc<NoticeQueue>,
    registry: Arc<EventRegistry>,
    manual: ManualTrigger,
}

impl AppState {
    /// Wire the transmission pipeline around the given stores and mailer.
    ///
    /// Status subscriptions are bound from the persisted settings record;
    /// payment completion is bound to the unguarded transmitter.
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        audit_handle: AuditHandle,
        audit_store: Arc<dyn AuditStore>,
        orders: Arc<dyn OrderStore>,
        settings: Arc<dyn SettingsStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Result<Self, SettingsError> {
        let notices = Arc::new(NoticeQueue::new());

        let mut hooks = TransmissionHooks::default();
        if !config.transmission.csv_columns.is_empty() {
            hooks = hooks.with_field_provider(column_provider(
                config.transmission.csv_columns.clone(),
            ));
        }

        let transmitter = Arc::new(
            CsvTransmitter::new(
                Arc::clone(&orders),
                Arc::clone(&settings),
                mailer,
                Arc::clone(&notices),
                Sender::from(&config.mail),
                config.storage.upload_dir.clone(),
            )
            .with_hooks(hooks)
            .with_keep_files(config.storage.keep_files)
            .with_audit(audit_handle.clone()),
        );
        let guarded =
            Arc::new(GuardedSender::new(Arc::clone(&transmitter)).with_audit(audit_handle.clone()));
        let manual = ManualTrigger::new(Arc::clone(&transmitter)).with_audit(audit_handle.clone());

        let registry = Arc::new(EventRegistry::new());
        let statuses = load_transmission_settings(settings.as_ref())?.statuses;
        let bound = registry.bind_statuses(&statuses, Arc::new(GuardedTransmitHandler::new(guarded)));
        registry.bind_payment_complete(Arc::new(DirectTransmitHandler::new(transmitter)));
        info!(statuses = bound, "Transmission handlers registered");

        Ok(Self {
            config,
            authenticator,
            audit_handle,
            audit_store,
            orders,
            settings,
            notices,
            registry,
            manual,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn audit(&self) -> &AuditHandle {
        &self.audit_handle
    }

    pub fn audit_store(&self) -> &dyn AuditStore {
        self.audit_store.as_ref()
    }

    pub fn orders(&self) -> &dyn OrderStore {
        self.orders.as_ref()
    }

    pub fn settings(&self) -> &dyn SettingsStore {
        self.settings.as_ref()
    }

    pub fn notices(&self) -> &NoticeQueue {
        &self.notices
    }

    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    pub fn manual(&self) -> &ManualTrigger {
        &self.manual
    }
}
