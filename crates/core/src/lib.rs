pub mod audit;
pub mod auth;
pub mod config;
pub mod events;
pub mod mail;
pub mod metrics;
pub mod notice;
pub mod order;
pub mod settings;
pub mod testing;
pub mod transmit;

pub use audit::{
    create_audit_system, AuditError, AuditEvent, AuditEventEnvelope, AuditFilter, AuditHandle,
    AuditRecord, AuditStore, AuditWriter, SqliteAuditStore,
};
pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthConfig, AuthMethod, Config,
    ConfigError, MailConfig, MailTransportKind, SanitizedConfig,
};
pub use events::{
    DirectTransmitHandler, EventRegistry, GuardedTransmitHandler, OrderEvent, OrderEventHandler,
};
pub use mail::{create_mailer, LogMailer, MailError, MailMessage, Mailer, SmtpMailer};
pub use notice::{Notice, NoticeKind, NoticeQueue, StagedNotice};
pub use order::{
    Order, OrderError, OrderId, OrderMeta, OrderNote, OrderStatus, OrderStore, SqliteOrderStore,
    UpsertOrderRequest,
};
pub use settings::{
    load_transmission_settings, prepare_settings_update, save_transmission_settings,
    seed_transmission_settings, FieldError, SettingsError, SettingsStore, SqliteSettingsStore,
    TransmissionSettings,
};
pub use transmit::{
    CsvTransmitter, GuardedSender, ManualSurface, ManualTrigger, OrderRef, Sender,
    TransmissionConfig, TransmissionHooks, TransmissionOutcome, TransmissionResult, TransmitError,
};
