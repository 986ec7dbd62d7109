//! Plugin settings: the persisted trigger statuses and recipients.

mod sqlite_store;
mod store;
mod types;
mod validate;

pub use sqlite_store::SqliteSettingsStore;
pub use store::{
    load_transmission_settings, save_transmission_settings, seed_transmission_settings,
    SettingsError, SettingsStore,
};
pub use types::*;
pub use validate::{prepare_settings_update, sanitize_settings, validate_settings, MAX_API_KEY_LEN};
