//! Error types for the transmit module.

use std::path::PathBuf;
use thiserror::Error;

use crate::order::OrderError;
use crate::settings::SettingsError;

/// Errors that abort a transmission.
///
/// Mail failures are not errors here: they become a `Failed` result and an
/// error notice.
#[derive(Debug, Error)]
pub enum TransmitError {
    /// The CSV could not be written to the upload directory.
    #[error("Failed to write CSV to {path}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl TransmitError {
    pub fn filesystem(path: PathBuf, source: std::io::Error) -> Self {
        Self::Filesystem { path, source }
    }
}
