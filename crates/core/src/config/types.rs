use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub mail: MailConfig,
    /// Initial transmission settings, written to the settings store on first start.
    #[serde(default)]
    pub transmission: TransmissionSeed,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Where manual triggers redirect when the referring page is unusable.
    #[serde(default = "default_admin_url")]
    pub admin_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            admin_url: default_admin_url(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

fn default_admin_url() -> String {
    "/".to_string()
}

/// Authentication configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Operator key (required when method = "api_key")
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("transmit.db")
}

/// Where CSV files are written before being attached.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,
    /// Leave written CSV files in `upload_dir` after the mail attempt.
    #[serde(default)]
    pub keep_files: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: default_upload_dir(),
            keep_files: false,
        }
    }
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

/// Mail sender identity and transport
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MailConfig {
    /// Display name used in the From header
    pub from_name: String,
    /// Address used in the From header
    pub from_address: String,
    #[serde(default)]
    pub transport: MailTransportKind,
    #[serde(default)]
    pub smtp: Option<SmtpConfig>,
}

/// Available mail transports
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MailTransportKind {
    Smtp,
    /// Log the message instead of delivering it.
    #[default]
    Log,
}

/// SMTP relay configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SmtpConfig {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub tls: SmtpTls,
}

fn default_smtp_port() -> u16 {
    587
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SmtpTls {
    #[default]
    Starttls,
    Tls,
    None,
}

/// Transmission settings used to seed the settings store.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TransmissionSeed {
    #[serde(default)]
    pub statuses: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    /// Order attributes written as CSV columns, in order.
    #[serde(default)]
    pub csv_columns: Vec<String>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub mail: SanitizedMailConfig,
    pub csv_columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

/// Sanitized mail config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedMailConfig {
    pub from_name: String,
    pub from_address: String,
    pub transport: MailTransportKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smtp_host: Option<String>,
    pub smtp_credentials_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
            },
            server: config.server.clone(),
            database: config.database.clone(),
            storage: config.storage.clone(),
            mail: SanitizedMailConfig {
                from_name: config.mail.from_name.clone(),
                from_address: config.mail.from_address.clone(),
                transport: config.mail.transport,
                smtp_host: config.mail.smtp.as_ref().map(|s| s.host.clone()),
                smtp_credentials_configured: config
                    .mail
                    .smtp
                    .as_ref()
                    .is_some_and(|s| s.username.is_some() && s.password.is_some()),
            },
            csv_columns: config.transmission.csv_columns.clone(),
        }
    }
}
