//! Common test utilities for in-process HTTP testing.
//!
//! Builds the full router around a temporary database, a temporary upload
//! directory and a `MockMailer`, so transmissions can be driven over HTTP
//! and inspected without a mail relay.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use transmit_core::{
    create_audit_system, create_authenticator, load_config_from_str, seed_transmission_settings,
    testing::MockMailer, AuditFilter, AuditStore, Mailer, OrderStore, SettingsStore,
    SqliteAuditStore, SqliteOrderStore, SqliteSettingsStore, TransmissionSettings,
};

/// Re-export fixtures for test convenience
pub use transmit_core::testing::fixtures;

/// Operator key used when `TestConfig::api_key` is set.
pub const TEST_API_KEY: &str = "test-operator-key";

/// In-process server with a mock mail transport.
pub struct TestFixture {
    pub router: Router,
    pub mailer: Arc<MockMailer>,
    pub orders: Arc<dyn OrderStore>,
    pub settings: Arc<dyn SettingsStore>,
    pub audit_store: Arc<dyn AuditStore>,
    /// Where CSV files are written
    pub upload_dir: PathBuf,
    /// Holds the database and upload directory
    pub temp_dir: TempDir,
    api_key: Option<String>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        self.headers
            .get("location")
            .and_then(|value| value.to_str().ok())
    }
}

/// Configuration for the test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Trigger statuses seeded into the settings store
    pub statuses: Vec<String>,
    /// CSV recipients seeded into the settings store
    pub recipients: Vec<String>,
    pub csv_columns: Vec<String>,
    pub keep_files: bool,
    /// Require this operator key on API requests
    pub api_key: Option<String>,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            statuses: vec!["complete".to_string()],
            recipients: vec!["ops@example.com".to_string()],
            csv_columns: vec!["number".to_string(), "sku".to_string(), "qty".to_string()],
            keep_files: false,
            api_key: None,
        }
    }
}

impl TestConfig {
    pub fn with_statuses(mut self, statuses: &[&str]) -> Self {
        self.statuses = statuses.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_recipients(mut self, recipients: &[&str]) -> Self {
        self.recipients = recipients.iter().map(|r| r.to_string()).collect();
        self
    }

    pub fn keeping_files(mut self) -> Self {
        self.keep_files = true;
        self
    }

    pub fn with_api_key(mut self) -> Self {
        self.api_key = Some(TEST_API_KEY.to_string());
        self
    }
}

/// JSON string and array literals are valid TOML.
fn toml_value<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).expect("value serializes")
}

impl TestFixture {
    /// Create a new test fixture with the default configuration.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let upload_dir = temp_dir.path().join("uploads");
        std::fs::create_dir_all(&upload_dir).expect("Failed to create upload dir");

        let auth = match &test_config.api_key {
            Some(key) => format!("method = \"api_key\"\napi_key = \"{}\"", key),
            None => "method = \"none\"".to_string(),
        };
        let toml = format!(
            r#"
[auth]
{auth}

[server]
host = "127.0.0.1"
port = 8080
admin_url = "/admin/orders"

[database]
path = {db}

[storage]
upload_dir = {uploads}
keep_files = {keep}

[mail]
from_name = "Test Shop"
from_address = "shop@example.com"
transport = "log"

[transmission]
csv_columns = {columns}
"#,
            auth = auth,
            db = toml_value(&db_path.display().to_string()),
            uploads = toml_value(&upload_dir.display().to_string()),
            keep = test_config.keep_files,
            columns = toml_value(&test_config.csv_columns),
        );
        let config = load_config_from_str(&toml).expect("Failed to parse test config");

        let audit_store: Arc<dyn AuditStore> = Arc::new(
            SqliteAuditStore::new(&db_path).expect("Failed to create audit store"),
        );
        let orders: Arc<dyn OrderStore> = Arc::new(
            SqliteOrderStore::new(&db_path).expect("Failed to create order store"),
        );
        let settings: Arc<dyn SettingsStore> = Arc::new(
            SqliteSettingsStore::new(&db_path).expect("Failed to create settings store"),
        );
        seed_transmission_settings(
            settings.as_ref(),
            &TransmissionSettings {
                statuses: test_config.statuses.clone(),
                csv_recipients: test_config.recipients.clone(),
                api_key: None,
            },
        )
        .expect("Failed to seed settings");

        let (audit_handle, audit_writer) = create_audit_system(Arc::clone(&audit_store), 100);
        tokio::spawn(audit_writer.run());

        let mailer = Arc::new(MockMailer::new());
        let authenticator =
            create_authenticator(&config.auth).expect("Failed to create authenticator");

        let state = Arc::new(
            transmit_server::state::AppState::new(
                config,
                authenticator,
                audit_handle,
                Arc::clone(&audit_store),
                Arc::clone(&orders),
                Arc::clone(&settings),
                Arc::clone(&mailer) as Arc<dyn Mailer>,
            )
            .expect("Failed to build app state"),
        );

        let router = transmit_server::api::create_router(state);

        Self {
            router,
            mailer,
            orders,
            settings,
            audit_store,
            upload_dir,
            temp_dir,
            api_key: test_config.api_key,
        }
    }

    /// Push an order snapshot through the API.
    pub async fn create_order(&self, id: u64, number: &str, status: &str) -> TestResponse {
        self.put(
            &format!("/api/v1/orders/{}", id),
            json!({
                "number": number,
                "status": status,
                "fields": { "sku": format!("SKU-{}", id), "qty": "1" }
            }),
        )
        .await
    }

    /// Move an order to `status` through the API.
    pub async fn set_status(&self, id: u64, status: &str) -> TestResponse {
        self.post(
            &format!("/api/v1/orders/{}/status", id),
            json!({ "status": status }),
        )
        .await
    }

    /// Files currently in the upload directory.
    pub fn written_files(&self) -> Vec<String> {
        let mut names: Vec<String> = std::fs::read_dir(&self.upload_dir)
            .expect("Failed to read upload dir")
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Poll the audit store until `event_type` was recorded `count` times.
    pub async fn wait_for_audit(&self, event_type: &str, count: i64) -> bool {
        let filter = AuditFilter::new().with_event_type(event_type);
        for _ in 0..100 {
            if self.audit_store.count(&filter).unwrap_or(0) >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        false
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, None, &[]).await
    }

    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request("POST", path, Some(body), &[]).await
    }

    pub async fn put(&self, path: &str, body: Value) -> TestResponse {
        self.request("PUT", path, Some(body), &[]).await
    }

    /// Send a request with extra headers (Referer, Host, credentials).
    pub async fn request_with_headers(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.request(method, path, None, headers).await
    }

    /// Send a request without the fixture's operator key.
    pub async fn unauthenticated(&self, method: &str, path: &str) -> TestResponse {
        self.send(method, path, None, &[], false).await
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        self.send(method, path, body, headers, true).await
    }

    async fn send(
        &self,
        method: &str,
        path: &str,
        body: Option<Value>,
        headers: &[(&str, &str)],
        with_credentials: bool,
    ) -> TestResponse {
        let mut request_builder = Request::builder().method(method).uri(path);

        if with_credentials {
            if let Some(ref key) = self.api_key {
                request_builder = request_builder.header("X-API-Key", key.as_str());
            }
        }
        for (name, value) in headers {
            request_builder = request_builder.header(*name, *value);
        }

        let body = if let Some(json_body) = body {
            request_builder = request_builder.header("Content-Type", "application/json");
            Body::from(serde_json::to_vec(&json_body).unwrap())
        } else {
            Body::empty()
        };

        let request = request_builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
