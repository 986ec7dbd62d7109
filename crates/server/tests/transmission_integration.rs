//! Transmission flows driven through the HTTP API.
//!
//! Run with: cargo test -p transmit-server --test transmission_integration

mod common;

use axum::http::StatusCode;
use common::{TestConfig, TestFixture, TEST_API_KEY};
use serde_json::json;
use transmit_core::OrderId;

// =============================================================================
// Order ingestion
// =============================================================================

#[tokio::test]
async fn test_upsert_and_get_order() {
    let fixture = TestFixture::new().await;

    let response = fixture.create_order(1, "1001", "processing").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["number"], "1001");
    assert_eq!(response.body["status"], "processing");

    let response = fixture.get("/api/v1/orders/1").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["fields"]["sku"], "SKU-1");
}

#[tokio::test]
async fn test_get_unknown_order_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.get("/api/v1/orders/404").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert!(response.body["error"].as_str().unwrap().contains("404"));
}

#[tokio::test]
async fn test_ingesting_order_in_trigger_status_sends_nothing() {
    let fixture = TestFixture::new().await;

    fixture.create_order(1, "1001", "complete").await;
    assert_eq!(fixture.mailer.mail_count().await, 0);
}

// =============================================================================
// Status-triggered transmission
// =============================================================================

#[tokio::test]
async fn test_entering_trigger_status_transmits_csv() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;

    let response = fixture.set_status(1, "complete").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["dispatched"], true);
    assert_eq!(response.body["results"][0]["outcome"], "sent");

    let mails = fixture.mailer.recorded_mails().await;
    assert_eq!(mails.len(), 1);
    let mail = &mails[0];
    assert_eq!(mail.message.to, vec!["ops@example.com".to_string()]);
    assert_eq!(mail.message.subject, "Order 1001");
    assert_eq!(mail.message.body, "Confirmation CSV attached for order 1001");
    assert_eq!(mail.message.headers, vec!["From: Test Shop <shop@example.com>"]);
    assert!(mail.message.attachments[0].ends_with("1001.csv"));
    assert_eq!(mail.attachment_contents[0].as_deref(), Some("1001,SKU-1,1"));

    // Note, guard flag, and cleanup of the written file
    let order = &response.body["order"];
    assert_eq!(order["notes"][0]["content"], "CSV successfully transmitted - complete");
    assert_eq!(order["notes"][0]["customer_note"], false);
    assert_eq!(order["meta"]["sent-as-complete"], true);
    assert!(fixture.written_files().is_empty());
}

#[tokio::test]
async fn test_non_trigger_status_sends_nothing() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "pending").await;

    let response = fixture.set_status(1, "processing").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["dispatched"], true);
    assert_eq!(response.body["results"], json!([]));
    assert_eq!(fixture.mailer.mail_count().await, 0);
}

#[tokio::test]
async fn test_reentering_status_does_not_resend() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;

    fixture.set_status(1, "complete").await;
    fixture.set_status(1, "on-hold").await;
    let response = fixture.set_status(1, "complete").await;

    assert_eq!(response.body["results"][0]["outcome"], "skipped");
    assert_eq!(fixture.mailer.mail_count().await, 1);
}

#[tokio::test]
async fn test_reposting_current_status_dispatches_nothing() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "complete").await;

    let response = fixture.set_status(1, "complete").await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["dispatched"], false);
    assert_eq!(fixture.mailer.mail_count().await, 0);
}

#[tokio::test]
async fn test_each_trigger_status_transmits_once() {
    let fixture = TestFixture::with_config(
        TestConfig::default().with_statuses(&["processing", "complete"]),
    )
    .await;
    fixture.create_order(1, "1001", "pending").await;

    fixture.set_status(1, "processing").await;
    let response = fixture.set_status(1, "complete").await;

    assert_eq!(fixture.mailer.mail_count().await, 2);
    assert_eq!(response.body["order"]["meta"]["sent-as-processing"], true);
    assert_eq!(response.body["order"]["meta"]["sent-as-complete"], true);
    assert_eq!(
        response.body["order"]["notes"][1]["content"],
        "CSV successfully transmitted - complete"
    );
}

#[tokio::test]
async fn test_status_change_for_unknown_order_is_not_found() {
    let fixture = TestFixture::new().await;

    let response = fixture.set_status(9, "complete").await;
    assert_status!(response, StatusCode::NOT_FOUND);
    assert_eq!(fixture.mailer.mail_count().await, 0);
}

#[tokio::test]
async fn test_mail_failure_stages_error_notice_and_sets_guard() {
    let fixture = TestFixture::new().await;
    fixture.mailer.set_failure("relay refused").await;
    fixture.create_order(1, "1001", "processing").await;

    let response = fixture.set_status(1, "complete").await;
    assert_eq!(response.body["results"][0]["outcome"], "failed");
    assert_eq!(response.body["order"]["notes"], json!([]));
    assert_eq!(response.body["order"]["meta"]["sent-as-complete"], true);

    let notices = fixture.get("/api/v1/notices").await;
    assert_eq!(notices.body["notices"][0]["kind"], "error");
    assert_eq!(
        notices.body["notices"][0]["message"],
        "There was an error when trying to transmit CSV for Order 1001, please try again."
    );
}

#[tokio::test]
async fn test_empty_recipients_writes_file_but_sends_no_mail() {
    let fixture =
        TestFixture::with_config(TestConfig::default().with_recipients(&[]).keeping_files())
            .await;
    fixture.create_order(1, "1001", "processing").await;

    let response = fixture.set_status(1, "complete").await;
    assert_eq!(response.body["results"][0]["outcome"], "skipped");
    assert_eq!(fixture.mailer.mail_count().await, 0);
    assert_eq!(fixture.written_files(), vec!["1001.csv".to_string()]);

    let contents = std::fs::read_to_string(fixture.upload_dir.join("1001.csv")).unwrap();
    assert_eq!(contents, "1001,SKU-1,1");
}

// =============================================================================
// Payment completion
// =============================================================================

#[tokio::test]
async fn test_payment_complete_bypasses_guard() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.set_status(1, "complete").await;

    let response = fixture
        .post("/api/v1/orders/1/payment-complete", json!({}))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["results"][0]["outcome"], "sent");
    assert_eq!(fixture.mailer.mail_count().await, 2);
}

// =============================================================================
// Notices
// =============================================================================

#[tokio::test]
async fn test_notices_are_shown_once() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.set_status(1, "complete").await;

    let first = fixture.get("/api/v1/notices").await;
    assert_status!(first, StatusCode::OK);
    assert_eq!(first.body["notices"][0]["order_id"], 1);
    assert_eq!(first.body["notices"][0]["kind"], "updated");
    assert_eq!(
        first.body["notices"][0]["message"],
        "CSV was successfully transmitted for Order 1001."
    );

    let second = fixture.get("/api/v1/notices").await;
    assert_eq!(second.body["notices"], json!([]));
}

// =============================================================================
// Manual triggers
// =============================================================================

#[tokio::test]
async fn test_order_action_sends_and_redirects_to_referer() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "complete").await;

    let response = fixture
        .request_with_headers(
            "POST",
            "/api/v1/orders/1/actions/transmit_order_csv",
            &[("referer", "/admin/orders/1")],
        )
        .await;

    assert_status!(response, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/orders/1"));
    assert_eq!(fixture.mailer.mail_count().await, 1);
}

#[tokio::test]
async fn test_manual_send_ignores_guard() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.set_status(1, "complete").await;

    for _ in 0..2 {
        fixture
            .request_with_headers("POST", "/api/v1/orders/1/actions/transmit_order_csv", &[])
            .await;
    }

    assert_eq!(fixture.mailer.mail_count().await, 3);
    let order = fixture.orders.get(OrderId(1)).unwrap().unwrap();
    assert_eq!(order.notes.len(), 3);
}

#[tokio::test]
async fn test_foreign_referer_falls_back_to_admin_url() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "complete").await;

    let response = fixture
        .request_with_headers(
            "GET",
            "/api/v1/ajax/transmit_order_csv?order_id=1",
            &[("referer", "https://evil.test/phish"), ("host", "shop.test")],
        )
        .await;

    assert_status!(response, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("/admin/orders"));
    assert_eq!(fixture.mailer.mail_count().await, 1);
}

#[tokio::test]
async fn test_ajax_without_order_id_only_redirects() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .request_with_headers(
            "GET",
            "/api/v1/ajax/transmit_order_csv",
            &[("referer", "http://shop.test/admin/orders"), ("host", "shop.test")],
        )
        .await;

    assert_status!(response, StatusCode::SEE_OTHER);
    assert_eq!(response.location(), Some("http://shop.test/admin/orders"));
    assert_eq!(fixture.mailer.mail_count().await, 0);
    assert!(fixture.written_files().is_empty());
}

#[tokio::test]
async fn test_ajax_with_unknown_order_writes_nothing() {
    let fixture = TestFixture::with_config(TestConfig::default().keeping_files()).await;

    let response = fixture
        .request_with_headers("GET", "/api/v1/ajax/transmit_order_csv?order_id=77", &[])
        .await;

    assert_status!(response, StatusCode::SEE_OTHER);
    assert_eq!(fixture.mailer.mail_count().await, 0);
    assert!(fixture.written_files().is_empty());
}

#[tokio::test]
async fn test_list_action_follows_trigger_statuses() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.create_order(2, "1002", "complete").await;

    let processing = fixture.get("/api/v1/orders/1/actions").await;
    assert_status!(processing, StatusCode::OK);
    assert_eq!(processing.body["detail"][0]["id"], "transmit_order_csv");
    assert_eq!(processing.body["detail"][0]["name"], "Transmit Order CSV");
    assert_eq!(processing.body["list"], json!([]));

    let complete = fixture.get("/api/v1/orders/2/actions").await;
    assert_eq!(
        complete.body["list"][0]["url"],
        "/api/v1/ajax/transmit_order_csv?order_id=2"
    );
}

// =============================================================================
// Settings
// =============================================================================

#[tokio::test]
async fn test_settings_update_rebinds_statuses() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "pending").await;

    let response = fixture
        .put(
            "/api/v1/settings",
            json!({
                "statuses": ["processing", "processing"],
                "csv_recipients": [" ops@example.com ", ""],
                "api_key": "abc123"
            }),
        )
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["api_key"], "ABC123");
    assert_eq!(response.body["csv_recipients"], json!(["ops@example.com"]));
    assert_eq!(response.body["bound_statuses"], json!(["processing"]));

    let response = fixture.set_status(1, "processing").await;
    assert_eq!(response.body["results"][0]["outcome"], "sent");
    assert_eq!(fixture.mailer.mail_count().await, 1);

    let response = fixture.set_status(1, "complete").await;
    assert_eq!(response.body["results"], json!([]));
    assert_eq!(fixture.mailer.mail_count().await, 1);
}

#[tokio::test]
async fn test_settings_rejects_long_api_key() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put(
            "/api/v1/settings",
            json!({ "api_key": "ABCDEFGHIJKLMNOPQRSTU" }),
        )
        .await;
    assert_status!(response, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body["errors"][0]["field"], "api_key");

    let current = fixture.get("/api/v1/settings").await;
    assert_eq!(current.body["statuses"], json!(["complete"]));
    assert!(current.body.get("api_key").is_none());
}

#[tokio::test]
async fn test_empty_statuses_bind_complete() {
    let fixture = TestFixture::new().await;

    let response = fixture
        .put("/api/v1/settings", json!({ "statuses": [] }))
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["bound_statuses"], json!(["complete"]));
}

// =============================================================================
// Audit
// =============================================================================

#[tokio::test]
async fn test_transmission_is_audited() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.set_status(1, "complete").await;

    assert!(fixture.wait_for_audit("transmission_attempted", 1).await);

    let response = fixture
        .get("/api/v1/audit?order_id=1&event_type=transmission_attempted")
        .await;
    assert_status!(response, StatusCode::OK);
    assert_eq!(response.body["total"], 1);
    let data = &response.body["events"][0]["data"];
    assert_eq!(data["outcome"], "sent");
    assert_eq!(data["status"], "complete");
    assert_eq!(data["recipients"], 1);
}

#[tokio::test]
async fn test_status_changes_are_audited() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "pending").await;
    fixture.set_status(1, "processing").await;

    assert!(fixture.wait_for_audit("order_status_changed", 1).await);
    let response = fixture
        .get("/api/v1/audit?event_type=order_status_changed")
        .await;
    let data = &response.body["events"][0]["data"];
    assert_eq!(data["from_status"], "pending");
    assert_eq!(data["to_status"], "processing");
}

// =============================================================================
// Authentication
// =============================================================================

#[tokio::test]
async fn test_api_requires_operator_key() {
    let fixture = TestFixture::with_config(TestConfig::default().with_api_key()).await;

    let response = fixture.unauthenticated("GET", "/api/v1/notices").await;
    assert_status!(response, StatusCode::UNAUTHORIZED);

    let response = fixture.unauthenticated("GET", "/api/v1/health").await;
    assert_status!(response, StatusCode::OK);

    let response = fixture.get("/api/v1/notices").await;
    assert_status!(response, StatusCode::OK);
}

#[tokio::test]
async fn test_manual_send_records_operator() {
    let fixture = TestFixture::with_config(TestConfig::default().with_api_key()).await;
    fixture.create_order(1, "1001", "complete").await;

    fixture
        .request_with_headers(
            "GET",
            "/api/v1/ajax/transmit_order_csv?order_id=1",
            &[("authorization", &format!("Bearer {}", TEST_API_KEY))],
        )
        .await;

    assert!(
        fixture
            .wait_for_audit("manual_transmission_requested", 1)
            .await
    );
    let response = fixture
        .get("/api/v1/audit?event_type=manual_transmission_requested")
        .await;
    assert_eq!(response.body["events"][0]["user_id"], "operator");
    assert_eq!(response.body["events"][0]["data"]["surface"], "ajax");
}

// =============================================================================
// Metrics
// =============================================================================

#[tokio::test]
async fn test_metrics_endpoint_exposes_transmissions() {
    let fixture = TestFixture::new().await;
    fixture.create_order(1, "1001", "processing").await;
    fixture.set_status(1, "complete").await;

    let response = fixture.get("/metrics").await;
    assert_status!(response, StatusCode::OK);
    // Text exposition format, not JSON
    assert_eq!(response.body, serde_json::Value::Null);
}
