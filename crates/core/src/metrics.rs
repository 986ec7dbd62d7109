//! Prometheus metrics for the transmission pipeline.
//!
//! Registered into the server's registry via `all_metrics()`.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

/// Pipeline runs by outcome.
pub static TRANSMISSIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "transmit_csv_transmissions_total",
            "Total CSV transmissions by outcome",
        ),
        &["outcome"], // "sent", "failed", "skipped"
    )
    .unwrap()
});

/// Status events ignored because the CSV was already sent for that status.
pub static GUARD_SKIPS_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "transmit_csv_guard_skips_total",
        "Guarded sends skipped because the order was already transmitted for the status",
    )
    .unwrap()
});

/// Time spent in the mail transport.
pub static MAIL_SEND_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "transmit_csv_mail_send_duration_seconds",
            "Duration of mail transport calls",
        )
        .buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0]),
        &["transport", "result"], // result: "success", "error"
    )
    .unwrap()
});

/// Order events dispatched through the registry.
pub static ORDER_EVENTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("transmit_csv_order_events_total", "Total order events dispatched"),
        &["event"], // "status_changed", "payment_complete"
    )
    .unwrap()
});

/// Every core metric, for registration.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TRANSMISSIONS_TOTAL.clone()),
        Box::new(GUARD_SKIPS_TOTAL.clone()),
        Box::new(MAIL_SEND_DURATION.clone()),
        Box::new(ORDER_EVENTS_TOTAL.clone()),
    ]
}
