//! Test doubles and fixtures.
//!
//! ```rust,ignore
//! use transmit_core::testing::{fixtures, MockMailer};
//!
//! let mailer = Arc::new(MockMailer::new());
//! orders.upsert(fixtures::order_request(1, "1001", "complete"))?;
//! // build a CsvTransmitter around `mailer` ...
//! ```

mod mock_mailer;

pub use mock_mailer::{MockMailer, RecordedMail};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::collections::BTreeMap;

    use crate::order::{OrderId, UpsertOrderRequest};
    use crate::settings::TransmissionSettings;

    /// Order snapshot with a couple of line attributes.
    pub fn order_request(id: u64, number: &str, status: &str) -> UpsertOrderRequest {
        UpsertOrderRequest {
            id: OrderId(id),
            number: number.to_string(),
            status: status.into(),
            fields: BTreeMap::from([
                ("sku".to_string(), format!("SKU-{}", id)),
                ("qty".to_string(), "1".to_string()),
            ]),
        }
    }

    /// Settings record with the given trigger statuses and recipients.
    pub fn settings(statuses: &[&str], recipients: &[&str]) -> TransmissionSettings {
        TransmissionSettings {
            statuses: statuses.iter().map(|s| s.to_string()).collect(),
            csv_recipients: recipients.iter().map(|r| r.to_string()).collect(),
            api_key: None,
        }
    }
}
