//! Operator-facing triggers: the order action menu and manual sends.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use super::error::TransmitError;
use super::transmitter::CsvTransmitter;
use super::types::TransmissionResult;
use crate::audit::{AuditEvent, AuditHandle};
use crate::order::{Order, OrderId};

pub const TRANSMIT_ACTION_ID: &str = "transmit_order_csv";
pub const TRANSMIT_ACTION_NAME: &str = "Transmit Order CSV";

/// An entry in an order's action menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderAction {
    pub id: String,
    pub name: String,
    /// Endpoint to call for list-view actions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Actions offered on the order detail view. Always includes the manual send.
pub fn order_detail_actions() -> Vec<OrderAction> {
    vec![OrderAction {
        id: TRANSMIT_ACTION_ID.to_string(),
        name: TRANSMIT_ACTION_NAME.to_string(),
        url: None,
    }]
}

/// Actions offered in the order list, pointing at `endpoint`.
///
/// The manual send only appears while the order is in a trigger status.
pub fn order_list_actions<S: AsRef<str>>(
    order: &Order,
    trigger_statuses: &[S],
    endpoint: &str,
) -> Vec<OrderAction> {
    if !order.has_status(trigger_statuses) {
        return Vec::new();
    }
    vec![OrderAction {
        id: TRANSMIT_ACTION_ID.to_string(),
        name: TRANSMIT_ACTION_NAME.to_string(),
        url: Some(format!("{}?order_id={}", endpoint, order.id)),
    }]
}

/// Where a manual send was requested from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualSurface {
    /// The action menu on the order detail view.
    OrderAction,
    /// The asynchronous list-view endpoint.
    Ajax,
}

impl ManualSurface {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderAction => "order_action",
            Self::Ajax => "ajax",
        }
    }
}

/// Runs operator-requested sends. Bypasses the per-status guard.
pub struct ManualTrigger {
    transmitter: Arc<CsvTransmitter>,
    audit: Option<AuditHandle>,
}

impl ManualTrigger {
    pub fn new(transmitter: Arc<CsvTransmitter>) -> Self {
        Self {
            transmitter,
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Send the CSV for `order_id`. A missing id is a no-op returning `None`.
    pub async fn trigger(
        &self,
        order_id: Option<OrderId>,
        requested_by: &str,
        surface: ManualSurface,
    ) -> Result<Option<TransmissionResult>, TransmitError> {
        let Some(order_id) = order_id else {
            return Ok(None);
        };

        info!(
            order_id = %order_id,
            requested_by = requested_by,
            surface = surface.as_str(),
            "Manual CSV transmission requested"
        );
        if let Some(ref audit) = self.audit {
            audit
                .emit(AuditEvent::ManualTransmissionRequested {
                    order_id: order_id.0,
                    requested_by: requested_by.to_string(),
                    surface: surface.as_str().to_string(),
                })
                .await;
        }

        self.transmitter.send(order_id).await.map(Some)
    }
}
