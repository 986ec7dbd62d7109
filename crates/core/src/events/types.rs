use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::order::{OrderId, OrderStatus};
use crate::transmit::{TransmissionResult, TransmitError};

/// An order lifecycle event published by the commerce platform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "event", content = "status", rename_all = "snake_case")]
pub enum OrderEvent {
    /// The order entered the given status.
    StatusChanged(OrderStatus),
    /// Payment for the order was captured.
    PaymentComplete,
}

impl OrderEvent {
    /// Metric label for the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::StatusChanged(_) => "status_changed",
            Self::PaymentComplete => "payment_complete",
        }
    }
}

impl fmt::Display for OrderEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusChanged(status) => write!(f, "order_status_{}", status),
            Self::PaymentComplete => f.write_str("payment_complete"),
        }
    }
}

/// Receives order events from the registry.
#[async_trait]
pub trait OrderEventHandler: Send + Sync {
    fn name(&self) -> &str;

    async fn handle(
        &self,
        order_id: OrderId,
        event: &OrderEvent,
    ) -> Result<TransmissionResult, TransmitError>;
}
