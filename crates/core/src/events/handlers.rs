//! Handlers binding order events to the transmission pipeline.

use std::sync::Arc;

use async_trait::async_trait;

use super::types::{OrderEvent, OrderEventHandler};
use crate::order::OrderId;
use crate::transmit::{CsvTransmitter, GuardedSender, TransmissionResult, TransmitError};

/// Status-change handler: at most one transmission per order and status.
pub struct GuardedTransmitHandler {
    sender: Arc<GuardedSender>,
}

impl GuardedTransmitHandler {
    pub fn new(sender: Arc<GuardedSender>) -> Self {
        Self { sender }
    }
}

#[async_trait]
impl OrderEventHandler for GuardedTransmitHandler {
    fn name(&self) -> &str {
        "send_csv_as"
    }

    async fn handle(
        &self,
        order_id: OrderId,
        _event: &OrderEvent,
    ) -> Result<TransmissionResult, TransmitError> {
        self.sender.send_as(order_id).await
    }
}

/// Payment handler: transmits on every event, without the guard.
pub struct DirectTransmitHandler {
    transmitter: Arc<CsvTransmitter>,
}

impl DirectTransmitHandler {
    pub fn new(transmitter: Arc<CsvTransmitter>) -> Self {
        Self { transmitter }
    }
}

#[async_trait]
impl OrderEventHandler for DirectTransmitHandler {
    fn name(&self) -> &str {
        "send_csv"
    }

    async fn handle(
        &self,
        order_id: OrderId,
        _event: &OrderEvent,
    ) -> Result<TransmissionResult, TransmitError> {
        self.transmitter.send(order_id).await
    }
}
