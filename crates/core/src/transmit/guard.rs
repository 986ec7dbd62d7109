//! Once-per-status transmission.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::debug;

use super::error::TransmitError;
use super::transmitter::CsvTransmitter;
use super::types::{OrderRef, TransmissionResult};
use crate::audit::{AuditEvent, AuditHandle};
use crate::metrics::GUARD_SKIPS_TOTAL;
use crate::order::OrderId;

type InFlightKey = (OrderId, String);

/// Sends an order's CSV at most once per status.
///
/// The `sent-as-<status>` meta flag is set after the send returns, whether
/// the mail went out or not. Within one process, concurrent triggers for the
/// same order and status are serialized by an in-flight claim: the loser is
/// skipped.
pub struct GuardedSender {
    transmitter: Arc<CsvTransmitter>,
    in_flight: Mutex<HashSet<InFlightKey>>,
    audit: Option<AuditHandle>,
}

/// Held while a guarded send is running; releases the key on drop.
struct InFlightClaim<'a> {
    set: &'a Mutex<HashSet<InFlightKey>>,
    key: InFlightKey,
}

impl Drop for InFlightClaim<'_> {
    fn drop(&mut self) {
        lock_set(self.set).remove(&self.key);
    }
}

fn lock_set(set: &Mutex<HashSet<InFlightKey>>) -> MutexGuard<'_, HashSet<InFlightKey>> {
    set.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl GuardedSender {
    pub fn new(transmitter: Arc<CsvTransmitter>) -> Self {
        Self {
            transmitter,
            in_flight: Mutex::new(HashSet::new()),
            audit: None,
        }
    }

    pub fn with_audit(mut self, audit: AuditHandle) -> Self {
        self.audit = Some(audit);
        self
    }

    pub fn transmitter(&self) -> &Arc<CsvTransmitter> {
        &self.transmitter
    }

    fn claim(&self, key: InFlightKey) -> Option<InFlightClaim<'_>> {
        lock_set(&self.in_flight)
            .insert(key.clone())
            .then(|| InFlightClaim {
                set: &self.in_flight,
                key,
            })
    }

    /// Transmit `order` for its current status unless already done.
    pub async fn send_as(
        &self,
        order: impl Into<OrderRef>,
    ) -> Result<TransmissionResult, TransmitError> {
        let order_ref = order.into();
        let order_id = order_ref.id();
        let Some(order) = self.transmitter.resolve(order_ref)? else {
            debug!(order_id = %order_id, "Order not found, guarded send skipped");
            return Ok(TransmissionResult::skipped(order_id, "Order not found"));
        };

        let status = order.status.clone();
        let guard_key = status.sent_as_key();

        let Some(_claim) = self.claim((order.id, guard_key.clone())) else {
            debug!(order_id = %order.id, status = %status, "Transmission already in flight");
            GUARD_SKIPS_TOTAL.inc();
            return Ok(TransmissionResult::skipped(
                order.id,
                format!("Transmission for status {} already in progress", status),
            ));
        };

        // A concurrent run may have set the flag after `order` was read.
        let order = self.transmitter.orders().get(order.id)?.unwrap_or(order);

        if order.meta.flag(&guard_key) {
            debug!(order_id = %order.id, status = %status, "CSV already transmitted for status");
            GUARD_SKIPS_TOTAL.inc();
            if let Some(ref audit) = self.audit {
                audit
                    .emit(AuditEvent::GuardSkipped {
                        order_id: order.id.0,
                        status: status.to_string(),
                    })
                    .await;
            }
            return Ok(TransmissionResult::skipped(
                order.id,
                format!("CSV already transmitted as {}", status),
            ));
        }

        let order_id = order.id;
        let result = self.transmitter.send(order).await?;
        self.transmitter
            .orders()
            .set_meta_flag(order_id, &guard_key, true)?;

        Ok(result)
    }
}
