//! Dispatch table from order events to handlers.

use std::collections::HashSet;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tracing::{debug, info};

use super::types::{OrderEvent, OrderEventHandler};
use crate::metrics::ORDER_EVENTS_TOTAL;
use crate::order::{OrderId, OrderStatus};
use crate::settings::DEFAULT_TRIGGER_STATUS;
use crate::transmit::{TransmissionResult, TransmitError};

struct Subscription {
    event: OrderEvent,
    handler: Arc<dyn OrderEventHandler>,
}

#[derive(Default)]
struct Inner {
    subscriptions: Vec<Subscription>,
    /// Handler last passed to `bind_statuses`, reused by `rebind`.
    status_handler: Option<Arc<dyn OrderEventHandler>>,
}

/// Registry of order event subscriptions.
///
/// Handlers for one event run in registration order.
#[derive(Default)]
pub struct EventRegistry {
    inner: RwLock<Inner>,
}

impl EventRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `handler` for `event`.
    pub fn subscribe(&self, event: OrderEvent, handler: Arc<dyn OrderEventHandler>) {
        debug!(event = %event, handler = handler.name(), "Subscribing handler");
        self.write().subscriptions.push(Subscription { event, handler });
    }

    /// Bind `handler` to "order entered status" for each distinct tag.
    ///
    /// Replaces every existing status subscription. An empty list binds
    /// `complete`. Returns the number of statuses bound.
    pub fn bind_statuses<S: AsRef<str>>(
        &self,
        statuses: &[S],
        handler: Arc<dyn OrderEventHandler>,
    ) -> usize {
        let mut tags: Vec<&str> = Vec::new();
        let mut seen = HashSet::new();
        for tag in statuses.iter().map(AsRef::as_ref) {
            if seen.insert(tag) {
                tags.push(tag);
            }
        }
        if tags.is_empty() {
            tags.push(DEFAULT_TRIGGER_STATUS);
        }

        let mut inner = self.write();
        inner
            .subscriptions
            .retain(|s| !matches!(s.event, OrderEvent::StatusChanged(_)));
        for tag in &tags {
            inner.subscriptions.push(Subscription {
                event: OrderEvent::StatusChanged(OrderStatus::new(*tag)),
                handler: handler.clone(),
            });
        }
        inner.status_handler = Some(handler);

        info!(statuses = ?tags, "Bound trigger statuses");
        tags.len()
    }

    /// Rebuild the status subscriptions with the handler from the last
    /// `bind_statuses` call. Returns 0 when nothing was bound yet.
    pub fn rebind<S: AsRef<str>>(&self, statuses: &[S]) -> usize {
        let handler = self.read().status_handler.clone();
        match handler {
            Some(handler) => self.bind_statuses(statuses, handler),
            None => 0,
        }
    }

    /// Register an unguarded handler for payment completion.
    pub fn bind_payment_complete(&self, handler: Arc<dyn OrderEventHandler>) {
        self.subscribe(OrderEvent::PaymentComplete, handler);
    }

    /// Number of handlers registered for `event`.
    pub fn subscriptions_for(&self, event: &OrderEvent) -> usize {
        self.read()
            .subscriptions
            .iter()
            .filter(|s| &s.event == event)
            .count()
    }

    pub fn subscription_count(&self) -> usize {
        self.read().subscriptions.len()
    }

    /// Statuses that currently have a subscription, in binding order.
    pub fn bound_statuses(&self) -> Vec<String> {
        self.read()
            .subscriptions
            .iter()
            .filter_map(|s| match &s.event {
                OrderEvent::StatusChanged(status) => Some(status.to_string()),
                OrderEvent::PaymentComplete => None,
            })
            .collect()
    }

    fn handlers_for(&self, event: &OrderEvent) -> Vec<Arc<dyn OrderEventHandler>> {
        self.read()
            .subscriptions
            .iter()
            .filter(|s| &s.event == event)
            .map(|s| s.handler.clone())
            .collect()
    }

    /// Run every handler subscribed to `event` for `order_id`.
    ///
    /// Stops at the first handler error.
    pub async fn dispatch(
        &self,
        order_id: OrderId,
        event: &OrderEvent,
    ) -> Result<Vec<TransmissionResult>, TransmitError> {
        ORDER_EVENTS_TOTAL.with_label_values(&[event.kind()]).inc();
        let handlers = self.handlers_for(event);
        if handlers.is_empty() {
            debug!(order_id = %order_id, event = %event, "No handlers subscribed");
            return Ok(Vec::new());
        }

        let mut results = Vec::with_capacity(handlers.len());
        for handler in handlers {
            debug!(order_id = %order_id, event = %event, handler = handler.name(), "Dispatching");
            results.push(handler.handle(order_id, event).await?);
        }
        Ok(results)
    }
}
