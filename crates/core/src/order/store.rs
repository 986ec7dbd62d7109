//! Order repository trait and request types.

use std::collections::BTreeMap;

use thiserror::Error;

use super::{Order, OrderId, OrderNote, OrderStatus};

/// Error type for order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(OrderId),

    #[error("Database error: {0}")]
    Database(String),
}

/// Snapshot of an order pushed by the commerce platform.
#[derive(Debug, Clone)]
pub struct UpsertOrderRequest {
    pub id: OrderId,
    pub number: String,
    pub status: OrderStatus,
    pub fields: BTreeMap<String, String>,
}

/// Trait for order storage.
///
/// Meta flags and notes survive upserts: a platform snapshot never clears them.
pub trait OrderStore: Send + Sync {
    /// Resolve an order by id.
    fn get(&self, id: OrderId) -> Result<Option<Order>, OrderError>;

    /// Create or replace the platform-owned part of an order.
    fn upsert(&self, request: UpsertOrderRequest) -> Result<Order, OrderError>;

    /// Move an order to a new status.
    fn set_status(&self, id: OrderId, status: &OrderStatus) -> Result<Order, OrderError>;

    /// Set a boolean meta flag.
    fn set_meta_flag(&self, id: OrderId, key: &str, value: bool) -> Result<(), OrderError>;

    /// Append to the order's permanent note log.
    fn add_note(
        &self,
        id: OrderId,
        content: &str,
        customer_note: bool,
    ) -> Result<OrderNote, OrderError>;
}
