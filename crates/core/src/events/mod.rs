//! Order events and the registry that routes them to the pipeline.
//!
//! At startup the configured trigger statuses are bound to a
//! `GuardedTransmitHandler`, and payment completion to a
//! `DirectTransmitHandler`. Saving new settings rebinds the statuses.

mod handlers;
mod registry;
mod types;

pub use handlers::{DirectTransmitHandler, GuardedTransmitHandler};
pub use registry::EventRegistry;
pub use types::{OrderEvent, OrderEventHandler};
