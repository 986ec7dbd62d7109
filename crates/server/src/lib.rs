//! HTTP surface of the order CSV transmitter.

pub mod api;
pub mod metrics;
pub mod state;
