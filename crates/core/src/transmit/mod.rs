//! The order-to-CSV transmission pipeline.
//!
//! - `CsvTransmitter::send` builds the CSV, writes it to the upload
//!   directory, mails it and records the outcome
//! - `GuardedSender::send_as` wraps it with the `sent-as-<status>` guard
//! - `ManualTrigger` is the operator path that bypasses the guard

mod actions;
mod error;
mod guard;
mod hooks;
mod payload;
mod transmitter;
mod types;

pub use actions::{
    order_detail_actions, order_list_actions, ManualSurface, ManualTrigger, OrderAction,
    TRANSMIT_ACTION_ID, TRANSMIT_ACTION_NAME,
};
pub use error::TransmitError;
pub use guard::GuardedSender;
pub use hooks::{FieldProvider, OrderTemplate, TransmissionHooks};
pub use payload::{build_payload, column_provider, FIELD_SEPARATOR};
pub use transmitter::CsvTransmitter;
pub use types::{OrderRef, Sender, TransmissionConfig, TransmissionOutcome, TransmissionResult};
