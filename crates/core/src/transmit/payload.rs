//! CSV body construction.
//!
//! The body is the field list joined with commas. Fields are written as-is:
//! no quoting, no escaping, no header row, no trailing newline.

use std::sync::Arc;

use super::hooks::FieldProvider;
use crate::order::Order;

pub const FIELD_SEPARATOR: &str = ",";

pub fn build_payload<S: AsRef<str>>(fields: &[S]) -> String {
    fields
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join(FIELD_SEPARATOR)
}

/// Field provider emitting one value per named column.
///
/// `id`, `number` and `status` read the order itself; any other column is
/// looked up in the order's attributes. Missing attributes yield an empty field.
pub fn column_provider(columns: Vec<String>) -> FieldProvider {
    Arc::new(move |order: &Order| {
        columns
            .iter()
            .map(|column| match column.as_str() {
                "id" => order.id.to_string(),
                "number" => order.number.clone(),
                "status" => order.status.to_string(),
                other => order.fields.get(other).cloned().unwrap_or_default(),
            })
            .collect()
    })
}
