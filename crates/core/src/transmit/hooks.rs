//! Overridable per-order values: subject, message, filename and CSV fields.

use std::fmt;
use std::sync::Arc;

use crate::order::Order;

/// Computes a string from an order.
pub type OrderTemplate = Arc<dyn Fn(&Order) -> String + Send + Sync>;

/// Supplies the CSV fields for an order, in column order.
pub type FieldProvider = Arc<dyn Fn(&Order) -> Vec<String> + Send + Sync>;

/// Extension points consulted on every send.
///
/// Each hook defaults to the stock behaviour; override with the `with_*`
/// builders.
#[derive(Clone)]
pub struct TransmissionHooks {
    subject: OrderTemplate,
    message: OrderTemplate,
    filename: OrderTemplate,
    fields: FieldProvider,
}

impl Default for TransmissionHooks {
    fn default() -> Self {
        Self {
            subject: Arc::new(|order| format!("Order {}", order.number)),
            message: Arc::new(|order| {
                format!("Confirmation CSV attached for order {}", order.number)
            }),
            filename: Arc::new(|order| format!("{}.csv", order.number)),
            fields: Arc::new(|_| Vec::new()),
        }
    }
}

impl TransmissionHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subject<F>(mut self, f: F) -> Self
    where
        F: Fn(&Order) -> String + Send + Sync + 'static,
    {
        self.subject = Arc::new(f);
        self
    }

    pub fn with_message<F>(mut self, f: F) -> Self
    where
        F: Fn(&Order) -> String + Send + Sync + 'static,
    {
        self.message = Arc::new(f);
        self
    }

    pub fn with_filename<F>(mut self, f: F) -> Self
    where
        F: Fn(&Order) -> String + Send + Sync + 'static,
    {
        self.filename = Arc::new(f);
        self
    }

    pub fn with_fields<F>(mut self, f: F) -> Self
    where
        F: Fn(&Order) -> Vec<String> + Send + Sync + 'static,
    {
        self.fields = Arc::new(f);
        self
    }

    pub fn with_field_provider(mut self, provider: FieldProvider) -> Self {
        self.fields = provider;
        self
    }

    pub fn subject(&self, order: &Order) -> String {
        (self.subject)(order)
    }

    pub fn message(&self, order: &Order) -> String {
        (self.message)(order)
    }

    pub fn filename(&self, order: &Order) -> String {
        (self.filename)(order)
    }

    pub fn fields(&self, order: &Order) -> Vec<String> {
        (self.fields)(order)
    }
}

impl fmt::Debug for TransmissionHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransmissionHooks").finish_non_exhaustive()
    }
}
