//! Order types shared by the stores and the transmission pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Prefix of the per-status "already transmitted" meta flag.
pub const SENT_AS_PREFIX: &str = "sent-as-";

/// Identifier assigned to an order by the commerce platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub u64);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OrderId {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(OrderId)
    }
}

impl From<u64> for OrderId {
    fn from(id: u64) -> Self {
        OrderId(id)
    }
}

/// Lifecycle status tag of an order.
///
/// Tags are opaque: the platform defines the set, this crate only compares them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderStatus(String);

impl OrderStatus {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Meta key recording that a CSV was already transmitted for this status.
    pub fn sent_as_key(&self) -> String {
        format!("{}{}", SENT_AS_PREFIX, self.0)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderStatus {
    fn from(tag: &str) -> Self {
        Self::new(tag)
    }
}

impl From<String> for OrderStatus {
    fn from(tag: String) -> Self {
        Self(tag)
    }
}

/// Typed boolean annotations attached to an order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderMeta(BTreeMap<String, bool>);

impl OrderMeta {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the flag value, `false` when unset.
    pub fn flag(&self, key: &str) -> bool {
        self.0.get(key).copied().unwrap_or(false)
    }

    pub fn set_flag(&mut self, key: impl Into<String>, value: bool) {
        self.0.insert(key.into(), value);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Entry in an order's permanent note log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderNote {
    pub content: String,
    /// Whether the note is visible to the customer.
    pub customer_note: bool,
    pub created_at: DateTime<Utc>,
}

/// A purchase record owned by the commerce platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable order number.
    pub number: String,
    pub status: OrderStatus,
    #[serde(default)]
    pub meta: OrderMeta,
    /// Free-form attributes (customer, totals, line data) supplied by the platform.
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
    #[serde(default)]
    pub notes: Vec<OrderNote>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(id: OrderId, number: impl Into<String>, status: impl Into<OrderStatus>) -> Self {
        Self {
            id,
            number: number.into(),
            status: status.into(),
            meta: OrderMeta::new(),
            fields: BTreeMap::new(),
            notes: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Whether the current status is one of `statuses`.
    pub fn has_status<S: AsRef<str>>(&self, statuses: &[S]) -> bool {
        statuses.iter().any(|s| s.as_ref() == self.status.as_str())
    }

    /// Whether a CSV was already transmitted while the order was in `status`.
    pub fn is_sent_as(&self, status: &OrderStatus) -> bool {
        self.meta.flag(&status.sent_as_key())
    }
}
