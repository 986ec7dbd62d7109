//! One-shot admin notices.
//!
//! The pipeline stages at most one notice per order; a later notice for the
//! same order replaces the earlier one. The presentation layer drains the
//! queue, which clears it.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::order::OrderId;

/// Severity of a notice, matching the admin CSS classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    Updated,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    pub message: String,
    pub kind: NoticeKind,
}

impl Notice {
    pub fn updated(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Updated,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: NoticeKind::Error,
        }
    }
}

/// A drained notice together with the order it was keyed by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagedNotice {
    pub order_id: OrderId,
    #[serde(flatten)]
    pub notice: Notice,
}

/// Outbound notice queue keyed by order id.
#[derive(Debug, Default)]
pub struct NoticeQueue {
    notices: Mutex<BTreeMap<OrderId, Notice>>,
}

impl NoticeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<OrderId, Notice>> {
        // A panic while staging cannot leave the map half-written.
        self.notices
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Stage a notice for `order_id`, replacing any pending one.
    pub fn stage(&self, order_id: OrderId, notice: Notice) {
        self.lock().insert(order_id, notice);
    }

    /// Pending notice for `order_id`, without consuming it.
    pub fn peek(&self, order_id: OrderId) -> Option<Notice> {
        self.lock().get(&order_id).cloned()
    }

    /// Take every pending notice, ordered by order id.
    pub fn drain(&self) -> Vec<StagedNotice> {
        std::mem::take(&mut *self.lock())
            .into_iter()
            .map(|(order_id, notice)| StagedNotice { order_id, notice })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
