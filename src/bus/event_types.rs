//! Event name constants and payload shapes.
//!
//! Single source of truth for the events this subsystem publishes and
//! the domain events it consumes.

use serde::{Deserialize, Serialize};

use crate::model::Notification;

// ---------------------------------------------------------------------------
// Events published by the sync engine
// ---------------------------------------------------------------------------

pub const EVENT_NEW_NOTIFICATIONS: &str = "notifications.new";
pub const EVENT_NOTIFICATION_READ: &str = "notifications.read";
pub const EVENT_ALL_NOTIFICATIONS_READ: &str = "notifications.read_all";
pub const EVENT_NOTIFICATION_DELETED: &str = "notifications.deleted";
pub const EVENT_ALL_NOTIFICATIONS_DELETED: &str = "notifications.deleted_all";
pub const EVENT_UNREAD_COUNT_UPDATED: &str = "notifications.unread_count";

// ---------------------------------------------------------------------------
// Domain events consumed by the sync engine
// ---------------------------------------------------------------------------

/// Published by expense CRUD flows elsewhere in the app. The poller
/// reacts with a debounced out-of-band fetch, since a fresh expense may
/// have tripped a budget alert server-side.
pub const EVENT_EXPENSE_CREATED: &str = "expenses.created";

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotificationsPayload {
    pub count: usize,
    pub items: Vec<Notification>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationReadPayload {
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationDeletedPayload {
    pub id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UnreadCountPayload {
    pub count: u64,
}
