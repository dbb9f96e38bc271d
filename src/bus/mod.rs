//! Event system decoupling the sync engine from its UI consumers.
//!
//! The bus provides:
//! - Publish-subscribe keyed by event name
//! - Synchronous fan-out in registration order
//! - Per-handler isolation (a panicking handler never starves the rest)
//!
//! # Architecture
//!
//! Events flow from the poller and reconciler → `EventBus` → UI widgets:
//! - `EventBus`: in-memory handler registry, one list per event name
//! - `event_types`: single source of truth for event names and payloads
//!
//! The UI also publishes domain events (e.g. [`EVENT_EXPENSE_CREATED`])
//! back onto the same bus to request out-of-band refreshes.

mod event_bus;
mod event_types;

pub use event_bus::{BusEvent, EventBus, Subscription};
pub use event_types::{
    NewNotificationsPayload, NotificationDeletedPayload, NotificationReadPayload,
    UnreadCountPayload, EVENT_ALL_NOTIFICATIONS_DELETED, EVENT_ALL_NOTIFICATIONS_READ,
    EVENT_EXPENSE_CREATED, EVENT_NEW_NOTIFICATIONS, EVENT_NOTIFICATION_DELETED,
    EVENT_NOTIFICATION_READ, EVENT_UNREAD_COUNT_UPDATED,
};
