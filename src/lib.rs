//! Notification synchronization engine for the Spesa expense tracker.
//!
//! The server owns all notification state; this crate keeps a client-side
//! cache convergent with it while the UI stays instant. It handles:
//! - Adaptive polling with bounded exponential backoff
//! - Identity-based merging with resurrection suppression
//! - Optimistic mutations reconciled by forced resync on failure
//! - Activity- and visibility-driven cadence tuning
//!
//! # Architecture
//!
//! - `bus`: publish/subscribe fan-out to UI consumers
//! - `store`: cached notifications + deleted/seen tracking sets
//! - `api`: gateway trait and the reqwest-backed REST client
//! - `sync`: poller, reconciler, and activity tracker
//! - `config`: tunables with serde defaults
//!
//! [`NotificationCenter`] wires the pieces into one explicitly
//! constructed context whose lifetime follows the authenticated session:
//! build it on login, `start()` it, `stop()` it on logout.
//!
//! ```no_run
//! use spesa_notify::{NotificationCenter, SyncConfig, EVENT_NEW_NOTIFICATIONS};
//!
//! # async fn session() -> Result<(), spesa_notify::ApiError> {
//! let center = NotificationCenter::new(SyncConfig::new(
//!     "https://api.spesa.app/v1",
//!     "bearer-token",
//! ))?;
//! let _badge = center.bus().subscribe(EVENT_NEW_NOTIFICATIONS, |event| {
//!     println!("{} new notifications", event.payload["count"]);
//! });
//! center.start();
//! # Ok(())
//! # }
//! ```

mod api;
mod bus;
mod config;
mod model;
mod store;
mod sync;

#[cfg(test)]
mod testing;

use std::sync::Arc;

pub use api::{ApiError, HttpNotificationApi, NotificationGateway, NotificationQuery};
pub use bus::{
    BusEvent, EventBus, NewNotificationsPayload, NotificationDeletedPayload,
    NotificationReadPayload, Subscription, UnreadCountPayload, EVENT_ALL_NOTIFICATIONS_DELETED,
    EVENT_ALL_NOTIFICATIONS_READ, EVENT_EXPENSE_CREATED, EVENT_NEW_NOTIFICATIONS,
    EVENT_NOTIFICATION_DELETED, EVENT_NOTIFICATION_READ, EVENT_UNREAD_COUNT_UPDATED,
};
pub use config::{SyncConfig, MIN_POLL_INTERVAL_MS};
pub use model::{Notification, NotificationPage, NotificationType, UnreadCount};
pub use store::{MergeOutcome, NotificationStore};
pub use sync::{
    ActivitySignal, ActivityTracker, AdaptivePoller, Mutation, PollPolicy, Reconciler,
};

use sync::{PollSignal, SyncShared};

/// The assembled sync engine: one per authenticated session.
///
/// All collaborators share one [`EventBus`] and one store; nothing in
/// here is process-global, so tests (and a hypothetical multi-account
/// UI) can run several centers side by side.
pub struct NotificationCenter {
    bus: Arc<EventBus>,
    shared: Arc<SyncShared>,
    poller: AdaptivePoller,
    reconciler: Reconciler,
    activity: ActivityTracker,
}

impl NotificationCenter {
    /// Build a center backed by the real REST API.
    pub fn new(config: SyncConfig) -> Result<Self, ApiError> {
        let config = config.normalized();
        let gateway = Arc::new(HttpNotificationApi::new(&config)?);
        Ok(Self::with_gateway(config, gateway))
    }

    /// Build a center over any gateway implementation. This is the seam
    /// tests use; the wiring is identical to [`NotificationCenter::new`].
    pub fn with_gateway(config: SyncConfig, gateway: Arc<dyn NotificationGateway>) -> Self {
        let config = config.normalized();
        let bus = Arc::new(EventBus::new());
        let shared = Arc::new(SyncShared::new(gateway, bus.clone(), &config));
        let poller = AdaptivePoller::new(shared.clone(), &config);
        let reconciler = Reconciler::new(shared.clone(), &config);
        let activity = ActivityTracker::new(shared.clone(), poller.signals(), &config);
        Self {
            bus,
            shared,
            poller,
            reconciler,
            activity,
        }
    }

    // -----------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------

    /// Begin polling. Called when the authenticated session starts.
    pub fn start(&self) {
        self.poller.start();
    }

    /// Stop polling. Idempotent; called when the session ends.
    pub fn stop(&self) {
        self.poller.stop();
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_active()
    }

    /// Out-of-band refresh entry point for mutation flows elsewhere in
    /// the app, routed through the same debounced path as
    /// [`EVENT_EXPENSE_CREATED`].
    pub fn force_refresh(&self) {
        self.poller.signals().push(PollSignal::DebouncedRefresh);
    }

    /// Clear the deleted/seen tracking sets. Only for user/session
    /// switches, never mid-session.
    pub fn reset_tracking(&self) {
        self.shared
            .store
            .lock()
            .expect("notification store mutex poisoned")
            .reset_tracking();
    }

    // -----------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------

    /// Cached notifications, newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.shared
            .store
            .lock()
            .expect("notification store mutex poisoned")
            .notifications()
    }

    pub fn unread_count(&self) -> u64 {
        self.shared
            .store
            .lock()
            .expect("notification store mutex poisoned")
            .unread_count()
    }

    pub fn bus(&self) -> Arc<EventBus> {
        self.bus.clone()
    }

    pub fn activity(&self) -> &ActivityTracker {
        &self.activity
    }

    // -----------------------------------------------------------------
    // Mutations (optimistic, reconciled on failure)
    // -----------------------------------------------------------------

    pub async fn mark_read(&self, id: &str) {
        self.reconciler.mark_read(id).await;
    }

    pub async fn mark_all_read(&self) {
        self.reconciler.mark_all_read().await;
    }

    pub async fn delete(&self, id: &str) {
        self.reconciler.delete(id).await;
    }

    pub async fn delete_all(&self) {
        self.reconciler.delete_all().await;
    }
}
