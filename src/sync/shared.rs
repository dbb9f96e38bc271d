use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::api::{ApiError, NotificationGateway, NotificationQuery};
use crate::bus::{
    EventBus, NewNotificationsPayload, UnreadCountPayload, EVENT_NEW_NOTIFICATIONS,
    EVENT_UNREAD_COUNT_UPDATED,
};
use crate::config::SyncConfig;
use crate::store::{MergeOutcome, NotificationStore};

/// State shared between the poller and the reconciler.
///
/// Every fetch, scheduled or forced, funnels through [`fetch_and_merge`]
/// so throttle accounting and `NEW_NOTIFICATIONS` publishing happen in
/// exactly one place. The store mutex is only held for synchronous merge
/// work, never across an await point.
///
/// [`fetch_and_merge`]: SyncShared::fetch_and_merge
pub(crate) struct SyncShared {
    pub gateway: Arc<dyn NotificationGateway>,
    pub store: Mutex<NotificationStore>,
    pub bus: Arc<EventBus>,
    pub query: NotificationQuery,
    throttle: Duration,
    last_fetch: Mutex<Option<Instant>>,
    visible: AtomicBool,
}

impl SyncShared {
    pub fn new(
        gateway: Arc<dyn NotificationGateway>,
        bus: Arc<EventBus>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            gateway,
            store: Mutex::new(NotificationStore::new()),
            bus,
            query: NotificationQuery {
                per_page: Some(config.per_page),
                kind: config.kind_filter,
            },
            throttle: Duration::from_millis(config.throttle_ms),
            last_fetch: Mutex::new(None),
            visible: AtomicBool::new(true),
        }
    }

    /// Reserve the fetch slot. While the throttle window from the previous
    /// fetch is still open, a throttled caller gets `false` and must skip
    /// its tick entirely.
    fn try_acquire_fetch_slot(&self, honor_throttle: bool) -> bool {
        let mut last = self.last_fetch.lock().expect("fetch throttle mutex poisoned");
        if honor_throttle {
            if let Some(at) = *last {
                if at.elapsed() < self.throttle {
                    return false;
                }
            }
        }
        *last = Some(Instant::now());
        true
    }

    /// Fetch the current list, merge it into the store, and publish
    /// `NEW_NOTIFICATIONS` if anything genuinely new survived the merge.
    /// Returns `Ok(None)` when the throttle swallowed the call.
    pub async fn fetch_and_merge(
        &self,
        honor_throttle: bool,
    ) -> Result<Option<MergeOutcome>, ApiError> {
        if !self.try_acquire_fetch_slot(honor_throttle) {
            tracing::debug!("poll skipped, throttle window still open");
            return Ok(None);
        }
        let fresh = self.gateway.list(&self.query).await?;
        let outcome = {
            let mut store = self.store.lock().expect("notification store mutex poisoned");
            store.merge(fresh)
        };
        if !outcome.new_items.is_empty() {
            self.bus.emit(
                EVENT_NEW_NOTIFICATIONS,
                &NewNotificationsPayload {
                    count: outcome.new_items.len(),
                    items: outcome.new_items.clone(),
                },
            );
        }
        Ok(Some(outcome))
    }

    /// Fetch the server-side unread count and publish it. Skipped while
    /// the tab is hidden; failures degrade to a stale badge.
    pub async fn refresh_unread_count(&self) {
        if !self.is_visible() {
            return;
        }
        match self.gateway.unread_count().await {
            Ok(count) => {
                self.bus
                    .emit(EVENT_UNREAD_COUNT_UPDATED, &UnreadCountPayload { count });
            }
            Err(e) => {
                tracing::debug!("unread count refresh failed: {e}");
            }
        }
    }

    /// Rollback path for failed mutations: reconcile against the server
    /// of record, bypassing the throttle. The deleted/seen sets keep the
    /// result convergent no matter how the resync interleaves with other
    /// store writes.
    pub async fn resync(&self) {
        match self.fetch_and_merge(false).await {
            Ok(_) => tracing::debug!("forced resync completed"),
            Err(e) => {
                tracing::warn!("forced resync failed, cache stays stale until the next poll: {e}");
            }
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible.load(Ordering::Relaxed)
    }

    pub fn set_visible(&self, visible: bool) {
        self.visible.store(visible, Ordering::Relaxed);
    }
}
