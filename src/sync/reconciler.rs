use std::sync::Arc;

use super::shared::SyncShared;
use crate::api::{ApiError, NotificationQuery};
use crate::bus::{
    NotificationDeletedPayload, NotificationReadPayload, UnreadCountPayload,
    EVENT_ALL_NOTIFICATIONS_DELETED, EVENT_ALL_NOTIFICATIONS_READ, EVENT_NOTIFICATION_DELETED,
    EVENT_NOTIFICATION_READ, EVENT_UNREAD_COUNT_UPDATED,
};
use crate::config::SyncConfig;
use crate::model::NotificationType;

/// The four user-triggered mutations, funneled through one code path
/// instead of ad hoc try/catch at every call site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    MarkRead(String),
    MarkAllRead,
    Delete(String),
    DeleteAll,
}

/// Optimistic-then-reconcile mutation layer.
///
/// The store mutation and bus events land before the network call, so
/// the UI reflects the change with zero latency. A failed request rolls
/// back by forcing a full resync against the server of record; a brief
/// flash of wrong state beats permanent divergence, and the store's
/// deleted-set keeps a resync from resurrecting what the user removed.
pub struct Reconciler {
    shared: Arc<SyncShared>,
    kind_filter: Option<NotificationType>,
}

impl Reconciler {
    pub(crate) fn new(shared: Arc<SyncShared>, config: &SyncConfig) -> Self {
        Self {
            shared,
            kind_filter: config.kind_filter,
        }
    }

    pub async fn mark_read(&self, id: &str) {
        self.apply(Mutation::MarkRead(id.to_string())).await;
    }

    pub async fn mark_all_read(&self) {
        self.apply(Mutation::MarkAllRead).await;
    }

    pub async fn delete(&self, id: &str) {
        self.apply(Mutation::Delete(id.to_string())).await;
    }

    pub async fn delete_all(&self) {
        self.apply(Mutation::DeleteAll).await;
    }

    pub async fn apply(&self, mutation: Mutation) {
        self.apply_local(&mutation);
        if let Err(e) = self.push_remote(&mutation).await {
            tracing::warn!(?mutation, "mutation failed upstream, forcing resync: {e}");
            self.shared.resync().await;
        }
    }

    fn apply_local(&self, mutation: &Mutation) {
        let unread = {
            let mut store = self
                .shared
                .store
                .lock()
                .expect("notification store mutex poisoned");
            match mutation {
                Mutation::MarkRead(id) => {
                    store.mark_read(id);
                }
                Mutation::MarkAllRead => store.mark_all_read(),
                Mutation::Delete(id) => {
                    store.remove(id);
                }
                Mutation::DeleteAll => store.remove_all(),
            }
            store.unread_count()
        };

        let bus = &self.shared.bus;
        match mutation {
            Mutation::MarkRead(id) => {
                bus.emit(
                    EVENT_NOTIFICATION_READ,
                    &NotificationReadPayload { id: id.clone() },
                );
            }
            Mutation::MarkAllRead => {
                bus.publish(EVENT_ALL_NOTIFICATIONS_READ, serde_json::Value::Null);
            }
            Mutation::Delete(id) => {
                bus.emit(
                    EVENT_NOTIFICATION_DELETED,
                    &NotificationDeletedPayload { id: id.clone() },
                );
            }
            Mutation::DeleteAll => {
                bus.publish(EVENT_ALL_NOTIFICATIONS_DELETED, serde_json::Value::Null);
            }
        }
        bus.emit(EVENT_UNREAD_COUNT_UPDATED, &UnreadCountPayload { count: unread });
    }

    async fn push_remote(&self, mutation: &Mutation) -> Result<(), ApiError> {
        let gateway = &self.shared.gateway;
        match mutation {
            Mutation::MarkRead(id) => gateway.mark_read(id).await,
            Mutation::MarkAllRead => gateway.mark_all_read(self.kind_filter).await,
            Mutation::Delete(id) => gateway.delete(id).await,
            Mutation::DeleteAll => {
                gateway
                    .delete_all(&NotificationQuery {
                        per_page: None,
                        kind: self.kind_filter,
                    })
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;
    use std::sync::Mutex;

    use super::*;
    use crate::bus::{BusEvent, EventBus};
    use crate::testing::{note, StubGateway};

    struct Fixture {
        gateway: Arc<StubGateway>,
        shared: Arc<SyncShared>,
        reconciler: Reconciler,
        events: Arc<Mutex<Vec<BusEvent>>>,
        _subscriptions: Vec<crate::bus::Subscription>,
    }

    fn fixture(initial: Vec<crate::model::Notification>) -> Fixture {
        let config = SyncConfig::default();
        let gateway = Arc::new(StubGateway::new());
        let bus = Arc::new(EventBus::new());
        let shared = Arc::new(SyncShared::new(gateway.clone(), bus.clone(), &config));
        shared
            .store
            .lock()
            .expect("store mutex")
            .merge(initial);

        let events = Arc::new(Mutex::new(Vec::new()));
        let watched = [
            EVENT_NOTIFICATION_READ,
            EVENT_ALL_NOTIFICATIONS_READ,
            EVENT_NOTIFICATION_DELETED,
            EVENT_ALL_NOTIFICATIONS_DELETED,
            EVENT_UNREAD_COUNT_UPDATED,
        ];
        let subscriptions = watched
            .into_iter()
            .map(|event_type| {
                let events = events.clone();
                bus.subscribe(event_type, move |event| {
                    events.lock().expect("events mutex").push(event.clone());
                })
            })
            .collect();

        Fixture {
            reconciler: Reconciler::new(shared.clone(), &config),
            gateway,
            shared,
            events,
            _subscriptions: subscriptions,
        }
    }

    fn count_of(fixture: &Fixture, event_type: &str) -> usize {
        fixture
            .events
            .lock()
            .expect("events mutex")
            .iter()
            .filter(|e| e.event_type == event_type)
            .count()
    }

    #[tokio::test]
    async fn successful_mark_read_skips_resync() {
        let fx = fixture(vec![note("n1", false, 0)]);
        fx.reconciler.mark_read("n1").await;

        assert_eq!(fx.gateway.mutation_log(), vec!["mark_read:n1"]);
        assert_eq!(fx.gateway.list_calls.load(Ordering::SeqCst), 0);
        assert_eq!(count_of(&fx, EVENT_NOTIFICATION_READ), 1);
        let store = fx.shared.store.lock().expect("store mutex");
        assert!(store.get("n1").is_some_and(|n| n.is_read));
        assert_eq!(store.unread_count(), 0);
    }

    #[tokio::test]
    async fn failed_delete_resyncs_without_resurrecting() {
        let fx = fixture(vec![note("n1", false, 0), note("n2", false, 1)]);
        fx.gateway.fail_mutations.store(true, Ordering::SeqCst);
        // Server still reports both items: the delete never landed.
        fx.gateway.set_list(vec![note("n1", false, 0), note("n2", false, 1)]);

        fx.reconciler.delete("n2").await;

        assert_eq!(fx.gateway.list_calls.load(Ordering::SeqCst), 1);
        let store = fx.shared.store.lock().expect("store mutex");
        assert_eq!(store.len(), 1);
        assert!(store.get("n2").is_none());
        assert!(store.is_deleted("n2"));
    }

    #[tokio::test]
    async fn mark_all_read_publishes_exactly_once() {
        let fx = fixture(vec![note("n1", false, 0), note("n2", true, 1)]);
        fx.reconciler.mark_all_read().await;

        assert_eq!(count_of(&fx, EVENT_ALL_NOTIFICATIONS_READ), 1);
        let store = fx.shared.store.lock().expect("store mutex");
        assert!(store.notifications().iter().all(|n| n.is_read));
        assert_eq!(store.unread_count(), 0);
    }

    #[tokio::test]
    async fn delete_all_masks_and_reports() {
        let fx = fixture(vec![note("n1", false, 0), note("n2", false, 1)]);
        fx.reconciler.delete_all().await;

        assert_eq!(count_of(&fx, EVENT_ALL_NOTIFICATIONS_DELETED), 1);
        assert_eq!(fx.gateway.mutation_log(), vec!["delete_all"]);
        let store = fx.shared.store.lock().expect("store mutex");
        assert!(store.is_empty());
        assert!(store.is_deleted("n1") && store.is_deleted("n2"));
    }

    #[tokio::test]
    async fn unread_count_event_follows_each_mutation() {
        let fx = fixture(vec![note("n1", false, 0)]);
        fx.reconciler.mark_read("n1").await;

        let events = fx.events.lock().expect("events mutex");
        let count_event = events
            .iter()
            .find(|e| e.event_type == EVENT_UNREAD_COUNT_UPDATED)
            .expect("count event published");
        assert_eq!(count_event.payload["count"], 0);
    }
}
