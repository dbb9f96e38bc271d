use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

type Handler = Arc<dyn Fn(&BusEvent) + Send + Sync>;

#[derive(Debug, Clone, Serialize)]
pub struct BusEvent {
    pub id: String,
    pub seq: i64,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub created_at: String,
}

struct HandlerEntry {
    token: u64,
    handler: Handler,
}

/// Named-event publish/subscribe registry.
///
/// Handlers for an event run synchronously, in registration order, from a
/// snapshot taken at publish time. A handler registered mid-publish sees
/// only later events; a handler that panics is logged and skipped while
/// the rest of the fan-out proceeds.
#[derive(Default)]
pub struct EventBus {
    handlers: Mutex<HashMap<String, Vec<HandlerEntry>>>,
    seq: AtomicI64,
    next_token: AtomicU64,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `event_type`. The returned guard deregisters
    /// exactly this handler when dropped (or via [`Subscription::unsubscribe`]).
    pub fn subscribe(
        self: &Arc<Self>,
        event_type: &str,
        handler: impl Fn(&BusEvent) + Send + Sync + 'static,
    ) -> Subscription {
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);
        let mut handlers = self.handlers.lock().expect("event bus mutex poisoned");
        handlers
            .entry(event_type.to_string())
            .or_default()
            .push(HandlerEntry {
                token,
                handler: Arc::new(handler),
            });
        Subscription {
            bus: Arc::downgrade(self),
            event_type: event_type.to_string(),
            token,
        }
    }

    /// Build and publish an event with a raw JSON payload.
    pub fn publish(&self, event_type: &str, payload: serde_json::Value) -> BusEvent {
        let event = BusEvent {
            id: Uuid::new_v4().to_string(),
            seq: self.seq.fetch_add(1, Ordering::Relaxed),
            event_type: event_type.to_string(),
            payload,
            created_at: Utc::now().to_rfc3339(),
        };
        self.dispatch(&event);
        event
    }

    /// Convenience: serialize a typed payload and publish in one call.
    pub fn emit<T: Serialize>(&self, event_type: &str, payload: &T) -> BusEvent {
        let payload = match serde_json::to_value(payload) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(event_type, "failed to serialize event payload: {e}");
                serde_json::Value::Null
            }
        };
        self.publish(event_type, payload)
    }

    /// Idempotent removal; unknown tokens are a no-op.
    fn remove_handler(&self, event_type: &str, token: u64) {
        let mut handlers = self.handlers.lock().expect("event bus mutex poisoned");
        if let Some(entries) = handlers.get_mut(event_type) {
            entries.retain(|entry| entry.token != token);
            if entries.is_empty() {
                handlers.remove(event_type);
            }
        }
    }

    fn dispatch(&self, event: &BusEvent) {
        let snapshot: Vec<Handler> = {
            let handlers = self.handlers.lock().expect("event bus mutex poisoned");
            handlers
                .get(&event.event_type)
                .map(|entries| entries.iter().map(|e| e.handler.clone()).collect())
                .unwrap_or_default()
        };
        for handler in snapshot {
            if catch_unwind(AssertUnwindSafe(|| handler(event))).is_err() {
                tracing::warn!(
                    event_type = %event.event_type,
                    "event handler panicked, continuing fan-out"
                );
            }
        }
    }
}

/// Capability returned by [`EventBus::subscribe`]. Deregisters its handler
/// on drop; `unsubscribe` makes the intent explicit at call sites.
pub struct Subscription {
    bus: Weak<EventBus>,
    event_type: String,
    token: u64,
}

impl Subscription {
    /// Deregister the handler now.
    pub fn unsubscribe(self) {}

    /// Keep the handler registered for the lifetime of the bus.
    pub fn detach(mut self) {
        self.bus = Weak::new();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(bus) = self.bus.upgrade() {
            bus.remove_handler(&self.event_type, self.token);
        }
    }
}
