//! Shared unit-test fixtures: an in-memory gateway and record builders.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::api::{ApiError, NotificationGateway, NotificationQuery};
use crate::model::{Notification, NotificationType};

pub(crate) fn note(id: &str, is_read: bool, minute: u32) -> Notification {
    Notification {
        id: id.to_string(),
        title: format!("title {id}"),
        message: format!("message {id}"),
        kind: NotificationType::BudgetWarning,
        is_read,
        related_id: None,
        created_at: Utc
            .with_ymd_and_hms(2024, 3, 1, 10, minute, 0)
            .single()
            .expect("valid timestamp"),
    }
}

/// Scriptable in-memory [`NotificationGateway`].
#[derive(Default)]
pub(crate) struct StubGateway {
    list_response: Mutex<Vec<Notification>>,
    pub unread_total: AtomicU64,
    pub fail_list: AtomicBool,
    pub fail_mutations: AtomicBool,
    pub list_calls: AtomicUsize,
    pub count_calls: AtomicUsize,
    mutations: Mutex<Vec<String>>,
}

impl StubGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_list(&self, items: Vec<Notification>) {
        *self.list_response.lock().expect("stub list mutex") = items;
    }

    pub fn mutation_log(&self) -> Vec<String> {
        self.mutations.lock().expect("stub mutation mutex").clone()
    }

    fn record_mutation(&self, label: String) -> Result<(), ApiError> {
        self.mutations.lock().expect("stub mutation mutex").push(label);
        if self.fail_mutations.load(Ordering::SeqCst) {
            return Err(ApiError::Request("stub: mutation rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for StubGateway {
    async fn list(&self, _query: &NotificationQuery) -> Result<Vec<Notification>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(ApiError::Request("stub: list offline".to_string()));
        }
        Ok(self.list_response.lock().expect("stub list mutex").clone())
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.unread_total.load(Ordering::SeqCst))
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        self.record_mutation(format!("mark_read:{id}"))
    }

    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<(), ApiError> {
        self.record_mutation(match kind {
            Some(kind) => format!("mark_all_read:{kind}"),
            None => "mark_all_read".to_string(),
        })
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.record_mutation(format!("delete:{id}"))
    }

    async fn delete_all(&self, query: &NotificationQuery) -> Result<(), ApiError> {
        self.record_mutation(match query.kind {
            Some(kind) => format!("delete_all:{kind}"),
            None => "delete_all".to_string(),
        })
    }
}
