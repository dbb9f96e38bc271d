use async_trait::async_trait;

use crate::model::{Notification, NotificationType};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("auth error: {0}")]
    Auth(String),
    #[error("request timeout: {0}")]
    Timeout(String),
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl From<reqwest::Error> for ApiError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return Self::Timeout(value.to_string());
        }
        Self::Request(value.to_string())
    }
}

/// Query filter shared by list and bulk operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotificationQuery {
    pub per_page: Option<u32>,
    pub kind: Option<NotificationType>,
}

/// The six notification endpoints the engine consumes.
#[async_trait]
pub trait NotificationGateway: Send + Sync {
    /// `GET /notifications`
    async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError>;
    /// `GET /notifications/count`
    async fn unread_count(&self) -> Result<u64, ApiError>;
    /// `POST /notifications/{id}/read`
    async fn mark_read(&self, id: &str) -> Result<(), ApiError>;
    /// `POST /notifications/read-all`
    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<(), ApiError>;
    /// `DELETE /notifications/{id}`
    async fn delete(&self, id: &str) -> Result<(), ApiError>;
    /// `DELETE /notifications`
    async fn delete_all(&self, query: &NotificationQuery) -> Result<(), ApiError>;
}
