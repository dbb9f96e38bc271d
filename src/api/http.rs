use std::time::Duration;

use async_trait::async_trait;

use super::gateway::{ApiError, NotificationGateway, NotificationQuery};
use crate::config::SyncConfig;
use crate::model::{Notification, NotificationPage, NotificationType, UnreadCount};

/// Bearer-authenticated reqwest client for the notification endpoints.
pub struct HttpNotificationApi {
    client: reqwest::Client,
    base_url: String,
    api_token: String,
}

impl HttpNotificationApi {
    pub fn new(config: &SyncConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| ApiError::Request(format!("failed to build http client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_token: config.api_token.clone(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn query_pairs(query: &NotificationQuery) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(per_page) = query.per_page {
            pairs.push(("per_page", per_page.to_string()));
        }
        if let Some(kind) = query.kind {
            pairs.push(("type", kind.as_str().to_string()));
        }
        pairs
    }

    async fn check_status(
        response: reqwest::Response,
        what: &'static str,
    ) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(ApiError::Auth(format!(
                "{what} rejected ({status}). Check API token and account access."
            )));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(ApiError::Request(format!("{what} error {status}: {text}")));
        }
        Ok(response)
    }

    /// Fire a mutation request and discard the ack body.
    async fn send_ack(
        &self,
        request: reqwest::RequestBuilder,
        what: &'static str,
    ) -> Result<(), ApiError> {
        let response = request.bearer_auth(&self.api_token).send().await?;
        Self::check_status(response, what).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationGateway for HttpNotificationApi {
    async fn list(&self, query: &NotificationQuery) -> Result<Vec<Notification>, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/notifications"))
            .query(&Self::query_pairs(query))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let response = Self::check_status(response, "notification list").await?;
        let text = response.text().await?;

        // Malformed bodies degrade to an empty page: the UI shows "no
        // notifications" instead of crashing (the next poll retries).
        let page: NotificationPage = match serde_json::from_str(&text) {
            Ok(page) => page,
            Err(e) => {
                tracing::warn!("malformed notification list response, treating as empty: {e}");
                NotificationPage::default()
            }
        };
        Ok(page.data)
    }

    async fn unread_count(&self) -> Result<u64, ApiError> {
        let response = self
            .client
            .get(self.endpoint("/notifications/count"))
            .bearer_auth(&self.api_token)
            .send()
            .await?;
        let response = Self::check_status(response, "unread count").await?;
        let text = response.text().await?;
        let parsed: UnreadCount = serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("unread count parse failed: {e}")))?;
        Ok(parsed.total)
    }

    async fn mark_read(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/notifications/{id}/read"));
        self.send_ack(self.client.post(url), "mark read").await
    }

    async fn mark_all_read(&self, kind: Option<NotificationType>) -> Result<(), ApiError> {
        let mut request = self.client.post(self.endpoint("/notifications/read-all"));
        if let Some(kind) = kind {
            request = request.query(&[("type", kind.as_str())]);
        }
        self.send_ack(request, "mark all read").await
    }

    async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let url = self.endpoint(&format!("/notifications/{id}"));
        self.send_ack(self.client.delete(url), "delete notification")
            .await
    }

    async fn delete_all(&self, query: &NotificationQuery) -> Result<(), ApiError> {
        let request = self
            .client
            .delete(self.endpoint("/notifications"))
            .query(&Self::query_pairs(query));
        self.send_ack(request, "delete all notifications").await
    }
}
