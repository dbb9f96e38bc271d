//! Notification records and the wire envelopes the server returns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Category tag attached to every notification. Drives icon/severity in
/// the UI; unknown server-side tags fall back to [`NotificationType::Generic`]
/// instead of failing the whole fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    BudgetExceeded,
    BudgetWarning,
    BudgetApproaching,
    #[serde(other)]
    Generic,
}

impl NotificationType {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BudgetExceeded => "budget_exceeded",
            Self::BudgetWarning => "budget_warning",
            Self::BudgetApproaching => "budget_approaching",
            Self::Generic => "generic",
        }
    }
}

impl Default for NotificationType {
    fn default() -> Self {
        Self::Generic
    }
}

impl std::fmt::Display for NotificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A server-owned notification, cached client-side.
///
/// `id` is an opaque identifier stable across fetches; all diffing is by
/// identity, never by content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(rename = "type", default)]
    pub kind: NotificationType,
    #[serde(default)]
    pub is_read: bool,
    /// Foreign reference for UI navigation (e.g. the budget that tripped).
    #[serde(default)]
    pub related_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Envelope for `GET /notifications`. `data` defaults to empty so a body
/// missing the field degrades to "no notifications" rather than an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NotificationPage {
    #[serde(default)]
    pub data: Vec<Notification>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Envelope for `GET /notifications/count`.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct UnreadCount {
    #[serde(default)]
    pub total: u64,
}
