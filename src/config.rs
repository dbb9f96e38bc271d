//! Sync engine configuration.
//!
//! Every tunable has a serde default so a host application can supply a
//! partial JSON/TOML blob and get sensible behavior. `normalized()` is
//! applied once at wiring time and clamps degenerate values instead of
//! erroring.

use serde::{Deserialize, Serialize};

use crate::model::NotificationType;

/// Hard floor for poll intervals. Prevents accidental zero/near-zero
/// config values from creating a busy-loop against the server.
pub const MIN_POLL_INTERVAL_MS: u64 = 1_000;

fn default_per_page() -> u32 {
    50
}

fn default_start_interval_ms() -> u64 {
    30_000
}

fn default_min_interval_ms() -> u64 {
    10_000
}

fn default_max_interval_ms() -> u64 {
    120_000
}

fn default_backoff_factor() -> f64 {
    1.5
}

fn default_throttle_ms() -> u64 {
    1_000
}

fn default_idle_threshold_ms() -> u64 {
    10_000
}

fn default_refresh_debounce_ms() -> u64 {
    500
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Base URL of the REST API, e.g. `https://api.spesa.app/v1`.
    pub base_url: String,
    /// Bearer token attached to every request.
    #[serde(default)]
    pub api_token: String,
    /// Page size for notification list fetches.
    #[serde(default = "default_per_page")]
    pub per_page: u32,
    /// Optional server-side type filter applied to list and bulk calls.
    #[serde(default)]
    pub kind_filter: Option<NotificationType>,
    /// Interval the poller starts at when a session begins.
    #[serde(default = "default_start_interval_ms")]
    pub start_interval_ms: u64,
    /// Fastest cadence the poller may reach while notifications flow.
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,
    /// Slowest cadence the poller backs off to during quiet periods.
    #[serde(default = "default_max_interval_ms")]
    pub max_interval_ms: u64,
    /// Multiplier applied per quiet tick (and its inverse per productive one).
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,
    /// Minimum spacing between fetches regardless of how ticks are triggered.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// User inactivity span after which the next input forces a poll.
    #[serde(default = "default_idle_threshold_ms")]
    pub idle_threshold_ms: u64,
    /// Delay before an out-of-band refresh request actually fetches,
    /// coalescing bursts of domain events into one call.
    #[serde(default = "default_refresh_debounce_ms")]
    pub refresh_debounce_ms: u64,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl SyncConfig {
    pub fn new(base_url: impl Into<String>, api_token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_token: api_token.into(),
            ..Self::default()
        }
    }

    /// Clamp degenerate values into a usable range.
    pub fn normalized(mut self) -> Self {
        if !self.backoff_factor.is_finite() || self.backoff_factor <= 1.0 {
            self.backoff_factor = default_backoff_factor();
        }
        self.min_interval_ms = self.min_interval_ms.max(MIN_POLL_INTERVAL_MS);
        self.max_interval_ms = self.max_interval_ms.max(self.min_interval_ms);
        self.start_interval_ms = self
            .start_interval_ms
            .clamp(self.min_interval_ms, self.max_interval_ms);
        self.throttle_ms = self.throttle_ms.max(1);
        self
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_token: String::new(),
            per_page: default_per_page(),
            kind_filter: None,
            start_interval_ms: default_start_interval_ms(),
            min_interval_ms: default_min_interval_ms(),
            max_interval_ms: default_max_interval_ms(),
            backoff_factor: default_backoff_factor(),
            throttle_ms: default_throttle_ms(),
            idle_threshold_ms: default_idle_threshold_ms(),
            refresh_debounce_ms: default_refresh_debounce_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}
