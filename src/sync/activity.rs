use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use super::poller::{PollSignal, PollSignals};
use super::shared::SyncShared;
use crate::config::SyncConfig;

/// User-interaction signal kinds the host UI forwards to the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivitySignal {
    PointerDown,
    PointerMove,
    KeyDown,
    Scroll,
    Touch,
}

/// Translates raw user input and tab visibility into poller cadence hints.
///
/// Routine activity only refreshes the last-activity timestamp; a signal
/// arriving after the idle threshold means the user just came back, so
/// the tracker forces an immediate poll pinned to the fast cadence.
pub struct ActivityTracker {
    shared: Arc<SyncShared>,
    signals: Arc<PollSignals>,
    idle_threshold: Duration,
    last_activity: Mutex<Instant>,
}

impl ActivityTracker {
    pub(crate) fn new(
        shared: Arc<SyncShared>,
        signals: Arc<PollSignals>,
        config: &SyncConfig,
    ) -> Self {
        Self {
            shared,
            signals,
            idle_threshold: Duration::from_millis(config.idle_threshold_ms),
            last_activity: Mutex::new(Instant::now()),
        }
    }

    pub fn record(&self, signal: ActivitySignal) {
        let was_idle = {
            let mut last = self.last_activity.lock().expect("activity mutex poisoned");
            let was_idle = last.elapsed() >= self.idle_threshold;
            *last = Instant::now();
            was_idle
        };
        if was_idle {
            tracing::debug!(?signal, "user back from idle, forcing immediate poll");
            self.signals.push(PollSignal::ForceNow);
        }
    }

    /// Hidden tabs stretch the cadence to the maximum; becoming visible
    /// counts as activity and forces an immediate out-of-cycle poll.
    pub fn set_visibility(&self, visible: bool) {
        self.shared.set_visible(visible);
        if visible {
            *self.last_activity.lock().expect("activity mutex poisoned") = Instant::now();
            self.signals.push(PollSignal::ForceNow);
        } else {
            self.signals.push(PollSignal::SlowDown);
        }
    }
}
