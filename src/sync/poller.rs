use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time;

use super::shared::SyncShared;
use crate::bus::{Subscription, EVENT_EXPENSE_CREATED};
use crate::config::SyncConfig;

/// Pure interval math: bounded exponential cadence adjustment.
///
/// Kept separate from the timer mechanism so the policy can be unit
/// tested without spinning a runtime.
#[derive(Debug, Clone, Copy)]
pub struct PollPolicy {
    pub min: Duration,
    pub max: Duration,
    pub backoff_factor: f64,
}

impl PollPolicy {
    pub fn from_config(config: &SyncConfig) -> Self {
        Self {
            min: Duration::from_millis(config.min_interval_ms),
            max: Duration::from_millis(config.max_interval_ms),
            backoff_factor: config.backoff_factor,
        }
    }

    pub fn clamp(&self, interval: Duration) -> Duration {
        interval.clamp(self.min, self.max)
    }

    /// Next interval after a productive tick: poll faster, floored at `min`.
    pub fn faster(&self, current: Duration) -> Duration {
        self.clamp(current.div_f64(self.backoff_factor))
    }

    /// Next interval after a quiet or failed tick: poll slower, capped at `max`.
    pub fn slower(&self, current: Duration) -> Duration {
        self.clamp(current.mul_f64(self.backoff_factor))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PollSignal {
    /// Poll immediately and pin the cadence to the minimum interval.
    ForceNow,
    /// Poll after the debounce window, coalescing duplicate requests.
    DebouncedRefresh,
    /// Stretch the cadence to the maximum interval (tab went hidden).
    SlowDown,
}

/// Signal mailbox feeding the poll loop. Lives outside the spawned task
/// so senders (activity tracker, bus handlers, manual refresh) stay valid
/// across poller stop/start cycles.
pub(crate) struct PollSignals {
    queue: Mutex<Vec<PollSignal>>,
    notify: Notify,
}

impl PollSignals {
    pub fn new() -> Self {
        Self {
            queue: Mutex::new(Vec::new()),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, signal: PollSignal) {
        self.queue
            .lock()
            .expect("poll signal mutex poisoned")
            .push(signal);
        self.notify.notify_one();
    }

    async fn notified(&self) {
        self.notify.notified().await;
    }

    pub(crate) fn drain(&self) -> Vec<PollSignal> {
        std::mem::take(&mut *self.queue.lock().expect("poll signal mutex poisoned"))
    }
}

/// Timer-driven background fetch loop.
///
/// States: Idle (not started) → Active (loop task running) → Idle. Each
/// tick fetches the notification list, merges it, and adjusts its own
/// cadence: productive ticks speed it up, quiet or failed ones back it
/// off, both bounded by [`PollPolicy`].
pub struct AdaptivePoller {
    shared: Arc<SyncShared>,
    signals: Arc<PollSignals>,
    policy: PollPolicy,
    start_interval: Duration,
    debounce: Duration,
    task: Mutex<Option<JoinHandle<()>>>,
    refresh_subscription: Mutex<Option<Subscription>>,
}

impl AdaptivePoller {
    pub(crate) fn new(shared: Arc<SyncShared>, config: &SyncConfig) -> Self {
        Self {
            shared,
            signals: Arc::new(PollSignals::new()),
            policy: PollPolicy::from_config(config),
            start_interval: Duration::from_millis(config.start_interval_ms),
            debounce: Duration::from_millis(config.refresh_debounce_ms),
            task: Mutex::new(None),
            refresh_subscription: Mutex::new(None),
        }
    }

    pub(crate) fn signals(&self) -> Arc<PollSignals> {
        self.signals.clone()
    }

    /// Idle → Active. Fetches once immediately so a fresh session shows
    /// notifications without waiting a full interval. No-op when already
    /// active.
    pub fn start(&self) {
        let mut task = self.task.lock().expect("poller task mutex poisoned");
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return;
        }

        // Expense CRUD elsewhere in the app may trip a budget alert
        // server-side; refresh shortly after, debounced.
        let signals = self.signals.clone();
        let subscription = self
            .shared
            .bus
            .subscribe(EVENT_EXPENSE_CREATED, move |_event| {
                signals.push(PollSignal::DebouncedRefresh);
            });
        *self
            .refresh_subscription
            .lock()
            .expect("poller subscription mutex poisoned") = Some(subscription);

        let shared = self.shared.clone();
        let signals = self.signals.clone();
        let policy = self.policy;
        let start_interval = policy.clamp(self.start_interval);
        let debounce = self.debounce;
        *task = Some(tokio::spawn(run_loop(
            shared,
            signals,
            policy,
            start_interval,
            debounce,
        )));
        tracing::debug!("notification poller started");
    }

    /// Active → Idle. Idempotent; a tick in flight is cancelled at its
    /// next await point.
    pub fn stop(&self) {
        self.refresh_subscription
            .lock()
            .expect("poller subscription mutex poisoned")
            .take();
        if let Some(task) = self.task.lock().expect("poller task mutex poisoned").take() {
            task.abort();
            tracing::debug!("notification poller stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.task
            .lock()
            .expect("poller task mutex poisoned")
            .as_ref()
            .is_some_and(|t| !t.is_finished())
    }
}

impl Drop for AdaptivePoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_loop(
    shared: Arc<SyncShared>,
    signals: Arc<PollSignals>,
    policy: PollPolicy,
    start_interval: Duration,
    debounce: Duration,
) {
    let mut interval = tick(&shared, &policy, start_interval).await;
    loop {
        tokio::select! {
            _ = time::sleep(interval) => {
                interval = tick(&shared, &policy, interval).await;
            }
            _ = signals.notified() => {
                interval = apply_signals(&shared, &signals, &policy, interval, debounce).await;
            }
        }
    }
}

/// Collapse pending signals into one cadence decision.
///
/// Precedence when several fire together: the slow-down nudge applies
/// first, then a forced poll pins the interval to the floor before the
/// tick outcome lands on top. The final interval is the minimum of the
/// competing candidates.
async fn apply_signals(
    shared: &SyncShared,
    signals: &PollSignals,
    policy: &PollPolicy,
    mut interval: Duration,
    debounce: Duration,
) -> Duration {
    let mut force = false;
    let mut refresh = false;
    let mut slow = false;
    for signal in signals.drain() {
        match signal {
            PollSignal::ForceNow => force = true,
            PollSignal::DebouncedRefresh => refresh = true,
            PollSignal::SlowDown => slow = true,
        }
    }

    if slow {
        interval = policy.max;
    }
    if refresh && !force {
        time::sleep(debounce).await;
        // Coalesce whatever piled up during the debounce window.
        for signal in signals.drain() {
            if signal == PollSignal::ForceNow {
                force = true;
            }
        }
    }
    if force {
        interval = policy.min;
    }
    if force || refresh {
        interval = tick(shared, policy, interval).await;
    }
    interval
}

/// One poll cycle: throttle-gated fetch + merge, cadence adjustment,
/// visibility-gated unread-count refresh. Failures are absorbed so the
/// loop itself never dies.
async fn tick(shared: &SyncShared, policy: &PollPolicy, interval: Duration) -> Duration {
    let next = match shared.fetch_and_merge(true).await {
        Ok(Some(outcome)) => {
            if outcome.new_items.is_empty() {
                policy.slower(interval)
            } else {
                tracing::debug!(count = outcome.new_items.len(), "merged new notifications");
                policy.faster(interval)
            }
        }
        // Throttle swallowed the tick; keep the schedule as-is.
        Ok(None) => return interval,
        Err(e) => {
            tracing::warn!("notification poll failed, backing off: {e}");
            policy.slower(interval)
        }
    };
    shared.refresh_unread_count().await;
    next
}
