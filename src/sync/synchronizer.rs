// ABOUTME: Synchronizer keeps one remote resource fresh with change-gated publishing
// ABOUTME: Owns the interval timer, visibility/focus listeners, throttle and in-flight guard

use anyhow::Result;
use chrono::Utc;
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::config::{PollingConfig, SyncConfigError};
use super::detect::ChangeDetector;
use super::signals::PageSignals;
use super::state::SyncState;

type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T>> + Send + Sync>;

/// What started a fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Initial,
    Interval,
    Visible,
    Focus,
    Manual,
}

impl Trigger {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trigger::Initial => "initial",
            Trigger::Interval => "interval",
            Trigger::Visible => "visible",
            Trigger::Focus => "focus",
            Trigger::Manual => "manual",
        }
    }
}

/// Why an attempt did not publish anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Another fetch for this instance is still running
    InFlight,
    /// Too soon after the last successful attempt
    Throttled,
    /// Fetched while the page was hidden; result not applied
    Hidden,
    /// The instance was stopped
    Stopped,
}

/// Result of one polling cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    Published,
    Unchanged,
    Skipped(SkipReason),
    Failed(String),
}

/// Clears the in-flight flag when the cycle ends, however it ends.
struct InFlight {
    flag: Arc<AtomicBool>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

struct Inner<T> {
    name: String,
    fetch: FetchFn<T>,
    detector: Arc<dyn ChangeDetector<T>>,
    config: PollingConfig,
    state: watch::Sender<SyncState<T>>,
    in_flight: Arc<AtomicBool>,
    stopped: AtomicBool,
    visible: AtomicBool,
    last_attempt: Mutex<Option<Instant>>,
    driver: Mutex<Option<JoinHandle<()>>>,
}

/// Repeatedly fetches one resource and publishes it only when it meaningfully changed.
///
/// State is published only on the first load, on a forced attempt, or when the change
/// detector reports a difference. At most one fetch runs at a time. Fetch errors are
/// recorded in the state and never stop the timer; the previous data stays in place.
///
/// Dropping the synchronizer stops it.
pub struct Synchronizer<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Synchronizer<T>
where
    T: Send + Sync + 'static,
{
    pub fn new<F, Fut, D>(
        name: impl Into<String>,
        fetch: F,
        detector: D,
        config: PollingConfig,
    ) -> Result<Self, SyncConfigError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T>> + Send + 'static,
        D: ChangeDetector<T> + 'static,
    {
        config.validate()?;
        let fetch: FetchFn<T> = Arc::new(move || -> BoxFuture<'static, Result<T>> {
            Box::pin(fetch())
        });
        let (state, _) = watch::channel(SyncState::default());

        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                fetch,
                detector: Arc::new(detector),
                config,
                state,
                in_flight: Arc::new(AtomicBool::new(false)),
                stopped: AtomicBool::new(false),
                visible: AtomicBool::new(true),
                last_attempt: Mutex::new(None),
                driver: Mutex::new(None),
            }),
        })
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn config(&self) -> &PollingConfig {
        &self.inner.config
    }

    /// Perform an immediate forced fetch, then poll on the configured interval.
    ///
    /// Does nothing when polling is disabled, when already running, or after `stop`.
    pub fn start(&self, signals: &PageSignals) {
        let inner = &self.inner;
        if !inner.config.enabled {
            tracing::debug!(sync = %inner.name, "polling disabled, not starting");
            return;
        }
        if inner.stopped.load(Ordering::SeqCst) {
            tracing::warn!(sync = %inner.name, "start called on a stopped synchronizer");
            return;
        }

        let mut driver = inner.driver.lock().unwrap_or_else(PoisonError::into_inner);
        if driver.is_some() {
            tracing::debug!(sync = %inner.name, "already running");
            return;
        }

        inner.visible.store(signals.is_visible(), Ordering::SeqCst);
        Inner::spawn_cycle(inner, Trigger::Initial, true);

        let visibility = signals.subscribe_visibility();
        let focus = signals.subscribe_focus();
        *driver = Some(tokio::spawn(drive(Arc::clone(inner), visibility, focus)));

        tracing::info!(
            sync = %inner.name,
            "Started polling every {:?} (min update interval {:?})",
            inner.config.interval,
            inner.config.min_update_interval
        );
    }

    /// Attempt a fetch right now. The in-flight guard always applies; the throttle
    /// is bypassed only when `force` is set.
    pub async fn refetch(&self, force: bool) -> CycleOutcome {
        Arc::clone(&self.inner).run_cycle(Trigger::Manual, force).await
    }

    /// Like `refetch`, but runs on its own task so the caller is not held up by a slow fetch.
    pub fn spawn_refetch(&self, force: bool) -> JoinHandle<CycleOutcome> {
        tokio::spawn(Arc::clone(&self.inner).run_cycle(Trigger::Manual, force))
    }

    /// Stop polling. Late results of fetches that are still running are discarded.
    pub fn stop(&self) {
        self.inner.stop();
    }

    pub fn is_running(&self) -> bool {
        !self.inner.stopped.load(Ordering::SeqCst)
            && self
                .inner
                .driver
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .is_some()
    }

    pub fn subscribe(&self) -> watch::Receiver<SyncState<T>> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SyncState<T> {
        self.inner.state.borrow().clone()
    }
}

impl<T> Drop for Synchronizer<T> {
    fn drop(&mut self) {
        self.inner.stop();
    }
}

impl<T> Inner<T> {
    fn stop(&self) {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self
            .driver
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        tracing::info!(sync = %self.name, "Stopped polling");
    }

    fn last_attempt(&self) -> Option<Instant> {
        *self
            .last_attempt
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// True when no successful attempt happened within `window`.
    fn idle_for(&self, window: Duration) -> bool {
        self.last_attempt()
            .map_or(true, |last| last.elapsed() > window)
    }
}

impl<T> Inner<T>
where
    T: Send + Sync + 'static,
{
    /// Synchronous part of a cycle: guard, throttle and busy flags.
    fn begin(&self, trigger: Trigger, force: bool) -> Result<InFlight, SkipReason> {
        if self.stopped.load(Ordering::SeqCst) {
            return Err(SkipReason::Stopped);
        }
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!(sync = %self.name, trigger = trigger.as_str(), "fetch already in flight, skipping");
            return Err(SkipReason::InFlight);
        }
        let guard = InFlight {
            flag: Arc::clone(&self.in_flight),
        };

        if !force {
            if let Some(last) = self.last_attempt() {
                let elapsed = last.elapsed();
                if elapsed < self.config.min_update_interval {
                    tracing::debug!(
                        sync = %self.name,
                        trigger = trigger.as_str(),
                        "last update {:?} ago, throttling",
                        elapsed
                    );
                    return Err(SkipReason::Throttled);
                }
            }
        }

        self.state.send_modify(|state| {
            if state.data.is_none() {
                state.loading = true;
            } else {
                state.is_refreshing = true;
            }
        });
        Ok(guard)
    }

    /// Asynchronous part of a cycle: fetch, compare, publish.
    async fn complete(&self, guard: InFlight, trigger: Trigger, force: bool) -> CycleOutcome {
        let result = (self.fetch)().await;

        if self.stopped.load(Ordering::SeqCst) {
            tracing::debug!(sync = %self.name, trigger = trigger.as_str(), "stopped while fetching, discarding result");
            return CycleOutcome::Skipped(SkipReason::Stopped);
        }

        let outcome = match result {
            Ok(next) => {
                *self
                    .last_attempt
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner) = Some(Instant::now());
                let visible = self.visible.load(Ordering::SeqCst);
                let mut outcome = CycleOutcome::Unchanged;

                self.state.send_modify(|state| {
                    let first_load = state.data.is_none();
                    if !(visible || first_load || force) {
                        outcome = CycleOutcome::Skipped(SkipReason::Hidden);
                    } else if first_load
                        || force
                        || self.detector.has_changed(state.data.as_deref(), &next)
                    {
                        state.data = Some(Arc::new(next));
                        state.last_updated = Some(Utc::now());
                        outcome = CycleOutcome::Published;
                    }
                    state.error = None;
                    state.loading = false;
                    state.is_refreshing = false;
                });
                outcome
            }
            Err(e) => {
                let message = e.to_string();
                tracing::warn!(
                    sync = %self.name,
                    trigger = trigger.as_str(),
                    "Fetch failed: {:#}",
                    e
                );
                self.state.send_modify(|state| {
                    state.error = Some(message.clone());
                    state.loading = false;
                    state.is_refreshing = false;
                });
                CycleOutcome::Failed(message)
            }
        };

        match &outcome {
            CycleOutcome::Published => {
                tracing::debug!(sync = %self.name, trigger = trigger.as_str(), "published new data")
            }
            CycleOutcome::Unchanged => {
                tracing::debug!(sync = %self.name, trigger = trigger.as_str(), "no significant change")
            }
            _ => {}
        }

        drop(guard);
        outcome
    }

    async fn run_cycle(self: Arc<Self>, trigger: Trigger, force: bool) -> CycleOutcome {
        match self.begin(trigger, force) {
            Ok(guard) => self.complete(guard, trigger, force).await,
            Err(reason) => CycleOutcome::Skipped(reason),
        }
    }

    /// Claim the guard now and run the rest of the cycle on its own task.
    fn spawn_cycle(inner: &Arc<Self>, trigger: Trigger, force: bool) {
        if let Ok(guard) = inner.begin(trigger, force) {
            let inner = Arc::clone(inner);
            tokio::spawn(async move {
                inner.complete(guard, trigger, force).await;
            });
        }
    }
}

/// Timer and listener loop of a running synchronizer. Aborted by `stop`.
async fn drive<T>(
    inner: Arc<Inner<T>>,
    mut visibility: watch::Receiver<bool>,
    mut focus: broadcast::Receiver<()>,
) where
    T: Send + Sync + 'static,
{
    let period = inner.config.interval;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut visibility_open = true;
    let mut focus_open = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if !inner.visible.load(Ordering::SeqCst) {
                    tracing::debug!(sync = %inner.name, "page hidden, skipping tick");
                    continue;
                }
                Inner::spawn_cycle(&inner, Trigger::Interval, false);
            }
            changed = visibility.changed(), if visibility_open => {
                if changed.is_err() {
                    visibility_open = false;
                    continue;
                }
                let now_visible = *visibility.borrow_and_update();
                let was_visible = inner.visible.swap(now_visible, Ordering::SeqCst);
                if now_visible && !was_visible && inner.idle_for(period) {
                    tracing::debug!(sync = %inner.name, "visible again after a full interval, catching up");
                    Inner::spawn_cycle(&inner, Trigger::Visible, true);
                }
            }
            event = focus.recv(), if focus_open => match event {
                Ok(()) | Err(broadcast::error::RecvError::Lagged(_)) => {
                    if inner.idle_for(inner.config.focus_threshold) {
                        Inner::spawn_cycle(&inner, Trigger::Focus, false);
                    }
                }
                Err(broadcast::error::RecvError::Closed) => focus_open = false,
            },
        }
    }
}
