//! Per-job debounce timer registry.
//!
//! This is the concurrency-critical piece of the proxy. Every job name has
//! at most one armed timer at any instant. Arming an already-armed job
//! cancels the old timer and restarts the full quiet period, so a steady
//! stream of events with gaps shorter than the quiet period keeps the job
//! from firing until the stream pauses. That starvation is the intended
//! debounce semantics, not a bug.
//!
//! # The cleanup race
//!
//! A timer that matures fires its job and then removes its own registry
//! entry. That removal can race a concurrent `arm` for the same job: the
//! expiry task must never delete the entry a newer `arm` just installed.
//! Entries carry a generation number for exactly this reason; the expiry
//! task only removes the entry if the stored generation still matches the
//! one it was armed with.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::dispatch::JobDispatcher;
use crate::types::JobName;

/// A pending timer for one job.
struct ArmedTimer {
    /// Identifies which `arm` call installed this entry. The expiry task
    /// compares this against its own generation before cleaning up.
    generation: u64,

    /// Cancels the sleeping timer task when the entry is superseded or
    /// the registry shuts down.
    cancel: CancellationToken,
}

/// Registry of armed debounce timers, keyed by job name.
///
/// Cloning is cheap and all clones share the same state, so the registry
/// can be handed to every request handler as part of the application
/// state. Timers are keyed by job name alone: two mapping rows that name
/// the same job from different branches share one timer slot.
#[derive(Clone)]
pub struct DebounceRegistry {
    inner: Arc<RegistryInner>,
}

struct RegistryInner {
    /// The quiet period every `arm` call restarts in full.
    quiet_period: Duration,

    /// Fires a job once its window elapses.
    dispatcher: Arc<dyn JobDispatcher>,

    /// Armed timers. Mutated by `arm` (handler tasks) and by expiry
    /// cleanup (timer tasks); the mutex is held only for map access,
    /// never across the dispatch call.
    timers: Mutex<HashMap<JobName, ArmedTimer>>,

    /// Source of entry generations.
    next_generation: AtomicU64,

    /// Parent token for all timer tasks; cancelled on shutdown.
    shutdown: CancellationToken,
}

impl DebounceRegistry {
    /// Creates a registry that fires jobs through `dispatcher` after
    /// `quiet_period` of silence.
    pub fn new(quiet_period: Duration, dispatcher: Arc<dyn JobDispatcher>) -> Self {
        Self::new_with_shutdown(quiet_period, dispatcher, CancellationToken::new())
    }

    /// Creates a registry whose timers are additionally cancelled when
    /// `shutdown` is cancelled externally.
    pub fn new_with_shutdown(
        quiet_period: Duration,
        dispatcher: Arc<dyn JobDispatcher>,
        shutdown: CancellationToken,
    ) -> Self {
        DebounceRegistry {
            inner: Arc::new(RegistryInner {
                quiet_period,
                dispatcher,
                timers: Mutex::new(HashMap::new()),
                next_generation: AtomicU64::new(0),
                shutdown,
            }),
        }
    }

    /// Arms (or re-arms) the debounce timer for `job`.
    ///
    /// If a timer is already pending for this job it is cancelled and the
    /// delay restarts from zero. The spawned timer task sleeps for the
    /// quiet period, dispatches the job, and removes its own entry unless
    /// a newer `arm` has replaced it in the meantime.
    pub async fn arm(&self, job: JobName) {
        let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
        let cancel = self.inner.shutdown.child_token();

        {
            let mut timers = self.inner.timers.lock().await;
            if let Some(previous) = timers.insert(
                job.clone(),
                ArmedTimer {
                    generation,
                    cancel: cancel.clone(),
                },
            ) {
                debug!(job = %job, "Resetting timer for job");
                previous.cancel.cancel();
            }
        }

        info!(
            job = %job,
            quiet_period_secs = self.inner.quiet_period.as_secs(),
            "Timer armed"
        );

        let inner = Arc::clone(&self.inner);
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {
                    trace!(job = %job, "Timer cancelled before maturing");
                    return;
                }
                _ = tokio::time::sleep(inner.quiet_period) => {}
            }

            info!(job = %job, "Quiet period exceeded, firing job");

            if let Err(error) = inner.dispatcher.fire(&job).await {
                warn!(job = %job, error = %error, "Trigger dispatch failed");
            }

            // Only remove the entry this task installed. A newer arm may
            // have replaced it while the dispatch was in flight.
            let mut timers = inner.timers.lock().await;
            if timers
                .get(&job)
                .is_some_and(|timer| timer.generation == generation)
            {
                trace!(job = %job, "Removing matured timer entry");
                timers.remove(&job);
            }
        });
    }

    /// Number of currently armed timers.
    pub async fn pending_count(&self) -> usize {
        self.inner.timers.lock().await.len()
    }

    /// Cancels every pending timer and clears the registry.
    ///
    /// In-flight dispatch calls are not interrupted beyond their own
    /// timeout; timers that have not matured yet will never fire.
    pub async fn shutdown(&self) {
        self.inner.shutdown.cancel();

        let mut timers = self.inner.timers.lock().await;
        let cancelled = timers.len();
        timers.clear();

        if cancelled > 0 {
            info!(cancelled, "Cancelled pending timers on shutdown");
        }
    }
}
