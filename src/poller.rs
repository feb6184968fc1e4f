use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::backend::JobBackend;
use crate::store::JobStore;

/// Single-flight flag shared by clones of a component.
#[derive(Debug, Clone, Default)]
pub(crate) struct InFlight(Arc<AtomicBool>);

impl InFlight {
    /// Claim the flag, or `None` if already held. Released when the guard drops.
    pub(crate) fn try_acquire(&self) -> Option<InFlightGuard> {
        if self.0.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(InFlightGuard(Arc::clone(&self.0)))
        }
    }

    pub(crate) fn is_held(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

pub(crate) struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// What a single poll did to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// The fetched status replaced the cache.
    Applied,
    /// A local write landed while the fetch was in flight; result dropped.
    Stale,
    /// Another fetch was already in flight.
    Skipped,
    /// The fetch failed; the cache is unchanged.
    Failed,
}

/// Keeps a [`JobStore`] in sync with the backend's job status.
///
/// Poll failures are logged and swallowed so transient network loss never
/// flips the cached state. Only one fetch is in flight at a time across all
/// clones of a poller.
pub struct StatusPoller<B: JobBackend> {
    backend: Arc<B>,
    store: Arc<JobStore>,
    interval: Duration,
    in_flight: InFlight,
}

impl<B: JobBackend> Clone for StatusPoller<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            interval: self.interval,
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<B: JobBackend> StatusPoller<B> {
    pub fn new(backend: Arc<B>, store: Arc<JobStore>, interval: Duration) -> Self {
        Self {
            backend,
            store,
            interval,
            in_flight: InFlight::default(),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Fetch the status once and apply it to the store.
    pub async fn refresh(&self) -> PollOutcome {
        let Some(_guard) = self.in_flight.try_acquire() else {
            tracing::trace!("Status poll already in flight, skipping");
            return PollOutcome::Skipped;
        };

        let ticket = self.store.poll_ticket();
        let before = self.store.snapshot().phase();
        match self.backend.job_status().await {
            Ok(status) => {
                let job_id = status.job_id.clone();
                if self.store.apply_poll(ticket, status) {
                    let after = self.store.snapshot().phase();
                    if before != after {
                        tracing::info!(?before, ?after, job_id = ?job_id, "Job phase changed");
                    }
                    PollOutcome::Applied
                } else {
                    PollOutcome::Stale
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Job status poll failed, keeping cached status");
                PollOutcome::Failed
            }
        }
    }

    /// Run [`refresh`](Self::refresh) on the configured interval until the
    /// returned handle is stopped or dropped. The first poll runs immediately.
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        self.refresh().await;
                    }
                }
            }
            tracing::debug!("Status poller stopped");
        });
        PollerHandle {
            stop: Some(stop_tx),
            task: Some(task),
        }
    }
}

/// Stop handle for a spawned [`StatusPoller`]. Dropping it stops polling.
pub struct PollerHandle {
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl PollerHandle {
    /// Stop polling and wait for the loop to exit.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                tracing::error!(error = %e, "Status poller task failed");
            }
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        if let Some(tx) = self.stop.take() {
            let _ = tx.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_in_flight_single_holder() {
        let flag = InFlight::default();
        let guard = flag.try_acquire();
        assert!(guard.is_some());
        assert!(flag.is_held());
        assert!(flag.clone().try_acquire().is_none());

        drop(guard);
        assert!(!flag.is_held());
        assert!(flag.try_acquire().is_some());
    }
}
