//! Single owned cache of the backend's current job status.
//!
//! Every write bumps a monotonically increasing version. Poll results carry
//! the version they were issued at and are dropped if a local write landed
//! in the meantime, so a slow poll cannot clobber an optimistic update.

use tokio::sync::watch;

use crate::types::{JobPhase, JobState, JobStatus};

/// Versioned view of the cached status handed to readers.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub version: u64,
    pub status: JobStatus,
    last_local_write: u64,
}

impl Snapshot {
    pub fn phase(&self) -> JobPhase {
        self.status.phase()
    }

    pub fn is_running(&self) -> bool {
        self.status.is_running
    }
}

/// Store version observed when a status fetch was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollTicket(u64);

/// Shared job status cache with subscription-based readers.
#[derive(Debug)]
pub struct JobStore {
    tx: watch::Sender<Snapshot>,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl JobStore {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Snapshot::default());
        Self { tx }
    }

    pub fn snapshot(&self) -> Snapshot {
        self.tx.borrow().clone()
    }

    pub fn status(&self) -> JobStatus {
        self.tx.borrow().status.clone()
    }

    pub fn is_running(&self) -> bool {
        self.tx.borrow().status.is_running
    }

    pub fn version(&self) -> u64 {
        self.tx.borrow().version
    }

    /// Receive every accepted write. The receiver starts at the current value.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.tx.subscribe()
    }

    /// Record the version a status fetch is about to be issued at.
    pub fn poll_ticket(&self) -> PollTicket {
        PollTicket(self.tx.borrow().version)
    }

    /// Replace the cache with a polled status, unless a local write happened
    /// after `ticket` was taken. Returns whether the status was applied.
    ///
    /// While the cache is marked killing, a poll that still reports the job
    /// running keeps the killing state.
    pub fn apply_poll(&self, ticket: PollTicket, mut status: JobStatus) -> bool {
        self.tx.send_if_modified(|snap| {
            if snap.last_local_write > ticket.0 {
                tracing::debug!(
                    ticket = ticket.0,
                    local = snap.last_local_write,
                    "Discarding stale status poll"
                );
                return false;
            }
            if snap.status.status == JobState::Killing && status.is_running {
                status.status = JobState::Killing;
            }
            snap.version += 1;
            snap.status = status;
            true
        })
    }

    /// Overwrite the cache from a local action (start, cancel, kill).
    pub fn write_local(&self, status: JobStatus) {
        self.tx.send_modify(|snap| {
            snap.version += 1;
            snap.last_local_write = snap.version;
            snap.status = status;
        });
    }

    /// Local write flagging the running job as being stopped.
    pub fn mark_killing(&self) {
        self.update_local(|status| status.status = JobState::Killing);
    }

    /// Local write putting back the status held before a stop was attempted.
    pub fn restore(&self, previous: JobStatus) {
        self.write_local(previous);
    }

    /// Local write clearing the running job.
    pub fn clear(&self) {
        self.write_local(JobStatus::idle());
    }

    fn update_local<F>(&self, f: F)
    where
        F: FnOnce(&mut JobStatus),
    {
        self.tx.send_modify(|snap| {
            f(&mut snap.status);
            snap.version += 1;
            snap.last_local_write = snap.version;
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn running(job_id: &str) -> JobStatus {
        JobStatus::started(job_id, "feed-engagement", Utc::now())
    }

    #[test]
    fn test_starts_idle() {
        let store = JobStore::new();
        assert!(!store.is_running());
        assert_eq!(store.version(), 0);
        assert_eq!(store.snapshot().phase(), JobPhase::Idle);
    }

    #[test]
    fn test_poll_replaces_wholesale() {
        let store = JobStore::new();
        let ticket = store.poll_ticket();
        assert!(store.apply_poll(ticket, running("abc123")));
        assert_eq!(store.status().job_id.as_deref(), Some("abc123"));

        let ticket = store.poll_ticket();
        assert!(store.apply_poll(ticket, JobStatus::idle()));
        assert_eq!(store.status(), JobStatus::idle());
        assert_eq!(store.version(), 2);
    }

    #[test]
    fn test_stale_poll_discarded_after_local_write() {
        let store = JobStore::new();
        let ticket = store.poll_ticket();

        store.write_local(running("abc123"));
        assert!(!store.apply_poll(ticket, JobStatus::idle()));
        assert!(store.is_running());

        let fresh = store.poll_ticket();
        assert!(store.apply_poll(fresh, JobStatus::idle()));
        assert!(!store.is_running());
    }

    #[test]
    fn test_poll_after_poll_is_not_stale() {
        let store = JobStore::new();
        let first = store.poll_ticket();
        let second = store.poll_ticket();
        assert!(store.apply_poll(second, running("a")));
        // Only local writes make a ticket stale; polls are last-write-wins.
        assert!(store.apply_poll(first, running("b")));
        assert_eq!(store.status().job_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_killing_and_restore() {
        let store = JobStore::new();
        store.write_local(running("abc123"));
        let previous = store.status();
        store.mark_killing();
        assert_eq!(store.snapshot().phase(), JobPhase::Killing);
        assert!(store.is_running());

        store.restore(previous);
        assert_eq!(store.snapshot().phase(), JobPhase::Running);
        assert_eq!(store.status().job_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_restore_from_idle_stays_idle() {
        let store = JobStore::new();
        let previous = store.status();
        store.mark_killing();
        store.restore(previous);
        assert!(!store.is_running());
        assert_eq!(store.snapshot().phase(), JobPhase::Idle);
    }

    #[test]
    fn test_running_poll_keeps_killing() {
        let store = JobStore::new();
        store.write_local(running("abc123"));
        store.mark_killing();

        let ticket = store.poll_ticket();
        assert!(store.apply_poll(ticket, running("abc123")));
        assert_eq!(store.snapshot().phase(), JobPhase::Killing);

        let ticket = store.poll_ticket();
        assert!(store.apply_poll(ticket, JobStatus::idle()));
        assert_eq!(store.snapshot().phase(), JobPhase::Idle);
    }

    #[tokio::test]
    async fn test_subscribers_see_writes() {
        let store = JobStore::new();
        let mut rx = store.subscribe();
        store.write_local(running("abc123"));
        rx.changed().await.unwrap();
        assert!(rx.borrow().is_running());

        store.clear();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_running());
    }
}
