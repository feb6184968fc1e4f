use std::sync::Arc;
use std::time::Duration;

use crate::backend::JobBackend;
use crate::config::ClientConfig;
use crate::error::{AutomationError, Result};
use crate::poller::InFlight;
use crate::store::JobStore;
use crate::types::JobStatus;

/// How a cancellation request finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelOutcome {
    /// The backend confirmed the job stopped after `attempts` status checks.
    Cancelled { attempts: u32 },
    /// Graceful cancel did not converge; force-kill was acknowledged.
    ForceKilled,
    /// Another cancellation is already running; this call did nothing.
    AlreadyInProgress,
}

/// Stops the running job: graceful cancel, bounded confirmation, then
/// force-kill.
///
/// ```text
/// Running -> CancelRequested -> Confirmed
///                            -> TimedOut -> ForceKillRequested -> Confirmed
///                                                              -> Fatal
/// ```
///
/// At most one flow runs at a time across all clones.
pub struct CancellationController<B: JobBackend> {
    backend: Arc<B>,
    store: Arc<JobStore>,
    poll_interval: Duration,
    max_attempts: u32,
    in_flight: InFlight,
}

impl<B: JobBackend> Clone for CancellationController<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            poll_interval: self.poll_interval,
            max_attempts: self.max_attempts,
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<B: JobBackend> CancellationController<B> {
    pub fn new(backend: Arc<B>, store: Arc<JobStore>, poll_interval: Duration, max_attempts: u32) -> Self {
        Self {
            backend,
            store,
            poll_interval,
            max_attempts,
            in_flight: InFlight::default(),
        }
    }

    /// Build with the cancel budget from `config`.
    pub fn from_config(backend: Arc<B>, store: Arc<JobStore>, config: &ClientConfig) -> Self {
        Self::new(
            backend,
            store,
            config.cancel_poll_interval,
            config.cancel_max_attempts,
        )
    }

    /// True while a cancel or force-kill flow is running.
    pub fn is_cancelling(&self) -> bool {
        self.in_flight.is_held()
    }

    /// Request a graceful stop and wait for the backend to confirm it.
    ///
    /// Escalates to force-kill exactly once if the cancel request fails or
    /// the job is still running after the attempt budget. Only a failed
    /// force-kill is an error, and it puts back the status cached before the
    /// cancel began.
    pub async fn cancel(&self) -> Result<CancelOutcome> {
        let Some(_guard) = self.in_flight.try_acquire() else {
            tracing::debug!("Cancellation already in progress, ignoring");
            return Ok(CancelOutcome::AlreadyInProgress);
        };

        let previous = self.store.status();
        self.store.mark_killing();
        if self.request_cancel().await {
            for attempt in 1..=self.max_attempts {
                tokio::time::sleep(self.poll_interval).await;
                match self.backend.job_status().await {
                    Ok(status) if !status.is_running => {
                        self.store.clear();
                        tracing::info!(attempts = attempt, "Job cancelled");
                        return Ok(CancelOutcome::Cancelled { attempts: attempt });
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(attempt, error = %e, "Status check during cancel failed");
                    }
                }
            }
            tracing::warn!(
                attempts = self.max_attempts,
                "Job still running after cancel, escalating to force kill"
            );
        }

        self.kill(previous).await?;
        Ok(CancelOutcome::ForceKilled)
    }

    /// Hard-stop the running job without trying a graceful cancel first.
    pub async fn force_kill(&self) -> Result<CancelOutcome> {
        let Some(_guard) = self.in_flight.try_acquire() else {
            return Ok(CancelOutcome::AlreadyInProgress);
        };
        let previous = self.store.status();
        self.store.mark_killing();
        self.kill(previous).await?;
        Ok(CancelOutcome::ForceKilled)
    }

    /// Send the graceful cancel. Returns false if it should escalate at once.
    async fn request_cancel(&self) -> bool {
        match self.backend.cancel_job().await {
            Ok(resp) if resp.success => {
                tracing::info!(message = ?resp.message, "Cancellation requested");
                true
            }
            Ok(resp) => {
                let reason = resp.error.or(resp.message).unwrap_or_default();
                tracing::warn!(%reason, "Backend refused cancel, escalating to force kill");
                false
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cancel request failed, escalating to force kill");
                false
            }
        }
    }

    /// Trust a successful acknowledgement without re-polling. On failure the
    /// cache goes back to `previous`.
    async fn kill(&self, previous: JobStatus) -> Result<()> {
        let failure = match self.backend.force_kill_job().await {
            Ok(resp) if resp.success => {
                self.store.clear();
                tracing::info!("Job force killed");
                return Ok(());
            }
            Ok(resp) => resp
                .error
                .or(resp.message)
                .unwrap_or_else(|| "backend reported failure".into()),
            Err(e) => e.to_string(),
        };
        self.store.restore(previous);
        tracing::error!(reason = %failure, "Force kill failed, job may still be running");
        Err(AutomationError::Fatal(failure))
    }
}
