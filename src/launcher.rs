use chrono::Utc;
use std::sync::Arc;

use crate::backend::JobBackend;
use crate::error::{AutomationError, Result};
use crate::jobs::AutomationJob;
use crate::poller::InFlight;
use crate::store::JobStore;
use crate::types::JobStatus;

/// A job the backend accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartedJob {
    pub job_id: String,
    pub job_type: &'static str,
    pub message: Option<String>,
}

/// Starts automation jobs, one at a time.
///
/// The backend is the real authority on the single-job rule. The launcher
/// checks the cached status first so an obviously doomed start never hits
/// the network, and marks the store running as soon as the backend accepts.
pub struct Launcher<B: JobBackend> {
    backend: Arc<B>,
    store: Arc<JobStore>,
    in_flight: InFlight,
}

impl<B: JobBackend> Clone for Launcher<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            store: Arc::clone(&self.store),
            in_flight: self.in_flight.clone(),
        }
    }
}

impl<B: JobBackend> Launcher<B> {
    pub fn new(backend: Arc<B>, store: Arc<JobStore>) -> Self {
        Self {
            backend,
            store,
            in_flight: InFlight::default(),
        }
    }

    /// Validate and submit `job`.
    ///
    /// Fails with [`AutomationError::JobAlreadyRunning`] without a request
    /// when the cache shows a running job or another start is pending, and
    /// with [`AutomationError::Validation`] for bad parameters.
    pub async fn start(&self, job: AutomationJob) -> Result<StartedJob> {
        let cached = self.store.status();
        if cached.is_running {
            return Err(AutomationError::JobAlreadyRunning(format!(
                "{} ({}) is still running, cancel it first",
                cached.script_name.as_deref().unwrap_or("unknown"),
                cached.job_id.as_deref().unwrap_or("no id"),
            )));
        }
        job.validate()?;

        let Some(_guard) = self.in_flight.try_acquire() else {
            return Err(AutomationError::JobAlreadyRunning(
                "another start request is in progress".into(),
            ));
        };

        tracing::info!(job_type = job.slug(), "Starting automation job");
        let resp = self
            .backend
            .start_job(&job)
            .await
            .map_err(already_running_or)?;

        let job_id = resp
            .job_id
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AutomationError::InvalidResponse("Start response missing jobId".into()))?;

        if self.store.is_running() {
            // A poll landed during the request and says something is running.
            tracing::warn!(
                job_id = %job_id,
                cached = ?self.store.status().job_id,
                "Backend accepted a start while another job appeared to be running"
            );
        }
        self.store
            .write_local(JobStatus::started(job_id.clone(), job.slug(), Utc::now()));
        tracing::info!(job_id = %job_id, job_type = job.slug(), "Automation job started");

        Ok(StartedJob {
            job_id,
            job_type: job.slug(),
            message: resp.message,
        })
    }
}

/// Map backend "already running" rejections to `JobAlreadyRunning`.
fn already_running_or(err: AutomationError) -> AutomationError {
    match err {
        AutomationError::Http { status, message }
            if status == 409 || message.to_ascii_lowercase().contains("already running") =>
        {
            AutomationError::JobAlreadyRunning(message)
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_running_mapping() {
        let conflict = already_running_or(AutomationError::Http {
            status: 409,
            message: "busy".into(),
        });
        assert!(matches!(conflict, AutomationError::JobAlreadyRunning(m) if m == "busy"));

        let by_message = already_running_or(AutomationError::Http {
            status: 400,
            message: "A job is Already Running".into(),
        });
        assert!(matches!(by_message, AutomationError::JobAlreadyRunning(_)));

        let other = already_running_or(AutomationError::Http {
            status: 500,
            message: "Internal error".into(),
        });
        assert!(matches!(other, AutomationError::Http { status: 500, .. }));
    }
}
