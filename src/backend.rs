use std::future::Future;

use crate::client::AutomationClient;
use crate::error::Result;
use crate::jobs::AutomationJob;
use crate::types::{CancelResponse, ForceKillResponse, JobStatus, StartResponse};

/// The job-control operations the poller, launcher and canceller depend on.
///
/// [`AutomationClient`] is the production implementation. Tests and
/// embedders can supply their own.
pub trait JobBackend: Send + Sync + 'static {
    fn start_job(
        &self,
        job: &AutomationJob,
    ) -> impl Future<Output = Result<StartResponse>> + Send;

    fn job_status(&self) -> impl Future<Output = Result<JobStatus>> + Send;

    fn cancel_job(&self) -> impl Future<Output = Result<CancelResponse>> + Send;

    fn force_kill_job(&self) -> impl Future<Output = Result<ForceKillResponse>> + Send;
}

impl JobBackend for AutomationClient {
    async fn start_job(&self, job: &AutomationJob) -> Result<StartResponse> {
        AutomationClient::start_job(self, job).await
    }

    async fn job_status(&self) -> Result<JobStatus> {
        AutomationClient::job_status(self).await
    }

    async fn cancel_job(&self) -> Result<CancelResponse> {
        AutomationClient::cancel_job(self).await
    }

    async fn force_kill_job(&self) -> Result<ForceKillResponse> {
        AutomationClient::force_kill_job(self).await
    }
}
