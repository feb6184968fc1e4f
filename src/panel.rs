use std::sync::Arc;

use tokio::sync::watch;

use crate::backend::JobBackend;
use crate::canceller::{CancelOutcome, CancellationController};
use crate::client::AutomationClient;
use crate::config::ClientConfig;
use crate::error::Result;
use crate::jobs::AutomationJob;
use crate::launcher::{Launcher, StartedJob};
use crate::poller::{PollOutcome, PollerHandle, StatusPoller};
use crate::store::{JobStore, Snapshot};

/// Poller, launcher and canceller wired to one backend and one [`JobStore`].
pub struct ControlPanel<B: JobBackend> {
    store: Arc<JobStore>,
    poller: StatusPoller<B>,
    launcher: Launcher<B>,
    canceller: CancellationController<B>,
}

impl ControlPanel<AutomationClient> {
    /// Wire a panel to an HTTP client, using the client's configuration.
    pub fn connect(client: AutomationClient) -> Result<Self> {
        let config = client.config().clone();
        Self::new(Arc::new(client), &config)
    }
}

impl<B: JobBackend> ControlPanel<B> {
    /// Fails with [`AutomationError::Config`](crate::AutomationError::Config)
    /// if `config` does not pass [`ClientConfig::validate`].
    pub fn new(backend: Arc<B>, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(JobStore::new());
        Ok(Self {
            poller: StatusPoller::new(
                Arc::clone(&backend),
                Arc::clone(&store),
                config.poll_interval,
            ),
            launcher: Launcher::new(Arc::clone(&backend), Arc::clone(&store)),
            canceller: CancellationController::from_config(backend, Arc::clone(&store), config),
            store,
        })
    }

    pub fn store(&self) -> &Arc<JobStore> {
        &self.store
    }

    pub fn snapshot(&self) -> Snapshot {
        self.store.snapshot()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.store.subscribe()
    }

    /// Poll once now.
    pub async fn refresh(&self) -> PollOutcome {
        self.poller.refresh().await
    }

    /// Start background polling. Polling ends when the handle is dropped.
    pub fn spawn_poller(&self) -> PollerHandle {
        self.poller.clone().spawn()
    }

    pub async fn start(&self, job: AutomationJob) -> Result<StartedJob> {
        self.launcher.start(job).await
    }

    pub async fn cancel(&self) -> Result<CancelOutcome> {
        self.canceller.cancel().await
    }

    pub async fn force_kill(&self) -> Result<CancelOutcome> {
        self.canceller.force_kill().await
    }

    pub fn is_cancelling(&self) -> bool {
        self.canceller.is_cancelling()
    }
}
