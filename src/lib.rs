//! # linkedin-automation-rs
//!
//! Async Rust client for a LinkedIn automation backend, the service that
//! runs scripted feed engagement, connection requests, messaging and
//! profile scraping jobs.
//!
//! Provides a typed REST client, a versioned job status cache kept in sync
//! by a cancellable poller, a launcher that enforces one job at a time, a
//! cancellation controller that escalates to force-kill, and local
//! aggregation of activity logs for charts.
//!
//! ## Quick Start
//!
//! ```no_run
//! use linkedin_automation_rs::{
//!     AutomationClient, AutomationJob, ClientConfig, ControlPanel, CredentialStore,
//! };
//!
//! # async fn example() -> linkedin_automation_rs::Result<()> {
//! let credentials = CredentialStore::default_location()?.load_or_default();
//! let client = AutomationClient::new(ClientConfig::from_env()?).with_credentials(credentials);
//! let panel = ControlPanel::connect(client)?;
//!
//! // Keep the status cache fresh while this handle lives
//! let poller = panel.spawn_poller();
//!
//! let started = panel.start(AutomationJob::FeedEngagement { max_posts: 15 }).await?;
//! println!("Started job {}", started.job_id);
//!
//! let mut updates = panel.subscribe();
//! while updates.changed().await.is_ok() {
//!     if !updates.borrow().is_running() {
//!         break;
//!     }
//! }
//! poller.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod analytics;
pub mod backend;
pub mod canceller;
pub mod client;
pub mod config;
pub mod credentials;
pub mod error;
pub mod format;
pub mod jobs;
pub mod launcher;
pub mod panel;
pub mod poller;
pub mod store;
pub mod types;

pub use analytics::{ActivitySeries, AnalyticsSnapshot, AuthorCount, DailyActivity};
pub use backend::JobBackend;
pub use canceller::{CancelOutcome, CancellationController};
pub use client::AutomationClient;
pub use config::{ClientConfig, ClientConfigBuilder, CredentialDelivery};
pub use credentials::{CredentialStore, Credentials};
pub use error::{AutomationError, Result};
pub use jobs::AutomationJob;
pub use launcher::{Launcher, StartedJob};
pub use panel::ControlPanel;
pub use poller::{PollOutcome, PollerHandle, StatusPoller};
pub use store::{JobStore, PollTicket, Snapshot};
pub use types::{
    ActivityAction, ActivityLog, CancelResponse, ForceKillResponse, JobPhase, JobState, JobStatus,
    PostOptions, StartResponse,
};
