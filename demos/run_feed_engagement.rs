//! Start a feed engagement run and follow it until it finishes.
//!
//! Reads `LINKEDIN_API_BASE_URL` and saved credentials. Press Ctrl-C to
//! cancel the job (escalating to force-kill if it does not stop).
//!
//! ```sh
//! cargo run --example run_feed_engagement
//! ```

use linkedin_automation_rs::{
    AutomationClient, AutomationJob, CancelOutcome, ClientConfig, ControlPanel, CredentialStore,
};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("linkedin_automation_rs=info")
        .init();

    let credentials = CredentialStore::default_location()?.load_or_default();
    let client = AutomationClient::new(ClientConfig::from_env()?).with_credentials(credentials);
    let panel = ControlPanel::connect(client)?;

    // Sync with the backend first so a running job blocks the start locally
    panel.refresh().await;
    let started = panel
        .start(AutomationJob::FeedEngagement { max_posts: 15 })
        .await?;
    println!("Started job {}", started.job_id);

    let poller = panel.spawn_poller();
    let mut updates = panel.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = updates.borrow_and_update().clone();
                if !snap.is_running() {
                    println!("Job finished: {:?}", snap.status.status);
                    break;
                }
                println!("  {:?} {:?}", snap.phase(), snap.status.progress);
            }
            _ = tokio::signal::ctrl_c() => {
                match panel.cancel().await? {
                    CancelOutcome::Cancelled { attempts } => println!("Cancelled after {} checks", attempts),
                    CancelOutcome::ForceKilled => println!("Force killed"),
                    CancelOutcome::AlreadyInProgress => {}
                }
                break;
            }
        }
    }

    poller.stop().await;
    Ok(())
}
