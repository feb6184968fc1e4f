use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use linkedin_automation_rs::{
    analytics, format, ActivityAction, ActivitySeries, AnalyticsSnapshot, AutomationClient,
    AutomationJob, CancelOutcome, ClientConfig, ControlPanel, CredentialDelivery, CredentialStore,
    Credentials, JobStatus, PostOptions,
};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "linkedin-automation",
    version,
    about = "Control panel for the LinkedIn automation backend"
)]
struct Cli {
    /// Backend base URL (overrides LINKEDIN_API_BASE_URL)
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Send this key as X-API-Key instead of putting credentials in request bodies
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// Credentials file (defaults to the user config directory)
    #[arg(long, global = true)]
    credentials_file: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Start an automation job
    Start {
        /// feed-engagement, connection-requests, monitor-connections,
        /// welcome-messages, search-engagement or profile-scraping
        job_type: String,
        #[arg(long)]
        keyword: Option<String>,
        #[arg(long)]
        max_posts: Option<u32>,
        #[arg(long)]
        max_requests: Option<u32>,
        #[arg(long)]
        max_profiles: Option<u32>,
        /// Keep polling until the job finishes
        #[arg(long)]
        wait: bool,
    },
    /// Show the current job status
    Status {
        #[arg(long)]
        json: bool,
    },
    /// Follow job status until interrupted
    Watch,
    /// Cancel the running job, force-killing it if it does not stop
    Cancel,
    /// Force-kill the running job immediately
    Kill,
    /// Print the current job's output
    Output,
    /// Show logged activity grouped by day
    Logs {
        /// like, comment, connection_requested, connection_accepted, message_sent
        #[arg(long)]
        action: Option<String>,
        /// Number of top authors to list
        #[arg(long, default_value_t = 5)]
        top: usize,
    },
    /// Print backend analytics aggregates as JSON
    Stats {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Download all activity as CSV
    Export {
        #[arg(long)]
        out: PathBuf,
    },
    /// Delete logs older than the given number of days
    Prune {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
    /// Generate a post draft and hashtags
    Post {
        topic: String,
        #[arg(long, default_value_t = 5)]
        hashtags: u32,
    },
    /// Manage saved LinkedIn credentials
    Credentials {
        #[command(subcommand)]
        action: CredentialsAction,
    },
}

#[derive(Debug, Subcommand)]
enum CredentialsAction {
    Set {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    Show,
    Clear,
}

fn init_logging(verbose: bool) {
    let default = if verbose {
        "linkedin_automation_rs=debug,linkedin_automation=debug"
    } else {
        "linkedin_automation_rs=info"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn build_job(
    job_type: &str,
    keyword: Option<String>,
    max_posts: Option<u32>,
    max_requests: Option<u32>,
    max_profiles: Option<u32>,
) -> Result<AutomationJob> {
    use linkedin_automation_rs::jobs::*;
    let keyword = keyword.unwrap_or_else(|| DEFAULT_KEYWORD.to_string());
    let job = match job_type {
        "feed-engagement" => AutomationJob::FeedEngagement {
            max_posts: max_posts.unwrap_or(DEFAULT_FEED_POSTS),
        },
        "connection-requests" => AutomationJob::ConnectionRequests {
            keyword,
            max_requests: max_requests.unwrap_or(DEFAULT_MAX_REQUESTS),
        },
        "monitor-connections" => AutomationJob::MonitorConnections,
        "welcome-messages" => AutomationJob::WelcomeMessages,
        "search-engagement" => AutomationJob::SearchEngagement {
            keyword,
            max_posts: max_posts.unwrap_or(DEFAULT_SEARCH_POSTS),
        },
        "profile-scraping" => AutomationJob::ProfileScraping {
            keyword,
            max_profiles: max_profiles.unwrap_or(DEFAULT_MAX_PROFILES),
        },
        other => bail!(
            "unknown job type {:?}, expected one of: {}",
            other,
            JOB_TYPES.join(", ")
        ),
    };
    Ok(job)
}

fn print_status(status: &JobStatus) {
    if !status.is_running {
        println!("No job running ({})", format::status_label(status.status));
        return;
    }
    println!("Job running: {}", format::status_label(status.status));
    println!("  Job ID:      {}", status.job_id.as_deref().unwrap_or("-"));
    println!("  Script:      {}", status.script_name.as_deref().unwrap_or("-"));
    if let Some(elapsed) = status.elapsed(Utc::now()) {
        println!("  Running for: {}s", elapsed.as_secs());
    }
    if let Some(start) = status.start_time {
        println!("  Started:     {}", format::time_ago(start, Utc::now()));
    }
    if let Some(progress) = status.progress {
        println!("  Progress:    {}%", progress);
    }
}

async fn wait_until_idle(panel: &ControlPanel<AutomationClient>) -> Result<()> {
    let poller = panel.spawn_poller();
    let mut updates = panel.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snap = updates.borrow_and_update().clone();
                print_status(&snap.status);
                if !snap.is_running() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("Stopped watching");
                break;
            }
        }
    }
    poller.stop().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = ClientConfig::from_env().context("invalid environment configuration")?;
    if let Some(url) = cli.base_url {
        config.base_url = url;
    }
    if let Some(key) = cli.api_key {
        config.credential_delivery = CredentialDelivery::ApiKeyHeader(key);
    }
    config.validate()?;

    let store = match cli.credentials_file {
        Some(path) => CredentialStore::at(path),
        None => CredentialStore::default_location()?,
    };

    match cli.command {
        Command::Credentials { action } => manage_credentials(&store, action),
        command => {
            let client = AutomationClient::new(config).with_credentials(store.load_or_default());
            run(command, client).await
        }
    }
}

fn manage_credentials(store: &CredentialStore, action: CredentialsAction) -> Result<()> {
    match action {
        CredentialsAction::Set { email, password } => {
            store.save(&Credentials::new(email, password))?;
            println!("Saved credentials to {}", store.path().display());
        }
        CredentialsAction::Show => match store.load()? {
            Some(creds) => println!("{}", creds.email),
            None => println!("No credentials saved"),
        },
        CredentialsAction::Clear => {
            if store.clear()? {
                println!("Credentials cleared");
            } else {
                println!("No credentials saved");
            }
        }
    }
    Ok(())
}

async fn run(command: Command, client: AutomationClient) -> Result<()> {
    match command {
        Command::Start {
            job_type,
            keyword,
            max_posts,
            max_requests,
            max_profiles,
            wait,
        } => {
            let job = build_job(&job_type, keyword, max_posts, max_requests, max_profiles)?;
            let panel = ControlPanel::connect(client)?;
            panel.refresh().await;
            let started = panel.start(job).await?;
            println!(
                "{} (job {})",
                started.message.as_deref().unwrap_or("Job started"),
                started.job_id
            );
            if wait {
                wait_until_idle(&panel).await?;
            }
        }
        Command::Status { json } => {
            let status = client.job_status().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&status)?);
            } else {
                print_status(&status);
            }
        }
        Command::Watch => {
            let panel = ControlPanel::connect(client)?;
            panel.refresh().await;
            print_status(&panel.snapshot().status);
            if panel.snapshot().is_running() {
                wait_until_idle(&panel).await?;
            }
        }
        Command::Cancel => {
            let panel = ControlPanel::connect(client)?;
            match panel.cancel().await? {
                CancelOutcome::Cancelled { attempts } => {
                    println!("Job cancelled after {} status checks", attempts)
                }
                CancelOutcome::ForceKilled => println!("Job did not stop in time and was force killed"),
                CancelOutcome::AlreadyInProgress => println!("Cancellation already in progress"),
            }
        }
        Command::Kill => {
            let panel = ControlPanel::connect(client)?;
            panel.force_kill().await?;
            println!("Job force killed");
        }
        Command::Output => {
            let output = client.job_output().await?;
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Command::Logs { action, top } => {
            let action = action.as_deref().map(ActivityAction::parse);
            let logs = client.user_logs(action.as_ref()).await?;
            let series = ActivitySeries::from_logs(&logs);
            for day in &series.days {
                let parts: Vec<String> = day
                    .counts
                    .iter()
                    .map(|(action, n)| format!("{} {}", n, action.as_str()))
                    .collect();
                println!("{}  {:>5}  {}", day.date, day.total(), parts.join(", "));
            }
            println!(
                "Total {} actions, engagement {}",
                format::compact_number(series.total() as u64),
                format::percentage(series.engagement_rate(), 1)
            );
            for (rank, author) in analytics::top_authors(&logs, top).iter().enumerate() {
                println!("{:>2}. {} ({})", rank + 1, author.author, author.count);
            }
        }
        Command::Stats { days } => {
            let snapshot = AnalyticsSnapshot::fetch(&client, days).await?;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
        Command::Export { out } => {
            let csv = client.download_csv().await?;
            std::fs::write(&out, csv).with_context(|| format!("writing {}", out.display()))?;
            println!("Saved {}", out.display());
        }
        Command::Prune { days } => {
            let result = client.delete_old_logs(days).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Post { topic, hashtags } => {
            let draft = client.generate_ai_post(&topic, &PostOptions::default()).await?;
            println!("{}", serde_json::to_string_pretty(&draft)?);
            let text = draft
                .get("post")
                .or_else(|| draft.get("content"))
                .and_then(|v| v.as_str())
                .unwrap_or(topic.as_str());
            let tags = client.generate_hashtags(text, hashtags).await?;
            println!("{}", serde_json::to_string_pretty(&tags)?);
        }
        Command::Credentials { .. } => {
            bail!("credential management does not talk to the backend")
        }
    }
    Ok(())
}
