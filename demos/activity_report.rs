//! Print a per-day activity table and top authors from the logs endpoint.
//!
//! ```sh
//! cargo run --example activity_report
//! ```

use linkedin_automation_rs::analytics::top_authors;
use linkedin_automation_rs::format::{compact_number, percentage};
use linkedin_automation_rs::{ActivitySeries, AutomationClient, ClientConfig, CredentialStore};

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let credentials = CredentialStore::default_location()?.load_or_default();
    let client = AutomationClient::new(ClientConfig::from_env()?).with_credentials(credentials);

    let logs = client.user_logs(None).await?;
    let series = ActivitySeries::from_logs(&logs);

    for day in &series.days {
        println!("{}  {:>4} actions", day.date, day.total());
    }
    println!(
        "{} actions total, {} engagement",
        compact_number(series.total() as u64),
        percentage(series.engagement_rate(), 1)
    );

    println!("Top authors:");
    for author in top_authors(&logs, 5) {
        println!("  {} ({})", author.author, author.count);
    }
    Ok(())
}
