use chrono::NaiveDate;
use futures_util::future::try_join4;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};

use crate::client::AutomationClient;
use crate::error::Result;
use crate::types::{ActivityAction, ActivityLog};

/// Activity counts for one calendar day (UTC).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyActivity {
    pub date: NaiveDate,
    pub counts: BTreeMap<ActivityAction, usize>,
}

impl DailyActivity {
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn count(&self, action: &ActivityAction) -> usize {
        self.counts.get(action).copied().unwrap_or(0)
    }
}

/// An author and how many logged actions targeted them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorCount {
    pub author: String,
    pub count: usize,
}

/// Activity logs grouped into chart-ready series.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActivitySeries {
    /// One row per day that has activity, oldest first.
    pub days: Vec<DailyActivity>,
}

impl ActivitySeries {
    pub fn from_logs(logs: &[ActivityLog]) -> Self {
        let mut by_day: BTreeMap<NaiveDate, BTreeMap<ActivityAction, usize>> = BTreeMap::new();
        for log in logs {
            *by_day
                .entry(log.timestamp.date_naive())
                .or_default()
                .entry(log.action.clone())
                .or_default() += 1;
        }
        Self {
            days: by_day
                .into_iter()
                .map(|(date, counts)| DailyActivity { date, counts })
                .collect(),
        }
    }

    /// Totals per action across all days.
    pub fn action_totals(&self) -> BTreeMap<ActivityAction, usize> {
        let mut totals = BTreeMap::new();
        for day in &self.days {
            for (action, n) in &day.counts {
                *totals.entry(action.clone()).or_default() += n;
            }
        }
        totals
    }

    pub fn total(&self) -> usize {
        self.days.iter().map(DailyActivity::total).sum()
    }

    /// Share of actions that were likes or comments, as a percentage.
    pub fn engagement_rate(&self) -> f64 {
        let total = self.total();
        if total == 0 {
            return 0.0;
        }
        let totals = self.action_totals();
        let engaged = totals.get(&ActivityAction::Like).copied().unwrap_or(0)
            + totals.get(&ActivityAction::Comment).copied().unwrap_or(0);
        engaged as f64 / total as f64 * 100.0
    }
}

/// Most frequent authors, highest count first, ties by name.
pub fn top_authors(logs: &[ActivityLog], limit: usize) -> Vec<AuthorCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for log in logs {
        if let Some(author) = log.author_name.as_deref().filter(|a| !a.is_empty()) {
            *counts.entry(author).or_default() += 1;
        }
    }
    let mut ranked: Vec<AuthorCount> = counts
        .into_iter()
        .map(|(author, count)| AuthorCount {
            author: author.to_string(),
            count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.author.cmp(&b.author)));
    ranked.truncate(limit);
    ranked
}

/// Backend aggregates fetched together for a dashboard refresh.
#[derive(Debug, Clone, Serialize)]
pub struct AnalyticsSnapshot {
    pub stats: Value,
    pub dashboard: Value,
    pub activity_by_date: Value,
    pub trends: Value,
}

impl AnalyticsSnapshot {
    /// Fetch all aggregates concurrently. Fails if any request fails.
    pub async fn fetch(client: &AutomationClient, trend_days: u32) -> Result<Self> {
        let (stats, dashboard, activity_by_date, trends) = try_join4(
            client.stats(),
            client.dashboard(),
            client.activity_by_date(),
            client.engagement_trends(trend_days),
        )
        .await?;
        Ok(Self {
            stats,
            dashboard,
            activity_by_date,
            trends,
        })
    }
}
