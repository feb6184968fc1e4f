use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Lifecycle state reported by the backend for the current job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    #[default]
    Idle,
    Running,
    Killing,
    Completed,
    Failed,
    Stopped,
}

impl JobState {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobState::Idle => "idle",
            JobState::Running => "running",
            JobState::Killing => "killing",
            JobState::Completed => "completed",
            JobState::Failed => "failed",
            JobState::Stopped => "stopped",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "idle" => Some(JobState::Idle),
            "running" => Some(JobState::Running),
            "killing" => Some(JobState::Killing),
            "completed" => Some(JobState::Completed),
            "failed" => Some(JobState::Failed),
            "stopped" | "cancelled" => Some(JobState::Stopped),
            _ => None,
        }
    }
}

/// Coarse phase the UI reacts to: Idle, Running or Killing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Idle,
    Running,
    Killing,
}

/// Snapshot of the backend's single active job slot.
///
/// Decodes both `scriptName` and `script`, and `startTime` as either an
/// RFC 3339 string or epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawJobStatus")]
pub struct JobStatus {
    pub is_running: bool,
    pub job_id: Option<String>,
    pub script_name: Option<String>,
    pub pid: Option<u32>,
    pub status: JobState,
    pub start_time: Option<DateTime<Utc>>,
    /// Elapsed run time in milliseconds as reported by the backend.
    pub running_for: Option<u64>,
    /// Completion percentage, clamped to 100.
    pub progress: Option<u8>,
    pub error: Option<String>,
}

impl JobStatus {
    /// The idle snapshot: nothing running.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Local snapshot for a job the client just started.
    pub fn started(job_id: impl Into<String>, script: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            is_running: true,
            job_id: Some(job_id.into()),
            script_name: Some(script.into()),
            status: JobState::Running,
            start_time: Some(at),
            running_for: Some(0),
            ..Self::default()
        }
    }

    pub fn phase(&self) -> JobPhase {
        if self.status == JobState::Killing {
            JobPhase::Killing
        } else if self.is_running {
            JobPhase::Running
        } else {
            JobPhase::Idle
        }
    }

    /// Elapsed run time, from the backend value or derived from `start_time`.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Option<Duration> {
        if let Some(ms) = self.running_for {
            return Some(Duration::from_millis(ms));
        }
        let start = self.start_time?;
        (now - start).to_std().ok()
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawJobStatus {
    #[serde(default)]
    is_running: bool,
    #[serde(default)]
    job_id: Option<String>,
    #[serde(default)]
    script_name: Option<String>,
    #[serde(default)]
    script: Option<String>,
    #[serde(default)]
    pid: Option<u32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    start_time: Option<Value>,
    #[serde(default)]
    running_for: Option<f64>,
    #[serde(default)]
    progress: Option<f64>,
    #[serde(default)]
    error: Option<String>,
}

impl From<RawJobStatus> for JobStatus {
    fn from(raw: RawJobStatus) -> Self {
        let fallback = if raw.is_running {
            JobState::Running
        } else {
            JobState::Idle
        };
        Self {
            is_running: raw.is_running,
            job_id: raw.job_id,
            script_name: raw.script_name.or(raw.script),
            pid: raw.pid,
            status: raw
                .status
                .as_deref()
                .and_then(JobState::parse)
                .unwrap_or(fallback),
            start_time: raw.start_time.as_ref().and_then(parse_timestamp),
            running_for: raw.running_for.filter(|ms| *ms >= 0.0).map(|ms| ms as u64),
            progress: raw.progress.map(|p| p.clamp(0.0, 100.0) as u8),
            error: raw.error,
        }
    }
}

/// Parse an RFC 3339 string or an epoch-milliseconds number.
pub(crate) fn parse_timestamp(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc)),
        Value::Number(n) => n
            .as_i64()
            .and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        _ => None,
    }
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<DateTime<Utc>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    parse_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", value)))
}

/// Response to a start request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartResponse {
    #[serde(default)]
    pub job_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to a graceful cancel request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CancelResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response to a force-kill request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceKillResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Kind of logged LinkedIn activity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityAction {
    Like,
    Comment,
    ConnectionRequested,
    ConnectionAccepted,
    MessageSent,
    Scrape,
    Other(String),
}

impl ActivityAction {
    pub fn as_str(&self) -> &str {
        match self {
            ActivityAction::Like => "like",
            ActivityAction::Comment => "comment",
            ActivityAction::ConnectionRequested => "connection_requested",
            ActivityAction::ConnectionAccepted => "connection_accepted",
            ActivityAction::MessageSent => "message_sent",
            ActivityAction::Scrape => "scrape",
            ActivityAction::Other(s) => s,
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "like" => ActivityAction::Like,
            "comment" => ActivityAction::Comment,
            "connection_requested" => ActivityAction::ConnectionRequested,
            "connection_accepted" => ActivityAction::ConnectionAccepted,
            "message_sent" => ActivityAction::MessageSent,
            "scrape" => ActivityAction::Scrape,
            other => ActivityAction::Other(other.to_string()),
        }
    }
}

impl Serialize for ActivityAction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ActivityAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ActivityAction::parse(&s))
    }
}

/// One logged action performed by an automation job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub action: ActivityAction,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub post_url: Option<String>,
    #[serde(default)]
    pub profile_url: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

/// Tuning for AI post generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostOptions {
    pub tone: String,
    pub length: String,
    pub include_question: bool,
    pub style: String,
}

impl Default for PostOptions {
    fn default() -> Self {
        Self {
            tone: "professional".into(),
            length: "medium".into(),
            include_question: true,
            style: "thought-leadership".into(),
        }
    }
}

/// Unwrap `{ "success": .., "data": X }` to `X`, passing bare payloads through.
pub(crate) fn unwrap_envelope(json: Value) -> Value {
    match json {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}
