use serde_json::{json, Map, Value};

use crate::error::{AutomationError, Result};

pub const DEFAULT_KEYWORD: &str = "developer";
pub const DEFAULT_FEED_POSTS: u32 = 15;
pub const DEFAULT_MAX_REQUESTS: u32 = 20;
pub const DEFAULT_SEARCH_POSTS: u32 = 10;
pub const DEFAULT_MAX_PROFILES: u32 = 50;

/// Every job type the backend can run, by URL slug.
pub const JOB_TYPES: [&str; 6] = [
    "feed-engagement",
    "connection-requests",
    "monitor-connections",
    "welcome-messages",
    "search-engagement",
    "profile-scraping",
];

/// An automation run request with its parameters.
///
/// The `new_*` constructors fill in the backend's usual defaults.
/// [`AutomationJob::from_params`] is the strict path for loosely-typed
/// input (forms, CLI) and rejects missing or invalid fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutomationJob {
    /// Like and comment on posts from the home feed.
    FeedEngagement { max_posts: u32 },
    /// Search people by keyword and send connection requests.
    ConnectionRequests { keyword: String, max_requests: u32 },
    /// Check which sent requests were accepted.
    MonitorConnections,
    /// Message newly accepted connections.
    WelcomeMessages,
    /// Search posts by keyword and engage with them.
    SearchEngagement { keyword: String, max_posts: u32 },
    /// Collect profile data for people matching a keyword.
    ProfileScraping { keyword: String, max_profiles: u32 },
}

impl AutomationJob {
    pub fn feed_engagement() -> Self {
        AutomationJob::FeedEngagement {
            max_posts: DEFAULT_FEED_POSTS,
        }
    }

    pub fn connection_requests(keyword: impl Into<String>) -> Self {
        AutomationJob::ConnectionRequests {
            keyword: keyword.into(),
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }

    pub fn search_engagement(keyword: impl Into<String>) -> Self {
        AutomationJob::SearchEngagement {
            keyword: keyword.into(),
            max_posts: DEFAULT_SEARCH_POSTS,
        }
    }

    pub fn profile_scraping(keyword: impl Into<String>) -> Self {
        AutomationJob::ProfileScraping {
            keyword: keyword.into(),
            max_profiles: DEFAULT_MAX_PROFILES,
        }
    }

    /// URL slug used in `/automation/{slug}/start` and reported as `scriptName`.
    pub fn slug(&self) -> &'static str {
        match self {
            AutomationJob::FeedEngagement { .. } => "feed-engagement",
            AutomationJob::ConnectionRequests { .. } => "connection-requests",
            AutomationJob::MonitorConnections => "monitor-connections",
            AutomationJob::WelcomeMessages => "welcome-messages",
            AutomationJob::SearchEngagement { .. } => "search-engagement",
            AutomationJob::ProfileScraping { .. } => "profile-scraping",
        }
    }

    /// Check the parameter schema for this job type.
    pub fn validate(&self) -> Result<()> {
        match self {
            AutomationJob::FeedEngagement { max_posts } => at_least_one("maxPosts", *max_posts),
            AutomationJob::ConnectionRequests {
                keyword,
                max_requests,
            } => {
                non_empty("keyword", keyword)?;
                at_least_one("maxRequests", *max_requests)
            }
            AutomationJob::SearchEngagement { keyword, max_posts } => {
                non_empty("keyword", keyword)?;
                at_least_one("maxPosts", *max_posts)
            }
            AutomationJob::ProfileScraping {
                keyword,
                max_profiles,
            } => {
                non_empty("keyword", keyword)?;
                at_least_one("maxProfiles", *max_profiles)
            }
            AutomationJob::MonitorConnections | AutomationJob::WelcomeMessages => Ok(()),
        }
    }

    /// Job-specific request body fields, without credentials.
    pub fn params(&self) -> Map<String, Value> {
        let value = match self {
            AutomationJob::FeedEngagement { max_posts } => json!({ "maxPosts": max_posts }),
            AutomationJob::ConnectionRequests {
                keyword,
                max_requests,
            } => json!({ "keyword": keyword, "maxRequests": max_requests }),
            AutomationJob::SearchEngagement { keyword, max_posts } => {
                json!({ "keyword": keyword, "maxPosts": max_posts })
            }
            AutomationJob::ProfileScraping {
                keyword,
                max_profiles,
            } => json!({ "keyword": keyword, "maxProfiles": max_profiles }),
            AutomationJob::MonitorConnections | AutomationJob::WelcomeMessages => json!({}),
        };
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    /// Build a job from a type slug and a JSON object of parameters.
    ///
    /// Every required field must be present with the right type; no
    /// defaults are applied.
    pub fn from_params(job_type: &str, params: &Value) -> Result<Self> {
        let job = match job_type {
            "feed-engagement" => AutomationJob::FeedEngagement {
                max_posts: count_field(params, "maxPosts")?,
            },
            "connection-requests" => AutomationJob::ConnectionRequests {
                keyword: string_field(params, "keyword")?,
                max_requests: count_field(params, "maxRequests")?,
            },
            "monitor-connections" => AutomationJob::MonitorConnections,
            "welcome-messages" => AutomationJob::WelcomeMessages,
            "search-engagement" => AutomationJob::SearchEngagement {
                keyword: string_field(params, "keyword")?,
                max_posts: count_field(params, "maxPosts")?,
            },
            "profile-scraping" => AutomationJob::ProfileScraping {
                keyword: string_field(params, "keyword")?,
                max_profiles: count_field(params, "maxProfiles")?,
            },
            other => {
                return Err(AutomationError::Validation(format!(
                    "unknown job type: {}",
                    other
                )))
            }
        };
        job.validate()?;
        Ok(job)
    }
}

fn at_least_one(field: &str, value: u32) -> Result<()> {
    if value >= 1 {
        Ok(())
    } else {
        Err(AutomationError::Validation(format!(
            "{} must be at least 1",
            field
        )))
    }
}

fn non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(AutomationError::Validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn count_field(params: &Value, field: &str) -> Result<u32> {
    let value = params
        .get(field)
        .ok_or_else(|| AutomationError::Validation(format!("{} is required", field)))?;
    value
        .as_u64()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            AutomationError::Validation(format!("{} must be a positive integer, got {}", field, value))
        })
}

fn string_field(params: &Value, field: &str) -> Result<String> {
    params
        .get(field)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| AutomationError::Validation(format!("{} is required", field)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        assert_eq!(
            AutomationJob::feed_engagement(),
            AutomationJob::FeedEngagement { max_posts: 15 }
        );
        assert_eq!(
            AutomationJob::profile_scraping("rust"),
            AutomationJob::ProfileScraping {
                keyword: "rust".into(),
                max_profiles: 50
            }
        );
    }

    #[test]
    fn test_params_body() {
        let job = AutomationJob::FeedEngagement { max_posts: 15 };
        assert_eq!(Value::Object(job.params()), json!({"maxPosts": 15}));

        let job = AutomationJob::connection_requests("developer");
        assert_eq!(
            Value::Object(job.params()),
            json!({"keyword": "developer", "maxRequests": 20})
        );

        assert!(AutomationJob::WelcomeMessages.params().is_empty());
    }

    #[test]
    fn test_slugs_cover_all_types() {
        let jobs = [
            AutomationJob::feed_engagement(),
            AutomationJob::connection_requests("x"),
            AutomationJob::MonitorConnections,
            AutomationJob::WelcomeMessages,
            AutomationJob::search_engagement("x"),
            AutomationJob::profile_scraping("x"),
        ];
        let slugs: Vec<_> = jobs.iter().map(|j| j.slug()).collect();
        assert_eq!(slugs, JOB_TYPES);
    }

    #[test]
    fn test_validation_rejects_zero_and_blank() {
        assert!(AutomationJob::FeedEngagement { max_posts: 0 }.validate().is_err());
        assert!(AutomationJob::ConnectionRequests {
            keyword: "  ".into(),
            max_requests: 5
        }
        .validate()
        .is_err());
        assert!(AutomationJob::SearchEngagement {
            keyword: "ai".into(),
            max_posts: 0
        }
        .validate()
        .is_err());
        assert!(AutomationJob::MonitorConnections.validate().is_ok());
    }

    #[test]
    fn test_from_params_strict() {
        let job = AutomationJob::from_params("feed-engagement", &json!({"maxPosts": 15})).unwrap();
        assert_eq!(job, AutomationJob::FeedEngagement { max_posts: 15 });

        let missing = AutomationJob::from_params("connection-requests", &json!({"keyword": "dev"}));
        assert!(matches!(missing, Err(AutomationError::Validation(m)) if m.contains("maxRequests")));

        let wrong_type = AutomationJob::from_params("feed-engagement", &json!({"maxPosts": "15"}));
        assert!(wrong_type.is_err());

        let negative = AutomationJob::from_params("feed-engagement", &json!({"maxPosts": -3}));
        assert!(negative.is_err());

        let unknown = AutomationJob::from_params("mass-dm", &json!({}));
        assert!(matches!(unknown, Err(AutomationError::Validation(m)) if m.contains("mass-dm")));

        let no_params = AutomationJob::from_params("welcome-messages", &json!({})).unwrap();
        assert_eq!(no_params, AutomationJob::WelcomeMessages);
    }
}
