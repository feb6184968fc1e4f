use thiserror::Error;

/// Errors returned by automation client operations.
#[derive(Error, Debug)]
pub enum AutomationError {
    /// Job parameters failed local validation. Never reaches the network.
    #[error("Invalid job parameters: {0}")]
    Validation(String),

    /// Another job is already running, locally cached or backend-reported.
    #[error("A job is already running: {0}")]
    JobAlreadyRunning(String),

    /// The backend returned a non-success HTTP status.
    #[error("Backend returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The request did not complete within the client-side timeout.
    #[error("{context}: request timed out")]
    Timeout { context: String },

    /// Network-level request failure with context.
    #[error("{context}: {source}")]
    Network {
        context: String,
        source: reqwest::Error,
    },

    /// The response from the backend was missing expected fields.
    #[error("{0}")]
    InvalidResponse(String),

    /// Force-kill failed. The job may still be running and needs manual attention.
    #[error("Force kill failed: {0}")]
    Fatal(String),

    /// Invalid client configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Credential file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AutomationError {
    /// Wrap a `reqwest` failure, splitting client-side timeouts out of
    /// generic network errors.
    pub(crate) fn from_transport(context: impl Into<String>, source: reqwest::Error) -> Self {
        let context = context.into();
        if source.is_timeout() {
            AutomationError::Timeout { context }
        } else {
            AutomationError::Network { context, source }
        }
    }

    /// True for transport-level failures that may succeed on a later attempt.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AutomationError::Network { .. } | AutomationError::Timeout { .. }
        )
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, AutomationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        let timeout = AutomationError::Timeout {
            context: "status".into(),
        };
        assert!(timeout.is_transient());
        assert!(!AutomationError::Validation("maxPosts".into()).is_transient());
        assert!(!AutomationError::Fatal("kill".into()).is_transient());
        assert!(!AutomationError::Http {
            status: 500,
            message: "boom".into()
        }
        .is_transient());
    }

    #[test]
    fn test_display_messages() {
        let err = AutomationError::Http {
            status: 409,
            message: "A job is already running".into(),
        };
        assert_eq!(
            err.to_string(),
            "Backend returned HTTP 409: A job is already running"
        );

        let err = AutomationError::Timeout {
            context: "Failed to fetch job status".into(),
        };
        assert_eq!(err.to_string(), "Failed to fetch job status: request timed out");
    }
}
