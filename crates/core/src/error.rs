//! Error taxonomy shared by every layer of the server.

use serde::Serialize;

/// Result type for GLM operations.
pub type GlmResult<T> = Result<T, GlmError>;

/// Errors that can occur while serving a delegated tool call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GlmError {
    /// Bad or missing caller input.
    #[error("Invalid argument `{field}`: {message}")]
    Validation { field: String, message: String },

    /// Missing or rejected credential, or unusable settings.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connection failure or timeout talking to the remote API.
    #[error("Transport error: {message}")]
    Transport { message: String, timed_out: bool },

    /// The remote API answered with a non-success status.
    #[error("Remote API error (status {status}): {message}")]
    RemoteApi {
        status: u16,
        code: Option<String>,
        message: String,
    },
}

impl GlmError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Shorthand for a required argument that was absent or blank.
    pub fn missing(field: impl Into<String>) -> Self {
        let field = field.into();
        Self::Validation {
            message: format!("`{}` is required", field),
            field,
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn transport(message: impl Into<String>, timed_out: bool) -> Self {
        Self::Transport {
            message: message.into(),
            timed_out,
        }
    }

    pub fn remote_api(status: u16, code: Option<String>, message: impl Into<String>) -> Self {
        Self::RemoteApi {
            status,
            code,
            message: message.into(),
        }
    }

    /// Stable machine-readable name of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation_error",
            Self::Configuration(_) => "configuration_error",
            Self::Transport { .. } => "transport_error",
            Self::RemoteApi { .. } => "remote_api_error",
        }
    }

    /// Whether the host may reasonably try the same call again.
    ///
    /// This is a hint for the caller only; nothing in this crate retries.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport { .. } => true,
            Self::RemoteApi { status, .. } => *status == 429 || *status >= 500,
            Self::Validation { .. } | Self::Configuration(_) => false,
        }
    }

    /// Structured form attached to failed tool results.
    pub fn to_report(&self) -> ErrorReport {
        let (status, code, field) = match self {
            Self::RemoteApi { status, code, .. } => (Some(*status), code.clone(), None),
            Self::Validation { field, .. } => (None, None, Some(field.clone())),
            _ => (None, None, None),
        };

        ErrorReport {
            kind: self.kind(),
            message: self.to_string(),
            retryable: self.is_retryable(),
            status,
            code,
            field,
        }
    }
}

/// Serializable error summary surfaced to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub message: String,
    pub retryable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_names_the_field() {
        let err = GlmError::missing("code_or_file");
        assert!(err.to_string().contains("code_or_file"));
        assert_eq!(err.kind(), "validation_error");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(GlmError::transport("connection refused", false).is_retryable());
        assert!(GlmError::remote_api(503, None, "overloaded").is_retryable());
        assert!(GlmError::remote_api(429, None, "slow down").is_retryable());
        assert!(!GlmError::remote_api(400, None, "bad request").is_retryable());
        assert!(!GlmError::configuration("ZAI_API_KEY not configured").is_retryable());
        assert!(!GlmError::missing("question").is_retryable());
    }

    #[test]
    fn test_report_carries_status_and_code() {
        let err = GlmError::remote_api(500, Some("api_error".to_string()), "internal");
        let report = err.to_report();

        assert_eq!(report.kind, "remote_api_error");
        assert_eq!(report.status, Some(500));
        assert_eq!(report.code.as_deref(), Some("api_error"));
        assert!(report.retryable);

        let json = serde_json::to_value(&report).unwrap();
        assert!(json.get("field").is_none());
    }

    #[test]
    fn test_report_for_validation_names_field() {
        let report = GlmError::missing("question").to_report();
        assert_eq!(report.field.as_deref(), Some("question"));
        assert!(report.status.is_none());
    }
}
