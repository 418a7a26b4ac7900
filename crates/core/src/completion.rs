// Completion request/response types and the backend seam

use crate::error::{GlmError, GlmResult};
use crate::models::RemoteModelId;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const MIN_TEMPERATURE: f64 = 0.0;
pub const MAX_TEMPERATURE: f64 = 1.0;

/// One prompt bound for the remote model.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub prompt: String,
    pub model: RemoteModelId,
    pub temperature: f64,
    pub max_tokens: u32,
    /// Per-call bound; the backend's own default applies when unset.
    #[serde(skip)]
    pub timeout: Option<Duration>,
}

impl CompletionRequest {
    pub fn new(prompt: impl Into<String>, model: RemoteModelId) -> Self {
        Self {
            prompt: prompt.into(),
            model,
            temperature: 0.7,
            max_tokens: 4096,
            timeout: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Check the request invariants before anything leaves the process.
    pub fn validate(&self) -> GlmResult<()> {
        if self.prompt.trim().is_empty() {
            return Err(GlmError::validation("prompt", "prompt must not be empty"));
        }
        validate_temperature(self.temperature)?;
        validate_max_tokens(self.max_tokens)?;
        if self.model.as_str().trim().is_empty() {
            return Err(GlmError::configuration("model identifier must not be empty"));
        }
        Ok(())
    }
}

pub fn validate_temperature(temperature: f64) -> GlmResult<()> {
    if !(MIN_TEMPERATURE..=MAX_TEMPERATURE).contains(&temperature) {
        return Err(GlmError::validation(
            "temperature",
            format!(
                "must be between {} and {}, got {}",
                MIN_TEMPERATURE, MAX_TEMPERATURE, temperature
            ),
        ));
    }
    Ok(())
}

pub fn validate_max_tokens(max_tokens: u32) -> GlmResult<()> {
    if max_tokens == 0 {
        return Err(GlmError::validation("max_tokens", "must be a positive integer"));
    }
    Ok(())
}

/// Token counts reported by the provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

/// Text produced by the remote model for a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResult {
    pub text: String,
    pub model: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

/// Anything able to turn a prompt into a completion.
///
/// Implementations perform at most one round trip per call and never retry.
#[async_trait::async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> GlmResult<CompletionResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(prompt: &str) -> CompletionRequest {
        CompletionRequest::new(prompt, RemoteModelId::new("glm-4.7"))
    }

    #[test]
    fn test_valid_request() {
        let req = request("Explain borrowing")
            .with_temperature(0.2)
            .with_max_tokens(512)
            .with_timeout(Duration::from_secs(5));
        assert!(req.validate().is_ok());
        assert_eq!(req.timeout, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_empty_prompt_rejected() {
        let err = request("  \n").validate().unwrap_err();
        assert!(matches!(err, GlmError::Validation { ref field, .. } if field == "prompt"));
    }

    #[test]
    fn test_temperature_bounds() {
        assert!(request("hi").with_temperature(0.0).validate().is_ok());
        assert!(request("hi").with_temperature(1.0).validate().is_ok());
        assert!(request("hi").with_temperature(1.5).validate().is_err());
        assert!(request("hi").with_temperature(-0.1).validate().is_err());
        assert!(request("hi").with_temperature(f64::NAN).validate().is_err());
    }

    #[test]
    fn test_zero_max_tokens_rejected() {
        let err = request("hi").with_max_tokens(0).validate().unwrap_err();
        assert!(err.to_string().contains("max_tokens"));
    }

    #[test]
    fn test_serialized_request_omits_timeout() {
        let json = serde_json::to_value(request("hi").with_timeout(Duration::from_secs(1))).unwrap();
        assert!(json.get("timeout").is_none());
        assert_eq!(json["model"], "glm-4.7");
    }
}
