// HTTP client for the remote Messages endpoint

use crate::wire::{parse_error_body, MessagesRequest, MessagesResponse};
use glm_core::{ApiSettings, CompletionBackend, CompletionRequest, CompletionResult, GlmError, GlmResult};
use reqwest::{header, Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

pub const MESSAGES_PATH: &str = "v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Completion client for Z.ai's Anthropic-compatible API.
///
/// One call is one HTTP request. There is no retry loop: delegation is
/// cost-sensitive and the host decides whether to try again.
#[derive(Debug, Clone)]
pub struct ZaiClient {
    http: Client,
    endpoint: Url,
}

impl ZaiClient {
    /// Build a client from the API settings. Fails with a configuration
    /// error when no credential is present.
    pub fn new(settings: &ApiSettings) -> GlmResult<Self> {
        let api_key = settings.api_key.as_ref().ok_or_else(|| {
            GlmError::configuration(format!("{} not configured", glm_core::config::ENV_API_KEY))
        })?;

        let mut headers = header::HeaderMap::new();

        let mut bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key.expose()))
            .map_err(|_| GlmError::configuration("Invalid API key format"))?;
        bearer.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, bearer);

        let mut x_api_key = header::HeaderValue::from_str(api_key.expose())
            .map_err(|_| GlmError::configuration("Invalid API key format"))?;
        x_api_key.set_sensitive(true);
        headers.insert(header::HeaderName::from_static("x-api-key"), x_api_key);

        headers.insert(
            header::HeaderName::from_static("anthropic-version"),
            header::HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let http = Client::builder()
            .user_agent(concat!("glm-mcp/", env!("CARGO_PKG_VERSION")))
            .timeout(settings.timeout.unwrap_or(DEFAULT_TIMEOUT))
            .connect_timeout(CONNECT_TIMEOUT)
            .default_headers(headers)
            .build()
            .map_err(|e| GlmError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        let endpoint = settings
            .base_url
            .join(MESSAGES_PATH)
            .map_err(|e| GlmError::configuration(format!("Invalid base URL: {}", e)))?;

        Ok(Self { http, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn send(&self, request: &CompletionRequest) -> GlmResult<CompletionResult> {
        request.validate()?;

        let mut builder = self
            .http
            .post(self.endpoint.clone())
            .json(&MessagesRequest::from(request));
        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }

        debug!(
            model = %request.model,
            max_tokens = request.max_tokens,
            prompt_chars = request.prompt.chars().count(),
            "Sending completion request"
        );
        let started = Instant::now();

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(
                model = %request.model,
                status = status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Completion request failed"
            );
            return Err(error_from_response(status, &body));
        }

        let body = response.text().await.map_err(transport_error)?;
        let parsed: MessagesResponse = serde_json::from_str(&body).map_err(|e| {
            GlmError::remote_api(
                status.as_u16(),
                Some("invalid_response".to_string()),
                format!("Unexpected response body: {}", e),
            )
        })?;
        let result = parsed.into_result(request.model.as_str());

        info!(
            model = %result.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            input_tokens = result.usage.map(|u| u.input_tokens),
            output_tokens = result.usage.map(|u| u.output_tokens),
            "Completion finished"
        );

        Ok(result)
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ZaiClient {
    async fn complete(&self, request: CompletionRequest) -> GlmResult<CompletionResult> {
        self.send(&request).await
    }
}

fn transport_error(e: reqwest::Error) -> GlmError {
    let timed_out = e.is_timeout();
    let message = if timed_out {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        e.to_string()
    };
    GlmError::transport(message, timed_out)
}

fn error_from_response(status: StatusCode, body: &str) -> GlmError {
    let detail = parse_error_body(body);
    let message = detail
        .message
        .unwrap_or_else(|| truncate_chars(body.trim(), MAX_ERROR_BODY_CHARS));
    let message = if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no error message")
            .to_string()
    } else {
        message
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => GlmError::configuration(format!(
            "Remote API rejected the credential (status {}): {}",
            status.as_u16(),
            message
        )),
        _ => GlmError::remote_api(status.as_u16(), detail.code, message),
    }
}

fn truncate_chars(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
