// Anthropic Messages API wire types (request body, response body, error body)

use glm_core::{CompletionRequest, CompletionResult, Usage};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct MessagesRequest<'a> {
    pub model: &'a str,
    pub max_tokens: u32,
    pub temperature: f64,
    pub messages: [Message<'a>; 1],
}

#[derive(Debug, Serialize)]
pub(crate) struct Message<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> From<&'a CompletionRequest> for MessagesRequest<'a> {
    fn from(request: &'a CompletionRequest) -> Self {
        Self {
            model: request.model.as_str(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            messages: [Message {
                role: "user",
                content: &request.prompt,
            }],
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct MessagesResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub content: Vec<ContentBlock>,
    #[serde(default)]
    pub stop_reason: Option<String>,
    #[serde(default)]
    pub usage: Option<WireUsage>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub(crate) enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    // thinking, tool_use, ...
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WireUsage {
    #[serde(default)]
    pub input_tokens: u64,
    #[serde(default)]
    pub output_tokens: u64,
}

impl MessagesResponse {
    pub fn into_result(self, requested_model: &str) -> CompletionResult {
        let text = self
            .content
            .into_iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");

        CompletionResult {
            text,
            model: self.model.unwrap_or_else(|| requested_model.to_string()),
            stop_reason: self.stop_reason,
            usage: self.usage.map(|u| Usage {
                input_tokens: u.input_tokens,
                output_tokens: u.output_tokens,
            }),
        }
    }
}

/// Provider error detail pulled out of a non-success body.
#[derive(Debug, Default, PartialEq)]
pub(crate) struct ErrorDetail {
    pub code: Option<String>,
    pub message: Option<String>,
}

/// Accepts both `{"error": {"type", "message"}}` and the `{"error": {"code",
/// "message"}}` shape some gateways return.
pub(crate) fn parse_error_body(body: &str) -> ErrorDetail {
    let Ok(value) = serde_json::from_str::<serde_json::Value>(body) else {
        return ErrorDetail::default();
    };
    let error = value.get("error").unwrap_or(&value);

    let code = ["type", "code"].iter().find_map(|key| match error.get(*key) {
        Some(serde_json::Value::String(s)) if s != "error" => Some(s.clone()),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    });
    let message = error
        .get("message")
        .and_then(|m| m.as_str())
        .map(str::to_string);

    ErrorDetail { code, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glm_core::RemoteModelId;

    #[test]
    fn test_request_body_shape() {
        let request = CompletionRequest::new("Hello", RemoteModelId::new("glm-4.7"))
            .with_temperature(0.3)
            .with_max_tokens(256);
        let json = serde_json::to_value(MessagesRequest::from(&request)).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "glm-4.7",
                "max_tokens": 256,
                "temperature": 0.3,
                "messages": [{"role": "user", "content": "Hello"}]
            })
        );
    }

    #[test]
    fn test_response_text_blocks_joined() {
        let response: MessagesResponse = serde_json::from_value(serde_json::json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [
                {"type": "thinking", "thinking": "hmm"},
                {"type": "text", "text": "Hello"},
                {"type": "text", "text": ", world"}
            ],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": 12, "output_tokens": 4, "cache_read_input_tokens": 0}
        }))
        .unwrap();

        let result = response.into_result("glm-4.7");
        assert_eq!(result.text, "Hello, world");
        assert_eq!(result.model, "glm-4.7");
        assert_eq!(result.stop_reason.as_deref(), Some("end_turn"));
        assert_eq!(result.usage.unwrap().input_tokens, 12);
    }

    #[test]
    fn test_parse_anthropic_error_body() {
        let detail = parse_error_body(
            r#"{"type":"error","error":{"type":"overloaded_error","message":"Overloaded"}}"#,
        );
        assert_eq!(detail.code.as_deref(), Some("overloaded_error"));
        assert_eq!(detail.message.as_deref(), Some("Overloaded"));
    }

    #[test]
    fn test_parse_gateway_error_body() {
        let detail = parse_error_body(r#"{"error":{"code":1113,"message":"Insufficient balance"}}"#);
        assert_eq!(detail.code.as_deref(), Some("1113"));
        assert_eq!(detail.message.as_deref(), Some("Insufficient balance"));
    }

    #[test]
    fn test_parse_non_json_error_body() {
        assert_eq!(parse_error_body("<html>bad gateway</html>"), ErrorDetail::default());
    }
}
