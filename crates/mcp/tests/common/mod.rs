// Shared fixtures for the MCP integration tests

#![allow(dead_code)]

use glm_core::{ApiKey, CompletionBackend, CompletionRequest, CompletionResult, GlmResult, Settings};
use glm_mcp::ToolRegistry;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Backend that replays canned replies and records every request it sees.
#[derive(Default)]
pub struct ScriptedBackend {
    replies: Mutex<VecDeque<GlmResult<CompletionResult>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    hang: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend whose calls never complete.
    pub fn hanging() -> Self {
        Self {
            hang: true,
            ..Self::default()
        }
    }

    pub fn reply(self, text: &str) -> Self {
        self.push(Ok(CompletionResult {
            text: text.to_string(),
            model: "glm-4.7".to_string(),
            stop_reason: Some("end_turn".to_string()),
            usage: None,
        }))
    }

    pub fn fail(self, err: glm_core::GlmError) -> Self {
        self.push(Err(err))
    }

    fn push(self, reply: GlmResult<CompletionResult>) -> Self {
        self.replies.lock().unwrap().push_back(reply);
        self
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn complete(&self, request: CompletionRequest) -> GlmResult<CompletionResult> {
        self.requests.lock().unwrap().push(request);
        if self.hang {
            std::future::pending::<()>().await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| panic!("ScriptedBackend ran out of replies"))
    }
}

pub fn settings_with_key() -> Settings {
    let mut settings = Settings::default();
    settings.api.api_key = Some(ApiKey::new("zai-test-key-123456"));
    settings
}

pub fn registry(backend: Arc<ScriptedBackend>) -> ToolRegistry {
    ToolRegistry::with_defaults(Arc::new(settings_with_key()), backend)
}
