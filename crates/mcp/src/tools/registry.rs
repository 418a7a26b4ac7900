// Tool trait, access levels, and the registry that dispatches calls

use crate::protocol::{CallToolResult, ToolAnnotations, ToolSchema};
use glm_core::{GlmError, GlmResult};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

/// What a tool may touch on the host side. Published as metadata only;
/// the host resolves and enforces file access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum AccessLevel {
    /// Pure generation, no files involved
    None,
    /// May be given file or project content to read
    ReadOnly,
    /// Produces changes the host is expected to write
    Write,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ReadOnly => "read-only",
            Self::Write => "write",
        }
    }

    pub fn annotations(&self, open_world: bool) -> ToolAnnotations {
        ToolAnnotations {
            read_only_hint: *self != Self::Write,
            destructive_hint: false,
            open_world_hint: open_world,
        }
    }
}

/// Successful tool output before it is wrapped for the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    pub text: String,
    pub structured: Option<serde_json::Value>,
}

impl ToolOutput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            structured: None,
        }
    }

    pub fn with_structured(mut self, value: serde_json::Value) -> Self {
        self.structured = Some(value);
        self
    }
}

/// One-line description of a registered tool, used by `glm_status`.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ToolSummary {
    pub name: String,
    pub summary: String,
    pub access: &'static str,
}

/// Tool executor trait
#[async_trait::async_trait]
pub trait Tool: Send + Sync {
    /// Get the tool schema for MCP
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with given arguments
    async fn execute(&self, arguments: serde_json::Value) -> GlmResult<ToolOutput>;
}

/// Tool registry for managing available tools.
///
/// Tools are listed in registration order.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    by_name: HashMap<String, usize>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Vec::new(),
            by_name: HashMap::new(),
        }
    }

    /// Register a tool. A later registration with the same name replaces
    /// the earlier one in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.schema().name;
        match self.by_name.get(&name) {
            Some(&idx) => self.tools[idx] = tool,
            None => {
                self.by_name.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.by_name.get(name).map(|&idx| self.tools[idx].clone())
    }

    /// List all tool schemas
    pub fn list_schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    /// Check if a tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Run a tool and fold every failure into an MCP error result.
    ///
    /// Returns `None` only when no tool with that name is registered.
    pub async fn call(&self, name: &str, arguments: serde_json::Value) -> Option<CallToolResult> {
        let tool = self.get(name)?;
        let started = Instant::now();

        let result = match tool.execute(arguments).await {
            Ok(output) => {
                tracing::info!(
                    tool = name,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call succeeded"
                );
                let result = CallToolResult::text(output.text);
                match output.structured {
                    Some(value) => result.with_structured(value),
                    None => result,
                }
            }
            Err(err) => {
                tracing::warn!(
                    tool = name,
                    kind = err.kind(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Tool call failed: {}",
                    err
                );
                error_result(&err)
            }
        };

        Some(result)
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a lower-layer failure to the tool-result error shape.
pub fn error_result(err: &GlmError) -> CallToolResult {
    let mut text = err.to_string();
    if err.is_retryable() {
        text.push_str("\nThis failure may be transient. No automatic retry was attempted; calling the tool again may succeed.");
    }

    CallToolResult::error(text).with_structured(serde_json::json!({ "error": err.to_report() }))
}

// Helper functions for creating tool schemas

pub fn json_schema_object(properties: serde_json::Value, required: &[&str]) -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required
    })
}

pub fn json_schema_string(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "description": description
    })
}

pub fn json_schema_enum(values: &[&str], default: &str, description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "string",
        "enum": values,
        "default": default,
        "description": description
    })
}

pub fn json_schema_number(description: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "number",
        "description": description
    })
}

pub fn json_schema_integer(description: &str, minimum: i64) -> serde_json::Value {
    serde_json::json!({
        "type": "integer",
        "minimum": minimum,
        "description": description
    })
}
