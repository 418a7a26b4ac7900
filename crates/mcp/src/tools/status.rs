// glm_status: local configuration report, no network I/O

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_object, AccessLevel, Tool, ToolOutput, ToolSummary};
use glm_core::config::{ENV_API_KEY, SERVER_NAME};
use glm_core::pricing::Rate;
use glm_core::{GlmError, GlmResult, PriceTable, Settings};
use serde::Serialize;
use std::sync::Arc;

/// Name of the status tool.
pub const STATUS_TOOL: &str = "glm_status";

#[derive(Debug, Clone, Serialize)]
pub struct ModelMapping {
    pub alias: &'static str,
    pub model: String,
    pub description: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub server_name: &'static str,
    pub version: &'static str,
    pub base_url: String,
    pub api_key_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key_hint: Option<String>,
    /// `None` means each tool uses its own default.
    pub request_timeout_secs: Option<u64>,
    pub model_mappings: Vec<ModelMapping>,
    pub pricing: Vec<Rate>,
    pub headline_savings_percent: f64,
    pub tool_count: usize,
    pub tools: Vec<ToolSummary>,
}

impl StatusReport {
    pub fn collect(settings: &Settings, prices: &PriceTable, tools: &[ToolSummary]) -> Self {
        Self {
            server_name: SERVER_NAME,
            version: env!("CARGO_PKG_VERSION"),
            base_url: settings.api.base_url.to_string(),
            api_key_configured: settings.has_api_key(),
            api_key_hint: settings.api.api_key.as_ref().map(|k| k.hint()),
            request_timeout_secs: settings.api.timeout.map(|t| t.as_secs()),
            model_mappings: settings
                .models
                .entries()
                .into_iter()
                .map(|(alias, model)| ModelMapping {
                    alias: alias.host_name(),
                    model: model.to_string(),
                    description: alias.label(),
                })
                .collect(),
            pricing: vec![prices.reference, prices.remote],
            headline_savings_percent: prices.headline_savings_percent(),
            tool_count: tools.len(),
            tools: tools.to_vec(),
        }
    }

    pub fn render(&self) -> String {
        let mut lines = vec![
            format!("{} v{}", self.server_name, self.version),
            String::new(),
            format!("Endpoint: {}", self.base_url),
            match &self.api_key_hint {
                Some(hint) => format!("API key: configured ({})", hint),
                None => "API key: NOT CONFIGURED".to_string(),
            },
            match self.request_timeout_secs {
                Some(secs) => format!("Request timeout: {}s (all tools)", secs),
                None => "Request timeout: per-tool defaults".to_string(),
            },
            String::new(),
            "Model mappings:".to_string(),
        ];
        lines.extend(self.model_mappings.iter().map(|m| {
            format!("  {:<7} -> {} ({})", m.alias, m.model, m.description)
        }));

        lines.push(String::new());
        lines.push("Pricing (USD per million tokens):".to_string());
        lines.extend(self.pricing.iter().map(|rate| {
            format!(
                "  {:<12} ${} input / ${} output",
                rate.name, rate.input_per_million, rate.output_per_million
            )
        }));
        lines.push(format!("  Savings: {:.0}%", self.headline_savings_percent));

        lines.push(String::new());
        lines.push(format!("Tools ({}):", self.tool_count));
        lines.extend(
            self.tools
                .iter()
                .map(|t| format!("  {:<20} {} [{}]", t.name, t.summary, t.access)),
        );

        if !self.api_key_configured {
            lines.extend([
                String::new(),
                "Setup:".to_string(),
                "  1. Create an API key at https://z.ai".to_string(),
                format!(
                    "  2. Export {} or add it to .env or to [api] api_key in glm-mcp.toml",
                    ENV_API_KEY
                ),
                "  3. Restart the server".to_string(),
            ]);
        }

        lines.join("\n")
    }
}

/// Reports what the server would do, without touching the network.
pub struct StatusTool {
    settings: Arc<Settings>,
    prices: PriceTable,
    tools: Vec<ToolSummary>,
}

impl StatusTool {
    pub fn new(settings: Arc<Settings>, prices: PriceTable, tools: Vec<ToolSummary>) -> Self {
        Self {
            settings,
            prices,
            tools,
        }
    }

    pub fn summary() -> ToolSummary {
        ToolSummary {
            name: STATUS_TOOL.to_string(),
            summary: "Check server status".to_string(),
            access: AccessLevel::None.as_str(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for StatusTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: STATUS_TOOL.to_string(),
            title: Some("GLM server status".to_string()),
            description: "Check GLM server status and configuration: endpoint, credential presence, model mappings, pricing and available tools. Makes no remote call.".to_string(),
            input_schema: json_schema_object(serde_json::json!({}), &[]),
            annotations: Some(AccessLevel::None.annotations(false)),
        }
    }

    async fn execute(&self, _arguments: serde_json::Value) -> GlmResult<ToolOutput> {
        let report = StatusReport::collect(&self.settings, &self.prices, &self.tools);
        let structured = serde_json::to_value(&report)
            .map_err(|e| GlmError::configuration(format!("Failed to encode status: {}", e)))?;
        Ok(ToolOutput::text(report.render()).with_structured(structured))
    }
}
