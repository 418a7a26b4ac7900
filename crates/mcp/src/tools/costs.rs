// glm_compare_costs: local cost comparison against the reference provider

use crate::protocol::ToolSchema;
use crate::tools::{json_schema_integer, json_schema_object, AccessLevel, Tool, ToolOutput, ToolSummary};
use glm_core::{GlmError, GlmResult, PriceTable};
use serde::Deserialize;
use serde_json::json;

pub const COMPARE_COSTS_TOOL: &str = "glm_compare_costs";

const DEFAULT_TOKENS: i64 = 1000;

fn default_tokens() -> i64 {
    DEFAULT_TOKENS
}

#[derive(Debug, Deserialize)]
struct CompareCostsArgs {
    #[serde(default = "default_tokens", alias = "tokens_input")]
    input_tokens: i64,
    #[serde(default = "default_tokens", alias = "tokens_output")]
    output_tokens: i64,
}

impl Default for CompareCostsArgs {
    fn default() -> Self {
        Self {
            input_tokens: DEFAULT_TOKENS,
            output_tokens: DEFAULT_TOKENS,
        }
    }
}

pub struct CompareCostsTool {
    prices: PriceTable,
}

impl CompareCostsTool {
    pub fn new(prices: PriceTable) -> Self {
        Self { prices }
    }

    pub fn summary() -> ToolSummary {
        ToolSummary {
            name: COMPARE_COSTS_TOOL.to_string(),
            summary: "Compare costs".to_string(),
            access: AccessLevel::None.as_str(),
        }
    }
}

#[async_trait::async_trait]
impl Tool for CompareCostsTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: COMPARE_COSTS_TOOL.to_string(),
            title: Some("Compare costs".to_string()),
            description: "Compare the cost of a workload on Claude Opus versus GLM-4.7, using published per-million-token prices.".to_string(),
            input_schema: json_schema_object(
                json!({
                    "input_tokens": json_schema_integer("Number of input tokens (default: 1000)", 0),
                    "output_tokens": json_schema_integer("Number of output tokens (default: 1000)", 0),
                }),
                &[],
            ),
            annotations: Some(AccessLevel::None.annotations(false)),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> GlmResult<ToolOutput> {
        let args: CompareCostsArgs = if arguments.is_null() {
            CompareCostsArgs::default()
        } else {
            serde_json::from_value(arguments).map_err(|e| GlmError::validation("arguments", e.to_string()))?
        };

        let comparison = self.prices.compare(args.input_tokens, args.output_tokens)?;
        let structured = serde_json::to_value(&comparison)
            .map_err(|e| GlmError::configuration(format!("Failed to encode comparison: {}", e)))?;

        Ok(ToolOutput::text(comparison.render()).with_structured(structured))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_compare_reference_workload() {
        let tool = CompareCostsTool::new(PriceTable::default());
        let output = tool
            .execute(json!({"input_tokens": 50000, "output_tokens": 20000}))
            .await
            .unwrap();

        assert!(output.text.contains("88.44%"));
        let structured = output.structured.unwrap();
        assert_eq!(structured["input_tokens"], 50000);
        assert_eq!(format!("{:.2}", structured["savings_percent"].as_f64().unwrap()), "88.44");
    }

    #[tokio::test]
    async fn test_defaults_and_legacy_names() {
        let tool = CompareCostsTool::new(PriceTable::default());

        let defaults = tool.execute(serde_json::Value::Null).await.unwrap();
        assert_eq!(defaults.structured.unwrap()["output_tokens"], 1000);

        let legacy = tool
            .execute(json!({"tokens_input": 10, "tokens_output": 20}))
            .await
            .unwrap();
        let structured = legacy.structured.unwrap();
        assert_eq!(structured["input_tokens"], 10);
        assert_eq!(structured["output_tokens"], 20);
    }

    #[tokio::test]
    async fn test_negative_counts_are_validation_errors() {
        let tool = CompareCostsTool::new(PriceTable::default());
        let err = tool
            .execute(json!({"input_tokens": -1}))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "validation_error");

        let err = tool.execute(json!({"input_tokens": "many"})).await.unwrap_err();
        assert_eq!(err.kind(), "validation_error");
    }
}
