// Tool dispatch through the full default registry with a scripted backend

mod common;

use common::{registry, ScriptedBackend};
use glm_core::{GlmError, Settings};
use glm_mcp::ToolRegistry;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const EXPECTED_TOOLS: [&str; 13] = [
    "glm_ask",
    "glm_summarize",
    "glm_explain",
    "glm_analyze",
    "glm_review",
    "glm_find_bugs",
    "glm_implement",
    "glm_refactor",
    "glm_write_tests",
    "glm_document",
    "glm_generate_readme",
    "glm_status",
    "glm_compare_costs",
];

#[test]
fn test_lists_all_tools_in_order() {
    let registry = registry(Arc::new(ScriptedBackend::new()));
    let schemas = registry.list_schemas();

    let names: Vec<_> = schemas.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, EXPECTED_TOOLS);

    for schema in &schemas {
        assert_eq!(schema.input_schema["type"], "object", "{}", schema.name);
        assert!(schema.annotations.is_some(), "{}", schema.name);
        assert!(!schema.description.is_empty(), "{}", schema.name);
    }
}

#[tokio::test]
async fn test_ask_delegates_with_tool_defaults() {
    let backend = Arc::new(ScriptedBackend::new().reply("Rayleigh scattering."));
    let registry = registry(backend.clone());

    let result = registry
        .call("glm_ask", json!({"question": "Why is the sky blue?"}))
        .await
        .unwrap();

    assert!(!result.is_error());
    assert_eq!(result.text_content(), "Rayleigh scattering.");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].prompt, "Why is the sky blue?");
    assert_eq!(requests[0].model.as_str(), "glm-4.5-air");
    assert_eq!(requests[0].temperature, 0.7);
    assert_eq!(requests[0].max_tokens, 2048);
    assert_eq!(requests[0].timeout, Some(Duration::from_secs(120)));
}

#[tokio::test]
async fn test_model_alias_resolution_is_lenient() {
    let backend = Arc::new(ScriptedBackend::new().reply("a").reply("b").reply("c"));
    let registry = registry(backend.clone());

    for model in ["opus", "gpt-4o", ""] {
        let result = registry
            .call("glm_explain", json!({"code_or_concept": "closures", "model": model}))
            .await
            .unwrap();
        assert!(!result.is_error());
    }

    let models: Vec<_> = backend
        .requests()
        .into_iter()
        .map(|r| r.model.as_str().to_string())
        .collect();
    assert_eq!(models, vec!["glm-4.7", "glm-4.5-air", "glm-4.5-air"]);
}

#[tokio::test]
async fn test_missing_parameter_never_reaches_backend() {
    let backend = Arc::new(ScriptedBackend::new());
    let registry = registry(backend.clone());

    let result = registry
        .call("glm_refactor", json!({"file_path": "src/lib.rs", "instructions": "   "}))
        .await
        .unwrap();

    assert!(result.is_error());
    assert!(result.text_content().contains("instructions"));
    let report = &result.structured_content.unwrap()["error"];
    assert_eq!(report["kind"], "validation_error");
    assert_eq!(report["field"], "instructions");
    assert_eq!(report["retryable"], false);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_transport_failure_is_reported_as_retryable() {
    let backend = Arc::new(
        ScriptedBackend::new().fail(GlmError::transport("connection refused", false)),
    );
    let registry = registry(backend.clone());

    let result = registry
        .call("glm_analyze", json!({"task": "Map the module graph"}))
        .await
        .unwrap();

    assert!(result.is_error());
    assert!(result.text_content().contains("connection refused"));
    let report = &result.structured_content.unwrap()["error"];
    assert_eq!(report["kind"], "transport_error");
    assert_eq!(report["retryable"], true);
    assert_eq!(backend.requests().len(), 1);
}

#[tokio::test]
async fn test_remote_error_carries_status() {
    let backend = Arc::new(ScriptedBackend::new().fail(GlmError::remote_api(
        503,
        Some("overloaded_error".to_string()),
        "Overloaded",
    )));
    let registry = registry(backend);

    let result = registry
        .call("glm_find_bugs", json!({"code_or_file": "fn main() {\n    let x = 1 / 0;\n}"}))
        .await
        .unwrap();

    assert!(result.is_error());
    let report = &result.structured_content.unwrap()["error"];
    assert_eq!(report["kind"], "remote_api_error");
    assert_eq!(report["status"], 503);
    assert_eq!(report["code"], "overloaded_error");
}

#[tokio::test]
async fn test_empty_completion_becomes_notice() {
    let backend = Arc::new(ScriptedBackend::new().reply("  \n"));
    let registry = registry(backend);

    let result = registry
        .call("glm_summarize", json!({"text": "Long meeting notes"}))
        .await
        .unwrap();

    assert!(!result.is_error());
    assert!(!result.text_content().trim().is_empty());
}

#[tokio::test]
async fn test_local_tools_make_no_backend_calls() {
    let backend = Arc::new(ScriptedBackend::new());
    let registry = registry(backend.clone());

    let status = registry.call("glm_status", json!({})).await.unwrap();
    assert!(!status.is_error());
    assert!(status.text_content().contains("Tools (13):"));
    assert_eq!(status.structured_content.unwrap()["tool_count"], 13);

    let costs = registry
        .call("glm_compare_costs", json!({"input_tokens": 50000, "output_tokens": 20000}))
        .await
        .unwrap();
    assert!(costs.text_content().contains("88.44%"));

    let negative = registry
        .call("glm_compare_costs", json!({"output_tokens": -3}))
        .await
        .unwrap();
    assert!(negative.is_error());

    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_missing_credential_is_configuration_error() {
    let backend = Arc::new(ScriptedBackend::new());
    let registry = ToolRegistry::with_defaults(Arc::new(Settings::default()), backend.clone());

    let result = registry.call("glm_ask", json!({"question": "hi"})).await.unwrap();

    assert!(result.is_error());
    assert!(result.text_content().contains("ZAI_API_KEY"));
    assert_eq!(result.structured_content.unwrap()["error"]["kind"], "configuration_error");
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_file_tools_embed_supplied_content() {
    let backend = Arc::new(ScriptedBackend::new().reply("/// Adds two numbers."));
    let registry = registry(backend.clone());

    let result = registry
        .call(
            "glm_document",
            json!({
                "file_path": "src/math.rs",
                "content": "pub fn add(a: i32, b: i32) -> i32 { a + b }"
            }),
        )
        .await
        .unwrap();
    assert!(!result.is_error());

    let request = &backend.requests()[0];
    assert!(request.prompt.contains("src/math.rs"));
    assert!(request.prompt.contains("pub fn add(a: i32, b: i32) -> i32 { a + b }"));
    assert_eq!(request.model.as_str(), "glm-4.5-air");
    assert_eq!(request.max_tokens, 8192);
}
