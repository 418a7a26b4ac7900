// Delegated tools: validate, assemble a prompt, resolve the model, complete

use crate::protocol::ToolSchema;
use crate::tools::{
    json_schema_enum, json_schema_integer, json_schema_number, json_schema_object, json_schema_string,
    AccessLevel, Tool, ToolOutput, ToolSummary,
};
use glm_core::completion::{validate_max_tokens, validate_temperature};
use glm_core::prompts::{
    self, AnalyzeParams, AskParams, DocStyle, DocumentParams, ExplainParams, FindBugsParams,
    GenerateReadmeParams, ImplementParams, PromptTemplate, ReadmeStyle, RefactorParams, ReviewFocus,
    ReviewParams, SummarizeParams, SummaryStyle, WriteTestsParams,
};
use glm_core::{CompletionBackend, CompletionRequest, GlmError, GlmResult, ModelAlias, Settings};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const EMPTY_COMPLETION: &str = "GLM completed with no output";

/// Static description of one delegated tool.
#[derive(Clone)]
pub struct DelegateSpec {
    pub name: &'static str,
    pub title: &'static str,
    pub summary: &'static str,
    pub description: &'static str,
    pub access: AccessLevel,
    pub default_tier: ModelAlias,
    pub temperature: f64,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Tool-specific argument schemas; sampling arguments are appended.
    pub properties: serde_json::Value,
    pub required: &'static [&'static str],
    pub assemble: fn(&serde_json::Value) -> GlmResult<String>,
}

impl DelegateSpec {
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.to_string(),
            summary: self.summary.to_string(),
            access: self.access.as_str(),
        }
    }

    fn input_schema(&self) -> serde_json::Value {
        let mut properties = self.properties.clone();
        if let Some(map) = properties.as_object_mut() {
            map.insert(
                "model".to_string(),
                json_schema_enum(
                    &["haiku", "sonnet", "opus"],
                    self.default_tier.host_name(),
                    "Model tier: \"haiku\" (fastest), \"sonnet\" (balanced) or \"opus\" (highest quality). Unknown values use the default.",
                ),
            );
            map.insert(
                "temperature".to_string(),
                json_schema_number(&format!(
                    "Sampling temperature between 0 and 1 (default: {})",
                    self.temperature
                )),
            );
            map.insert(
                "max_tokens".to_string(),
                json_schema_integer(&format!("Maximum output tokens (default: {})", self.max_tokens), 1),
            );
        }
        json_schema_object(properties, self.required)
    }
}

/// Arguments every delegated tool accepts on top of its own.
#[derive(Debug, Default, Deserialize)]
struct SamplingArgs {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    temperature: Option<f64>,
    #[serde(default)]
    max_tokens: Option<u32>,
}

impl SamplingArgs {
    fn parse(arguments: &serde_json::Value) -> GlmResult<Self> {
        if arguments.is_null() {
            return Ok(Self::default());
        }
        let args: Self = serde_json::from_value(arguments.clone())
            .map_err(|e| GlmError::validation("arguments", e.to_string()))?;
        if let Some(temperature) = args.temperature {
            validate_temperature(temperature)?;
        }
        if let Some(max_tokens) = args.max_tokens {
            validate_max_tokens(max_tokens)?;
        }
        Ok(args)
    }
}

/// A tool that forwards an assembled prompt to the completion backend.
pub struct DelegateTool {
    spec: DelegateSpec,
    settings: Arc<Settings>,
    backend: Arc<dyn CompletionBackend>,
}

impl DelegateTool {
    pub fn new(spec: DelegateSpec, settings: Arc<Settings>, backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            spec,
            settings,
            backend,
        }
    }

    /// Build the completion request for a call without sending it.
    pub fn prepare(&self, arguments: &serde_json::Value) -> GlmResult<CompletionRequest> {
        let sampling = SamplingArgs::parse(arguments)?;
        let prompt = (self.spec.assemble)(arguments)?;

        let tool_default = self.settings.models.model_for(self.spec.default_tier);
        let model = self
            .settings
            .models
            .resolve(sampling.model.as_deref(), tool_default);

        let request = CompletionRequest::new(prompt, model)
            .with_temperature(sampling.temperature.unwrap_or(self.spec.temperature))
            .with_max_tokens(sampling.max_tokens.unwrap_or(self.spec.max_tokens))
            .with_timeout(self.settings.api.timeout.unwrap_or(self.spec.timeout));
        request.validate()?;
        Ok(request)
    }
}

#[async_trait::async_trait]
impl Tool for DelegateTool {
    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.spec.name.to_string(),
            title: Some(self.spec.title.to_string()),
            description: format!(
                "{}\n\nAccess: {}. Default model: {}.",
                self.spec.description,
                self.spec.access.as_str(),
                self.spec.default_tier.host_name()
            ),
            input_schema: self.spec.input_schema(),
            annotations: Some(self.spec.access.annotations(true)),
        }
    }

    async fn execute(&self, arguments: serde_json::Value) -> GlmResult<ToolOutput> {
        let request = self.prepare(&arguments)?;
        self.settings.require_api_key()?;

        tracing::debug!(
            tool = self.spec.name,
            model = %request.model,
            temperature = request.temperature,
            max_tokens = request.max_tokens,
            "Delegating to remote model"
        );

        let result = self.backend.complete(request).await?;

        if result.text.trim().is_empty() {
            return Ok(ToolOutput::text(EMPTY_COMPLETION));
        }
        Ok(ToolOutput::text(result.text))
    }
}

fn working_directory_schema() -> serde_json::Value {
    json_schema_string("Project directory the request refers to")
}

fn content_schema() -> serde_json::Value {
    json_schema_string("Contents of the referenced file, already read by the host")
}

fn context_schema() -> serde_json::Value {
    json_schema_string("Supporting project context (file listings, key files) supplied by the host")
}

/// The delegated tools, in the order they are listed to the host.
pub fn catalog() -> Vec<DelegateSpec> {
    vec![
        DelegateSpec {
            name: "glm_ask",
            title: "Ask GLM",
            summary: "Quick questions (no tools)",
            description: "Quick question to GLM with a fast response. Use for explanations, analysis, brainstorming and quick answers. Pure generation with no file access; roughly ten times cheaper than the host model.",
            access: AccessLevel::None,
            default_tier: ModelAlias::Quick,
            temperature: 0.7,
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
            properties: json!({
                "question": json_schema_string("Your question or prompt"),
            }),
            required: AskParams::REQUIRED,
            assemble: prompts::assemble::<AskParams>,
        },
        DelegateSpec {
            name: "glm_summarize",
            title: "Summarize text",
            summary: "Summarize text",
            description: "Summarize text using GLM. Use for document summaries, meeting notes and code explanations.",
            access: AccessLevel::None,
            default_tier: ModelAlias::Quick,
            temperature: 0.3,
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
            properties: json!({
                "text": json_schema_string("The text to summarize"),
                "style": json_schema_enum(SummaryStyle::NAMES, "concise", "Summary style"),
            }),
            required: SummarizeParams::REQUIRED,
            assemble: prompts::assemble::<SummarizeParams>,
        },
        DelegateSpec {
            name: "glm_explain",
            title: "Explain code or a concept",
            summary: "Explain code/concepts",
            description: "Explain code or a concept using GLM. Use for understanding code, learning concepts and documentation.",
            access: AccessLevel::None,
            default_tier: ModelAlias::Quick,
            temperature: 0.3,
            max_tokens: 2048,
            timeout: Duration::from_secs(120),
            properties: json!({
                "code_or_concept": json_schema_string("Code snippet or concept to explain"),
                "context": json_schema_string("Additional context (e.g., language, framework)"),
            }),
            required: ExplainParams::REQUIRED,
            assemble: prompts::assemble::<ExplainParams>,
        },
        DelegateSpec {
            name: "glm_analyze",
            title: "Analyze a codebase",
            summary: "Analyze codebase (read-only)",
            description: "Analyze a codebase using GLM. Use for understanding code structure, finding patterns, architecture analysis and dependency mapping. Pass relevant file contents in `context`.",
            access: AccessLevel::ReadOnly,
            default_tier: ModelAlias::Balanced,
            temperature: 0.2,
            max_tokens: 4096,
            timeout: Duration::from_secs(300),
            properties: json!({
                "task": json_schema_string("Analysis task to perform"),
                "working_directory": working_directory_schema(),
                "context": context_schema(),
            }),
            required: AnalyzeParams::REQUIRED,
            assemble: prompts::assemble::<AnalyzeParams>,
        },
        DelegateSpec {
            name: "glm_review",
            title: "Code review",
            summary: "Code review",
            description: "Code review by GLM. Use for security review, performance analysis and best practices. Accepts inline code, or a file path with its contents in `content`.",
            access: AccessLevel::ReadOnly,
            default_tier: ModelAlias::Balanced,
            temperature: 0.2,
            max_tokens: 4096,
            timeout: Duration::from_secs(300),
            properties: json!({
                "code_or_file": json_schema_string("Inline code or file path to review"),
                "review_focus": json_schema_enum(ReviewFocus::NAMES, "general", "What the review should concentrate on"),
                "working_directory": working_directory_schema(),
                "content": content_schema(),
            }),
            required: ReviewParams::REQUIRED,
            assemble: prompts::assemble::<ReviewParams>,
        },
        DelegateSpec {
            name: "glm_find_bugs",
            title: "Find bugs",
            summary: "Find potential bugs",
            description: "Find potential bugs in code using GLM. Use for bug detection, edge case analysis and error-prone patterns.",
            access: AccessLevel::ReadOnly,
            default_tier: ModelAlias::Balanced,
            temperature: 0.1,
            max_tokens: 4096,
            timeout: Duration::from_secs(300),
            properties: json!({
                "code_or_file": json_schema_string("Inline code or file path to analyze"),
                "working_directory": working_directory_schema(),
                "content": content_schema(),
            }),
            required: FindBugsParams::REQUIRED,
            assemble: prompts::assemble::<FindBugsParams>,
        },
        DelegateSpec {
            name: "glm_implement",
            title: "Implement a change",
            summary: "Implementation tasks (write)",
            description: "Implementation task for GLM: writing code, creating files, making changes. Returns the proposed code and changes for the host to apply.",
            access: AccessLevel::Write,
            default_tier: ModelAlias::Balanced,
            temperature: 0.2,
            max_tokens: 8192,
            timeout: Duration::from_secs(600),
            properties: json!({
                "task": json_schema_string("Implementation task to perform"),
                "working_directory": json_schema_string("Project directory (required)"),
                "context": context_schema(),
            }),
            required: ImplementParams::REQUIRED,
            assemble: prompts::assemble::<ImplementParams>,
        },
        DelegateSpec {
            name: "glm_refactor",
            title: "Refactor a file",
            summary: "Refactor code",
            description: "Refactor code using GLM. Use for improving code structure, applying patterns and cleanup. Returns the refactored code and an explanation.",
            access: AccessLevel::Write,
            default_tier: ModelAlias::Balanced,
            temperature: 0.2,
            max_tokens: 8192,
            timeout: Duration::from_secs(600),
            properties: json!({
                "file_path": json_schema_string("Path to the file to refactor"),
                "instructions": json_schema_string("Refactoring instructions"),
                "working_directory": working_directory_schema(),
                "content": content_schema(),
            }),
            required: RefactorParams::REQUIRED,
            assemble: prompts::assemble::<RefactorParams>,
        },
        DelegateSpec {
            name: "glm_write_tests",
            title: "Write unit tests",
            summary: "Generate unit tests",
            description: "Generate unit tests for a file using GLM. Use for test generation, coverage improvement and TDD support.",
            access: AccessLevel::Write,
            default_tier: ModelAlias::Balanced,
            temperature: 0.2,
            max_tokens: 8192,
            timeout: Duration::from_secs(600),
            properties: json!({
                "file_path": json_schema_string("Path to the file to test"),
                "test_framework": {
                    "type": "string",
                    "default": "pytest",
                    "description": "Test framework, e.g. \"pytest\", \"jest\", \"vitest\", \"unittest\""
                },
                "working_directory": working_directory_schema(),
                "content": content_schema(),
            }),
            required: WriteTestsParams::REQUIRED,
            assemble: prompts::assemble::<WriteTestsParams>,
        },
        DelegateSpec {
            name: "glm_document",
            title: "Document a file",
            summary: "Add documentation",
            description: "Add or update documentation for a file using GLM. Use for adding docstrings and documenting APIs.",
            access: AccessLevel::Write,
            default_tier: ModelAlias::Quick,
            temperature: 0.3,
            max_tokens: 8192,
            timeout: Duration::from_secs(300),
            properties: json!({
                "file_path": json_schema_string("Path to the file to document"),
                "style": json_schema_enum(DocStyle::NAMES, "google", "Documentation style"),
                "working_directory": working_directory_schema(),
                "content": content_schema(),
            }),
            required: DocumentParams::REQUIRED,
            assemble: prompts::assemble::<DocumentParams>,
        },
        DelegateSpec {
            name: "glm_generate_readme",
            title: "Generate a README",
            summary: "Generate README.md",
            description: "Generate a README.md for a project using GLM. Use for creating project documentation and onboarding. Pass the project layout and key files in `context`.",
            access: AccessLevel::Write,
            default_tier: ModelAlias::Balanced,
            temperature: 0.5,
            max_tokens: 4096,
            timeout: Duration::from_secs(600),
            properties: json!({
                "working_directory": json_schema_string("Project directory (required)"),
                "style": json_schema_enum(ReadmeStyle::NAMES, "standard", "README style"),
                "context": context_schema(),
            }),
            required: GenerateReadmeParams::REQUIRED,
            assemble: prompts::assemble::<GenerateReadmeParams>,
        },
    ]
}
