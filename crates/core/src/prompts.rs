//! Prompt templates for the delegated tools.
//!
//! Each tool has a parameter struct implementing [`PromptTemplate`]. Rendering
//! is plain string interpolation: no I/O, and identical parameters always give
//! an identical prompt. File contents, when a template wants them, arrive
//! already read by the host in a `content` argument.

use crate::error::{GlmError, GlmResult};
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Inline code shorter than this and without newlines is treated as a path.
const PATH_HEURISTIC_MAX_LEN: usize = 200;

/// A tool's typed parameters plus the instruction template they fill.
pub trait PromptTemplate: DeserializeOwned {
    /// Argument names that must be present and non-blank.
    const REQUIRED: &'static [&'static str];

    /// Extra checks beyond presence; runs after deserialization.
    fn validate(&self) -> GlmResult<()> {
        Ok(())
    }

    fn render(&self) -> String;
}

/// Validate raw tool arguments and build the prompt.
pub fn assemble<T: PromptTemplate>(arguments: &serde_json::Value) -> GlmResult<String> {
    Ok(parse::<T>(arguments)?.render())
}

/// Validate raw tool arguments into `T` without rendering.
pub fn parse<T: PromptTemplate>(arguments: &serde_json::Value) -> GlmResult<T> {
    let empty = serde_json::Map::new();
    let map = match arguments {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => &empty,
        other => {
            return Err(GlmError::validation(
                "arguments",
                format!("expected an object, got {}", json_type_name(other)),
            ))
        }
    };

    for field in T::REQUIRED {
        match map.get(*field) {
            None | Some(serde_json::Value::Null) => return Err(GlmError::missing(*field)),
            Some(serde_json::Value::String(s)) if s.trim().is_empty() => {
                return Err(GlmError::missing(*field))
            }
            Some(serde_json::Value::String(_)) => {}
            Some(other) => {
                return Err(GlmError::validation(
                    *field,
                    format!("expected a string, got {}", json_type_name(other)),
                ))
            }
        }
    }

    let params: T = serde_json::from_value(serde_json::Value::Object(map.clone()))
        .map_err(|e| GlmError::validation("arguments", e.to_string()))?;
    params.validate()?;
    Ok(params)
}

fn json_type_name(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "boolean",
        serde_json::Value::Number(_) => "number",
        serde_json::Value::String(_) => "string",
        serde_json::Value::Array(_) => "array",
        serde_json::Value::Object(_) => "object",
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Wrap text in a code fence longer than any backtick run inside it.
fn fenced(body: &str) -> String {
    let mut longest = 0;
    let mut run = 0;
    for ch in body.chars() {
        if ch == '`' {
            run += 1;
            longest = longest.max(run);
        } else {
            run = 0;
        }
    }
    let fence = "`".repeat(longest.max(2) + 1);
    format!("{fence}\n{body}\n{fence}")
}

/// Trailing sections shared by the file-oriented templates.
fn file_sections(working_directory: &Option<String>, content: &Option<String>) -> String {
    let mut out = String::new();
    if let Some(dir) = non_blank(working_directory) {
        out.push_str(&format!("\n\nWorking directory: {}", dir));
    }
    match content.as_deref().filter(|c| !c.trim().is_empty()) {
        Some(content) => out.push_str(&format!("\n\nFile contents:\n{}", fenced(content))),
        None => out.push_str("\n\nThe file contents were not included with this request."),
    }
    out
}

fn context_section(heading: &str, context: &Option<String>) -> String {
    match non_blank(context) {
        Some(context) => format!("\n\n{}:\n{}", heading, context),
        None => String::new(),
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AskParams {
    pub question: String,
}

impl PromptTemplate for AskParams {
    const REQUIRED: &'static [&'static str] = &["question"];

    fn render(&self) -> String {
        self.question.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryStyle {
    Concise,
    Detailed,
    BulletPoints,
    Executive,
}

impl SummaryStyle {
    pub const NAMES: &'static [&'static str] = &["concise", "detailed", "bullet-points", "executive"];

    /// Unknown styles fall back to `concise`.
    pub fn parse(style: Option<&str>) -> Self {
        match style.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("detailed") => Self::Detailed,
            Some("bullet-points") | Some("bullets") => Self::BulletPoints,
            Some("executive") => Self::Executive,
            _ => Self::Concise,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::Concise => "Summarize this concisely in 2-3 sentences:",
            Self::Detailed => "Provide a detailed summary:",
            Self::BulletPoints => "Summarize as bullet points:",
            Self::Executive => "Executive summary - key insights only:",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SummarizeParams {
    pub text: String,
    #[serde(default)]
    pub style: Option<String>,
}

impl PromptTemplate for SummarizeParams {
    const REQUIRED: &'static [&'static str] = &["text"];

    fn render(&self) -> String {
        let style = SummaryStyle::parse(self.style.as_deref());
        format!("{}\n\n{}", style.instruction(), self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExplainParams {
    pub code_or_concept: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl PromptTemplate for ExplainParams {
    const REQUIRED: &'static [&'static str] = &["code_or_concept"];

    fn render(&self) -> String {
        match non_blank(&self.context) {
            Some(context) => format!("Explain this: {}:\n\n{}", context, self.code_or_concept),
            None => format!("Explain this:\n\n{}", self.code_or_concept),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AnalyzeParams {
    pub task: String,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl PromptTemplate for AnalyzeParams {
    const REQUIRED: &'static [&'static str] = &["task"];

    fn render(&self) -> String {
        let mut prompt = self.task.clone();
        if let Some(dir) = non_blank(&self.working_directory) {
            prompt.push_str(&format!("\n\nProject directory: {}", dir));
        }
        prompt.push_str(&context_section("Project context", &self.context));
        prompt
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewFocus {
    General,
    Security,
    Performance,
    Style,
    Bugs,
    Refactor,
}

impl ReviewFocus {
    pub const NAMES: &'static [&'static str] =
        &["general", "security", "performance", "style", "bugs", "refactor"];

    /// Unknown focus values fall back to `general`.
    pub fn parse(focus: Option<&str>) -> Self {
        match focus.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("security") => Self::Security,
            Some("performance") => Self::Performance,
            Some("style") => Self::Style,
            Some("bugs") => Self::Bugs,
            Some("refactor") => Self::Refactor,
            _ => Self::General,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::General => "Review this code for clarity, correctness, and best practices.",
            Self::Security => "Security audit: find vulnerabilities, injection risks, auth issues.",
            Self::Performance => "Performance review: find bottlenecks, inefficiencies.",
            Self::Style => "Style review: naming, formatting, documentation.",
            Self::Bugs => "Bug hunt: find logic errors, edge cases, potential crashes.",
            Self::Refactor => "Refactoring suggestions: improve code structure.",
        }
    }
}

/// `true` when `code_or_file` reads as a file reference rather than code.
pub fn looks_like_path(code_or_file: &str) -> bool {
    !code_or_file.contains('\n') && code_or_file.chars().count() < PATH_HEURISTIC_MAX_LEN
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReviewParams {
    pub code_or_file: String,
    #[serde(default)]
    pub review_focus: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl ReviewParams {
    pub fn is_file_reference(&self) -> bool {
        looks_like_path(&self.code_or_file)
    }
}

impl PromptTemplate for ReviewParams {
    const REQUIRED: &'static [&'static str] = &["code_or_file"];

    fn render(&self) -> String {
        let focus = ReviewFocus::parse(self.review_focus.as_deref()).instruction();

        if self.is_file_reference() {
            format!(
                "{}\n\nFile to review: {}{}",
                focus,
                self.code_or_file.trim(),
                file_sections(&self.working_directory, &self.content)
            )
        } else {
            format!("{}\n\nCode to review:\n{}", focus, fenced(&self.code_or_file))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FindBugsParams {
    pub code_or_file: String,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl FindBugsParams {
    fn as_review(&self) -> ReviewParams {
        ReviewParams {
            code_or_file: self.code_or_file.clone(),
            review_focus: Some("bugs".to_string()),
            working_directory: self.working_directory.clone(),
            content: self.content.clone(),
        }
    }
}

impl PromptTemplate for FindBugsParams {
    const REQUIRED: &'static [&'static str] = &["code_or_file"];

    fn render(&self) -> String {
        self.as_review().render()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ImplementParams {
    pub task: String,
    pub working_directory: String,
    #[serde(default)]
    pub context: Option<String>,
}

impl PromptTemplate for ImplementParams {
    const REQUIRED: &'static [&'static str] = &["task", "working_directory"];

    fn render(&self) -> String {
        format!(
            "{}\n\nProject directory: {}{}",
            self.task,
            self.working_directory.trim(),
            context_section("Project context", &self.context)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RefactorParams {
    pub file_path: String,
    pub instructions: String,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl PromptTemplate for RefactorParams {
    const REQUIRED: &'static [&'static str] = &["file_path", "instructions"];

    fn render(&self) -> String {
        format!(
            "Refactor the file at {}.\n\n\
             Instructions: {}\n\n\
             1. Apply the refactoring\n\
             2. Return the complete refactored code\n\
             3. Explain the changes made{}",
            self.file_path.trim(),
            self.instructions,
            file_sections(&self.working_directory, &self.content)
        )
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WriteTestsParams {
    pub file_path: String,
    #[serde(default)]
    pub test_framework: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl PromptTemplate for WriteTestsParams {
    const REQUIRED: &'static [&'static str] = &["file_path"];

    fn render(&self) -> String {
        let framework = non_blank(&self.test_framework).unwrap_or("pytest");
        format!(
            "Generate comprehensive unit tests for {}.\n\n\
             Test framework: {}\n\n\
             1. Generate tests covering:\n   \
             - Happy path cases\n   \
             - Edge cases\n   \
             - Error handling\n\
             2. Return the complete test file{}",
            self.file_path.trim(),
            framework,
            file_sections(&self.working_directory, &self.content)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocStyle {
    Google,
    Sphinx,
    NumPy,
    Javadoc,
    Standard,
}

impl DocStyle {
    pub const NAMES: &'static [&'static str] = &["google", "sphinx", "numpy", "javadoc"];

    /// Absent means `google`; anything unrecognized means plain "standard".
    pub fn parse(style: Option<&str>) -> Self {
        match style.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("google") => Self::Google,
            Some("sphinx") => Self::Sphinx,
            Some("numpy") => Self::NumPy,
            Some("javadoc") => Self::Javadoc,
            Some(_) => Self::Standard,
        }
    }

    fn guide(&self) -> &'static str {
        match self {
            Self::Google => "Google style docstrings",
            Self::Sphinx => "Sphinx/reStructuredText style",
            Self::NumPy => "NumPy style docstrings",
            Self::Javadoc => "Javadoc style comments",
            Self::Standard => "standard",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DocumentParams {
    pub file_path: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub working_directory: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

impl PromptTemplate for DocumentParams {
    const REQUIRED: &'static [&'static str] = &["file_path"];

    fn render(&self) -> String {
        format!(
            "Add documentation to {}.\n\n\
             Documentation style: {}\n\n\
             1. Add appropriate docstrings to functions/classes\n\
             2. Add inline comments where needed\n\
             3. Return the complete documented file{}",
            self.file_path.trim(),
            DocStyle::parse(self.style.as_deref()).guide(),
            file_sections(&self.working_directory, &self.content)
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadmeStyle {
    Standard,
    Comprehensive,
    Minimal,
}

impl ReadmeStyle {
    pub const NAMES: &'static [&'static str] = &["standard", "comprehensive", "minimal"];

    /// Unknown styles fall back to `standard`.
    pub fn parse(style: Option<&str>) -> Self {
        match style.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("comprehensive") => Self::Comprehensive,
            Some("minimal") => Self::Minimal,
            _ => Self::Standard,
        }
    }

    fn instruction(&self) -> &'static str {
        match self {
            Self::Standard => "Include: description, installation, usage, license",
            Self::Comprehensive => {
                "Include: badges, description, features, installation, usage, API docs, contributing, license"
            }
            Self::Minimal => "Brief description and quick start only",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GenerateReadmeParams {
    pub working_directory: String,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

impl PromptTemplate for GenerateReadmeParams {
    const REQUIRED: &'static [&'static str] = &["working_directory"];

    fn render(&self) -> String {
        format!(
            "Generate a README.md for this project.\n\n\
             Style: {}\n\n\
             Project directory: {}\n\n\
             1. Work from the project structure and key files described below\n\
             2. Generate an appropriate README.md\n\
             3. Return the README.md content in full{}",
            ReadmeStyle::parse(self.style.as_deref()).instruction(),
            self.working_directory.trim(),
            context_section("Project context", &self.context)
        )
    }
}
