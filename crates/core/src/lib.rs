// Core types for the GLM delegation server: settings, errors, model
// resolution, prompt templates and pricing.

pub mod completion;
pub mod config;
pub mod error;
pub mod models;
pub mod pricing;
pub mod prompts;

pub use completion::{CompletionBackend, CompletionRequest, CompletionResult, Usage};
pub use config::{ApiKey, ApiSettings, Settings};
pub use error::{ErrorReport, GlmError, GlmResult};
pub use models::{ModelAlias, ModelTable, RemoteModelId};
pub use pricing::{CostComparison, PriceTable};
