mod costs;
mod delegate;
mod registry;
mod status;

pub use costs::{CompareCostsTool, COMPARE_COSTS_TOOL};
pub use delegate::{catalog, DelegateSpec, DelegateTool};
pub use registry::{
    error_result, json_schema_enum, json_schema_integer, json_schema_number, json_schema_object,
    json_schema_string, AccessLevel, Tool, ToolOutput, ToolRegistry, ToolSummary,
};
pub use status::{StatusReport, StatusTool, STATUS_TOOL};

use glm_core::{CompletionBackend, PriceTable, Settings};
use std::sync::Arc;

impl ToolRegistry {
    /// The full tool set: every delegated tool, then the two local ones.
    pub fn with_defaults(settings: Arc<Settings>, backend: Arc<dyn CompletionBackend>) -> Self {
        let prices = PriceTable::default();
        let specs = catalog();

        let mut summaries: Vec<ToolSummary> = specs.iter().map(|s| s.summary()).collect();
        summaries.push(StatusTool::summary());
        summaries.push(CompareCostsTool::summary());

        let mut registry = Self::new();
        for spec in specs {
            registry.register(Arc::new(DelegateTool::new(spec, settings.clone(), backend.clone())));
        }
        registry.register(Arc::new(StatusTool::new(settings, prices, summaries)));
        registry.register(Arc::new(CompareCostsTool::new(prices)));
        registry
    }
}
