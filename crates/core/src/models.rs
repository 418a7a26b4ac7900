// Model tier aliases and their mapping onto remote model identifiers

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier understood by the remote API (e.g. `glm-4.7`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteModelId(pub String);

impl RemoteModelId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RemoteModelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Model tier requested by the caller.
///
/// Hosts know the tiers by their own names (`haiku`, `sonnet`, `opus`); the
/// neutral names are accepted as well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelAlias {
    #[serde(rename = "haiku")]
    Quick,
    #[serde(rename = "sonnet")]
    Balanced,
    #[serde(rename = "opus")]
    HighQuality,
}

impl ModelAlias {
    pub const ALL: [ModelAlias; 3] = [Self::Quick, Self::Balanced, Self::HighQuality];

    /// Parse a caller-supplied alias; `None` for anything unrecognized.
    pub fn parse(alias: &str) -> Option<Self> {
        match alias.trim().to_ascii_lowercase().as_str() {
            "haiku" | "quick" => Some(Self::Quick),
            "sonnet" | "balanced" => Some(Self::Balanced),
            "opus" | "high-quality" | "high_quality" => Some(Self::HighQuality),
            _ => None,
        }
    }

    /// Name the host uses for this tier.
    pub fn host_name(&self) -> &'static str {
        match self {
            Self::Quick => "haiku",
            Self::Balanced => "sonnet",
            Self::HighQuality => "opus",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Quick => "fast, lightweight",
            Self::Balanced => "balanced",
            Self::HighQuality => "highest quality",
        }
    }
}

impl fmt::Display for ModelAlias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.host_name())
    }
}

/// Alias-to-model table. Each entry can be overridden from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelTable {
    #[serde(default = "default_haiku_model")]
    pub haiku: RemoteModelId,

    #[serde(default = "default_sonnet_model")]
    pub sonnet: RemoteModelId,

    #[serde(default = "default_opus_model")]
    pub opus: RemoteModelId,
}

fn default_haiku_model() -> RemoteModelId {
    RemoteModelId::new("glm-4.5-air")
}

fn default_sonnet_model() -> RemoteModelId {
    RemoteModelId::new("glm-4.7")
}

fn default_opus_model() -> RemoteModelId {
    RemoteModelId::new("glm-4.7")
}

impl Default for ModelTable {
    fn default() -> Self {
        Self {
            haiku: default_haiku_model(),
            sonnet: default_sonnet_model(),
            opus: default_opus_model(),
        }
    }
}

impl ModelTable {
    /// Remote model serving the given tier.
    pub fn model_for(&self, alias: ModelAlias) -> &RemoteModelId {
        match alias {
            ModelAlias::Quick => &self.haiku,
            ModelAlias::Balanced => &self.sonnet,
            ModelAlias::HighQuality => &self.opus,
        }
    }

    /// Resolve a caller-supplied alias.
    ///
    /// Absent, blank and unrecognized aliases all yield `tool_default`;
    /// delegation never fails over an unfamiliar model name.
    pub fn resolve(&self, alias: Option<&str>, tool_default: &RemoteModelId) -> RemoteModelId {
        let Some(alias) = alias.map(str::trim).filter(|a| !a.is_empty()) else {
            return tool_default.clone();
        };

        match ModelAlias::parse(alias) {
            Some(tier) => self.model_for(tier).clone(),
            None => {
                tracing::debug!(alias, fallback = %tool_default, "Unknown model alias, using tool default");
                tool_default.clone()
            }
        }
    }

    /// `(alias, model)` pairs in tier order.
    pub fn entries(&self) -> Vec<(ModelAlias, &RemoteModelId)> {
        ModelAlias::ALL
            .iter()
            .map(|alias| (*alias, self.model_for(*alias)))
            .collect()
    }
}
