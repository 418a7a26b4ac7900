//! Server settings.
//!
//! Settings are assembled once at startup from an optional TOML file and the
//! process environment, then shared read-only. Environment lookup is passed
//! in as a closure so nothing here reads or mutates global state.

use crate::error::{GlmError, GlmResult};
use crate::models::ModelTable;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://api.z.ai/api/anthropic";
pub const SERVER_NAME: &str = "glm-agent";

pub const ENV_API_KEY: &str = "ZAI_API_KEY";
pub const ENV_BASE_URL: &str = "ZAI_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "GLM_MCP_TIMEOUT_SECS";

/// Bearer credential for the remote API. Never printed in full.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Masked form safe to show to the host, e.g. `sk-a...wxyz`.
    pub fn hint(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() < 12 {
            return "****".to_string();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(****)")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

/// Remote endpoint settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSettings {
    /// Always ends with `/` so relative joins append rather than replace.
    pub base_url: Url,
    pub api_key: Option<ApiKey>,
    /// Overrides every tool's default request timeout when set.
    pub timeout: Option<Duration>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: normalize_base_url(DEFAULT_BASE_URL).expect("default base URL is valid"),
            api_key: None,
            timeout: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Settings {
    pub api: ApiSettings,
    pub models: ModelTable,
}

/// On-disk shape of `glm-mcp.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    #[serde(default)]
    api: FileApiConfig,

    #[serde(default)]
    models: ModelTable,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileApiConfig {
    #[serde(default)]
    base_url: Option<String>,

    #[serde(default)]
    api_key: Option<ApiKey>,

    #[serde(default)]
    timeout_secs: Option<u64>,
}

impl Settings {
    /// Load the TOML file at `config_path` when it exists, then apply
    /// environment overrides.
    pub fn load<F>(config_path: &Path, env: F) -> GlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let settings = if config_path.exists() {
            let content = std::fs::read_to_string(config_path).map_err(|e| {
                GlmError::configuration(format!(
                    "Failed to read configuration file {}: {}",
                    config_path.display(),
                    e
                ))
            })?;
            tracing::info!(path = %config_path.display(), "Loaded configuration file");
            Self::from_toml_str(&content)?
        } else {
            tracing::debug!(path = %config_path.display(), "Configuration file not found, using defaults");
            Self::default()
        };

        settings.with_env(env)
    }

    pub fn from_toml_str(content: &str) -> GlmResult<Self> {
        let file: FileConfig = toml::from_str(content)
            .map_err(|e| GlmError::configuration(format!("Failed to parse configuration file: {}", e)))?;

        let base_url = match file.api.base_url.as_deref() {
            Some(raw) => normalize_base_url(raw)?,
            None => ApiSettings::default().base_url,
        };

        Ok(Self {
            api: ApiSettings {
                base_url,
                api_key: file.api.api_key.filter(|k| !k.expose().trim().is_empty()),
                timeout: timeout_from_secs(file.api.timeout_secs)?,
            },
            models: file.models,
        })
    }

    /// Environment values win over the file. Blank values are ignored.
    pub fn with_env<F>(mut self, env: F) -> GlmResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |name: &str| env(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(key) = lookup(ENV_API_KEY) {
            self.api.api_key = Some(ApiKey::new(key));
        }
        if let Some(url) = lookup(ENV_BASE_URL) {
            self.api.base_url = normalize_base_url(&url)?;
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            let secs = secs.parse::<u64>().map_err(|_| {
                GlmError::configuration(format!("{} must be a whole number of seconds, got {:?}", ENV_TIMEOUT_SECS, secs))
            })?;
            self.api.timeout = timeout_from_secs(Some(secs))?;
        }

        Ok(self)
    }

    /// The credential, or a configuration error telling the user how to set it.
    pub fn require_api_key(&self) -> GlmResult<&ApiKey> {
        self.api.api_key.as_ref().ok_or_else(|| {
            GlmError::configuration(format!(
                "{} not configured. Get a key from https://z.ai/subscribe and set it in the environment, a .env file, or [api] api_key in the config file",
                ENV_API_KEY
            ))
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api.api_key.is_some()
    }
}

fn timeout_from_secs(secs: Option<u64>) -> GlmResult<Option<Duration>> {
    match secs {
        Some(0) => Err(GlmError::configuration("timeout must be at least one second")),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Ok(None),
    }
}

/// Parse a base URL and make sure its path ends with a slash.
pub fn normalize_base_url(raw: &str) -> GlmResult<Url> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| GlmError::configuration(format!("Invalid base URL {:?}: {}", raw, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(GlmError::configuration(format!(
            "Base URL must use http or https, got {}",
            url.scheme()
        )));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RemoteModelId;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.api.base_url.as_str(), "https://api.z.ai/api/anthropic/");
        assert!(settings.api.api_key.is_none());
        assert!(settings.api.timeout.is_none());
        assert_eq!(settings.models, ModelTable::default());
    }

    #[test]
    fn test_parse_file() {
        let settings = Settings::from_toml_str(
            r#"
            [api]
            base_url = "http://localhost:9000/anthropic"
            api_key = "from-file-key-123456"
            timeout_secs = 45

            [models]
            opus = "glm-5"
            "#,
        )
        .unwrap();

        assert_eq!(settings.api.base_url.as_str(), "http://localhost:9000/anthropic/");
        assert_eq!(settings.api.api_key.as_ref().unwrap().expose(), "from-file-key-123456");
        assert_eq!(settings.api.timeout, Some(Duration::from_secs(45)));
        assert_eq!(settings.models.opus, RemoteModelId::new("glm-5"));
        assert_eq!(settings.models.haiku, RemoteModelId::new("glm-4.5-air"));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        let err = Settings::from_toml_str("[api]\nbase_uri = \"x\"\n").unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
    }

    #[test]
    fn test_env_overrides_file() {
        let settings = Settings::from_toml_str("[api]\napi_key = \"file-key\"\n")
            .unwrap()
            .with_env(env_from(&[
                (ENV_API_KEY, "env-key"),
                (ENV_BASE_URL, "https://proxy.example.com/v2"),
                (ENV_TIMEOUT_SECS, "30"),
            ]))
            .unwrap();

        assert_eq!(settings.api.api_key.unwrap().expose(), "env-key");
        assert_eq!(settings.api.base_url.as_str(), "https://proxy.example.com/v2/");
        assert_eq!(settings.api.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_blank_env_values_ignored() {
        let settings = Settings::default()
            .with_env(env_from(&[(ENV_API_KEY, "   ")]))
            .unwrap();
        assert!(!settings.has_api_key());
    }

    #[test]
    fn test_bad_timeout_env() {
        let err = Settings::default()
            .with_env(env_from(&[(ENV_TIMEOUT_SECS, "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        let err = Settings::default()
            .with_env(env_from(&[(ENV_TIMEOUT_SECS, "0")]))
            .unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
    }

    #[test]
    fn test_missing_key_is_configuration_error() {
        let err = Settings::default().require_api_key().unwrap_err();
        assert_eq!(err.kind(), "configuration_error");
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(&dir.path().join("absent.toml"), env_from(&[])).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_load_file_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("glm-mcp.toml");
        std::fs::write(&path, "[models]\nhaiku = \"glm-4.6-flash\"\n").unwrap();

        let settings = Settings::load(&path, env_from(&[(ENV_API_KEY, "k")])).unwrap();
        assert_eq!(settings.models.haiku.as_str(), "glm-4.6-flash");
        assert!(settings.has_api_key());
    }

    #[test]
    fn test_base_url_validation() {
        assert!(normalize_base_url("ftp://example.com").is_err());
        assert!(normalize_base_url("not a url").is_err());
        assert_eq!(
            normalize_base_url("https://example.com").unwrap().as_str(),
            "https://example.com/"
        );
    }

    #[test]
    fn test_api_key_never_printed() {
        let key = ApiKey::new("sk-abcdefghijklmnop");
        assert_eq!(format!("{:?}", key), "ApiKey(****)");
        assert_eq!(key.to_string(), "****");
        assert_eq!(key.hint(), "sk-a...mnop");
        assert_eq!(ApiKey::new("short").hint(), "****");
    }
}
