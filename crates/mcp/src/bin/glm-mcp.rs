// GLM delegation MCP server (stdio)

use anyhow::{Context, Result};
use clap::Parser;
use glm_client::ZaiClient;
use glm_core::{CompletionBackend, Settings};
use glm_mcp::{McpServer, ToolRegistry};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

const DEFAULT_LOG_FILTER: &str = "glm_mcp=info,glm_client=info,glm_core=info";

#[derive(Parser, Debug)]
#[command(name = "glm-mcp")]
#[command(about = "MCP server that delegates coding tasks to Z.ai GLM models", long_about = None)]
#[command(version)]
struct Args {
    /// Path to configuration file (skipped when absent)
    #[arg(short, long, env = "GLM_MCP_CONFIG", default_value = "glm-mcp.toml")]
    config: PathBuf,

    /// Dotenv file to read credentials from (skipped when absent)
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries the protocol; logs go to stderr only.
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into());
    if args.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .init();
    }

    tracing::info!("GLM MCP server starting");

    let dotenv = read_env_file(&args.env_file)?;
    let settings = Settings::load(&args.config, |name| {
        std::env::var(name).ok().or_else(|| dotenv.get(name).cloned())
    })
    .context("Failed to load configuration")?;

    settings
        .require_api_key()
        .context("Refusing to start without a Z.ai API key")?;

    tracing::info!(
        base_url = %settings.api.base_url,
        timeout_secs = settings.api.timeout.map(|t| t.as_secs()),
        "Configuration loaded"
    );

    let instructions = usage_instructions(&settings);
    let settings = Arc::new(settings);
    let backend: Arc<dyn CompletionBackend> =
        Arc::new(ZaiClient::new(&settings.api).context("Failed to build HTTP client")?);

    let registry = ToolRegistry::with_defaults(settings, backend);
    tracing::info!("Registered {} tools", registry.len());

    McpServer::new(registry)
        .with_instructions(instructions)
        .start()
        .await
}

/// Key/value pairs from a dotenv file. A missing file yields nothing.
fn read_env_file(path: &Path) -> Result<HashMap<String, String>> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => return Err(e).with_context(|| format!("Failed to open {}", path.display())),
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.with_context(|| format!("Failed to parse {}", path.display()))?;
        vars.insert(key, value);
    }
    tracing::debug!(path = %path.display(), count = vars.len(), "Read env file");
    Ok(vars)
}

fn usage_instructions(settings: &Settings) -> String {
    let mut text = String::from(
        "Delegates coding tasks to Z.ai GLM models at a fraction of the host model's cost.\n\n\
         Available models:\n",
    );
    for (alias, model) in settings.models.entries() {
        text.push_str(&format!("- {} ({}): {}\n", alias, model, alias.label()));
    }
    text.push_str(
        "\nUse haiku for quick tasks and sonnet or opus for complex ones. \
         File-based tools do not read the filesystem: pass file contents in `content` \
         or project context in `context`. Call glm_status to check configuration.",
    );
    text
}
