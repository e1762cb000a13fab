//! Shared helpers used across multiple subcommands.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use payroll_agent::config::env_non_empty;
use payroll_agent::{AssistantConfig, ChatModel, LlmClient};
use payroll_core::Employee;
use tracing::info;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Tracing
// ---------------------------------------------------------------------------

/// Initialise the tracing subscriber with the given default log level.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Load `.env` (if present), then the layered assistant configuration.
pub fn load_config(path: Option<&Path>) -> Result<AssistantConfig> {
    if let Ok(env_path) = dotenvy::dotenv() {
        info!(path = %env_path.display(), "loaded .env");
    }
    AssistantConfig::load(path).context("failed to load configuration")
}

/// Build the LLM client for `config`.
pub fn build_model(config: &AssistantConfig) -> Result<Arc<dyn ChatModel>> {
    let client_config = config
        .client_config(env_non_empty)
        .context("no LLM provider configured")?;
    let provider = client_config.provider.as_str();
    let model = client_config.default_model.clone();
    let client = LlmClient::new(client_config).context("failed to create LLM client")?;
    info!(provider, default_model = %model, "LLM client ready");
    Ok(Arc::new(client))
}

// ---------------------------------------------------------------------------
// Files
// ---------------------------------------------------------------------------

/// Read an employee snapshot: either a bare JSON array of employees or an
/// object with an `employees` array (such as an exported report).
pub fn load_employees(path: &Path) -> Result<Vec<Employee>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    parse_employees(&content).with_context(|| format!("invalid employee file {}", path.display()))
}

fn parse_employees(content: &str) -> Result<Vec<Employee>> {
    let value: serde_json::Value = serde_json::from_str(content)?;
    let list = match value {
        serde_json::Value::Object(mut map) => map
            .remove("employees")
            .context("object has no `employees` array")?,
        other => other,
    };
    let employees: Vec<Employee> = serde_json::from_value(list)?;
    for e in &employees {
        e.validate()?;
    }
    Ok(employees)
}

/// Media type for an upload, from its file extension.
pub fn media_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        "csv" => "text/csv",
        "json" => "application/json",
        "md" | "markdown" => "text/markdown",
        "txt" | "text" => "text/plain",
        _ => "application/octet-stream",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
