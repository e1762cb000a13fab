//! One-shot subcommands: `payroll extract` and `payroll status`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use payroll_agent::config::{api_key_var, env_non_empty};
use payroll_agent::{Coordinator, LlmProvider};

use crate::helpers::{build_model, init_tracing, load_config, load_employees, media_type_for};

/// Extract one document and print the merged employee list as JSON.
pub async fn cmd_extract(
    file: PathBuf,
    media_type: Option<String>,
    existing: Option<PathBuf>,
    config_path: Option<PathBuf>,
) -> Result<()> {
    init_tracing("warn");

    let config = load_config(config_path.as_deref())?;
    let model = build_model(&config)?;
    let coordinator = Coordinator::new(config, model);

    let snapshot = match &existing {
        Some(path) => load_employees(path)?,
        None => Vec::new(),
    };
    let bytes = std::fs::read(&file).with_context(|| format!("failed to read {}", file.display()))?;
    let media_type = media_type.unwrap_or_else(|| media_type_for(&file).to_owned());

    let state = Coordinator::new_session(snapshot);
    let turn = coordinator
        .submit_document(&state, &bytes, &media_type)
        .await
        .context("extraction failed")?;

    let json = serde_json::to_string_pretty(&turn.state.updated_employees)?;
    println!("{json}");
    Ok(())
}

/// Print the effective configuration and whether an API key is set.
pub fn cmd_status(config_path: Option<PathBuf>) -> Result<()> {
    init_tracing("warn");

    let config = load_config(config_path.as_deref())?;

    println!();
    println!("  Payroll assistant v{}", env!("CARGO_PKG_VERSION"));
    println!(
        "  Config file: {}",
        config_path
            .as_deref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none, using defaults)".into())
    );
    println!();

    match config.client_config(env_non_empty) {
        Ok(client) => {
            println!("  Provider:        {}", client.provider.as_str());
            println!("  API base URL:    {}", client.base_url);
            let default = client.default_model.as_str();
            println!("  Vision model:    {}", or_default(&config.vision_model, default));
            println!("  Text model:      {}", or_default(&config.text_model, default));
            println!("  Report model:    {}", or_default(config.report_model(), default));
        }
        Err(e) => {
            println!("  Provider:        not configured ({e})");
        }
    }

    println!("  Currency:        {}", config.currency_symbol);
    println!("  Overtime factor: {}", config.overtime_multiplier);
    println!("  Max employees:   {}", config.max_employees);
    println!("  Call timeout:    {}s", config.call_timeout_secs);
    println!("  History window:  {} messages", config.history_window);
    println!();

    for provider in [LlmProvider::Anthropic, LlmProvider::OpenAI] {
        let var = api_key_var(provider);
        let state = if env_non_empty(var).is_some() {
            "set"
        } else {
            "not set"
        };
        println!("  {var:<18} {state}");
    }
    println!();

    Ok(())
}

fn or_default<'a>(model: &'a str, default: &'a str) -> &'a str {
    if model.is_empty() { default } else { model }
}
