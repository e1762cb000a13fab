//! Assistant configuration.
//!
//! Settings come from three layers, each overriding the previous one:
//! built-in defaults, an optional TOML or JSON file, and `PAYROLL_*`
//! environment variables.  API keys are only ever read from the environment.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{AgentError, Result};
use crate::llm::{LlmClientConfig, LlmProvider};

/// Default Anthropic model for all stages.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

/// Default OpenAI model for all stages (vision capable).
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Runtime settings for the payroll assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Provider to use.  `None` picks whichever API key is present.
    pub provider: Option<LlmProvider>,

    /// Override for the provider's API base URL.
    pub base_url: Option<String>,

    /// Model for document extraction.  Empty means the provider default.
    pub vision_model: String,

    /// Model for conversational updates.  Empty means the provider default.
    pub text_model: String,

    /// Model for the report summary.  Falls back to `text_model`.
    pub report_model: Option<String>,

    /// Symbol prefixed to amounts in replies and rendered reports.
    pub currency_symbol: String,

    /// Factor applied to the pay rate for overtime hours.
    pub overtime_multiplier: f64,

    /// Upper bound on employees per extraction and in the working list.
    pub max_employees: usize,

    /// Limit for a single model call, in seconds.
    pub call_timeout_secs: u64,

    /// Number of most recent chat messages sent to the update stage.
    pub history_window: usize,

    /// Sampling temperature for every stage.
    pub temperature: f32,

    /// Response token limit for every stage.
    pub max_tokens: u32,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            provider: None,
            base_url: None,
            vision_model: String::new(),
            text_model: String::new(),
            report_model: None,
            currency_symbol: "$".into(),
            overtime_multiplier: payroll_core::DEFAULT_OVERTIME_MULTIPLIER,
            max_employees: 500,
            call_timeout_secs: 60,
            history_window: 20,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

impl AssistantConfig {
    /// Read a configuration file.  `.json` files are parsed as JSON,
    /// anything else as TOML.  Missing keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| AgentError::ConfigError {
            reason: format!("failed to read {}: {e}", path.display()),
        })?;

        let config: Self = if path.extension().and_then(|s| s.to_str()) == Some("json") {
            serde_json::from_str(&content).map_err(|e| AgentError::ConfigError {
                reason: format!("failed to parse JSON config: {e}"),
            })?
        } else {
            toml::from_str(&content).map_err(|e| AgentError::ConfigError {
                reason: format!("failed to parse TOML config: {e}"),
            })?
        };

        info!(path = %path.display(), "configuration loaded from file");
        Ok(config)
    }

    /// Defaults, then the optional file, then the process environment,
    /// then validation.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => Self::default(),
        };
        config.apply_env(env_non_empty)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PAYROLL_*` overrides using `lookup` to read variables.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(v) = lookup("PAYROLL_PROVIDER") {
            self.provider = Some(LlmProvider::parse(&v).ok_or_else(|| {
                AgentError::ConfigError {
                    reason: format!("unknown provider `{v}` in PAYROLL_PROVIDER"),
                }
            })?);
        }
        if let Some(v) = lookup("PAYROLL_API_BASE_URL") {
            self.base_url = Some(v);
        }
        if let Some(v) = lookup("PAYROLL_VISION_MODEL") {
            self.vision_model = v;
        }
        if let Some(v) = lookup("PAYROLL_TEXT_MODEL") {
            self.text_model = v;
        }
        if let Some(v) = lookup("PAYROLL_REPORT_MODEL") {
            self.report_model = Some(v);
        }
        if let Some(v) = lookup("PAYROLL_CURRENCY") {
            self.currency_symbol = v;
        }
        if let Some(v) = lookup("PAYROLL_OVERTIME_MULTIPLIER") {
            self.overtime_multiplier = parse_var("PAYROLL_OVERTIME_MULTIPLIER", &v)?;
        }
        if let Some(v) = lookup("PAYROLL_MAX_EMPLOYEES") {
            self.max_employees = parse_var("PAYROLL_MAX_EMPLOYEES", &v)?;
        }
        if let Some(v) = lookup("PAYROLL_TIMEOUT_SECS") {
            self.call_timeout_secs = parse_var("PAYROLL_TIMEOUT_SECS", &v)?;
        }
        Ok(())
    }

    /// Reject settings that would make every report or call fail.
    pub fn validate(&self) -> Result<()> {
        if !self.overtime_multiplier.is_finite() || self.overtime_multiplier < 1.0 {
            return Err(AgentError::ConfigError {
                reason: format!(
                    "overtime_multiplier must be at least 1.0, got {}",
                    self.overtime_multiplier
                ),
            });
        }
        if self.max_employees == 0 {
            return Err(AgentError::ConfigError {
                reason: "max_employees must be at least 1".into(),
            });
        }
        if self.call_timeout_secs == 0 {
            return Err(AgentError::ConfigError {
                reason: "call_timeout_secs must be at least 1".into(),
            });
        }
        if self.history_window == 0 {
            return Err(AgentError::ConfigError {
                reason: "history_window must be at least 1".into(),
            });
        }
        Ok(())
    }

    /// Per-call timeout as a [`Duration`].
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Model for the report summary.
    pub fn report_model(&self) -> &str {
        self.report_model.as_deref().unwrap_or(&self.text_model)
    }

    /// Build the HTTP client settings, reading the API key via `lookup`.
    ///
    /// With no explicit provider, `ANTHROPIC_API_KEY` is preferred over
    /// `OPENAI_API_KEY`.
    pub fn client_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<LlmClientConfig> {
        let (provider, api_key) = match self.provider {
            Some(p) => (p, lookup(api_key_var(p))),
            None => match lookup(api_key_var(LlmProvider::Anthropic)) {
                Some(key) => (LlmProvider::Anthropic, Some(key)),
                None => (
                    LlmProvider::OpenAI,
                    lookup(api_key_var(LlmProvider::OpenAI)),
                ),
            },
        };

        let api_key = api_key.ok_or_else(|| AgentError::MissingApiKey {
            provider: format!("{} (set {})", provider.as_str(), api_key_var(provider)),
        })?;

        let base_url = self.base_url.as_deref().map(|url| url.trim_end_matches('/'));
        let mut client = match (provider, base_url) {
            (LlmProvider::Anthropic, url) => {
                let mut client = LlmClientConfig::anthropic(api_key, DEFAULT_ANTHROPIC_MODEL);
                if let Some(url) = url {
                    client.base_url = url.to_owned();
                }
                client
            }
            (LlmProvider::OpenAI, Some(url)) => {
                LlmClientConfig::openai_compatible(api_key, DEFAULT_OPENAI_MODEL, url)
            }
            (LlmProvider::OpenAI, None) => LlmClientConfig::openai(api_key, DEFAULT_OPENAI_MODEL),
        };
        client.max_tokens = self.max_tokens;
        // The HTTP timeout sits just above the per-call timeout so the
        // stage-level limit is the one that fires.
        client.request_timeout = self.call_timeout() + Duration::from_secs(5);

        debug!(provider = provider.as_str(), base_url = %client.base_url, "resolved LLM client");
        Ok(client)
    }
}

/// Environment variable holding the API key for `provider`.
pub fn api_key_var(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Anthropic => "ANTHROPIC_API_KEY",
        LlmProvider::OpenAI => "OPENAI_API_KEY",
    }
}

/// Read an environment variable, treating empty values as unset.
pub fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T: std::str::FromStr>(name: &str, value: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e| AgentError::ConfigError {
        reason: format!("invalid value `{value}` for {name}: {e}"),
    })
}
