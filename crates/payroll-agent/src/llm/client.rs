//! Multi-provider LLM client.
//!
//! Supports the **Anthropic Messages API** and the **OpenAI Chat Completions
//! API** (including OpenAI-compatible endpoints such as Ollama, Groq, and
//! vLLM).  Requests are non-streaming: every payroll stage needs the complete
//! answer before it can act on it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::{AgentError, Result};
use crate::llm::ChatModel;
use crate::llm::types::{ChatRequest, LlmResponse, Message, Role, ToolCall, ToolDefinition};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Default Anthropic API base URL.
pub const ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";

/// Default OpenAI API base URL.
pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP request timeout used when none is configured.
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

// ---------------------------------------------------------------------------
// Provider enum
// ---------------------------------------------------------------------------

/// Identifies which LLM provider the client should target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmProvider {
    /// Anthropic Messages API.
    Anthropic,
    /// OpenAI Chat Completions API (also covers OpenAI-compatible endpoints).
    #[serde(rename = "openai")]
    OpenAI,
}

impl LlmProvider {
    /// Lowercase provider name used in config files and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Anthropic => "anthropic",
            Self::OpenAI => "openai",
        }
    }

    /// Parse a provider name from configuration.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "anthropic" | "claude" => Some(Self::Anthropic),
            "openai" | "openai-compatible" | "ollama" => Some(Self::OpenAI),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Client configuration
// ---------------------------------------------------------------------------

/// Configuration for connecting to a single LLM provider endpoint.
#[derive(Debug, Clone)]
pub struct LlmClientConfig {
    /// Which provider this configuration targets.
    pub provider: LlmProvider,
    /// API key for authentication.
    pub api_key: String,
    /// Base URL for the API (e.g. `https://api.anthropic.com`).
    pub base_url: String,
    /// Model used when a request leaves `model` empty.
    pub default_model: String,
    /// Default maximum tokens per response.
    pub max_tokens: u32,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl LlmClientConfig {
    /// Create a configuration for the Anthropic API.
    pub fn anthropic(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::Anthropic,
            api_key: api_key.into(),
            base_url: ANTHROPIC_BASE_URL.to_owned(),
            default_model: model.into(),
            max_tokens: 4096,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a configuration for the OpenAI API.
    pub fn openai(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: LlmProvider::OpenAI,
            api_key: api_key.into(),
            base_url: OPENAI_BASE_URL.to_owned(),
            default_model: model.into(),
            max_tokens: 4096,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    /// Create a configuration for any OpenAI-compatible API.
    pub fn openai_compatible(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::openai(api_key, model)
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// An LLM client that talks to either the Anthropic Messages API or the
/// OpenAI Chat Completions API.
#[derive(Debug, Clone)]
pub struct LlmClient {
    config: Arc<LlmClientConfig>,
    http: reqwest::Client,
}

impl LlmClient {
    /// Create a new client with the given configuration.
    pub fn new(config: LlmClientConfig) -> Result<Self> {
        if config.api_key.is_empty() {
            return Err(AgentError::MissingApiKey {
                provider: config.provider.as_str().into(),
            });
        }

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| AgentError::Transport {
                reason: format!("failed to build HTTP client: {e}"),
            })?;

        Ok(Self {
            config: Arc::new(config),
            http,
        })
    }

    fn resolve_model<'a>(&'a self, request: &'a ChatRequest) -> &'a str {
        if request.model.is_empty() {
            &self.config.default_model
        } else {
            &request.model
        }
    }

    // =======================================================================
    // Anthropic implementation
    // =======================================================================

    async fn chat_anthropic(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let body = self.build_anthropic_request_body(request);
        let url = format!("{}/v1/messages", self.config.base_url);

        let mut headers = HeaderMap::new();
        headers.insert(
            "x-api-key",
            HeaderValue::from_str(&self.config.api_key).map_err(|e| AgentError::Transport {
                reason: format!("invalid API key header: {e}"),
            })?,
        );
        headers.insert(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(url = %url, model = %body["model"], provider = "anthropic", "sending LLM request");

        let v = self.post_json(&url, headers, &body).await?;
        parse_anthropic_response(&v)
    }

    /// Build the JSON body for the Anthropic Messages API.
    fn build_anthropic_request_body(&self, request: &ChatRequest) -> Value {
        let (system_text, messages) = messages_to_anthropic(&request.messages);

        let mut body = json!({
            "model": self.resolve_model(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages,
        });

        if let Some(system) = system_text {
            body["system"] = json!(system);
        }

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        if !request.tools.is_empty() {
            body["tools"] = tools_to_anthropic(&request.tools);
        }

        body
    }

    // =======================================================================
    // OpenAI implementation
    // =======================================================================

    async fn chat_openai(&self, request: &ChatRequest) -> Result<LlmResponse> {
        let body = self.build_openai_request_body(request);
        let url = format!("{}/chat/completions", self.config.base_url);

        let mut headers = HeaderMap::new();
        let auth_value = format!("Bearer {}", self.config.api_key);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth_value).map_err(|e| AgentError::Transport {
                reason: format!("invalid authorization header: {e}"),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        tracing::debug!(url = %url, model = %body["model"], provider = "openai", "sending LLM request");

        let v = self.post_json(&url, headers, &body).await?;
        parse_openai_response(&v)
    }

    /// Build the JSON body for the OpenAI Chat Completions API.
    fn build_openai_request_body(&self, request: &ChatRequest) -> Value {
        let mut body = json!({
            "model": self.resolve_model(request),
            "max_tokens": request.max_tokens.unwrap_or(self.config.max_tokens),
            "messages": messages_to_openai(&request.messages),
        });

        if let Some(temp) = request.temperature {
            body["temperature"] = json!(temp);
        }

        if !request.tools.is_empty() {
            body["tools"] = tools_to_openai(&request.tools);
        }

        body
    }

    // -- Shared transport ----------------------------------------------------

    /// POST a JSON body and decode a JSON response, mapping non-success
    /// statuses to [`AgentError::LlmStatus`].
    async fn post_json(&self, url: &str, headers: HeaderMap, body: &Value) -> Result<Value> {
        let resp = self
            .http
            .post(url)
            .headers(headers)
            .json(body)
            .send()
            .await
            .map_err(|e| self.request_error(e))?;

        let status = resp.status();
        let text = resp.text().await.map_err(|e| self.request_error(e))?;

        if !status.is_success() {
            return Err(AgentError::LlmStatus {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| AgentError::LlmParseFailed {
            reason: format!("invalid JSON response: {e}"),
        })
    }

    /// Map a reqwest failure, filling in the configured limit on timeouts.
    fn request_error(&self, err: reqwest::Error) -> AgentError {
        match AgentError::from(err) {
            AgentError::Timeout { stage, .. } => AgentError::Timeout {
                stage,
                secs: self.config.request_timeout.as_secs(),
            },
            other => other,
        }
    }
}

#[async_trait]
impl ChatModel for LlmClient {
    async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse> {
        match self.config.provider {
            LlmProvider::Anthropic => self.chat_anthropic(request).await,
            LlmProvider::OpenAI => self.chat_openai(request).await,
        }
    }
}

// ===========================================================================
// Anthropic format conversion (free functions)
// ===========================================================================

/// Split the system message out (Anthropic expects it as a top-level field)
/// and convert the remaining messages to the Anthropic wire format.
fn messages_to_anthropic(messages: &[Message]) -> (Option<String>, Vec<Value>) {
    let mut system: Option<String> = None;
    let mut wire_messages: Vec<Value> = Vec::with_capacity(messages.len());

    for msg in messages {
        match msg.role {
            Role::System => match &mut system {
                Some(existing) => {
                    existing.push('\n');
                    existing.push_str(&msg.content);
                }
                None => system = Some(msg.content.clone()),
            },
            Role::User if !msg.images.is_empty() => {
                let mut content: Vec<Value> = msg
                    .images
                    .iter()
                    .map(|img| {
                        json!({
                            "type": "image",
                            "source": {
                                "type": "base64",
                                "media_type": img.media_type,
                                "data": img.data,
                            }
                        })
                    })
                    .collect();
                content.push(json!({"type": "text", "text": msg.content}));
                wire_messages.push(json!({"role": "user", "content": content}));
            }
            Role::User => {
                wire_messages.push(json!({"role": "user", "content": msg.content}));
            }
            Role::Assistant => {
                wire_messages.push(json!({"role": "assistant", "content": msg.content}));
            }
        }
    }

    (system, wire_messages)
}

/// Convert tool definitions into the Anthropic API format.
fn tools_to_anthropic(tools: &[ToolDefinition]) -> Value {
    let tool_values: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "name": t.name,
                "description": t.description,
                "input_schema": t.input_schema,
            })
        })
        .collect();
    json!(tool_values)
}

/// Parse a non-streaming Anthropic Messages API response.
fn parse_anthropic_response(v: &Value) -> Result<LlmResponse> {
    let content = v["content"]
        .as_array()
        .ok_or_else(|| AgentError::LlmParseFailed {
            reason: "missing `content` array in response".into(),
        })?;

    let mut text_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();

    for block in content {
        match block["type"].as_str() {
            Some("text") => {
                if let Some(t) = block["text"].as_str() {
                    text_parts.push(t.to_owned());
                }
            }
            Some("tool_use") => {
                tool_calls.push(ToolCall {
                    id: block["id"].as_str().unwrap_or_default().to_owned(),
                    name: block["name"].as_str().unwrap_or_default().to_owned(),
                    arguments: block["input"].clone(),
                });
            }
            _ => {}
        }
    }

    if tool_calls.is_empty() {
        Ok(LlmResponse::Text(text_parts.join("")))
    } else {
        Ok(LlmResponse::ToolCalls(tool_calls))
    }
}

// ===========================================================================
// OpenAI format conversion (free functions)
// ===========================================================================

/// Convert internal messages to the OpenAI Chat Completions wire format.
///
/// User messages with images use the content-parts form
/// (`[{"type":"text"}, {"type":"image_url"}]`).
pub fn messages_to_openai(messages: &[Message]) -> Vec<Value> {
    messages
        .iter()
        .map(|msg| {
            let role = match msg.role {
                Role::System => "system",
                Role::User => "user",
                Role::Assistant => "assistant",
            };

            if msg.images.is_empty() {
                return json!({"role": role, "content": msg.content});
            }

            let mut parts = vec![json!({"type": "text", "text": msg.content})];
            parts.extend(msg.images.iter().map(|img| {
                json!({
                    "type": "image_url",
                    "image_url": {"url": img.data_url(), "detail": "high"},
                })
            }));
            json!({"role": role, "content": parts})
        })
        .collect()
}

/// Convert tool definitions into the OpenAI Chat Completions API format.
///
/// OpenAI wraps each tool in `{"type": "function", "function": {...}}`.
pub fn tools_to_openai(tools: &[ToolDefinition]) -> Value {
    let tool_values: Vec<Value> = tools
        .iter()
        .map(|t| {
            json!({
                "type": "function",
                "function": {
                    "name": t.name,
                    "description": t.description,
                    "parameters": t.input_schema,
                }
            })
        })
        .collect();
    json!(tool_values)
}

/// Parse a non-streaming OpenAI Chat Completions API response into an
/// [`LlmResponse`].
pub fn parse_openai_response(v: &Value) -> Result<LlmResponse> {
    let message = &v["choices"][0]["message"];

    if message.is_null() {
        return Err(AgentError::LlmParseFailed {
            reason: "missing `choices[0].message` in response".into(),
        });
    }

    if let Some(tool_calls_arr) = message["tool_calls"].as_array() {
        if !tool_calls_arr.is_empty() {
            let calls = tool_calls_arr
                .iter()
                .map(|tc| {
                    let func = &tc["function"];
                    let name = func["name"].as_str().unwrap_or_default().to_owned();
                    let args_str = func["arguments"].as_str().unwrap_or("{}");
                    let arguments: Value = serde_json::from_str(args_str).map_err(|e| {
                        AgentError::LlmParseFailed {
                            reason: format!("invalid JSON in tool call `{name}` arguments: {e}"),
                        }
                    })?;

                    Ok(ToolCall {
                        id: tc["id"].as_str().unwrap_or_default().to_owned(),
                        name,
                        arguments,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            return Ok(LlmResponse::ToolCalls(calls));
        }
    }

    let content = message["content"].as_str().unwrap_or_default();
    Ok(LlmResponse::Text(content.to_owned()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ImageContent;

    fn png() -> ImageContent {
        ImageContent {
            media_type: "image/png".into(),
            data: "aGVsbG8=".into(),
        }
    }

    // -- Anthropic -----------------------------------------------------------

    #[test]
    fn build_anthropic_request_body_basic() {
        let config = LlmClientConfig::anthropic("test-key", "claude-sonnet-4-20250514");
        let client = LlmClient::new(config).unwrap();

        let mut request = ChatRequest::new(
            "",
            vec![Message::system("You are helpful."), Message::user("Hello")],
        );
        request.temperature = Some(0.5);
        request.max_tokens = Some(1024);

        let body = client.build_anthropic_request_body(&request);

        assert_eq!(body["model"], "claude-sonnet-4-20250514");
        assert_eq!(body["system"], "You are helpful.");
        assert_eq!(body["max_tokens"], 1024);
        let temp = body["temperature"].as_f64().unwrap();
        assert!((temp - 0.5).abs() < 1e-6, "temperature was {temp}");

        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "Hello");
    }

    #[test]
    fn anthropic_image_block_precedes_text() {
        let (_, wire) = messages_to_anthropic(&[Message::user_with_image("Extract", png())]);
        let content = wire[0]["content"].as_array().unwrap();
        assert_eq!(content[0]["type"], "image");
        assert_eq!(content[0]["source"]["media_type"], "image/png");
        assert_eq!(content[0]["source"]["data"], "aGVsbG8=");
        assert_eq!(content[1]["type"], "text");
        assert_eq!(content[1]["text"], "Extract");
    }

    #[test]
    fn anthropic_request_with_tools() {
        let config = LlmClientConfig::anthropic("test-key", "claude-sonnet-4-20250514");
        let client = LlmClient::new(config).unwrap();

        let mut request = ChatRequest::new("claude-haiku", vec![Message::user("raise Bob")]);
        request.tools = vec![ToolDefinition {
            name: "update_pay_rate".into(),
            description: "Change a rate".into(),
            input_schema: json!({"type": "object"}),
        }];

        let body = client.build_anthropic_request_body(&request);
        assert_eq!(body["model"], "claude-haiku");
        assert_eq!(body["tools"][0]["name"], "update_pay_rate");
        assert_eq!(body["tools"][0]["input_schema"]["type"], "object");
    }

    #[test]
    fn parse_anthropic_tool_use_response() {
        let response_json = json!({
            "content": [
                {"type": "text", "text": "Updating."},
                {
                    "type": "tool_use",
                    "id": "toolu_01",
                    "name": "update_pay_rate",
                    "input": {"name": "Alice", "payrate": 25.0}
                }
            ],
            "stop_reason": "tool_use"
        });

        match parse_anthropic_response(&response_json).unwrap() {
            LlmResponse::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].name, "update_pay_rate");
                assert_eq!(calls[0].arguments["payrate"], 25.0);
            }
            other => panic!("expected ToolCalls response, got {other:?}"),
        }
    }

    #[test]
    fn parse_anthropic_missing_content_fails() {
        assert!(parse_anthropic_response(&json!({"id": "x"})).is_err());
    }

    // -- OpenAI --------------------------------------------------------------

    #[test]
    fn openai_compatible_config_construction() {
        let config =
            LlmClientConfig::openai_compatible("local-key", "llava", "http://localhost:11434/v1");
        assert_eq!(config.provider, LlmProvider::OpenAI);
        assert_eq!(config.default_model, "llava");
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.max_tokens, 4096);
    }

    #[tokio::test]
    async fn stalled_server_is_a_retryable_timeout() {
        // Accepts connections and never answers.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let mut open = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                open.push(socket);
            }
        });

        let mut config = LlmClientConfig::openai_compatible(
            "key",
            "model",
            format!("http://{addr}/v1"),
        );
        config.request_timeout = Duration::from_secs(1);
        let client = LlmClient::new(config).unwrap();

        let request = ChatRequest::new("", vec![Message::user("hi")]);
        let err = client.chat(&request).await.unwrap_err();
        assert!(
            matches!(err, AgentError::Timeout { stage: "llm request", secs: 1 }),
            "got {err:?}"
        );
        assert!(err.is_retryable());
    }

    #[test]
    fn empty_api_key_returns_error() {
        let result = LlmClient::new(LlmClientConfig::openai("", "gpt-4o"));
        assert!(matches!(result, Err(AgentError::MissingApiKey { .. })));
    }

    #[test]
    fn openai_image_uses_content_parts() {
        let wire = messages_to_openai(&[
            Message::system("sys"),
            Message::user_with_image("Extract", png()),
        ]);
        assert_eq!(wire[0]["content"], "sys");
        let parts = wire[1]["content"].as_array().unwrap();
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn tools_to_openai_format() {
        let wire = tools_to_openai(&[ToolDefinition {
            name: "add_employee".into(),
            description: "Add".into(),
            input_schema: json!({"type": "object"}),
        }]);
        assert_eq!(wire[0]["type"], "function");
        assert_eq!(wire[0]["function"]["name"], "add_employee");
        assert_eq!(wire[0]["function"]["parameters"]["type"], "object");
    }

    #[test]
    fn parse_openai_text_response() {
        let response_json = json!({
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }]
        });

        match parse_openai_response(&response_json).unwrap() {
            LlmResponse::Text(text) => assert_eq!(text, "Hello!"),
            other => panic!("expected Text response, got {other:?}"),
        }
    }

    #[test]
    fn parse_openai_tool_call_response() {
        let response_json = json!({
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_xyz",
                        "type": "function",
                        "function": {
                            "name": "remove_employee",
                            "arguments": "{\"name\":\"Bob\"}"
                        }
                    }]
                }
            }]
        });

        match parse_openai_response(&response_json).unwrap() {
            LlmResponse::ToolCalls(calls) => {
                assert_eq!(calls[0].id, "call_xyz");
                assert_eq!(calls[0].arguments["name"], "Bob");
            }
            other => panic!("expected ToolCalls response, got {other:?}"),
        }
    }

    #[test]
    fn parse_openai_bad_arguments_fails() {
        let response_json = json!({
            "choices": [{
                "message": {
                    "tool_calls": [{
                        "id": "c",
                        "function": {"name": "x", "arguments": "{not json"}
                    }]
                }
            }]
        });
        assert!(parse_openai_response(&response_json).is_err());
    }

    #[test]
    fn provider_parse() {
        assert_eq!(LlmProvider::parse("Anthropic"), Some(LlmProvider::Anthropic));
        assert_eq!(LlmProvider::parse("ollama"), Some(LlmProvider::OpenAI));
        assert_eq!(LlmProvider::parse("bard"), None);
    }
}
