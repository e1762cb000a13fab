//! LLM integration layer.
//!
//! This module provides the interface between the payroll stages and large
//! language model providers.  It is organized into:
//!
//! - [`types`] -- Core data types (messages, images, tool calls).
//! - [`client`] -- HTTP client for Anthropic and OpenAI APIs.
//!
//! Stages never hold an [`LlmClient`] directly; they call through the
//! [`ChatModel`] trait so a scripted model can stand in during tests.

pub mod client;
pub mod types;

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{AgentError, Result};

// Re-export the most commonly used types for convenience.
pub use client::{ANTHROPIC_BASE_URL, LlmClient, LlmClientConfig, LlmProvider, OPENAI_BASE_URL};
pub use types::{ChatRequest, ImageContent, LlmResponse, Message, Role, ToolCall, ToolDefinition};

/// A language model that answers one chat request at a time.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send a complete request and wait for the complete response.
    async fn chat(&self, request: &ChatRequest) -> Result<LlmResponse>;
}

/// Run one model call under a deadline.
///
/// An elapsed deadline becomes [`AgentError::Timeout`] tagged with `stage`.
pub async fn chat_with_timeout(
    model: &dyn ChatModel,
    request: &ChatRequest,
    limit: Duration,
    stage: &'static str,
) -> Result<LlmResponse> {
    match tokio::time::timeout(limit, model.chat(request)).await {
        Ok(result) => result,
        Err(_elapsed) => {
            tracing::warn!(stage, timeout = ?limit, "model call timed out");
            Err(AgentError::Timeout {
                stage,
                secs: limit.as_secs(),
            })
        }
    }
}
