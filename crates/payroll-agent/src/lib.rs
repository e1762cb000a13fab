//! Payroll assistant runtime.
//!
//! Takes an uploaded payroll document through extraction, conversational
//! review and report generation, one caller-owned state per session.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌──────────────┐   ┌──────────────┐
//! │  Ingest  │──>│ Extraction │──>│    Update    │──>│    Report    │
//! │ (bytes)  │   │  (vision)  │   │ (chat+tools) │   │ (summary)    │
//! └──────────┘   └─────┬──────┘   └──────┬───────┘   └──────┬───────┘
//!                      └──────── Coordinator (workflow) ────┘
//!                                        │
//!                                 ┌──────┴──────┐
//!                                 │  ChatModel  │
//!                                 │ (LlmClient) │
//!                                 └─────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`llm`] -- LLM client, wire types, and the `ChatModel` trait.
//! - [`config`] -- Layered assistant configuration.
//! - [`ingest`] -- Uploaded bytes to model-readable content.
//! - [`extract`] -- Document extraction stage.
//! - [`update`] -- Conversational update stage and its operation set.
//! - [`report`] -- Report generation stage.
//! - [`workflow`] -- Session state and the coordinator.
//! - [`prompts`] -- Prompt text for each stage.
//! - [`error`] -- Agent error types.

pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod llm;
pub mod prompts;
pub mod report;
pub mod update;
pub mod workflow;

// Re-export the most commonly used types at the crate root.
pub use config::AssistantConfig;
pub use error::{AgentError, Result};
pub use extract::Extractor;
pub use ingest::{DocumentContent, ingest, ingest_encoded};
pub use llm::{ChatModel, ChatRequest, LlmClient, LlmClientConfig, LlmProvider, LlmResponse};
pub use report::ReportGenerator;
pub use update::{UpdateOperation, UpdateOutcome, Updater};
pub use workflow::{ChatMessage, ChatRole, Coordinator, Phase, Turn, WorkflowState};
