//! Workflow coordinator.
//!
//! The coordinator owns no per-session data.  Every call takes the caller's
//! [`WorkflowState`] by reference, works on a copy, and hands the new state
//! back in a [`Turn`].  When a call fails the caller simply keeps the state
//! it already has.
//!
//! ```text
//! awaiting_document ──upload──> extracting ──ok──> reviewing <──┐
//!        │                                      │   │  (chat)  │
//!        └──────────── chat edit ───────────────┘   │──────────┘
//!                                                   │ approval + trigger
//!                                                   v
//!                          reviewing <──fail── generating ──ok──> done
//! ```

use std::sync::Arc;

use chrono::{DateTime, Utc};
use payroll_core::{Employee, PayrollReport, merge_employees, position_of};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::AssistantConfig;
use crate::error::{AgentError, Result};
use crate::extract::Extractor;
use crate::ingest::{self, DocumentContent};
use crate::llm::ChatModel;
use crate::report::ReportGenerator;
use crate::update::{ReviewData, Updater, status_summary};

// ---------------------------------------------------------------------------
// Phase
// ---------------------------------------------------------------------------

/// Where a session is in the payroll workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No document merged yet; the working list holds the snapshot.
    AwaitingDocument,
    /// A document is being extracted.
    Extracting,
    /// The user is reviewing and correcting the working list.
    Reviewing,
    /// The report is being generated.
    Generating,
    /// A report was produced.
    Done,
}

impl Phase {
    /// Whether the workflow may move from `self` to `to`.
    pub fn can_transition_to(self, to: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, to),
            (AwaitingDocument, Extracting)
                | (AwaitingDocument, Reviewing)
                | (Extracting, Reviewing)
                | (Extracting, AwaitingDocument)
                | (Reviewing, Extracting)
                | (Reviewing, Reviewing)
                | (Reviewing, Generating)
                | (Generating, Done)
                | (Generating, Reviewing)
                | (Done, Extracting)
                | (Done, Reviewing)
        )
    }

    /// Wire name, e.g. `awaiting_document`.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AwaitingDocument => "awaiting_document",
            Self::Extracting => "extracting",
            Self::Reviewing => "reviewing",
            Self::Generating => "generating",
            Self::Done => "done",
        }
    }
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

/// One entry in the session's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            text: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Everything the workflow knows about one payroll session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    /// Stable identifier for logs and persistence.
    pub session_id: Uuid,

    /// Incremented on every successful turn.  A caller holding an older
    /// revision than the one it last stored has lost an update.
    pub revision: u64,

    pub phase: Phase,

    /// Snapshot supplied by the caller, typically the previous pay period.
    pub existing_employees: Vec<Employee>,

    /// Working list for this run.
    pub updated_employees: Vec<Employee>,

    pub document_uploaded: bool,

    /// The most recently ingested document.
    pub document: Option<DocumentContent>,

    pub user_approval: bool,

    pub trigger_report: bool,

    /// The most recent report, if one was generated.
    pub report: Option<PayrollReport>,

    pub messages: Vec<ChatMessage>,

    pub updated_at: DateTime<Utc>,
}

impl WorkflowState {
    /// Move to `to`, rejecting transitions the state machine does not allow.
    pub fn transition(&mut self, to: Phase) -> Result<()> {
        if !self.phase.can_transition_to(to) {
            return Err(AgentError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        tracing::debug!(session_id = %self.session_id, from = ?self.phase, to = ?to, "phase transition");
        self.phase = to;
        Ok(())
    }

    /// Serialize for persistence.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Restore a persisted state.
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// Deterministic status text for the working list.
    pub fn status(&self, currency: &str) -> String {
        format!(
            "Phase: {}\n{}",
            self.phase.as_str(),
            status_summary(&self.updated_employees, self.user_approval, currency)
        )
    }

    fn finish_turn(&mut self, reply: &str) {
        self.messages.push(ChatMessage::assistant(reply));
        self.revision += 1;
        self.updated_at = Utc::now();
    }
}

/// The outcome of one coordinator call.
#[derive(Debug, Clone)]
pub struct Turn {
    /// The new state; the caller's previous state is untouched.
    pub state: WorkflowState,
    /// Text to show the user.
    pub reply: String,
}

// ---------------------------------------------------------------------------
// Coordinator
// ---------------------------------------------------------------------------

/// Routes each turn to the extraction, update, or report stage.
pub struct Coordinator {
    config: Arc<AssistantConfig>,
    extractor: Extractor,
    updater: Updater,
    reporter: ReportGenerator,
}

impl Coordinator {
    /// Create a coordinator whose stages all call `model`.  Each stage names
    /// its own model id from `config`.
    pub fn new(config: AssistantConfig, model: Arc<dyn ChatModel>) -> Self {
        let config = Arc::new(config);
        Self {
            extractor: Extractor::new(model.clone(), config.clone()),
            updater: Updater::new(model.clone(), config.clone()),
            reporter: ReportGenerator::new(model, config.clone()),
            config,
        }
    }

    /// The configuration the stages run with.
    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// A fresh session over `existing`.  The working list starts as a copy
    /// of the snapshot.
    pub fn new_session(existing: Vec<Employee>) -> WorkflowState {
        let state = WorkflowState {
            session_id: Uuid::now_v7(),
            revision: 0,
            phase: Phase::AwaitingDocument,
            updated_employees: existing.clone(),
            existing_employees: existing,
            document_uploaded: false,
            document: None,
            user_approval: false,
            trigger_report: false,
            report: None,
            messages: Vec::new(),
            updated_at: Utc::now(),
        };
        tracing::info!(
            session_id = %state.session_id,
            employee_count = state.existing_employees.len(),
            "new payroll session"
        );
        state
    }

    /// Ingest raw bytes and run extraction.
    pub async fn submit_document(
        &self,
        state: &WorkflowState,
        bytes: &[u8],
        media_type: &str,
    ) -> Result<Turn> {
        self.submit_content(state, ingest::ingest(bytes, media_type))
            .await
    }

    /// Run extraction on an already ingested document and merge the result
    /// into the working list.
    pub async fn submit_content(
        &self,
        state: &WorkflowState,
        document: DocumentContent,
    ) -> Result<Turn> {
        let mut next = state.clone();
        next.transition(Phase::Extracting)?;

        let base = if state.phase == Phase::AwaitingDocument && state.updated_employees.is_empty()
        {
            state.existing_employees.clone()
        } else {
            state.updated_employees.clone()
        };

        let extracted = self.extractor.extract(&document, &base).await?;
        let merged = merge_employees(&base, &extracted);
        if merged.len() > self.config.max_employees {
            return Err(AgentError::ExtractionFailed {
                reason: format!(
                    "merged list has {} employees, more than the limit of {}",
                    merged.len(),
                    self.config.max_employees
                ),
            });
        }

        let reply = merge_summary(&base, &extracted, &merged, &self.config.currency_symbol);

        next.messages.push(ChatMessage::user(format!(
            "[Uploaded document: {}]",
            document.describe()
        )));
        next.updated_employees = merged;
        next.document = Some(document);
        next.document_uploaded = true;
        next.user_approval = false;
        next.trigger_report = false;
        next.report = None;
        next.transition(Phase::Reviewing)?;
        next.finish_turn(&reply);

        tracing::info!(
            session_id = %next.session_id,
            revision = next.revision,
            employee_count = next.updated_employees.len(),
            "document merged"
        );
        Ok(Turn { state: next, reply })
    }

    /// Handle one user chat message.
    pub async fn send_message(&self, state: &WorkflowState, text: &str) -> Result<Turn> {
        let text = text.trim();
        if text.is_empty() {
            return Err(AgentError::ValidationError {
                reason: "message is empty".into(),
            });
        }

        let mut next = state.clone();
        match next.phase {
            Phase::Done => next.transition(Phase::Reviewing)?,
            Phase::Extracting | Phase::Generating => {
                return Err(AgentError::InvalidTransition {
                    from: next.phase,
                    to: Phase::Reviewing,
                });
            }
            Phase::AwaitingDocument | Phase::Reviewing => {}
        }
        next.messages.push(ChatMessage::user(text));

        let data = ReviewData {
            existing: &state.existing_employees,
            updated: &state.updated_employees,
            user_approval: state.user_approval,
            trigger_report: state.trigger_report,
        };
        let outcome = self.updater.respond(&next.messages, &data).await?;

        next.updated_employees = outcome.employees;
        next.user_approval = outcome.user_approval;
        next.trigger_report = outcome.trigger_report;

        if next.phase == Phase::AwaitingDocument && (outcome.changed || next.user_approval) {
            next.transition(Phase::Reviewing)?;
        } else if next.phase == Phase::Reviewing {
            next.transition(Phase::Reviewing)?;
        }

        let mut reply = outcome.reply;
        if next.user_approval && next.trigger_report {
            let report_reply = self.run_report(&mut next).await?;
            reply = format!("{reply}\n\n{report_reply}");
        }

        next.finish_turn(&reply);
        tracing::info!(
            session_id = %next.session_id,
            revision = next.revision,
            phase = ?next.phase,
            operation = outcome.operation.unwrap_or("none"),
            employee_count = next.updated_employees.len(),
            "chat turn complete"
        );
        Ok(Turn { state: next, reply })
    }

    /// Generate the report for an approved and triggered session.
    pub async fn generate_report(&self, state: &WorkflowState) -> Result<Turn> {
        if !state.user_approval || !state.trigger_report {
            return Err(AgentError::ReportPrecondition {
                approved: state.user_approval,
                triggered: state.trigger_report,
            });
        }

        let mut next = state.clone();
        if matches!(next.phase, Phase::AwaitingDocument | Phase::Done) {
            next.transition(Phase::Reviewing)?;
        }
        let reply = self.run_report(&mut next).await?;
        next.finish_turn(&reply);
        Ok(Turn { state: next, reply })
    }

    /// Move through `generating`.  Retryable failures propagate so the
    /// caller keeps its state; anything else returns to `reviewing` with
    /// the error as the reply.
    async fn run_report(&self, next: &mut WorkflowState) -> Result<String> {
        next.transition(Phase::Generating)?;
        tracing::info!(session_id = %next.session_id, employee_count = next.updated_employees.len(), "generating report");

        match self
            .reporter
            .generate(&next.updated_employees, next.user_approval, next.trigger_report)
            .await
        {
            Ok(report) => {
                let text = report.render_text();
                next.report = Some(report);
                next.trigger_report = false;
                next.transition(Phase::Done)?;
                Ok(text)
            }
            Err(e) if e.is_retryable() => Err(e),
            Err(e) => {
                tracing::warn!(session_id = %next.session_id, error = %e, "report generation failed");
                next.trigger_report = false;
                next.transition(Phase::Reviewing)?;
                Ok(format!("I couldn't generate the report: {e}"))
            }
        }
    }
}

/// Reply shown after a document is merged.
fn merge_summary(
    base: &[Employee],
    extracted: &[Employee],
    merged: &[Employee],
    currency: &str,
) -> String {
    let known = extracted
        .iter()
        .filter(|e| position_of(base, &e.name).is_some())
        .count();

    let mut out = format!(
        "I found {} employee{} in the document ({} matched your records, {} new). \
         Here is the merged payroll data:\n",
        extracted.len(),
        if extracted.len() == 1 { "" } else { "s" },
        known,
        merged.len() - base.len()
    );
    for e in merged {
        out.push_str("- ");
        out.push_str(&e.summary_line(currency));
        out.push('\n');
    }
    out.push_str("Is this correct? Tell me about any changes, or confirm to approve.");
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_table() {
        use Phase::*;
        assert!(AwaitingDocument.can_transition_to(Extracting));
        assert!(Reviewing.can_transition_to(Reviewing));
        assert!(Reviewing.can_transition_to(Generating));
        assert!(Generating.can_transition_to(Done));
        assert!(Done.can_transition_to(Reviewing));

        assert!(!AwaitingDocument.can_transition_to(Generating));
        assert!(!Extracting.can_transition_to(Generating));
        assert!(!Done.can_transition_to(Generating));
        assert!(!Generating.can_transition_to(Extracting));
    }

    #[test]
    fn invalid_transition_is_an_error() {
        let mut state = Coordinator::new_session(Vec::new());
        let err = state.transition(Phase::Done).unwrap_err();
        assert!(matches!(
            err,
            AgentError::InvalidTransition {
                from: Phase::AwaitingDocument,
                to: Phase::Done
            }
        ));
        assert_eq!(state.phase, Phase::AwaitingDocument);
    }

    #[test]
    fn new_session_seeds_working_list() {
        let existing = vec![Employee::new("Alice", 20.0, 40.0, 0.0)];
        let state = Coordinator::new_session(existing.clone());
        assert_eq!(state.updated_employees, existing);
        assert_eq!(state.phase, Phase::AwaitingDocument);
        assert_eq!(state.revision, 0);
        assert!(state.messages.is_empty());
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = Coordinator::new_session(vec![Employee::new("Alice", 20.0, 40.0, 0.0)]);
        let json = state.to_json().unwrap();
        assert!(json.contains("\"phase\": \"awaiting_document\""));
        assert_eq!(WorkflowState::from_json(&json).unwrap(), state);
    }

    #[test]
    fn merge_summary_counts() {
        let base = vec![Employee::new("Alice", 20.0, 40.0, 0.0)];
        let extracted = vec![
            Employee::new("alice", 0.0, 38.0, 0.0),
            Employee::new("John Doe", 25.0, 40.0, 5.0),
        ];
        let merged = merge_employees(&base, &extracted);
        let text = merge_summary(&base, &extracted, &merged, "$");
        assert!(text.starts_with("I found 2 employees in the document (1 matched your records, 1 new)."));
        assert!(text.contains("John Doe: 40h regular, 5h overtime @ $25.00/hr"));
    }
}
