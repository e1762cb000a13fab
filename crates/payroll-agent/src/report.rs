//! Report generation stage.
//!
//! Figures are always recomputed locally from the approved list; the model
//! only writes the summary paragraph.

use std::sync::Arc;

use payroll_core::{Employee, PayrollReport};

use crate::config::AssistantConfig;
use crate::error::{AgentError, Result};
use crate::llm::{ChatModel, ChatRequest, LlmResponse, Message, chat_with_timeout};
use crate::prompts;

/// Builds payroll reports from an approved employee list.
pub struct ReportGenerator {
    model: Arc<dyn ChatModel>,
    config: Arc<AssistantConfig>,
}

impl ReportGenerator {
    /// Create a generator using `model` for the summary call.
    pub fn new(model: Arc<dyn ChatModel>, config: Arc<AssistantConfig>) -> Self {
        Self { model, config }
    }

    /// Compute the report for `employees`.
    ///
    /// Both flags must be set or the call fails with
    /// [`AgentError::ReportPrecondition`] before any model call.
    pub async fn generate(
        &self,
        employees: &[Employee],
        user_approval: bool,
        trigger_report: bool,
    ) -> Result<PayrollReport> {
        if !user_approval || !trigger_report {
            return Err(AgentError::ReportPrecondition {
                approved: user_approval,
                triggered: trigger_report,
            });
        }
        if employees.is_empty() {
            return Err(AgentError::ValidationError {
                reason: "cannot generate a report for an empty employee list".into(),
            });
        }

        let report = PayrollReport::compute(
            employees,
            self.config.overtime_multiplier,
            &self.config.currency_symbol,
        )?;

        tracing::info!(
            employee_count = report.employees.len(),
            total_payroll = report.total_payroll,
            "payroll figures computed"
        );

        let mut request = ChatRequest::new(
            self.config.report_model().to_owned(),
            vec![
                Message::system(prompts::REPORT_SYSTEM_PROMPT),
                Message::user(prompts::report_user_prompt(&report)),
            ],
        );
        request.temperature = Some(self.config.temperature);
        request.max_tokens = Some(self.config.max_tokens);

        let response = chat_with_timeout(
            self.model.as_ref(),
            &request,
            self.config.call_timeout(),
            "report",
        )
        .await?;

        let summary = match response {
            LlmResponse::Text(text) if !text.trim().is_empty() => text.trim().to_owned(),
            LlmResponse::Text(_) => {
                tracing::debug!("empty summary from model, using default");
                report.default_summary()
            }
            LlmResponse::ToolCalls(calls) => {
                tracing::warn!(count = calls.len(), "summary call returned tool calls, using default");
                report.default_summary()
            }
        };

        Ok(report.with_summary(summary))
    }
}
