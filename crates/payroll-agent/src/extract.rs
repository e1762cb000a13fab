//! Document extraction stage.
//!
//! One call to a vision-capable model turns an ingested document into a
//! validated employee list.  The caller's snapshot is sent for name matching
//! only and is never modified here.

use std::sync::Arc;

use payroll_core::Employee;
use serde_json::Value;

use crate::config::AssistantConfig;
use crate::error::{AgentError, Result};
use crate::ingest::DocumentContent;
use crate::llm::{ChatModel, ChatRequest, LlmResponse, Message, chat_with_timeout};
use crate::prompts;

/// Tool name a model may use to hand back the extracted list.
pub const RECORD_EMPLOYEES_TOOL: &str = "record_employees";

/// Maps documents to employee records through a language model.
pub struct Extractor {
    model: Arc<dyn ChatModel>,
    config: Arc<AssistantConfig>,
}

impl Extractor {
    /// Create an extractor using `model` for every call.
    pub fn new(model: Arc<dyn ChatModel>, config: Arc<AssistantConfig>) -> Self {
        Self { model, config }
    }

    /// Extract employees from `document`.
    ///
    /// Fails with [`AgentError::ExtractionFailed`] when the answer cannot be
    /// parsed, holds an invalid record, is empty, or lists more than
    /// `max_employees` people.  Timeouts and transport errors keep their own
    /// variants.
    pub async fn extract(
        &self,
        document: &DocumentContent,
        existing: &[Employee],
    ) -> Result<Vec<Employee>> {
        let request = self.build_request(document, existing);

        tracing::info!(
            document = %document.describe(),
            existing = existing.len(),
            model = %request.model,
            "extracting employees"
        );

        let response = chat_with_timeout(
            self.model.as_ref(),
            &request,
            self.config.call_timeout(),
            "extraction",
        )
        .await?;

        let employees = parse_extraction(&response)?;

        if employees.is_empty() {
            return Err(AgentError::ExtractionFailed {
                reason: "no employee pay data found in the document".into(),
            });
        }
        if employees.len() > self.config.max_employees {
            return Err(AgentError::ExtractionFailed {
                reason: format!(
                    "document lists {} employees, more than the limit of {}",
                    employees.len(),
                    self.config.max_employees
                ),
            });
        }
        for e in &employees {
            e.validate().map_err(|err| AgentError::ExtractionFailed {
                reason: err.to_string(),
            })?;
        }

        tracing::info!(employee_count = employees.len(), "extraction complete");
        Ok(employees)
    }

    fn build_request(&self, document: &DocumentContent, existing: &[Employee]) -> ChatRequest {
        let user = match document {
            DocumentContent::Image { .. } => {
                let text = prompts::extraction_user_prompt(None, existing, self.config.max_employees);
                match document.as_image() {
                    Some(image) => Message::user_with_image(text, image),
                    None => Message::user(text),
                }
            }
            DocumentContent::Text { text } => Message::user(prompts::extraction_user_prompt(
                Some(text),
                existing,
                self.config.max_employees,
            )),
        };

        let mut request = ChatRequest::new(
            self.config.vision_model.clone(),
            vec![Message::system(prompts::EXTRACTION_SYSTEM_PROMPT), user],
        );
        request.temperature = Some(self.config.temperature);
        request.max_tokens = Some(self.config.max_tokens);
        request
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Turn the model's answer into employee records (unvalidated).
pub fn parse_extraction(response: &LlmResponse) -> Result<Vec<Employee>> {
    let value = match response {
        LlmResponse::Text(text) => parse_json_payload(text)?,
        LlmResponse::ToolCalls(calls) => {
            let call = calls
                .iter()
                .find(|c| c.name == RECORD_EMPLOYEES_TOOL)
                .ok_or_else(|| AgentError::ExtractionFailed {
                    reason: format!(
                        "model called `{}` instead of returning employee data",
                        calls.first().map(|c| c.name.as_str()).unwrap_or_default()
                    ),
                })?;
            call.arguments.clone()
        }
    };

    let items = match &value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("employees") {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(AgentError::ExtractionFailed {
                    reason: "response has no `employees` array".into(),
                });
            }
        },
        _ => {
            return Err(AgentError::ExtractionFailed {
                reason: "response is not a JSON object".into(),
            });
        }
    };

    items.iter().enumerate().map(|(i, v)| employee_from_value(i, v)).collect()
}

/// Locate and parse the JSON in a free-text answer.
fn parse_json_payload(text: &str) -> Result<Value> {
    let block = extract_json_block(text);
    if let Ok(v) = serde_json::from_str::<Value>(block) {
        return Ok(v);
    }

    // Prose around a bare object: take the outermost braces.
    if let (Some(start), Some(end)) = (block.find('{'), block.rfind('}')) {
        if start < end {
            if let Ok(v) = serde_json::from_str::<Value>(&block[start..=end]) {
                return Ok(v);
            }
        }
    }

    Err(AgentError::ExtractionFailed {
        reason: "could not find a JSON employee list in the model response".into(),
    })
}

/// Extract a JSON block from text that may be wrapped in markdown code
/// fences.
fn extract_json_block(text: &str) -> &str {
    let trimmed = text.trim();

    // Check for ```json ... ``` fences.
    if let Some(start) = trimmed.find("```json") {
        let json_start = start + 7; // len("```json")
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    // Check for ``` ... ``` fences (without language tag).
    if let Some(start) = trimmed.find("```") {
        let json_start = start + 3;
        if let Some(end) = trimmed[json_start..].find("```") {
            return trimmed[json_start..json_start + end].trim();
        }
    }

    trimmed
}

fn employee_from_value(index: usize, v: &Value) -> Result<Employee> {
    let name = v["name"]
        .as_str()
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AgentError::ExtractionFailed {
            reason: format!("employee #{} has no name", index + 1),
        })?;

    let employee_id = match &v["employee_id"] {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_owned()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    };

    let mut employee = Employee::new(
        name,
        number_field(v, "payrate", name)?,
        number_field(v, "regular_hours", name)?,
        number_field(v, "overtime_hours", name)?,
    );
    employee.employee_id = employee_id;
    employee.deductions = number_field(v, "deductions", name)?;
    Ok(employee)
}

/// Read a numeric field.  Missing or null is 0; numeric strings such as
/// `"$1,250.00"` are accepted once currency symbols, thousands separators
/// and whitespace are removed.  Anything else in the string is an error.
fn number_field(v: &Value, key: &str, name: &str) -> Result<f64> {
    match &v[key] {
        Value::Null => Ok(0.0),
        Value::Number(n) => n.as_f64().ok_or_else(|| bad_number(name, key)),
        Value::String(s) => parse_amount(s).ok_or_else(|| bad_number(name, key)),
        _ => Err(bad_number(name, key)),
    }
}

/// Parse a human-written amount.  An empty string (after stripping) is 0.
fn parse_amount(s: &str) -> Option<f64> {
    let cleaned: String = s
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ',' && !CURRENCY_SYMBOLS.contains(c))
        .collect();
    if cleaned.is_empty() {
        return Some(0.0);
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

const CURRENCY_SYMBOLS: &[char] = &['$', '€', '£', '¥', '₹', '₩', '₦', '₱', '¢'];

fn bad_number(name: &str, key: &str) -> AgentError {
    AgentError::ExtractionFailed {
        reason: format!("`{key}` for {name} is not a number"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
