//! Conversational update stage.
//!
//! Each user turn makes one model call with the closed set of payroll
//! operations exposed as tools.  A text answer is passed through untouched;
//! a single tool call is parsed into an [`UpdateOperation`], validated, and
//! applied to the working list with a deterministic confirmation.

use std::sync::Arc;

use payroll_core::money::format_amount;
use payroll_core::{Employee, NumericField, position_of};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::config::AssistantConfig;
use crate::error::{AgentError, Result};
use crate::llm::{
    ChatModel, ChatRequest, LlmResponse, Message, ToolCall, ToolDefinition, chat_with_timeout,
};
use crate::prompts;
use crate::workflow::{ChatMessage, ChatRole};

/// Reply used when the model selected an unusable operation.
pub const REPHRASE_REPLY: &str =
    "Sorry, I couldn't work out which change you want. Could you rephrase the request?";

/// Reply used when the model selected several operations at once.
pub const SPLIT_REPLY: &str = "That looks like several changes at once. \
     Please send them as separate messages so I can apply and confirm each one.";

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

/// The closed set of changes the model may request.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOperation {
    UpdatePayRate {
        name: String,
        payrate: f64,
    },
    SetEmployeeId {
        name: String,
        employee_id: String,
    },
    SetNumericField {
        name: String,
        field: NumericField,
        value: f64,
    },
    AddEmployee {
        employee: Employee,
    },
    RemoveEmployee {
        name: String,
    },
    ConfirmApproval,
    TriggerReport,
    QueryStatus,
}

#[derive(Deserialize)]
struct PayRateArgs {
    name: String,
    payrate: f64,
}

#[derive(Deserialize)]
struct EmployeeIdArgs {
    name: String,
    employee_id: String,
}

#[derive(Deserialize)]
struct NumericFieldArgs {
    name: String,
    field: String,
    value: f64,
}

#[derive(Deserialize)]
struct AddEmployeeArgs {
    name: String,
    payrate: f64,
    #[serde(default)]
    regular_hours: f64,
    #[serde(default)]
    overtime_hours: f64,
    #[serde(default)]
    employee_id: Option<String>,
    #[serde(default)]
    deductions: f64,
}

#[derive(Deserialize)]
struct NameArgs {
    name: String,
}

impl UpdateOperation {
    /// Parse a tool call.  Unknown tool names and malformed arguments are
    /// errors; nothing is ever executed for them.
    pub fn from_tool_call(call: &ToolCall) -> Result<Self> {
        let op = match call.name.as_str() {
            "update_pay_rate" => {
                let a: PayRateArgs = parse_args(call)?;
                Self::UpdatePayRate {
                    name: required_name(call, a.name)?,
                    payrate: amount(call, "payrate", a.payrate)?,
                }
            }
            "set_employee_id" => {
                let a: EmployeeIdArgs = parse_args(call)?;
                let employee_id = a.employee_id.trim().to_owned();
                if employee_id.is_empty() {
                    return Err(invalid(call, "employee_id is empty"));
                }
                Self::SetEmployeeId {
                    name: required_name(call, a.name)?,
                    employee_id,
                }
            }
            "set_numeric_field" => {
                let a: NumericFieldArgs = parse_args(call)?;
                let field = NumericField::parse(a.field.trim())
                    .ok_or_else(|| invalid(call, &format!("unknown field `{}`", a.field)))?;
                Self::SetNumericField {
                    name: required_name(call, a.name)?,
                    field,
                    value: amount(call, field.as_str(), a.value)?,
                }
            }
            "add_employee" => {
                let a: AddEmployeeArgs = parse_args(call)?;
                let mut employee = Employee::new(
                    required_name(call, a.name)?,
                    amount(call, "payrate", a.payrate)?,
                    amount(call, "regular_hours", a.regular_hours)?,
                    amount(call, "overtime_hours", a.overtime_hours)?,
                );
                employee.deductions = amount(call, "deductions", a.deductions)?;
                employee.employee_id = a
                    .employee_id
                    .map(|id| id.trim().to_owned())
                    .filter(|id| !id.is_empty());
                Self::AddEmployee { employee }
            }
            "remove_employee" => {
                let a: NameArgs = parse_args(call)?;
                Self::RemoveEmployee {
                    name: required_name(call, a.name)?,
                }
            }
            "confirm_approval" => Self::ConfirmApproval,
            "trigger_report" => Self::TriggerReport,
            "query_status" => Self::QueryStatus,
            other => {
                return Err(AgentError::UnknownOperation {
                    name: other.to_owned(),
                });
            }
        };
        Ok(op)
    }

    /// Tool name of this operation.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UpdatePayRate { .. } => "update_pay_rate",
            Self::SetEmployeeId { .. } => "set_employee_id",
            Self::SetNumericField { .. } => "set_numeric_field",
            Self::AddEmployee { .. } => "add_employee",
            Self::RemoveEmployee { .. } => "remove_employee",
            Self::ConfirmApproval => "confirm_approval",
            Self::TriggerReport => "trigger_report",
            Self::QueryStatus => "query_status",
        }
    }

    /// Tool definitions offered to the model, one per operation.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        let name_prop = json!({
            "type": "string",
            "description": "Employee name exactly as shown in the lists"
        });
        let no_args = json!({"type": "object", "properties": {}, "required": []});

        vec![
            ToolDefinition {
                name: "update_pay_rate".into(),
                description: "Change an employee's hourly pay rate".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": name_prop,
                        "payrate": {"type": "number", "description": "New hourly rate"}
                    },
                    "required": ["name", "payrate"]
                }),
            },
            ToolDefinition {
                name: "set_employee_id".into(),
                description: "Set or correct an employee's payroll identifier".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": name_prop,
                        "employee_id": {"type": "string"}
                    },
                    "required": ["name", "employee_id"]
                }),
            },
            ToolDefinition {
                name: "set_numeric_field".into(),
                description: "Set an employee's regular hours, overtime hours or deductions".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": name_prop,
                        "field": {
                            "type": "string",
                            "enum": ["regular_hours", "overtime_hours", "deductions"]
                        },
                        "value": {"type": "number"}
                    },
                    "required": ["name", "field", "value"]
                }),
            },
            ToolDefinition {
                name: "add_employee".into(),
                description: "Add a new employee to this payroll run".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "name": name_prop,
                        "payrate": {"type": "number"},
                        "regular_hours": {"type": "number"},
                        "overtime_hours": {"type": "number"},
                        "employee_id": {"type": "string"},
                        "deductions": {"type": "number"}
                    },
                    "required": ["name", "payrate"]
                }),
            },
            ToolDefinition {
                name: "remove_employee".into(),
                description: "Remove an employee from this payroll run".into(),
                input_schema: json!({
                    "type": "object",
                    "properties": {"name": name_prop},
                    "required": ["name"]
                }),
            },
            ToolDefinition {
                name: "confirm_approval".into(),
                description: "Record that the user confirmed the employee data is correct".into(),
                input_schema: no_args.clone(),
            },
            ToolDefinition {
                name: "trigger_report".into(),
                description: "Generate the payroll report from the approved data".into(),
                input_schema: no_args.clone(),
            },
            ToolDefinition {
                name: "query_status".into(),
                description: "Show the current employee data and approval status".into(),
                input_schema: no_args,
            },
        ]
    }
}

fn parse_args<T: DeserializeOwned>(call: &ToolCall) -> Result<T> {
    let args = match &call.arguments {
        Value::Null => json!({}),
        other => other.clone(),
    };
    serde_json::from_value(args).map_err(|e| invalid(call, &e.to_string()))
}

fn required_name(call: &ToolCall, name: String) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(invalid(call, "name is empty"));
    }
    Ok(name.to_owned())
}

fn amount(call: &ToolCall, label: &str, value: f64) -> Result<f64> {
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(
            call,
            &format!("{label} must be a non-negative number, got {value}"),
        ));
    }
    Ok(value)
}

fn invalid(call: &ToolCall, reason: &str) -> AgentError {
    AgentError::InvalidOperation {
        name: call.name.clone(),
        reason: reason.to_owned(),
    }
}

// ---------------------------------------------------------------------------
// Applying operations
// ---------------------------------------------------------------------------

/// The review data an operation reads.
#[derive(Debug, Clone, Copy)]
pub struct ReviewData<'a> {
    pub existing: &'a [Employee],
    pub updated: &'a [Employee],
    pub user_approval: bool,
    pub trigger_report: bool,
}

/// Result of one update-stage turn.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateOutcome {
    /// Text shown to the user.
    pub reply: String,
    /// Working list after the turn.
    pub employees: Vec<Employee>,
    pub user_approval: bool,
    pub trigger_report: bool,
    /// Whether the working list changed.
    pub changed: bool,
    /// Operation that was applied, if any.
    pub operation: Option<&'static str>,
}

impl UpdateOutcome {
    fn unchanged(data: &ReviewData<'_>, reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            employees: data.updated.to_vec(),
            user_approval: data.user_approval,
            trigger_report: data.trigger_report,
            changed: false,
            operation: None,
        }
    }

    fn mutated(employees: Vec<Employee>, reply: String, op: &UpdateOperation) -> Self {
        Self {
            reply,
            employees,
            user_approval: false,
            trigger_report: false,
            changed: true,
            operation: Some(op.name()),
        }
    }
}

/// Apply `op` to a copy of the working list and describe the result.
pub fn apply_operation(
    op: &UpdateOperation,
    data: &ReviewData<'_>,
    config: &AssistantConfig,
) -> UpdateOutcome {
    let currency = config.currency_symbol.as_str();
    let mut employees = data.updated.to_vec();

    match op {
        UpdateOperation::UpdatePayRate { name, payrate } => {
            let Some(idx) = resolve(&mut employees, data.existing, name) else {
                return UpdateOutcome::unchanged(data, unknown_employee_reply(name, data));
            };
            let old = employees[idx].payrate;
            if let Err(e) = employees[idx].set_payrate(*payrate) {
                return UpdateOutcome::unchanged(data, e.to_string());
            }
            let reply = format!(
                "Updated {}'s pay rate from {}/hr to {}/hr.",
                employees[idx].name,
                format_amount(currency, old),
                format_amount(currency, *payrate)
            );
            UpdateOutcome::mutated(employees, reply, op)
        }
        UpdateOperation::SetEmployeeId { name, employee_id } => {
            let Some(idx) = resolve(&mut employees, data.existing, name) else {
                return UpdateOutcome::unchanged(data, unknown_employee_reply(name, data));
            };
            employees[idx].employee_id = Some(employee_id.clone());
            let reply = format!(
                "Set {}'s employee ID to {employee_id}.",
                employees[idx].name
            );
            UpdateOutcome::mutated(employees, reply, op)
        }
        UpdateOperation::SetNumericField { name, field, value } => {
            let Some(idx) = resolve(&mut employees, data.existing, name) else {
                return UpdateOutcome::unchanged(data, unknown_employee_reply(name, data));
            };
            let old = employees[idx].get(*field);
            if let Err(e) = employees[idx].set(*field, *value) {
                return UpdateOutcome::unchanged(data, e.to_string());
            }
            let reply = format!(
                "Updated {}'s {field} from {} to {}.",
                employees[idx].name,
                field_value(*field, old, currency),
                field_value(*field, *value, currency)
            );
            UpdateOutcome::mutated(employees, reply, op)
        }
        UpdateOperation::AddEmployee { employee } => {
            if let Some(idx) = position_of(&employees, &employee.name) {
                return UpdateOutcome::unchanged(
                    data,
                    format!(
                        "{} is already on the payroll list. \
                         Ask me to change their rate or hours instead.",
                        employees[idx].name
                    ),
                );
            }
            if employees.len() >= config.max_employees {
                return UpdateOutcome::unchanged(
                    data,
                    format!(
                        "The payroll list already has the maximum of {} employees, \
                         so I can't add {}.",
                        config.max_employees, employee.name
                    ),
                );
            }
            let reply = format!("Added {}.", employee.summary_line(currency));
            employees.push(employee.clone());
            UpdateOutcome::mutated(employees, reply, op)
        }
        UpdateOperation::RemoveEmployee { name } => match position_of(&employees, name) {
            Some(idx) => {
                let removed = employees.remove(idx);
                let reply = format!(
                    "Removed {} from this payroll run. {} employee{} remaining.",
                    removed.name,
                    employees.len(),
                    plural(employees.len())
                );
                UpdateOutcome::mutated(employees, reply, op)
            }
            None if position_of(data.existing, name).is_some() => UpdateOutcome::unchanged(
                data,
                format!("{name} is on file but not part of this payroll run, so there is nothing to remove."),
            ),
            None => UpdateOutcome::unchanged(data, unknown_employee_reply(name, data)),
        },
        UpdateOperation::ConfirmApproval => {
            if data.updated.is_empty() {
                return UpdateOutcome::unchanged(
                    data,
                    "There are no employees to approve yet. \
                     Upload a payroll document or add an employee first.",
                );
            }
            UpdateOutcome {
                reply: format!(
                    "Thanks, the data for {} employee{} is approved. \
                     Ask me to generate the report when you're ready.",
                    data.updated.len(),
                    plural(data.updated.len())
                ),
                employees,
                user_approval: true,
                trigger_report: data.trigger_report,
                changed: false,
                operation: Some(op.name()),
            }
        }
        UpdateOperation::TriggerReport => {
            if !data.user_approval {
                return UpdateOutcome::unchanged(
                    data,
                    "Please confirm the employee data is correct before I generate the report.",
                );
            }
            UpdateOutcome {
                reply: "Generating the payroll report now.".into(),
                employees,
                user_approval: true,
                trigger_report: true,
                changed: false,
                operation: Some(op.name()),
            }
        }
        UpdateOperation::QueryStatus => {
            let mut outcome = UpdateOutcome::unchanged(
                data,
                status_summary(data.updated, data.user_approval, currency),
            );
            outcome.operation = Some(op.name());
            outcome
        }
    }
}

/// Index of `name` in the working list, copying it over from the snapshot
/// when it is only known there.
fn resolve(employees: &mut Vec<Employee>, existing: &[Employee], name: &str) -> Option<usize> {
    if let Some(idx) = position_of(employees, name) {
        return Some(idx);
    }
    let from_snapshot = existing.iter().find(|e| e.is_named(name))?;
    employees.push(from_snapshot.clone());
    Some(employees.len() - 1)
}

fn unknown_employee_reply(name: &str, data: &ReviewData<'_>) -> String {
    let known: Vec<&str> = data
        .updated
        .iter()
        .chain(data.existing.iter().filter(|e| position_of(data.updated, &e.name).is_none()))
        .map(|e| e.name.as_str())
        .collect();

    if known.is_empty() {
        format!(
            "I couldn't find an employee named {name}. \
             Is this a new employee you'd like me to add?"
        )
    } else {
        format!(
            "I couldn't find an employee named {name}. Did you mean one of {}, \
             or is {name} a new employee you'd like me to add?",
            known.join(", ")
        )
    }
}

fn field_value(field: NumericField, value: f64, currency: &str) -> String {
    match field {
        NumericField::Deductions => format_amount(currency, value),
        NumericField::RegularHours | NumericField::OvertimeHours => format!("{value}h"),
    }
}

fn plural(n: usize) -> &'static str {
    if n == 1 { "" } else { "s" }
}

/// Deterministic description of the working list and approval state.
pub fn status_summary(employees: &[Employee], approved: bool, currency: &str) -> String {
    if employees.is_empty() {
        return "No employee data yet. Upload a payroll document or add an employee.".into();
    }

    let mut out = format!(
        "{} employee{} in this payroll run:\n",
        employees.len(),
        plural(employees.len())
    );
    for e in employees {
        out.push_str("- ");
        out.push_str(&e.summary_line(currency));
        out.push('\n');
    }
    out.push_str(if approved {
        "Status: approved. Ask me to generate the report."
    } else {
        "Status: awaiting your confirmation."
    });
    out
}

// ---------------------------------------------------------------------------
// Stage
// ---------------------------------------------------------------------------

/// Runs the conversational update stage.
pub struct Updater {
    model: Arc<dyn ChatModel>,
    config: Arc<AssistantConfig>,
}

impl Updater {
    /// Create an updater using `model` for every call.
    pub fn new(model: Arc<dyn ChatModel>, config: Arc<AssistantConfig>) -> Self {
        Self { model, config }
    }

    /// Answer the latest user message in `history`.
    pub async fn respond(
        &self,
        history: &[ChatMessage],
        data: &ReviewData<'_>,
    ) -> Result<UpdateOutcome> {
        let request = self.build_request(history, data);

        let response = chat_with_timeout(
            self.model.as_ref(),
            &request,
            self.config.call_timeout(),
            "update",
        )
        .await?;

        let outcome = match response {
            LlmResponse::Text(text) => {
                let text = text.trim();
                if text.is_empty() {
                    UpdateOutcome::unchanged(data, REPHRASE_REPLY)
                } else {
                    UpdateOutcome::unchanged(data, text)
                }
            }
            LlmResponse::ToolCalls(calls) if calls.len() > 1 => {
                tracing::warn!(
                    count = calls.len(),
                    "model selected several operations, rejecting turn"
                );
                UpdateOutcome::unchanged(data, SPLIT_REPLY)
            }
            LlmResponse::ToolCalls(calls) => match calls.first() {
                None => UpdateOutcome::unchanged(data, REPHRASE_REPLY),
                Some(call) => match UpdateOperation::from_tool_call(call) {
                    Ok(op) => {
                        tracing::info!(operation = op.name(), "applying update operation");
                        apply_operation(&op, data, &self.config)
                    }
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "rejected tool call");
                        UpdateOutcome::unchanged(data, REPHRASE_REPLY)
                    }
                },
            },
        };

        Ok(outcome)
    }

    fn build_request(&self, history: &[ChatMessage], data: &ReviewData<'_>) -> ChatRequest {
        let system = format!(
            "{}{}",
            prompts::UPDATE_SYSTEM_PROMPT,
            prompts::update_context(
                data.existing,
                data.updated,
                data.user_approval,
                &self.config.currency_symbol
            )
        );

        // The window opens on a user turn; some providers reject a
        // conversation that starts with the assistant.
        let mut start = history.len().saturating_sub(self.config.history_window);
        while history
            .get(start)
            .is_some_and(|m| matches!(m.role, ChatRole::Assistant))
        {
            start += 1;
        }
        let mut messages = Vec::with_capacity(history.len() - start + 1);
        messages.push(Message::system(system));
        messages.extend(history[start..].iter().map(|m| match m.role {
            ChatRole::User => Message::user(m.text.clone()),
            ChatRole::Assistant => Message::assistant(m.text.clone()),
        }));

        let mut request = ChatRequest::new(self.config.text_model.clone(), messages);
        request.tools = UpdateOperation::tool_definitions();
        request.temperature = Some(self.config.temperature);
        request.max_tokens = Some(self.config.max_tokens);
        request
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, arguments: Value) -> ToolCall {
        ToolCall {
            id: "call_1".into(),
            name: name.into(),
            arguments,
        }
    }

    fn staff() -> Vec<Employee> {
        vec![
            Employee::new("Alice", 20.0, 40.0, 0.0),
            Employee::new("Bob", 18.0, 38.0, 2.0),
        ]
    }

    fn data<'a>(existing: &'a [Employee], updated: &'a [Employee]) -> ReviewData<'a> {
        ReviewData {
            existing,
            updated,
            user_approval: true,
            trigger_report: false,
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Parsing
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn parses_every_operation() {
        let cases = [
            call("update_pay_rate", json!({"name": "Alice", "payrate": 25})),
            call("set_employee_id", json!({"name": "Alice", "employee_id": "E-1"})),
            call(
                "set_numeric_field",
                json!({"name": "Bob", "field": "overtime_hours", "value": 4}),
            ),
            call("add_employee", json!({"name": "Dana", "payrate": 22.0})),
            call("remove_employee", json!({"name": "Bob"})),
            call("confirm_approval", json!({})),
            call("trigger_report", Value::Null),
            call("query_status", json!({})),
        ];
        for c in &cases {
            let op = UpdateOperation::from_tool_call(c).unwrap();
            assert_eq!(op.name(), c.name);
        }
        assert_eq!(UpdateOperation::tool_definitions().len(), cases.len());
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let err = UpdateOperation::from_tool_call(&call("delete_all", json!({}))).unwrap_err();
        assert!(matches!(err, AgentError::UnknownOperation { ref name } if name == "delete_all"));
    }

    #[test]
    fn malformed_arguments_are_rejected() {
        for c in [
            call("update_pay_rate", json!({"name": "Alice"})),
            call("update_pay_rate", json!({"name": "Alice", "payrate": -3})),
            call("update_pay_rate", json!({"name": " ", "payrate": 3})),
            call("set_numeric_field", json!({"name": "Bob", "field": "bonus", "value": 1})),
            call("set_employee_id", json!({"name": "Bob", "employee_id": ""})),
        ] {
            assert!(
                matches!(
                    UpdateOperation::from_tool_call(&c),
                    Err(AgentError::InvalidOperation { .. })
                ),
                "accepted {:?}",
                c.arguments
            );
        }
    }

    // ═══════════════════════════════════════════════════════════════════════
    //  Applying
    // ═══════════════════════════════════════════════════════════════════════

    #[test]
    fn pay_rate_update_changes_only_rate_and_clears_flags() {
        let list = staff();
        let op = UpdateOperation::UpdatePayRate {
            name: "alice".into(),
            payrate: 25.0,
        };
        let out = apply_operation(&op, &data(&[], &list), &AssistantConfig::default());

        assert!(out.changed);
        assert!(!out.user_approval);
        assert_eq!(out.employees[0].payrate, 25.0);
        assert_eq!(out.employees[0].regular_hours, 40.0);
        assert_eq!(out.employees[1], list[1]);
        assert_eq!(
            out.reply,
            "Updated Alice's pay rate from $20.00/hr to $25.00/hr."
        );
    }

    #[test]
    fn unknown_employee_asks_for_clarification() {
        let list = staff();
        let op = UpdateOperation::UpdatePayRate {
            name: "Zara".into(),
            payrate: 30.0,
        };
        let out = apply_operation(&op, &data(&[], &list), &AssistantConfig::default());

        assert!(!out.changed);
        assert_eq!(out.employees, list);
        assert!(out.user_approval, "flags untouched");
        assert!(out.reply.contains("Zara"));
        assert!(out.reply.contains("Alice, Bob"));
    }

    #[test]
    fn snapshot_only_employee_is_copied_in() {
        let existing = vec![Employee::new("Carol", 30.0, 40.0, 0.0)];
        let list = staff();
        let op = UpdateOperation::SetNumericField {
            name: "Carol".into(),
            field: NumericField::Deductions,
            value: 50.0,
        };
        let out = apply_operation(&op, &data(&existing, &list), &AssistantConfig::default());

        assert_eq!(out.employees.len(), 3);
        assert_eq!(out.employees[2].deductions, 50.0);
        assert_eq!(out.reply, "Updated Carol's deductions from $0.00 to $50.00.");
    }

    #[test]
    fn duplicate_add_and_capacity_are_rejected() {
        let list = staff();
        let dup = UpdateOperation::AddEmployee {
            employee: Employee::new("BOB", 10.0, 0.0, 0.0),
        };
        let out = apply_operation(&dup, &data(&[], &list), &AssistantConfig::default());
        assert!(!out.changed);
        assert!(out.reply.contains("already"));

        let config = AssistantConfig {
            max_employees: 2,
            ..AssistantConfig::default()
        };
        let new = UpdateOperation::AddEmployee {
            employee: Employee::new("Dana", 10.0, 0.0, 0.0),
        };
        let out = apply_operation(&new, &data(&[], &list), &config);
        assert!(!out.changed);
        assert_eq!(out.employees.len(), 2);
    }

    #[test]
    fn remove_employee() {
        let list = staff();
        let op = UpdateOperation::RemoveEmployee { name: "bob".into() };
        let out = apply_operation(&op, &data(&[], &list), &AssistantConfig::default());
        assert_eq!(out.employees.len(), 1);
        assert_eq!(
            out.reply,
            "Removed Bob from this payroll run. 1 employee remaining."
        );
    }

    #[test]
    fn approval_requires_employees() {
        let mut d = data(&[], &[]);
        d.user_approval = false;
        let out = apply_operation(&UpdateOperation::ConfirmApproval, &d, &AssistantConfig::default());
        assert!(!out.user_approval);

        let list = staff();
        let mut d = data(&[], &list);
        d.user_approval = false;
        let out = apply_operation(&UpdateOperation::ConfirmApproval, &d, &AssistantConfig::default());
        assert!(out.user_approval);
        assert!(!out.changed);
    }

    #[test]
    fn trigger_without_approval_is_refused() {
        let list = staff();
        let mut d = data(&[], &list);
        d.user_approval = false;
        let out = apply_operation(&UpdateOperation::TriggerReport, &d, &AssistantConfig::default());
        assert!(!out.trigger_report);
        assert!(out.reply.contains("confirm"));

        d.user_approval = true;
        let out = apply_operation(&UpdateOperation::TriggerReport, &d, &AssistantConfig::default());
        assert!(out.trigger_report);
    }

    #[test]
    fn status_summary_lists_everyone() {
        let summary = status_summary(&staff(), false, "$");
        assert!(summary.starts_with("2 employees in this payroll run:"));
        assert!(summary.contains("Bob: 38h regular, 2h overtime @ $18.00/hr"));
        assert!(summary.ends_with("awaiting your confirmation."));
    }
}
