//! Prompt text for the three model-calling stages.

use payroll_core::{Employee, PayrollReport};

/// System prompt for document extraction.
pub const EXTRACTION_SYSTEM_PROMPT: &str = "\
You extract employee payroll data from documents such as timesheets, pay stubs and \
payroll registers.

Return ONLY a JSON object of this exact shape, with no commentary:

{\"employees\": [{\"name\": \"Jane Smith\", \"employee_id\": \"E-17\", \"payrate\": 22.5, \
\"regular_hours\": 40, \"overtime_hours\": 3}]}

Rules:
- `payrate` is the hourly rate as a number. Use 0 when the document does not show it.
- `regular_hours` and `overtime_hours` are numbers. Use 0 when a value is missing.
- Include `employee_id` only when the document shows one.
- One entry per employee. Never invent employees that are not in the document.
- If the document contains no employee pay data, return {\"employees\": []}.";

/// System prompt for the conversational update stage.
pub const UPDATE_SYSTEM_PROMPT: &str = "\
You are a payroll assistant helping a user review employee pay data before a payroll \
report is generated.

Each turn, either answer the user in plain text or call exactly ONE of the provided \
tools. Never call more than one tool per turn.

- Use `update_pay_rate`, `set_employee_id`, `set_numeric_field`, `add_employee` and \
`remove_employee` only when the user clearly asks for that change.
- Use `confirm_approval` when the user says the data is correct.
- Use `trigger_report` when the user asks to generate or run the payroll report.
- Use `query_status` when the user asks what the current data or status is.
- Refer to employees by the exact names in the lists below.
- If a request is ambiguous, ask a short clarifying question instead of calling a tool.";

/// System prompt for the report summary.
pub const REPORT_SYSTEM_PROMPT: &str = "\
You write the summary paragraph of a payroll report. The figures below are final and \
were computed exactly; do not recalculate, round differently or invent numbers. \
In two to four sentences, state how many employees are paid, the total payroll, and \
anything notable such as overtime or deductions. Reply with the paragraph only.";

/// User message accompanying a document sent for extraction.
///
/// `document_text` is `None` when the document travels as an image block.
pub fn extraction_user_prompt(
    document_text: Option<&str>,
    existing: &[Employee],
    max_employees: usize,
) -> String {
    let mut prompt = String::from("Extract the employee payroll data from this document.");
    prompt.push_str(&format!(" Return at most {max_employees} employees."));

    if !existing.is_empty() {
        prompt.push_str("\n\nEmployees already on file (for name matching only):\n");
        for e in existing {
            prompt.push_str(&format!("- {}\n", e.name));
        }
    }

    if let Some(text) = document_text {
        prompt.push_str("\n\n--- DOCUMENT ---\n");
        prompt.push_str(text);
        prompt.push_str("\n--- END DOCUMENT ---");
    }
    prompt
}

/// Current data appended to the update-stage system prompt.
pub fn update_context(
    existing: &[Employee],
    updated: &[Employee],
    approved: bool,
    currency: &str,
) -> String {
    let mut ctx = String::from("\n\n## Employees on file (previous period)\n");
    push_list(&mut ctx, existing, currency);
    ctx.push_str("\n## Working list (this payroll run)\n");
    push_list(&mut ctx, updated, currency);
    ctx.push_str(&format!(
        "\nData approved by user: {}",
        if approved { "yes" } else { "no" }
    ));
    ctx
}

fn push_list(out: &mut String, list: &[Employee], currency: &str) {
    if list.is_empty() {
        out.push_str("(none)\n");
        return;
    }
    for e in list {
        out.push_str("- ");
        out.push_str(&e.summary_line(currency));
        out.push('\n');
    }
}

/// User message carrying the computed figures to the summary call.
pub fn report_user_prompt(report: &PayrollReport) -> String {
    format!(
        "Write the summary for this payroll report.\n\n{}",
        report.render_text()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extraction_prompt_inlines_text_and_names() {
        let existing = vec![Employee::new("Alice", 20.0, 40.0, 0.0)];
        let prompt = extraction_user_prompt(Some("John 25/hr 40h"), &existing, 50);
        assert!(prompt.contains("at most 50"));
        assert!(prompt.contains("- Alice"));
        assert!(prompt.contains("--- DOCUMENT ---\nJohn 25/hr 40h"));
    }

    #[test]
    fn extraction_prompt_for_image_has_no_document_block() {
        let prompt = extraction_user_prompt(None, &[], 10);
        assert!(!prompt.contains("DOCUMENT"));
    }

    #[test]
    fn update_context_marks_empty_lists() {
        let ctx = update_context(&[], &[Employee::new("Bob", 18.0, 40.0, 0.0)], false, "$");
        assert!(ctx.contains("(none)"));
        assert!(ctx.contains("Bob: 40h regular, 0h overtime @ $18.00/hr"));
        assert!(ctx.ends_with("Data approved by user: no"));
    }
}
