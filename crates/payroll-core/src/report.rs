//! Payroll report computation and export.
//!
//! A [`PayrollReport`] is always derived from employee records; no pay
//! figure is ever read back from a previous report.  Amounts are computed in
//! cents (see [`crate::money`]) so `total_pay == regular_pay + overtime_pay`
//! holds exactly.

use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::employee::Employee;
use crate::error::{CoreError, Result};
use crate::money::{add_cents, format_amount, from_cents, pay_cents, sub_cents, to_cents};

/// Overtime multiplier used when none is configured.
pub const DEFAULT_OVERTIME_MULTIPLIER: f64 = 1.5;

/// Column header of the CSV export.
pub const CSV_HEADER: &str =
    "name,rate,overtime_rate,regular_hours,overtime_hours,regular_pay,overtime_pay,total_pay";

// ---------------------------------------------------------------------------
// Report types
// ---------------------------------------------------------------------------

/// One employee's computed pay for the period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollLine {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,
    pub payrate: f64,
    pub overtime_rate: f64,
    pub regular_hours: f64,
    pub overtime_hours: f64,
    #[serde(default)]
    pub deductions: f64,
    pub regular_pay: f64,
    pub overtime_pay: f64,
    pub total_pay: f64,
    pub net_pay: f64,
}

impl PayrollLine {
    /// Compute the pay line for `employee` with the given multiplier.
    ///
    /// Fails with [`CoreError::AmountOutOfRange`] when a figure does not fit
    /// at cent precision.
    pub fn compute(employee: &Employee, overtime_multiplier: f64) -> Result<Self> {
        let out_of_range = |what: &str| CoreError::AmountOutOfRange {
            name: employee.name.clone(),
            reason: format!("{what} is too large"),
        };

        let regular = pay_cents(employee.payrate, employee.regular_hours, 1.0)
            .ok_or_else(|| out_of_range("regular pay"))?;
        let overtime = pay_cents(
            employee.payrate,
            employee.overtime_hours,
            overtime_multiplier,
        )
        .ok_or_else(|| out_of_range("overtime pay"))?;
        let overtime_rate = to_cents(employee.payrate * overtime_multiplier)
            .ok_or_else(|| out_of_range("overtime rate"))?;
        let deductions =
            to_cents(employee.deductions).ok_or_else(|| out_of_range("deductions"))?;
        let total = add_cents(regular, overtime).ok_or_else(|| out_of_range("total pay"))?;
        let net = sub_cents(total, deductions).ok_or_else(|| out_of_range("net pay"))?;

        Ok(Self {
            name: employee.name.clone(),
            employee_id: employee.employee_id.clone(),
            payrate: employee.payrate,
            overtime_rate: from_cents(overtime_rate),
            regular_hours: employee.regular_hours,
            overtime_hours: employee.overtime_hours,
            deductions: employee.deductions,
            regular_pay: from_cents(regular),
            overtime_pay: from_cents(overtime),
            total_pay: from_cents(total),
            net_pay: from_cents(net),
        })
    }

    /// The employee record this line was computed from.
    pub fn employee(&self) -> Employee {
        Employee {
            name: self.name.clone(),
            employee_id: self.employee_id.clone(),
            payrate: self.payrate,
            regular_hours: self.regular_hours,
            overtime_hours: self.overtime_hours,
            deductions: self.deductions,
        }
    }
}

/// The payroll report for one approved employee list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayrollReport {
    pub employees: Vec<PayrollLine>,
    pub total_payroll: f64,
    #[serde(default)]
    pub total_net_pay: f64,
    pub overtime_multiplier: f64,
    #[serde(default = "default_currency")]
    pub currency_symbol: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
}

fn default_currency() -> String {
    "$".into()
}

impl PayrollReport {
    /// Compute a report from employee records.
    ///
    /// Every record is validated first; the summary is left empty for the
    /// caller to fill in.
    pub fn compute(
        employees: &[Employee],
        overtime_multiplier: f64,
        currency_symbol: &str,
    ) -> Result<Self> {
        if !overtime_multiplier.is_finite() || overtime_multiplier < 1.0 {
            return Err(CoreError::InvalidMultiplier {
                value: overtime_multiplier,
            });
        }

        let mut lines = Vec::with_capacity(employees.len());
        let mut total_cents = 0i64;
        let mut net_cents = 0i64;

        for employee in employees {
            employee.validate()?;
            let line = PayrollLine::compute(employee, overtime_multiplier)?;
            total_cents = to_cents(line.total_pay)
                .and_then(|cents| add_cents(total_cents, cents))
                .ok_or_else(|| payroll_out_of_range("total payroll"))?;
            net_cents = to_cents(line.net_pay)
                .and_then(|cents| add_cents(net_cents, cents))
                .ok_or_else(|| payroll_out_of_range("total net pay"))?;
            lines.push(line);
        }

        Ok(Self {
            employees: lines,
            total_payroll: from_cents(total_cents),
            total_net_pay: from_cents(net_cents),
            overtime_multiplier,
            currency_symbol: currency_symbol.to_owned(),
            summary: String::new(),
            generated_at: None,
        })
    }

    /// Attach the summary text and generation time.
    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = summary.into();
        self.generated_at = Some(Utc::now());
        self
    }

    /// The employee records the report was computed from, in order.
    pub fn employee_list(&self) -> Vec<Employee> {
        self.employees.iter().map(PayrollLine::employee).collect()
    }

    /// A deterministic one-sentence summary.
    pub fn default_summary(&self) -> String {
        format!(
            "Payroll calculated for {} employee{}. Total payroll: {}.",
            self.employees.len(),
            if self.employees.len() == 1 { "" } else { "s" },
            format_amount(&self.currency_symbol, self.total_payroll)
        )
    }

    // -- Export --------------------------------------------------------------

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a report previously produced by [`PayrollReport::to_json`].
    pub fn from_json(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    /// CSV with one row per employee, columns as in [`CSV_HEADER`].
    pub fn to_csv(&self) -> String {
        let mut out = String::with_capacity(64 * (self.employees.len() + 1));
        out.push_str(CSV_HEADER);
        out.push('\n');

        for line in &self.employees {
            let _ = writeln!(
                out,
                "{},{:.2},{:.2},{},{},{:.2},{:.2},{:.2}",
                csv_field(&line.name),
                line.payrate,
                line.overtime_rate,
                line.regular_hours,
                line.overtime_hours,
                line.regular_pay,
                line.overtime_pay,
                line.total_pay,
            );
        }

        out
    }

    /// Multi-line text rendering for chat replies.
    pub fn render_text(&self) -> String {
        let cur = self.currency_symbol.as_str();
        let mut out = String::from("PAYROLL REPORT\n");
        out.push_str(&"=".repeat(40));
        out.push('\n');

        for line in &self.employees {
            let _ = writeln!(out, "\n{}", line.name);
            let _ = writeln!(
                out,
                "  Regular:  {}h x {} = {}",
                line.regular_hours,
                format_amount(cur, line.payrate),
                format_amount(cur, line.regular_pay)
            );
            if line.overtime_hours > 0.0 {
                let _ = writeln!(
                    out,
                    "  Overtime: {}h x {} = {}",
                    line.overtime_hours,
                    format_amount(cur, line.overtime_rate),
                    format_amount(cur, line.overtime_pay)
                );
            }
            let _ = writeln!(out, "  Total:    {}", format_amount(cur, line.total_pay));
            if line.deductions > 0.0 {
                let _ = writeln!(
                    out,
                    "  Net:      {} (after {} deductions)",
                    format_amount(cur, line.net_pay),
                    format_amount(cur, line.deductions)
                );
            }
        }

        out.push('\n');
        out.push_str(&"=".repeat(40));
        let _ = write!(
            out,
            "\nTOTAL PAYROLL: {}",
            format_amount(cur, self.total_payroll)
        );
        if !self.summary.is_empty() {
            let _ = write!(out, "\n\n{}", self.summary);
        }
        out
    }
}

fn payroll_out_of_range(what: &str) -> CoreError {
    CoreError::AmountOutOfRange {
        name: "payroll".into(),
        reason: format!("{what} is too large"),
    }
}

/// Quote a CSV field when it contains a delimiter, quote, or line break.
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn cents(amount: f64) -> i64 {
        crate::money::to_cents(amount).unwrap()
    }

    fn john() -> Employee {
        Employee::new("John Doe", 25.0, 40.0, 5.0)
    }

    #[test]
    fn john_doe_scenario() {
        let report = PayrollReport::compute(&[john()], 1.5, "$").unwrap();
        let line = &report.employees[0];
        assert_eq!(line.regular_pay, 1000.0);
        assert_eq!(line.overtime_pay, 187.5);
        assert_eq!(line.total_pay, 1187.5);
        assert_eq!(line.overtime_rate, 37.5);
        assert_eq!(report.total_payroll, 1187.5);
    }

    #[test]
    fn total_is_sum_of_parts_at_cent_precision() {
        let staff = vec![
            Employee::new("A", 17.33, 38.5, 2.25),
            Employee::new("B", 21.07, 40.0, 7.75),
            Employee::new("C", 9.99, 12.5, 0.0),
        ];
        let report = PayrollReport::compute(&staff, 1.5, "$").unwrap();

        let mut sum = 0;
        for (line, e) in report.employees.iter().zip(&staff) {
            assert_eq!(
                cents(line.total_pay),
                cents(line.regular_pay) + cents(line.overtime_pay)
            );
            assert_eq!(
                cents(line.regular_pay),
                cents(e.payrate * e.regular_hours)
            );
            sum += cents(line.total_pay);
        }
        assert_eq!(cents(report.total_payroll), sum);
    }

    #[test]
    fn rejects_multiplier_below_one() {
        assert!(PayrollReport::compute(&[john()], 0.5, "$").is_err());
        assert!(PayrollReport::compute(&[john()], f64::INFINITY, "$").is_err());
    }

    #[test]
    fn rejects_invalid_employee() {
        let bad = Employee::new("X", 10.0, -1.0, 0.0);
        assert!(PayrollReport::compute(&[bad], 1.5, "$").is_err());
    }

    #[test]
    fn huge_amounts_are_errors_not_overflow() {
        let big = Employee::new("Big", 1e17, 1000.0, 1000.0);
        assert!(big.validate().is_ok());
        match PayrollReport::compute(&[big], 1.5, "$") {
            Err(CoreError::AmountOutOfRange { name, .. }) => assert_eq!(name, "Big"),
            other => panic!("expected AmountOutOfRange, got {other:?}"),
        }
    }

    #[test]
    fn total_overflow_across_employees_is_an_error() {
        // Each line fits on its own; the sum does not.
        let staff: Vec<Employee> = (0..4)
            .map(|i| Employee::new(format!("E{i}"), 1e12, 40.0, 0.0))
            .collect();
        assert!(PayrollLine::compute(&staff[0], 1.5).is_ok());
        assert!(matches!(
            PayrollReport::compute(&staff, 1.5, "$"),
            Err(CoreError::AmountOutOfRange { .. })
        ));
    }

    #[test]
    fn net_pay_subtracts_deductions() {
        let mut e = john();
        e.deductions = 87.5;
        let report = PayrollReport::compute(&[e], 1.5, "$").unwrap();
        assert_eq!(report.employees[0].net_pay, 1100.0);
        assert_eq!(report.total_net_pay, 1100.0);
        assert_eq!(report.total_payroll, 1187.5);
    }

    #[test]
    fn csv_quotes_names_with_commas() {
        let e = Employee::new("Doe, Jane \"JJ\"", 20.0, 10.0, 0.0);
        let csv = PayrollReport::compute(&[e], 1.5, "$").unwrap().to_csv();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some(CSV_HEADER));
        assert_eq!(
            lines.next(),
            Some("\"Doe, Jane \"\"JJ\"\"\",20.00,30.00,10,0,200.00,0.00,200.00")
        );
    }

    #[test]
    fn render_text_mentions_total() {
        let report = PayrollReport::compute(&[john()], 1.5, "$").unwrap();
        let text = report.render_text();
        assert!(text.contains("John Doe"));
        assert!(text.contains("Overtime: 5h x $37.50 = $187.50"));
        assert!(text.contains("TOTAL PAYROLL: $1187.50"));
    }

    #[test]
    fn default_summary_pluralizes() {
        let one = PayrollReport::compute(&[john()], 1.5, "$").unwrap();
        assert_eq!(
            one.default_summary(),
            "Payroll calculated for 1 employee. Total payroll: $1187.50."
        );
    }
}
