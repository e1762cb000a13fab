//! Employee records and list operations.
//!
//! An employee is identified by name within a single run.  Names are compared
//! after trimming and case folding, so `"alice "` and `"Alice"` refer to the
//! same person.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

// ---------------------------------------------------------------------------
// Employee
// ---------------------------------------------------------------------------

/// Pay data for a single employee over one pay period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Display name, also the identity key within a list.
    pub name: String,

    /// Optional payroll identifier (badge number, staff code, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,

    /// Hourly pay rate.
    pub payrate: f64,

    /// Regular hours worked in the period.
    #[serde(default)]
    pub regular_hours: f64,

    /// Overtime hours worked in the period.
    #[serde(default)]
    pub overtime_hours: f64,

    /// Amount withheld from gross pay.
    #[serde(default)]
    pub deductions: f64,
}

impl Employee {
    /// Create an employee with no identifier and no deductions.
    pub fn new(
        name: impl Into<String>,
        payrate: f64,
        regular_hours: f64,
        overtime_hours: f64,
    ) -> Self {
        Self {
            name: name.into(),
            employee_id: None,
            payrate,
            regular_hours,
            overtime_hours,
            deductions: 0.0,
        }
    }

    /// Check that the name is present and every number is finite and
    /// non-negative.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(CoreError::InvalidEmployee {
                name: self.name.clone(),
                reason: "name is empty".into(),
            });
        }

        for field in NumericField::ALL {
            check_amount(&self.name, field.label(), self.get(field))?;
        }
        check_amount(&self.name, "pay rate", self.payrate)
    }

    /// Whether `name` refers to this employee.
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }

    /// Read one of the adjustable numeric fields.
    pub fn get(&self, field: NumericField) -> f64 {
        match field {
            NumericField::RegularHours => self.regular_hours,
            NumericField::OvertimeHours => self.overtime_hours,
            NumericField::Deductions => self.deductions,
        }
    }

    /// Overwrite one of the adjustable numeric fields after validating the
    /// new value.
    pub fn set(&mut self, field: NumericField, value: f64) -> Result<()> {
        check_amount(&self.name, field.label(), value)?;
        match field {
            NumericField::RegularHours => self.regular_hours = value,
            NumericField::OvertimeHours => self.overtime_hours = value,
            NumericField::Deductions => self.deductions = value,
        }
        Ok(())
    }

    /// Overwrite the hourly rate after validating it.
    pub fn set_payrate(&mut self, payrate: f64) -> Result<()> {
        check_amount(&self.name, "pay rate", payrate)?;
        self.payrate = payrate;
        Ok(())
    }

    /// One-line description used in chat replies.
    pub fn summary_line(&self, currency: &str) -> String {
        let mut line = format!(
            "{}: {}h regular, {}h overtime @ {currency}{:.2}/hr",
            self.name, self.regular_hours, self.overtime_hours, self.payrate
        );
        if let Some(id) = &self.employee_id {
            line.push_str(&format!(" (id {id})"));
        }
        if self.deductions > 0.0 {
            line.push_str(&format!(", deductions {currency}{:.2}", self.deductions));
        }
        line
    }
}

fn check_amount(name: &str, label: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(CoreError::InvalidEmployee {
            name: name.to_owned(),
            reason: format!("{label} must be a non-negative number, got {value}"),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Numeric fields
// ---------------------------------------------------------------------------

/// The numeric fields a user may adjust individually in conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NumericField {
    RegularHours,
    OvertimeHours,
    Deductions,
}

impl NumericField {
    /// Every adjustable field, in display order.
    pub const ALL: [NumericField; 3] = [
        NumericField::RegularHours,
        NumericField::OvertimeHours,
        NumericField::Deductions,
    ];

    /// Wire name, as used in tool arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RegularHours => "regular_hours",
            Self::OvertimeHours => "overtime_hours",
            Self::Deductions => "deductions",
        }
    }

    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Self::RegularHours => "regular hours",
            Self::OvertimeHours => "overtime hours",
            Self::Deductions => "deductions",
        }
    }

    /// Parse a wire name.  Returns `None` for anything outside the closed set.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.as_str() == s)
    }
}

impl fmt::Display for NumericField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// List helpers
// ---------------------------------------------------------------------------

/// Compare two employee names the way the assistant resolves references.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Index of the first employee called `name`.
pub fn position_of(list: &[Employee], name: &str) -> Option<usize> {
    list.iter().position(|e| e.is_named(name))
}

/// Merge a freshly extracted list into a prior snapshot.
///
/// - Every snapshot employee is kept, in snapshot order.
/// - An extracted employee with a known name replaces the hours; the rate is
///   replaced only when the extracted rate is positive, and the identifier and
///   deductions only when the extraction carries them.
/// - Unknown names are appended in extraction order.  A name repeated within
///   the extracted list overrides its earlier occurrence.
pub fn merge_employees(existing: &[Employee], updates: &[Employee]) -> Vec<Employee> {
    let mut merged: Vec<Employee> = existing.to_vec();
    let mut added = 0usize;

    for update in updates {
        match position_of(&merged, &update.name) {
            Some(idx) => {
                let current = &mut merged[idx];
                current.regular_hours = update.regular_hours;
                current.overtime_hours = update.overtime_hours;
                if update.payrate > 0.0 {
                    current.payrate = update.payrate;
                }
                if update.employee_id.is_some() {
                    current.employee_id = update.employee_id.clone();
                }
                if update.deductions > 0.0 {
                    current.deductions = update.deductions;
                }
            }
            None => {
                merged.push(update.clone());
                added += 1;
            }
        }
    }

    tracing::debug!(
        existing = existing.len(),
        updates = updates.len(),
        added,
        total = merged.len(),
        "merged employee lists"
    );

    merged
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_negative_and_nan() {
        assert!(Employee::new("Ann", 20.0, 40.0, 0.0).validate().is_ok());
        assert!(Employee::new("Ann", -1.0, 40.0, 0.0).validate().is_err());
        assert!(Employee::new("Ann", 20.0, f64::NAN, 0.0).validate().is_err());
        assert!(Employee::new("  ", 20.0, 40.0, 0.0).validate().is_err());

        let mut e = Employee::new("Ann", 20.0, 40.0, 0.0);
        e.deductions = -5.0;
        assert!(e.validate().is_err());
    }

    #[test]
    fn names_compare_case_insensitively() {
        assert!(names_match("Alice", " alice "));
        assert!(!names_match("Alice", "Alicia"));
    }

    #[test]
    fn set_field_validates() {
        let mut e = Employee::new("Bob", 18.0, 40.0, 2.0);
        e.set(NumericField::OvertimeHours, 6.0).unwrap();
        assert_eq!(e.overtime_hours, 6.0);
        assert!(e.set(NumericField::RegularHours, -3.0).is_err());
        assert_eq!(e.regular_hours, 40.0);
    }

    #[test]
    fn numeric_field_parse_is_closed() {
        assert_eq!(
            NumericField::parse("deductions"),
            Some(NumericField::Deductions)
        );
        assert_eq!(NumericField::parse("payrate"), None);
        assert_eq!(NumericField::parse("bonus"), None);
    }

    #[test]
    fn merge_keeps_rate_when_update_has_zero() {
        let existing = vec![
            Employee::new("Alice", 20.0, 40.0, 0.0),
            Employee::new("Bob", 18.0, 38.0, 1.0),
        ];
        let updates = vec![
            Employee::new("alice", 0.0, 35.0, 4.0),
            Employee::new("Carol", 30.0, 40.0, 0.0),
        ];

        let merged = merge_employees(&existing, &updates);
        assert_eq!(merged.len(), 3);

        assert_eq!(merged[0].name, "Alice");
        assert_eq!(merged[0].payrate, 20.0);
        assert_eq!(merged[0].regular_hours, 35.0);
        assert_eq!(merged[0].overtime_hours, 4.0);

        assert_eq!(merged[1], existing[1]);
        assert_eq!(merged[2].name, "Carol");
    }

    #[test]
    fn merge_later_duplicate_wins() {
        let updates = vec![
            Employee::new("Dan", 15.0, 10.0, 0.0),
            Employee::new("Dan", 16.0, 12.0, 0.0),
        ];
        let merged = merge_employees(&[], &updates);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].payrate, 16.0);
        assert_eq!(merged[0].regular_hours, 12.0);
    }

    #[test]
    fn serde_defaults_optional_fields() {
        let e: Employee =
            serde_json::from_str(r#"{"name":"Eve","payrate":22.5,"regular_hours":40}"#).unwrap();
        assert_eq!(e.overtime_hours, 0.0);
        assert_eq!(e.deductions, 0.0);
        assert!(e.employee_id.is_none());
    }
}
