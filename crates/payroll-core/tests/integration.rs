//! Integration tests for the payroll-core crate.
//!
//! These exercise the public API the way the agent uses it: merge an
//! extracted list into a snapshot, compute a report, export it, and read it
//! back.

use payroll_core::{Employee, PayrollReport, merge_employees, money::to_cents};

fn staff() -> Vec<Employee> {
    let mut alice = Employee::new("Alice", 20.0, 40.0, 0.0);
    alice.employee_id = Some("E-001".into());
    vec![
        alice,
        Employee::new("Bob", 18.25, 37.5, 3.5),
        Employee::new("Carol, Jr.", 31.4, 40.0, 10.0),
    ]
}

// ═══════════════════════════════════════════════════════════════════════
//  Determinism
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn report_is_idempotent() {
    let a = PayrollReport::compute(&staff(), 1.5, "$").unwrap();
    let b = PayrollReport::compute(&staff(), 1.5, "$").unwrap();

    assert_eq!(a, b);
    assert_eq!(
        a.total_payroll.to_bits(),
        b.total_payroll.to_bits(),
        "totals must be byte-identical"
    );
}

#[test]
fn multiplier_changes_only_overtime() {
    let base = PayrollReport::compute(&staff(), 1.5, "$").unwrap();
    let double = PayrollReport::compute(&staff(), 2.0, "$").unwrap();

    for (x, y) in base.employees.iter().zip(&double.employees) {
        assert_eq!(x.regular_pay, y.regular_pay);
        if x.overtime_hours > 0.0 {
            assert!(y.overtime_pay > x.overtime_pay);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Export round-trip
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn json_round_trip_preserves_employees_and_total() {
    let report = PayrollReport::compute(&staff(), 1.5, "$")
        .unwrap()
        .with_summary("Three employees paid.");

    let json = report.to_json().unwrap();
    let parsed = PayrollReport::from_json(&json).unwrap();

    assert_eq!(parsed.employee_list(), staff());
    assert_eq!(to_cents(parsed.total_payroll), to_cents(report.total_payroll));
    assert_eq!(parsed.summary, "Three employees paid.");
}

#[test]
fn json_uses_documented_field_names() {
    let report = PayrollReport::compute(&staff(), 1.5, "$").unwrap();
    let v: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();

    for key in ["employees", "total_payroll", "summary", "overtime_multiplier"] {
        assert!(v.get(key).is_some(), "missing top-level `{key}`");
    }
    let line = &v["employees"][0];
    for key in [
        "name",
        "payrate",
        "overtime_rate",
        "regular_hours",
        "overtime_hours",
        "regular_pay",
        "overtime_pay",
        "total_pay",
    ] {
        assert!(line.get(key).is_some(), "missing line field `{key}`");
    }
}

#[test]
fn recomputing_from_export_matches() {
    let report = PayrollReport::compute(&staff(), 1.5, "$").unwrap();
    let again =
        PayrollReport::compute(&report.employee_list(), report.overtime_multiplier, "$").unwrap();
    assert_eq!(report.employees, again.employees);
    assert_eq!(report.total_payroll, again.total_payroll);
}

#[test]
fn csv_has_one_row_per_employee() {
    let csv = PayrollReport::compute(&staff(), 1.5, "$").unwrap().to_csv();
    assert_eq!(csv.lines().count(), 4);
    assert!(csv.lines().nth(3).unwrap().starts_with("\"Carol, Jr.\","));
}

// ═══════════════════════════════════════════════════════════════════════
//  Merge then report
// ═══════════════════════════════════════════════════════════════════════

#[test]
fn merge_then_report() {
    let snapshot = staff();
    let extracted = vec![
        Employee::new("bob", 0.0, 40.0, 0.0),
        Employee::new("Dana", 22.0, 20.0, 0.0),
    ];

    let merged = merge_employees(&snapshot, &extracted);
    assert_eq!(merged.len(), 4);
    assert_eq!(merged[1].payrate, 18.25, "zero rate keeps the snapshot rate");
    assert_eq!(merged[1].overtime_hours, 0.0, "hours come from the document");

    let report = PayrollReport::compute(&merged, 1.5, "$").unwrap();
    assert_eq!(report.employees[3].total_pay, 440.0);
}
