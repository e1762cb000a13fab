//! Payroll data model.
//!
//! Plain records for employee pay data and the aggregate payroll report.
//! Nothing in this crate talks to a language model; it owns the arithmetic
//! and the export formats so that every figure the assistant shows can be
//! recomputed deterministically.
//!
//! ## Modules
//!
//! - [`employee`] -- Employee records, adjustable fields, list merge.
//! - [`report`] -- Report computation, JSON and CSV export, text rendering.
//! - [`money`] -- Cent-precision arithmetic and formatting.
//! - [`error`] -- Core error types.

pub mod employee;
pub mod error;
pub mod money;
pub mod report;

pub use employee::{Employee, NumericField, merge_employees, names_match, position_of};
pub use error::{CoreError, Result};
pub use report::{CSV_HEADER, DEFAULT_OVERTIME_MULTIPLIER, PayrollLine, PayrollReport};
