//! Core error types.
//!
//! Every fallible operation on the payroll data model surfaces a
//! [`CoreError`].  Variants carry the offending employee name where one is
//! known so callers can render a readable message.

/// Unified error type for the payroll data model.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    // -- Validation ----------------------------------------------------------
    /// An employee record failed field validation.
    #[error("invalid employee `{name}`: {reason}")]
    InvalidEmployee { name: String, reason: String },

    /// A pay figure is too large to compute at cent precision.
    #[error("amount out of range for `{name}`: {reason}")]
    AmountOutOfRange { name: String, reason: String },

    /// The overtime multiplier is not a finite number >= 1.
    #[error("invalid overtime multiplier: {value}")]
    InvalidMultiplier { value: f64 },

    // -- Serialization -------------------------------------------------------
    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the core crate.
pub type Result<T> = std::result::Result<T, CoreError>;
