//! Error types for fixed-point arithmetic
//!
//! Provides the arithmetic error taxonomy shared by every calculation in the
//! pricing core. These errors are always fatal to the calculation in
//! progress; callers must never clamp or substitute a default value.

use thiserror::Error;

/// Errors that can occur during fixed-point arithmetic operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FixedPointError {
    /// Result exceeds the maximum representable scaled value
    #[error("Overflow: result of {op} exceeds the representable range")]
    Overflow { op: &'static str },

    /// Result is below the minimum representable scaled value
    #[error("Underflow: result of {op} is below the representable range")]
    Underflow { op: &'static str },

    /// Division by zero in fixed-point arithmetic
    #[error("Division by zero in fixed-point arithmetic")]
    DivisionByZero,

    /// `ln` (and therefore a fractional power) requires a positive argument
    #[error("Logarithm of a non-positive value ({value})")]
    NonPositiveLogArgument { value: i128 },

    /// Invalid decimal string format
    #[error("Invalid decimal string: '{input}' - expected numeric format")]
    InvalidDecimal { input: String },

    /// Value is not finite (NaN or infinity)
    #[error("Value is not finite: {value}")]
    NotFinite { value: f64 },
}
