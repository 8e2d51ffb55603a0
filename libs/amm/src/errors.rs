//! Error taxonomy for the bonding-curve math
//!
//! Every error is raised to the immediate caller; this crate never retries,
//! logs-and-swallows, or clamps a bad result to something plausible.

use hyperdrive_types::FixedPointError;
use thiserror::Error;

/// Errors produced by curve calculations and the pool-state calculator
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AmmError {
    /// Fixed-point arithmetic failed (overflow, division by zero, invalid
    /// fractional power base)
    #[error(transparent)]
    Arithmetic(#[from] FixedPointError),

    /// A calculation would require a complex or undefined result, e.g. a
    /// trade that depletes reserves below zero before the invariant can be
    /// solved
    #[error("Numeric domain violation in {context}")]
    NumericDomain { context: &'static str },

    /// A caller-supplied state violates a data-model invariant; rejected
    /// before any computation
    #[error("Invariant violation: {reason}")]
    InvariantViolation { reason: &'static str },
}
