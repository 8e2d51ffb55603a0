//! Trade-facing value objects produced by the pricing core
//!
//! Each of these is created fresh per calculation and never mutated by the
//! core afterwards; callers own the result outright.

use crate::fixed_point::FixedPoint;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The two sides of the yield market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Token {
    /// Underlying base asset
    Base,
    /// Fixed-yield bond token
    Fyt,
}

impl Token {
    /// The opposite side of a pair
    pub fn other(self) -> Self {
        match self {
            Token::Base => Token::Fyt,
            Token::Fyt => Token::Base,
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Base => f.write_str("base"),
            Token::Fyt => f.write_str("fyt"),
        }
    }
}

/// Which side of a trade the caller has fixed
///
/// `In` means the quote solves for the input required to receive a fixed
/// output; `Out` means it solves for the output received for a fixed input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TradeDirection {
    In,
    Out,
}

impl fmt::Display for TradeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeDirection::In => f.write_str("in"),
            TradeDirection::Out => f.write_str("out"),
        }
    }
}

/// Output of a forward or inverse curve calculation
///
/// For `calc_out_given_in` the `amount_out_*` fields describe what the
/// trader receives; for the mirror `calc_in_given_out` they carry the
/// computed input side (the amount the trader must pay), since the fee is
/// added rather than subtracted there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TradeQuote {
    pub amount_in: FixedPoint,
    pub amount_out_without_fee_or_slippage: FixedPoint,
    pub amount_out_without_fee: FixedPoint,
    pub amount_out_with_fee: FixedPoint,
    pub curve_fee: FixedPoint,
    pub governance_fee: FixedPoint,
    pub flat_fee: FixedPoint,
}

/// Whether the target-rate solver reached its tolerance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    /// `|predicted - target|` fell within tolerance
    Converged,
    /// The iteration cap was reached first; the delta is best-effort
    IterationLimited,
}

/// Output of the target-rate solver: signed reserve deltas
///
/// Positive `bonds_needed` corresponds to the short-side flow (bonds moving
/// from the trader into the pool); the sign flips when the target rate
/// crosses the current rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservesDelta {
    pub shares_needed: FixedPoint,
    pub bonds_needed: FixedPoint,
    pub status: SolverStatus,
    pub iterations: u32,
}

impl ReservesDelta {
    pub fn converged(&self) -> bool {
        self.status == SolverStatus::Converged
    }
}
