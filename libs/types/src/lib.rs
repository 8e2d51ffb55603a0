//! # Hyperdrive Types Library
//!
//! Shared value types for the Hyperdrive pricing and simulation core.
//!
//! ## Design Philosophy
//!
//! - **No Precision Loss**: All financial values stored as scaled integers
//!   (`FixedPoint`, 18 decimals, the on-chain WAD format)
//! - **Deterministic Math**: Transcendental functions computed in the
//!   scaled-integer domain so results are bit-identical across runs
//! - **Value Objects Everywhere**: Pool snapshots, trade quotes, and reserve
//!   deltas are plain immutable data; nothing in this crate holds state
//! - **Clear Boundaries**: Explicit conversion points between floating-point
//!   and fixed-point, and between ABI camelCase and Rust snake_case
//!
//! ## Quick Start
//!
//! ```rust
//! use hyperdrive_types::FixedPoint;
//!
//! // Parse from decimal strings (primary method)
//! let price = FixedPoint::from_decimal_str("0.95").unwrap();
//!
//! // Checked arithmetic with explicit rounding direction
//! let discount = FixedPoint::ONE.checked_sub(price).unwrap();
//! let fee = discount.mul_down(FixedPoint::from_decimal_str("0.1").unwrap()).unwrap();
//! assert_eq!(fee, FixedPoint::from_decimal_str("0.005").unwrap());
//! ```
//!
//! Pool snapshots (`PoolConfig`, `PoolInfo`, `Checkpoint`) round-trip
//! losslessly through the chain reader's camelCase scaled-integer JSON.

pub mod errors;
pub mod fixed_point;
pub mod pool;
pub mod trade;

pub use errors::FixedPointError;
pub use fixed_point::FixedPoint;
pub use pool::{Checkpoint, PoolConfig, PoolInfo};
pub use trade::{ReservesDelta, SolverStatus, Token, TradeDirection, TradeQuote};

/// Seconds in a (non-leap) year, the annualization basis used on-chain
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

/// Days in the annualization basis
pub const DAYS_PER_YEAR: u64 = 365;
