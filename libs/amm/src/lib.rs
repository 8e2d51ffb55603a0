//! # Hyperdrive AMM Library - Bonding-Curve Mathematics Engine
//!
//! ## Purpose
//!
//! Closed-form pricing for a yield-bearing bond market: spot prices, fixed
//! rates, trade quotes, fee breakdowns, maximum trade bounds, LP mint/burn
//! math, and the iterative solver that sizes the trade needed to move a pool
//! to a target rate. Every calculation runs on 18-decimal scaled integers so
//! results match on-chain arithmetic bit-for-bit; a mismatch here translates
//! directly into money lost on a live trade.
//!
//! ## Integration Points
//!
//! - **Input Sources**: `PoolConfig`/`PoolInfo`/`Checkpoint` snapshots from
//!   the chain reader, trade parameters from strategy engines
//! - **Output Destinations**: trading policies (trade quotes, reserve
//!   deltas), the historical simulator (pricing models), analytics layers
//! - **Precision**: `hyperdrive_types::FixedPoint` throughout; no
//!   floating-point in any calculation path
//! - **Validation**: snapshot invariants are checked at calculator
//!   construction and every domain violation fails fast
//!
//! ## Architecture Role
//!
//! This crate is the mathematical foundation between the raw snapshot types
//! (`hyperdrive-types`) and the simulation driver (`hyperdrive-sim`). It
//! holds no state beyond the snapshot a calculator was built from and
//! performs no I/O; callers re-create calculators per block.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`curve`] | YieldSpace invariant primitives (k, spot price, APR, share/bond solves) |
//! | [`pool_state`] | [`PoolStateCalculator`] over one pool snapshot |
//! | [`target_rate`] | [`TargetRateSolver`] fixed-point iteration |
//! | [`liquidity`] | LP-token mint/burn math |
//! | [`pricing`] | [`PricingModel`] trait and [`ModelKind`] dispatch |
//! | [`element`], [`yield_space`] | The three bonding-curve variants |
//! | [`errors`] | [`AmmError`] taxonomy |

pub mod curve;
pub mod element;
pub mod errors;
pub mod liquidity;
pub mod pool_state;
pub mod pricing;
pub mod target_rate;
pub mod yield_space;

pub use element::ElementModel;
pub use errors::AmmError;
pub use pool_state::PoolStateCalculator;
pub use pricing::{ModelKind, PricingModel, MINIMUM_FEE_RATE};
pub use target_rate::{SolverOptions, TargetRateSolver, MAX_ITER, TOLERANCE};
pub use yield_space::{YieldSpaceMinFeeModel, YieldSpaceModel};
