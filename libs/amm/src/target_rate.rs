//! Target-rate solver: reserve deltas that move the pool to a desired rate
//!
//! Used by arbitrage policies to size the trade that pushes the fixed rate
//! toward the variable rate. The solver runs a fixed-point iteration rather
//! than a generic root-finder: each step computes the bond reserves that
//! would exactly hit the target at the current share reserves, closes half
//! of that gap on the bond side (a real trade moves shares and bonds in
//! amounts of equal value, so the other half arrives through the share-side
//! flow), simulates that flow with fees and the governance skim, and
//! re-evaluates. The half-step is an approximation, kept deliberately.
//!
//! The solver always works on a local copy of the snapshot; the caller's
//! `PoolInfo` is never touched.

use crate::curve;
use crate::errors::AmmError;
use hyperdrive_types::{FixedPoint, PoolConfig, PoolInfo, ReservesDelta, SolverStatus};
use tracing::{debug, info};

/// Default absolute tolerance on the predicted rate, in rate units
pub const TOLERANCE: FixedPoint = FixedPoint::from_scaled(1);

/// Default iteration cap
pub const MAX_ITER: u32 = 10;

/// Tunable solver knobs
///
/// A caller wanting a cheaper or stricter solve adjusts these rather than
/// wrapping the solver in a timeout.
#[derive(Debug, Clone, Copy)]
pub struct SolverOptions {
    pub tolerance: FixedPoint,
    pub max_iter: u32,
}

impl Default for SolverOptions {
    fn default() -> Self {
        Self {
            tolerance: TOLERANCE,
            max_iter: MAX_ITER,
        }
    }
}

/// Computes the `(shares_needed, bonds_needed)` pair for a target fixed rate
#[derive(Debug, Clone)]
pub struct TargetRateSolver {
    config: PoolConfig,
    info: PoolInfo,
    options: SolverOptions,
}

impl TargetRateSolver {
    pub fn new(config: PoolConfig, info: PoolInfo) -> Self {
        Self {
            config,
            info,
            options: SolverOptions::default(),
        }
    }

    pub fn with_options(mut self, options: SolverOptions) -> Self {
        self.options = options;
        self
    }

    /// Solve for the reserve deltas that put the pool at `target_rate`
    ///
    /// Hitting the iteration cap is not an error: the best-effort delta is
    /// returned with `SolverStatus::IterationLimited` so the caller can
    /// decide whether to trade on it.
    pub fn solve(&self, target_rate: FixedPoint) -> Result<ReservesDelta, AmmError> {
        let config = &self.config;
        let mut working = self.info.clone();

        let current_rate = curve::calc_apr(
            working.share_reserves,
            working.share_adjustment,
            working.bond_reserves,
            config.initial_share_price,
            config.position_duration,
            config.time_stretch,
        )?;
        info!(target_rate = %target_rate, current_rate = %current_rate, "targeting fixed rate");

        let mut predicted_rate = FixedPoint::ZERO;
        let mut total_shares_needed = FixedPoint::ZERO;
        let mut total_bonds_needed = FixedPoint::ZERO;
        let mut iterations = 0u32;

        while predicted_rate.checked_sub(target_rate)?.abs() > self.options.tolerance {
            iterations += 1;
            let target_bonds = curve::calc_bond_reserves(
                working.share_reserves,
                working.share_adjustment,
                config.initial_share_price,
                target_rate,
                config.position_duration,
                config.inv_time_stretch,
            )?;
            // bonds_needed closes the reserve-ratio gap with shares held
            // constant; a trade moves both sides in equal value, so only
            // half is taken on the bond side
            let bonds_needed = target_bonds
                .checked_sub(working.bond_reserves)?
                .div_down(FixedPoint::TWO)?;
            if bonds_needed.is_positive() {
                // short case: bonds flow in, shares flow out to the user,
                // and governance skims in the same direction
                let (shares_out, _, governance_fee) = curve::shares_out_for_bonds_in(
                    working.bond_reserves,
                    working.share_price,
                    config.initial_share_price,
                    working.share_reserves,
                    bonds_needed,
                    config.time_stretch,
                    config.curve_fee,
                    config.governance_fee,
                )?;
                working.share_reserves = working
                    .share_reserves
                    .checked_sub(shares_out)?
                    .checked_sub(governance_fee)?;
            } else {
                // long case: shares flow in from the user, governance still
                // takes its cut out of the pool
                let (shares_in, _, governance_fee) = curve::shares_in_for_bonds_out(
                    working.bond_reserves,
                    working.share_price,
                    config.initial_share_price,
                    working.share_reserves,
                    bonds_needed.abs(),
                    config.time_stretch,
                    config.curve_fee,
                    config.governance_fee,
                )?;
                working.share_reserves = working
                    .share_reserves
                    .checked_add(shares_in)?
                    .checked_sub(governance_fee)?;
            }
            working.bond_reserves = working.bond_reserves.checked_add(bonds_needed)?;
            total_shares_needed = working
                .share_reserves
                .checked_sub(self.info.share_reserves)?;
            total_bonds_needed = working
                .bond_reserves
                .checked_sub(self.info.bond_reserves)?;
            predicted_rate = curve::calc_apr(
                working.share_reserves,
                FixedPoint::ZERO,
                working.bond_reserves,
                config.initial_share_price,
                config.position_duration,
                config.time_stretch,
            )?;
            debug!(
                iteration = iterations,
                predicted = %predicted_rate,
                d_bonds = %total_bonds_needed,
                d_shares = %total_shares_needed,
                "solver step"
            );
            if iterations >= self.options.max_iter {
                break;
            }
        }

        let residual = predicted_rate.checked_sub(target_rate)?.abs();
        let status = if residual <= self.options.tolerance {
            SolverStatus::Converged
        } else {
            SolverStatus::IterationLimited
        };
        debug!(residual = %residual, iterations, "solver finished");
        Ok(ReservesDelta {
            shares_needed: total_shares_needed,
            bonds_needed: total_bonds_needed,
            status,
            iterations,
        })
    }
}
