//! Hyperdrive bonding-curve primitives
//!
//! Pure functions over fixed-point operands implementing the YieldSpace
//! invariant
//!
//! ```text
//! k = (c / mu) * (mu * z)^(1 - t) + y^(1 - t)
//! ```
//!
//! solved forward (trade in -> out) and inverse (out -> required in) on the
//! share side, plus the spot-price, APR, and target-bond-reserve formulas the
//! higher layers are built from. Nothing here touches pool-level fees beyond
//! the curve fee and its governance skim; flat fees live with the pool-state
//! calculator.

use crate::errors::AmmError;
use hyperdrive_types::{FixedPoint, SECONDS_PER_YEAR};

/// Share reserves net of the zeta adjustment
///
/// Rejects a snapshot whose adjustment swallows the entire share balance.
pub fn effective_share_reserves(
    share_reserves: FixedPoint,
    share_adjustment: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let effective = share_reserves.checked_sub(share_adjustment)?;
    if !effective.is_positive() {
        return Err(AmmError::InvariantViolation {
            reason: "share adjustment leaves no effective share reserves",
        });
    }
    Ok(effective)
}

/// The AMM invariant `k = (c/mu) * (mu*z)^(1-t) + y^(1-t)`
pub fn calc_k(
    share_price: FixedPoint,
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    bond_reserves: FixedPoint,
    time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let one_minus_t = FixedPoint::ONE.checked_sub(time_stretch)?;
    let shares_term = initial_share_price
        .mul_down(share_reserves)?
        .pow(one_minus_t)?;
    let scale = share_price.div_down(initial_share_price)?;
    Ok(scale
        .mul_down(shares_term)?
        .checked_add(bond_reserves.pow(one_minus_t)?)?)
}

/// Spot price `(mu * (z - zeta) / y)^t`
///
/// Degenerates to a division-by-zero error when the bond reserves are zero.
pub fn calc_spot_price(
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    share_adjustment: FixedPoint,
    bond_reserves: FixedPoint,
    time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let effective = effective_share_reserves(share_reserves, share_adjustment)?;
    Ok(initial_share_price
        .mul_down(effective)?
        .div_down(bond_reserves)?
        .pow(time_stretch)?)
}

/// Fixed rate implied by the reserves: `(1 - p) / (p * t_years)`
pub fn calc_apr(
    share_reserves: FixedPoint,
    share_adjustment: FixedPoint,
    bond_reserves: FixedPoint,
    initial_share_price: FixedPoint,
    position_duration: u64,
    time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let annualized = annualized_position_duration(position_duration)?;
    let spot_price = calc_spot_price(
        initial_share_price,
        share_reserves,
        share_adjustment,
        bond_reserves,
        time_stretch,
    )?;
    Ok(FixedPoint::ONE
        .checked_sub(spot_price)?
        .div_down(spot_price.mul_down(annualized)?)?)
}

/// Position duration as a fraction of a year
pub fn annualized_position_duration(position_duration: u64) -> Result<FixedPoint, AmmError> {
    Ok(FixedPoint::from_int(position_duration as i64)
        .div_down(FixedPoint::from_int(SECONDS_PER_YEAR as i64))?)
}

/// Bond reserves that put the pool exactly at `target_rate` for the given
/// share reserves: `mu * (z - zeta) * (1 + r * t_years)^(1/tau)`
pub fn calc_bond_reserves(
    share_reserves: FixedPoint,
    share_adjustment: FixedPoint,
    initial_share_price: FixedPoint,
    target_rate: FixedPoint,
    position_duration: u64,
    inv_time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let annualized = annualized_position_duration(position_duration)?;
    let growth = FixedPoint::ONE.checked_add(target_rate.mul_down(annualized)?)?;
    Ok(initial_share_price
        .mul_down(share_reserves.checked_sub(share_adjustment)?)?
        .mul_down(growth.pow(inv_time_stretch)?)?)
}

/// Shares a trader must pay the pool to receive `bonds_out` bonds
///
/// Solves the invariant for the new share reserves after the bond side
/// shrinks, then applies the curve fee (proportional to the price discount)
/// on top of the raw amount; the governance skim is carved out of that fee.
/// Returns `(amount_from_user, curve_fee, governance_fee)`, all in shares.
#[allow(clippy::too_many_arguments)]
pub fn shares_in_for_bonds_out(
    bond_reserves: FixedPoint,
    share_price: FixedPoint,
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    bonds_out: FixedPoint,
    time_stretch: FixedPoint,
    curve_fee: FixedPoint,
    governance_fee: FixedPoint,
) -> Result<(FixedPoint, FixedPoint, FixedPoint), AmmError> {
    let k = calc_k(
        share_price,
        initial_share_price,
        share_reserves,
        bond_reserves,
        time_stretch,
    )?;
    let one_minus_t = FixedPoint::ONE.checked_sub(time_stretch)?;
    let remaining_bonds = bond_reserves.checked_sub(bonds_out)?;
    if !remaining_bonds.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "shares_in_for_bonds_out: bond reserves depleted",
        });
    }
    let y_term = remaining_bonds.pow(one_minus_t)?;
    let z_term = k.checked_sub(y_term)?;
    if !z_term.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "shares_in_for_bonds_out: invariant residue not positive",
        });
    }
    let z_val = z_term
        .div_down(share_price.div_down(initial_share_price)?)?
        .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
        .div_down(initial_share_price)?;
    let spot_price = calc_spot_price(
        initial_share_price,
        share_reserves,
        FixedPoint::ZERO,
        bond_reserves,
        time_stretch,
    )?;
    let amount_in_shares = z_val.checked_sub(share_reserves)?;
    let price_discount = FixedPoint::ONE.checked_sub(spot_price)?;
    let curve_fee_shares = amount_in_shares.mul_down(price_discount.mul_down(curve_fee)?)?;
    let governance_fee_shares = curve_fee_shares.mul_down(governance_fee)?;
    // fees mean the user pays MORE shares in for the same bonds out
    let amount_from_user = amount_in_shares.checked_add(curve_fee_shares)?;
    Ok((amount_from_user, curve_fee_shares, governance_fee_shares))
}

/// Shares a trader receives from the pool for providing `bonds_in` bonds
///
/// The mirror of [`shares_in_for_bonds_out`]: the curve fee is subtracted
/// from what the user takes out. Returns
/// `(amount_to_user, curve_fee, governance_fee)`, all in shares.
#[allow(clippy::too_many_arguments)]
pub fn shares_out_for_bonds_in(
    bond_reserves: FixedPoint,
    share_price: FixedPoint,
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    bonds_in: FixedPoint,
    time_stretch: FixedPoint,
    curve_fee: FixedPoint,
    governance_fee: FixedPoint,
) -> Result<(FixedPoint, FixedPoint, FixedPoint), AmmError> {
    let k = calc_k(
        share_price,
        initial_share_price,
        share_reserves,
        bond_reserves,
        time_stretch,
    )?;
    let one_minus_t = FixedPoint::ONE.checked_sub(time_stretch)?;
    let y_term = bond_reserves.checked_add(bonds_in)?.pow(one_minus_t)?;
    let z_term = k.checked_sub(y_term)?;
    if !z_term.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "shares_out_for_bonds_in: invariant residue not positive",
        });
    }
    let z_val = z_term
        .div_down(share_price.div_down(initial_share_price)?)?
        .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
        .div_down(initial_share_price)?;
    let spot_price = calc_spot_price(
        initial_share_price,
        share_reserves,
        FixedPoint::ZERO,
        bond_reserves,
        time_stretch,
    )?;
    let price_discount = FixedPoint::ONE.checked_sub(spot_price)?;
    let amount_in_shares = share_reserves.checked_sub(z_val)?.max(FixedPoint::ZERO);
    let curve_fee_shares = amount_in_shares.mul_down(price_discount.mul_down(curve_fee)?)?;
    let governance_fee_shares = curve_fee_shares.mul_down(governance_fee)?;
    // fees mean the user gets LESS shares out for the same bonds in
    let amount_to_user = amount_in_shares.checked_sub(curve_fee_shares)?;
    Ok((amount_to_user, curve_fee_shares, governance_fee_shares))
}

/// Bonds leaving the pool when `shares_in` shares are paid in (no fees)
pub fn bonds_out_for_shares_in(
    bond_reserves: FixedPoint,
    share_price: FixedPoint,
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    shares_in: FixedPoint,
    time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let k = calc_k(
        share_price,
        initial_share_price,
        share_reserves,
        bond_reserves,
        time_stretch,
    )?;
    let one_minus_t = FixedPoint::ONE.checked_sub(time_stretch)?;
    let grown_shares = share_reserves.checked_add(shares_in)?;
    let shares_term = share_price
        .div_down(initial_share_price)?
        .mul_down(initial_share_price.mul_down(grown_shares)?.pow(one_minus_t)?)?;
    let y_term = k.checked_sub(shares_term)?;
    if !y_term.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "bonds_out_for_shares_in: invariant residue not positive",
        });
    }
    let new_bonds = y_term.pow(FixedPoint::ONE.div_down(one_minus_t)?)?;
    Ok(bond_reserves.checked_sub(new_bonds)?)
}

/// Bonds the pool requires for paying out `shares_out` shares (no fees)
pub fn bonds_in_for_shares_out(
    bond_reserves: FixedPoint,
    share_price: FixedPoint,
    initial_share_price: FixedPoint,
    share_reserves: FixedPoint,
    shares_out: FixedPoint,
    time_stretch: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let k = calc_k(
        share_price,
        initial_share_price,
        share_reserves,
        bond_reserves,
        time_stretch,
    )?;
    let one_minus_t = FixedPoint::ONE.checked_sub(time_stretch)?;
    let reduced_shares = share_reserves.checked_sub(shares_out)?;
    if !reduced_shares.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "bonds_in_for_shares_out: share reserves depleted",
        });
    }
    let shares_term = share_price.div_down(initial_share_price)?.mul_down(
        initial_share_price
            .mul_down(reduced_shares)?
            .pow(one_minus_t)?,
    )?;
    let y_term = k.checked_sub(shares_term)?;
    if !y_term.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "bonds_in_for_shares_out: invariant residue not positive",
        });
    }
    let new_bonds = y_term.pow(FixedPoint::ONE.div_down(one_minus_t)?)?;
    Ok(new_bonds.checked_sub(bond_reserves)?)
}
