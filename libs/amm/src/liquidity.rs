//! LP-token mint and burn math
//!
//! Pure combinatorial functions over `(x_reserves, y_reserves,
//! total_supply)`. Every operation preserves the pool's reserve ratio except
//! at initialization, where the first depositor's contribution defines the
//! ratio and mints LP one-for-one with the underlying.

use crate::errors::AmmError;
use hyperdrive_types::FixedPoint;

/// Token amounts required to mint `lp_out` LP tokens: `(x_needed, y_needed)`
pub fn tokens_in_given_lp_out(
    lp_out: FixedPoint,
    x_reserves: FixedPoint,
    y_reserves: FixedPoint,
    total_supply: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), AmmError> {
    if total_supply.is_zero() {
        // first depositor: LP mints one-for-one against x
        return Ok((lp_out, FixedPoint::ZERO));
    }
    let ratio = x_reserves.div_down(y_reserves)?;
    let y_needed = lp_out
        .mul_down(x_reserves)?
        .div_down(ratio.mul_down(total_supply)?)?;
    let x_needed = ratio.mul_down(y_needed)?;
    Ok((x_needed, y_needed))
}

/// LP tokens minted for a deposit of `(x_in, y_in)`:
/// `(x_needed, y_needed, lp_out)`
///
/// When the proportional `x_needed` for the offered `y_in` exceeds the
/// actual `x_in`, the deposit falls back to consuming all of `x_in` and
/// back-solves `y_needed`, accepting a smaller mint. Asymmetric deposits are
/// expected, not an error.
pub fn lp_out_given_tokens_in(
    x_in: FixedPoint,
    y_in: FixedPoint,
    x_reserves: FixedPoint,
    y_reserves: FixedPoint,
    total_supply: FixedPoint,
) -> Result<(FixedPoint, FixedPoint, FixedPoint), AmmError> {
    if total_supply.is_zero() {
        return Ok((x_in, FixedPoint::ZERO, x_in));
    }
    let ratio = x_reserves.div_down(y_reserves)?;
    let x_needed = ratio.mul_down(y_in)?;
    if x_needed > x_in {
        // not enough x offered: use all of it and scale y down to match
        let lp_out = x_in.mul_down(total_supply)?.div_down(x_reserves)?;
        let y_needed = x_in.div_down(ratio)?;
        Ok((x_in, y_needed, lp_out))
    } else {
        let lp_out = x_needed.mul_down(total_supply)?.div_down(x_reserves)?;
        Ok((x_needed, y_in, lp_out))
    }
}

/// LP tokens burned to withdraw at least `(min_x_out, min_y_out)`:
/// `(x_needed, y_needed, lp_in)`
pub fn lp_in_given_tokens_out(
    min_x_out: FixedPoint,
    min_y_out: FixedPoint,
    x_reserves: FixedPoint,
    y_reserves: FixedPoint,
    total_supply: FixedPoint,
) -> Result<(FixedPoint, FixedPoint, FixedPoint), AmmError> {
    let ratio = x_reserves.div_down(y_reserves)?;
    let x_needed = ratio.mul_down(min_y_out)?;
    if min_x_out > x_needed {
        let lp_in = min_x_out.mul_down(total_supply)?.div_down(x_reserves)?;
        let y_needed = min_x_out.div_down(ratio)?;
        Ok((min_x_out, y_needed, lp_in))
    } else {
        let lp_in = min_y_out.mul_down(total_supply)?.div_down(y_reserves)?;
        Ok((x_needed, min_y_out, lp_in))
    }
}

/// Proportional withdrawal for burning `lp_in`: `(x_out, y_out)`
pub fn tokens_out_for_lp_in(
    lp_in: FixedPoint,
    x_reserves: FixedPoint,
    y_reserves: FixedPoint,
    total_supply: FixedPoint,
) -> Result<(FixedPoint, FixedPoint), AmmError> {
    let ratio = x_reserves.div_down(y_reserves)?;
    let y_out = lp_in
        .mul_down(x_reserves)?
        .div_down(ratio.mul_down(total_supply)?)?;
    let x_out = ratio.mul_down(y_out)?;
    Ok((x_out, y_out))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    #[test]
    fn first_deposit_defines_the_pool() {
        let (x_needed, y_needed) =
            tokens_in_given_lp_out(fp("100"), FixedPoint::ZERO, FixedPoint::ZERO, FixedPoint::ZERO)
                .unwrap();
        assert_eq!(x_needed, fp("100"));
        assert_eq!(y_needed, FixedPoint::ZERO);

        let (x, y, lp) = lp_out_given_tokens_in(
            fp("100"),
            fp("50"),
            FixedPoint::ZERO,
            FixedPoint::ZERO,
            FixedPoint::ZERO,
        )
        .unwrap();
        assert_eq!((x, y, lp), (fp("100"), FixedPoint::ZERO, fp("100")));
    }

    #[test]
    fn balanced_deposit_preserves_the_ratio() {
        // pool at 2:1, deposit in the same proportion
        let (x_needed, y_needed, lp) =
            lp_out_given_tokens_in(fp("20"), fp("10"), fp("200"), fp("100"), fp("300")).unwrap();
        assert_eq!(x_needed, fp("20"));
        assert_eq!(y_needed, fp("10"));
        // 10% growth of x reserves mints 10% of supply
        assert!((lp.checked_sub(fp("30")).unwrap()).abs() < fp("0.000000000001"));
    }

    #[test]
    fn short_x_deposit_falls_back_to_all_of_x() {
        // y_in would require 40 x, but only 30 offered
        let (x_needed, y_needed, lp) =
            lp_out_given_tokens_in(fp("30"), fp("20"), fp("200"), fp("100"), fp("300")).unwrap();
        assert_eq!(x_needed, fp("30"));
        assert!((y_needed.checked_sub(fp("15")).unwrap()).abs() < fp("0.000000000001"));
        // smaller mint than the proportional 60-LP deposit would earn
        assert!(lp < fp("60"));
        assert!((lp.checked_sub(fp("45")).unwrap()).abs() < fp("0.000000000001"));
    }

    #[test]
    fn withdrawal_is_proportional() {
        let (x_out, y_out) = tokens_out_for_lp_in(fp("30"), fp("200"), fp("100"), fp("300")).unwrap();
        assert!((x_out.checked_sub(fp("20")).unwrap()).abs() < fp("0.000000000001"));
        assert!((y_out.checked_sub(fp("10")).unwrap()).abs() < fp("0.000000000001"));
    }

    #[test]
    fn mint_then_burn_round_trips() {
        let (x_needed, y_needed, lp) =
            lp_out_given_tokens_in(fp("20"), fp("10"), fp("200"), fp("100"), fp("300")).unwrap();
        let new_x = fp("200").checked_add(x_needed).unwrap();
        let new_y = fp("100").checked_add(y_needed).unwrap();
        let new_supply = fp("300").checked_add(lp).unwrap();
        let (x_back, y_back) = tokens_out_for_lp_in(lp, new_x, new_y, new_supply).unwrap();
        assert!((x_back.checked_sub(x_needed).unwrap()).abs() < fp("0.000000001"));
        assert!((y_back.checked_sub(y_needed).unwrap()).abs() < fp("0.000000001"));
    }

    #[test]
    fn lp_in_given_tokens_out_uses_the_binding_side() {
        // proportional x for 10 y is 20; asking for 30 x makes x the binding side
        let (x_needed, y_needed, lp_in) =
            lp_in_given_tokens_out(fp("30"), fp("10"), fp("200"), fp("100"), fp("300")).unwrap();
        assert_eq!(x_needed, fp("30"));
        assert!((y_needed.checked_sub(fp("15")).unwrap()).abs() < fp("0.000000000001"));
        assert!((lp_in.checked_sub(fp("45")).unwrap()).abs() < fp("0.000000000001"));

        // otherwise y is the binding side
        let (x_needed, y_needed, lp_in) =
            lp_in_given_tokens_out(fp("10"), fp("10"), fp("200"), fp("100"), fp("300")).unwrap();
        assert_eq!(y_needed, fp("10"));
        assert!((x_needed.checked_sub(fp("20")).unwrap()).abs() < fp("0.000000000001"));
        assert!((lp_in.checked_sub(fp("30")).unwrap()).abs() < fp("0.000000000001"));
    }
}
