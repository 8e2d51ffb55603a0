//! YieldSpace bonding curve with share-price scaling
//!
//! Implements `k = (c/u) * (u*z)^(1-t) + y^(1-t)` where base reserves are
//! carried as vault shares internally (`x = c*z`). Two variants live here:
//! the plain model and a min-fee model that floors the `calc_out_given_in`
//! fee at [`MINIMUM_FEE_RATE`](crate::pricing::MINIMUM_FEE_RATE) of the
//! input. Only that one direction is floored.

use crate::errors::AmmError;
use crate::pricing::{PricingModel, DAYS_PER_YEAR, HUNDRED, MINIMUM_FEE_RATE};
use hyperdrive_types::{FixedPoint, Token, TradeQuote};

pub struct YieldSpaceModel;

pub struct YieldSpaceMinFeeModel;

impl PricingModel for YieldSpaceModel {
    fn model_name(&self) -> &'static str {
        "YieldsSpacev2"
    }

    fn calc_spot_price(
        &self,
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        total_supply: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        spot_price(
            x_reserves,
            y_reserves,
            total_supply,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )
    }

    fn calc_in_given_out(
        &self,
        out: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_in: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        in_given_out(
            out,
            in_reserves,
            out_reserves,
            token_in,
            fee_percent,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )
    }

    fn calc_out_given_in(
        &self,
        amount_in: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_out: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        out_given_in(
            amount_in,
            in_reserves,
            out_reserves,
            token_out,
            fee_percent,
            time_remaining,
            conversion_rate,
            normalizing_constant,
            None,
        )
    }

    fn calc_x_reserves(
        &self,
        apy_percent: FixedPoint,
        y_reserves: FixedPoint,
        days_until_maturity: FixedPoint,
        time_stretch: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        x_reserves(
            apy_percent,
            y_reserves,
            days_until_maturity,
            time_stretch,
            conversion_rate,
            normalizing_constant,
        )
    }
}

impl PricingModel for YieldSpaceMinFeeModel {
    fn model_name(&self) -> &'static str {
        "YieldsSpacev2_MinFee"
    }

    fn calc_spot_price(
        &self,
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        total_supply: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        spot_price(
            x_reserves,
            y_reserves,
            total_supply,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )
    }

    // the floor applies only to the out-given-in direction
    fn calc_in_given_out(
        &self,
        out: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_in: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        in_given_out(
            out,
            in_reserves,
            out_reserves,
            token_in,
            fee_percent,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )
    }

    fn calc_out_given_in(
        &self,
        amount_in: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_out: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        out_given_in(
            amount_in,
            in_reserves,
            out_reserves,
            token_out,
            fee_percent,
            time_remaining,
            conversion_rate,
            normalizing_constant,
            Some(MINIMUM_FEE_RATE),
        )
    }

    fn calc_x_reserves(
        &self,
        apy_percent: FixedPoint,
        y_reserves: FixedPoint,
        days_until_maturity: FixedPoint,
        time_stretch: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        x_reserves(
            apy_percent,
            y_reserves,
            days_until_maturity,
            time_stretch,
            conversion_rate,
            normalizing_constant,
        )
    }
}

/// `1 / (c * (y + s) / (u * x))^t`
fn spot_price(
    x_reserves: FixedPoint,
    y_reserves: FixedPoint,
    total_supply: FixedPoint,
    time_remaining: FixedPoint,
    conversion_rate: FixedPoint,
    normalizing_constant: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let ratio = conversion_rate
        .mul_down(y_reserves.checked_add(total_supply)?)?
        .div_down(normalizing_constant.mul_down(x_reserves)?)?;
    Ok(FixedPoint::ONE.div_down(ratio.pow(time_remaining)?)?)
}

/// `k = (c/u) * (u*z)^(1-t) + y^(1-t)` over share-denominated reserves
fn invariant(
    share_reserves: FixedPoint,
    bond_reserves: FixedPoint,
    one_minus_t: FixedPoint,
    scale: FixedPoint,
    normalizing_constant: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    Ok(scale
        .mul_down(
            normalizing_constant
                .mul_down(share_reserves)?
                .pow(one_minus_t)?,
        )?
        .checked_add(bond_reserves.pow(one_minus_t)?)?)
}

#[allow(clippy::too_many_arguments)]
fn in_given_out(
    out: FixedPoint,
    in_reserves: FixedPoint,
    out_reserves: FixedPoint,
    token_in: Token,
    fee_percent: FixedPoint,
    time_remaining: FixedPoint,
    conversion_rate: FixedPoint,
    normalizing_constant: FixedPoint,
) -> Result<TradeQuote, AmmError> {
    let one_minus_t = FixedPoint::ONE.checked_sub(time_remaining)?;
    let scale = conversion_rate.div_down(normalizing_constant)?;
    let (without_fee, fee, without_fee_or_slippage) = match token_in {
        Token::Base => {
            // shares in for bond out: x = c*z conversion on the in side
            let z = in_reserves.div_down(conversion_rate)?;
            let k = invariant(z, out_reserves, one_minus_t, scale, normalizing_constant)?;
            let remaining = out_reserves.checked_sub(out)?;
            if !remaining.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "in_given_out: requested bonds deplete reserves",
                });
            }
            let residue = k.checked_sub(remaining.pow(one_minus_t)?)?;
            if !residue.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "in_given_out: invariant residue not positive",
                });
            }
            let grown_shares = residue
                .div_down(scale)?
                .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
                .div_down(normalizing_constant)?;
            let without_fee = grown_shares.checked_sub(z)?.mul_down(conversion_rate)?;
            let fee = out.checked_sub(without_fee)?.mul_down(fee_percent)?;
            let without_fee_or_slippage = in_reserves
                .div_down(scale.mul_down(out_reserves)?)?
                .pow(time_remaining)?
                .mul_down(out)?;
            (without_fee, fee, without_fee_or_slippage)
        }
        Token::Fyt => {
            // bonds in for shares out: the out side carries the conversion
            let share_out = out.div_down(conversion_rate)?;
            let z = out_reserves.div_down(conversion_rate)?;
            let k = invariant(z, in_reserves, one_minus_t, scale, normalizing_constant)?;
            let reduced = z.checked_sub(share_out)?;
            if !reduced.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "in_given_out: requested shares deplete reserves",
                });
            }
            let shares_term = scale.mul_down(
                normalizing_constant.mul_down(reduced)?.pow(one_minus_t)?,
            )?;
            let residue = k.checked_sub(shares_term)?;
            if !residue.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "in_given_out: invariant residue not positive",
                });
            }
            let without_fee = residue
                .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
                .checked_sub(in_reserves)?;
            let fee = without_fee.checked_sub(out)?.mul_down(fee_percent)?;
            let without_fee_or_slippage = scale
                .mul_down(in_reserves)?
                .div_down(out_reserves)?
                .pow(time_remaining)?
                .mul_down(out)?;
            (without_fee, fee, without_fee_or_slippage)
        }
    };
    let with_fee = without_fee.checked_add(fee)?;
    Ok(TradeQuote {
        amount_in: with_fee,
        amount_out_without_fee_or_slippage: without_fee_or_slippage,
        amount_out_without_fee: without_fee,
        amount_out_with_fee: with_fee,
        curve_fee: fee,
        governance_fee: FixedPoint::ZERO,
        flat_fee: FixedPoint::ZERO,
    })
}

#[allow(clippy::too_many_arguments)]
fn out_given_in(
    amount_in: FixedPoint,
    in_reserves: FixedPoint,
    out_reserves: FixedPoint,
    token_out: Token,
    fee_percent: FixedPoint,
    time_remaining: FixedPoint,
    conversion_rate: FixedPoint,
    normalizing_constant: FixedPoint,
    minimum_fee_rate: Option<FixedPoint>,
) -> Result<TradeQuote, AmmError> {
    let one_minus_t = FixedPoint::ONE.checked_sub(time_remaining)?;
    let scale = conversion_rate.div_down(normalizing_constant)?;
    let (without_fee, organic_fee, without_fee_or_slippage) = match token_out {
        Token::Base => {
            // shares out for bonds in
            let z = out_reserves.div_down(conversion_rate)?;
            let k = invariant(z, in_reserves, one_minus_t, scale, normalizing_constant)?;
            let grown = in_reserves.checked_add(amount_in)?.pow(one_minus_t)?;
            let residue = k.checked_sub(grown)?;
            if !residue.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "out_given_in: input exceeds the curve's capacity",
                });
            }
            let reduced_shares = residue
                .div_down(scale)?
                .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
                .div_down(normalizing_constant)?;
            let without_fee = z.checked_sub(reduced_shares)?.mul_down(conversion_rate)?;
            let fee = amount_in.checked_sub(without_fee)?.mul_down(fee_percent)?;
            let without_fee_or_slippage = FixedPoint::ONE
                .div_down(
                    scale
                        .mul_down(in_reserves)?
                        .div_down(out_reserves)?
                        .pow(time_remaining)?,
                )?
                .mul_down(amount_in)?;
            (without_fee, fee, without_fee_or_slippage)
        }
        Token::Fyt => {
            // bonds out for shares in
            let share_in = amount_in.div_down(conversion_rate)?;
            let z = in_reserves.div_down(conversion_rate)?;
            let k = invariant(z, out_reserves, one_minus_t, scale, normalizing_constant)?;
            let shares_term = scale.mul_down(
                normalizing_constant
                    .mul_down(z.checked_add(share_in)?)?
                    .pow(one_minus_t)?,
            )?;
            let residue = k.checked_sub(shares_term)?;
            if !residue.is_positive() {
                return Err(AmmError::NumericDomain {
                    context: "out_given_in: input exceeds the curve's capacity",
                });
            }
            let without_fee = out_reserves
                .checked_sub(residue.pow(FixedPoint::ONE.div_down(one_minus_t)?)?)?;
            let fee = without_fee.checked_sub(amount_in)?.mul_down(fee_percent)?;
            let without_fee_or_slippage = FixedPoint::ONE
                .div_down(
                    in_reserves
                        .div_down(scale.mul_down(out_reserves)?)?
                        .pow(time_remaining)?,
                )?
                .mul_down(amount_in)?;
            (without_fee, fee, without_fee_or_slippage)
        }
    };
    let fee = if let Some(floor_rate) = minimum_fee_rate {
        if amount_in.is_positive() && organic_fee.div_down(amount_in)? < floor_rate {
            amount_in.mul_down(floor_rate)?
        } else {
            organic_fee
        }
    } else {
        organic_fee
    };
    let with_fee = without_fee.checked_sub(fee)?;
    Ok(TradeQuote {
        amount_in,
        amount_out_without_fee_or_slippage: without_fee_or_slippage,
        amount_out_without_fee: without_fee,
        amount_out_with_fee: with_fee,
        curve_fee: fee,
        governance_fee: FixedPoint::ZERO,
        flat_fee: FixedPoint::ZERO,
    })
}

/// `x = 2*c*y / (u * (1/(1 - r*T))^(1/t) - c)`
fn x_reserves(
    apy_percent: FixedPoint,
    y_reserves: FixedPoint,
    days_until_maturity: FixedPoint,
    time_stretch: FixedPoint,
    conversion_rate: FixedPoint,
    normalizing_constant: FixedPoint,
) -> Result<FixedPoint, AmmError> {
    let time_remaining = days_until_maturity.div_down(DAYS_PER_YEAR.mul_down(time_stretch)?)?;
    let annualized = days_until_maturity.div_down(DAYS_PER_YEAR)?;
    let rate = apy_percent.div_down(HUNDRED)?;
    let discount = FixedPoint::ONE.checked_sub(rate.mul_down(annualized)?)?;
    if !discount.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "x_reserves: rate consumes the whole term value",
        });
    }
    let growth = FixedPoint::ONE
        .div_down(discount)?
        .pow(FixedPoint::ONE.div_down(time_remaining)?)?;
    let denominator = normalizing_constant
        .mul_down(growth)?
        .checked_sub(conversion_rate)?;
    if !denominator.is_positive() {
        return Err(AmmError::NumericDomain {
            context: "x_reserves: degenerate growth factor",
        });
    }
    Ok(FixedPoint::TWO
        .mul_down(conversion_rate)?
        .mul_down(y_reserves)?
        .div_down(denominator)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    const T: &str = "0.045071688063194092";

    // x (base), y+s (bonds plus supply), c, u
    fn reserves() -> (FixedPoint, FixedPoint, FixedPoint, FixedPoint) {
        (fp("50000"), fp("60000"), fp("1.1"), fp("1.05"))
    }

    #[test]
    fn spot_price_respects_the_share_scaling() {
        let (x, _, c, u) = reserves();
        let p = spot_price(x, fp("10000"), fp("50000"), fp(T), c, u).unwrap();
        assert!(p.is_positive() && p < FixedPoint::ONE);
        // a richer conversion rate cheapens the bond
        let p_higher_c =
            spot_price(x, fp("10000"), fp("50000"), fp(T), fp("1.2"), u).unwrap();
        assert!(p_higher_c < p);
    }

    #[test]
    fn zero_fee_round_trip_recovers_the_input() {
        let (x, y_plus_s, c, u) = reserves();
        let forward = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            FixedPoint::ZERO,
            fp(T),
            c,
            u,
            None,
        )
        .unwrap();
        let inverse = in_given_out(
            forward.amount_out_without_fee,
            x,
            y_plus_s,
            Token::Base,
            FixedPoint::ZERO,
            fp(T),
            c,
            u,
        )
        .unwrap();
        let recovered = inverse.amount_out_without_fee;
        let error = (recovered - fp("1000")).abs();
        assert!(error < fp("0.000000001"), "recovered {recovered}");
    }

    #[test]
    fn zero_fee_round_trip_on_the_share_side() {
        let (x, y_plus_s, c, u) = reserves();
        // bonds in, shares out; then ask for those shares back
        let forward = out_given_in(
            fp("1000"),
            y_plus_s,
            x,
            Token::Base,
            FixedPoint::ZERO,
            fp(T),
            c,
            u,
            None,
        )
        .unwrap();
        let inverse = in_given_out(
            forward.amount_out_without_fee,
            y_plus_s,
            x,
            Token::Fyt,
            FixedPoint::ZERO,
            fp(T),
            c,
            u,
        )
        .unwrap();
        let recovered = inverse.amount_out_without_fee;
        let error = (recovered - fp("1000")).abs();
        assert!(error < fp("0.000000001"), "recovered {recovered}");
    }

    #[test]
    fn fee_is_proportional_to_the_slippage_gap() {
        let (x, y_plus_s, c, u) = reserves();
        let quote = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            fp("0.1"),
            fp(T),
            c,
            u,
            None,
        )
        .unwrap();
        let expected = quote
            .amount_out_without_fee
            .checked_sub(fp("1000"))
            .unwrap()
            .mul_down(fp("0.1"))
            .unwrap();
        assert_eq!(quote.curve_fee, expected);
        assert!(quote.amount_out_with_fee < quote.amount_out_without_fee);
    }

    #[test]
    fn min_fee_variant_floors_the_fee() {
        let (x, y_plus_s, c, u) = reserves();
        let tiny_fee_rate = fp("0.0001");
        let organic = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            tiny_fee_rate,
            fp(T),
            c,
            u,
            None,
        )
        .unwrap();
        let floored = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            tiny_fee_rate,
            fp(T),
            c,
            u,
            Some(MINIMUM_FEE_RATE),
        )
        .unwrap();
        // organic fee on a small trade is below the 0.05% floor
        assert!(organic.curve_fee < fp("1000").mul_down(MINIMUM_FEE_RATE).unwrap());
        assert_eq!(
            floored.curve_fee,
            fp("1000").mul_down(MINIMUM_FEE_RATE).unwrap()
        );
        assert!(floored.amount_out_with_fee < organic.amount_out_with_fee);
    }

    #[test]
    fn min_fee_variant_leaves_in_given_out_unfloored() {
        let (x, y_plus_s, c, u) = reserves();
        let tiny_fee_rate = fp("0.0001");
        let plain = YieldSpaceModel
            .calc_in_given_out(fp("1000"), x, y_plus_s, Token::Base, tiny_fee_rate, fp(T), c, u)
            .unwrap();
        let min_fee = YieldSpaceMinFeeModel
            .calc_in_given_out(fp("1000"), x, y_plus_s, Token::Base, tiny_fee_rate, fp(T), c, u)
            .unwrap();
        assert_eq!(plain, min_fee);
    }

    #[test]
    fn large_fee_is_not_floored() {
        let (x, y_plus_s, c, u) = reserves();
        let plain = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            fp("0.2"),
            fp(T),
            c,
            u,
            None,
        )
        .unwrap();
        let min_fee = out_given_in(
            fp("1000"),
            x,
            y_plus_s,
            Token::Fyt,
            fp("0.2"),
            fp(T),
            c,
            u,
            Some(MINIMUM_FEE_RATE),
        )
        .unwrap();
        assert_eq!(plain, min_fee);
    }
}
