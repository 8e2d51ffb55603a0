//! Element-style bonding curve: `k = x^(1-t) + y^(1-t)`
//!
//! The simplest of the three variants: no share-price scaling, so the
//! conversion rate and normalizing constant are accepted and ignored.

use crate::errors::AmmError;
use crate::pricing::{PricingModel, DAYS_PER_YEAR, HUNDRED};
use hyperdrive_types::{FixedPoint, Token, TradeQuote};

pub struct ElementModel;

impl PricingModel for ElementModel {
    fn model_name(&self) -> &'static str {
        "Element_Pricing_Model"
    }

    fn calc_spot_price(
        &self,
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        total_supply: FixedPoint,
        time_remaining: FixedPoint,
        _conversion_rate: FixedPoint,
        _normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let ratio = y_reserves
            .checked_add(total_supply)?
            .div_down(x_reserves)?;
        Ok(FixedPoint::ONE.div_down(ratio.pow(time_remaining)?)?)
    }

    fn calc_in_given_out(
        &self,
        out: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_in: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        _conversion_rate: FixedPoint,
        _normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        let one_minus_t = FixedPoint::ONE.checked_sub(time_remaining)?;
        let k = in_reserves
            .pow(one_minus_t)?
            .checked_add(out_reserves.pow(one_minus_t)?)?;
        let remaining = out_reserves.checked_sub(out)?;
        if !remaining.is_positive() {
            return Err(AmmError::NumericDomain {
                context: "calc_in_given_out: requested output depletes reserves",
            });
        }
        let without_fee = k
            .checked_sub(remaining.pow(one_minus_t)?)?
            .pow(FixedPoint::ONE.div_down(one_minus_t)?)?
            .checked_sub(in_reserves)?;
        let fee = match token_in {
            Token::Base => out.checked_sub(without_fee)?.mul_down(fee_percent)?,
            Token::Fyt => without_fee.checked_sub(out)?.mul_down(fee_percent)?,
        };
        let with_fee = without_fee.checked_add(fee)?;
        let without_fee_or_slippage = in_reserves
            .div_down(out_reserves)?
            .pow(time_remaining)?
            .mul_down(out)?;
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

    fn calc_out_given_in(
        &self,
        amount_in: FixedPoint,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        token_out: Token,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        _conversion_rate: FixedPoint,
        _normalizing_constant: FixedPoint,
    ) -> Result<TradeQuote, AmmError> {
        let one_minus_t = FixedPoint::ONE.checked_sub(time_remaining)?;
        let k = in_reserves
            .pow(one_minus_t)?
            .checked_add(out_reserves.pow(one_minus_t)?)?;
        let grown = in_reserves.checked_add(amount_in)?;
        let residue = k.checked_sub(grown.pow(one_minus_t)?)?;
        if !residue.is_positive() {
            return Err(AmmError::NumericDomain {
                context: "calc_out_given_in: input exceeds the curve's capacity",
            });
        }
        let without_fee = out_reserves
            .checked_sub(residue.pow(FixedPoint::ONE.div_down(one_minus_t)?)?)?;
        let fee = match token_out {
            Token::Base => amount_in.checked_sub(without_fee)?.mul_down(fee_percent)?,
            Token::Fyt => without_fee.checked_sub(amount_in)?.mul_down(fee_percent)?,
        };
        let with_fee = without_fee.checked_sub(fee)?;
        let without_fee_or_slippage = FixedPoint::ONE
            .div_down(in_reserves.div_down(out_reserves)?.pow(time_remaining)?)?
            .mul_down(amount_in)?;
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

    fn calc_x_reserves(
        &self,
        apy_percent: FixedPoint,
        y_reserves: FixedPoint,
        days_until_maturity: FixedPoint,
        time_stretch: FixedPoint,
        _conversion_rate: FixedPoint,
        _normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let time_remaining =
            days_until_maturity.div_down(DAYS_PER_YEAR.mul_down(time_stretch)?)?;
        let annualized = days_until_maturity.div_down(DAYS_PER_YEAR)?;
        let rate = apy_percent.div_down(HUNDRED)?;
        // x = 2y / ((1 / (1 - r*T))^(1/t) - 1)
        let discount = FixedPoint::ONE.checked_sub(rate.mul_down(annualized)?)?;
        if !discount.is_positive() {
            return Err(AmmError::NumericDomain {
                context: "calc_x_reserves: rate consumes the whole term value",
            });
        }
        let growth = FixedPoint::ONE
            .div_down(discount)?
            .pow(FixedPoint::ONE.div_down(time_remaining)?)?;
        let denominator = growth.checked_sub(FixedPoint::ONE)?;
        if !denominator.is_positive() {
            return Err(AmmError::NumericDomain {
                context: "calc_x_reserves: degenerate growth factor",
            });
        }
        Ok(FixedPoint::TWO.mul_down(y_reserves)?.div_down(denominator)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    const T: &str = "0.045071688063194092";

    #[test]
    fn spot_price_discounts_the_bond() {
        let p = ElementModel
            .calc_spot_price(
                fp("50000"),
                fp("10000"),
                fp("50000"),
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        assert!(p.is_positive() && p < FixedPoint::ONE);
    }

    #[test]
    fn out_given_in_fee_reduces_output() {
        let no_fee = ElementModel
            .calc_out_given_in(
                fp("1000"),
                fp("50000"),
                fp("60000"),
                Token::Fyt,
                FixedPoint::ZERO,
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        assert_eq!(no_fee.amount_out_with_fee, no_fee.amount_out_without_fee);

        let with_fee = ElementModel
            .calc_out_given_in(
                fp("1000"),
                fp("50000"),
                fp("60000"),
                Token::Fyt,
                fp("0.1"),
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        assert!(with_fee.amount_out_with_fee < with_fee.amount_out_without_fee);
        assert!(with_fee.curve_fee.is_positive());
    }

    #[test]
    fn in_given_out_fee_raises_cost() {
        let quote = ElementModel
            .calc_in_given_out(
                fp("1000"),
                fp("50000"),
                fp("60000"),
                Token::Base,
                fp("0.1"),
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        assert!(quote.amount_out_with_fee > quote.amount_out_without_fee);
        assert!(quote.curve_fee.is_positive());
    }

    #[test]
    fn zero_fee_round_trip_recovers_the_input() {
        // out_given_in then in_given_out on the produced output
        let forward = ElementModel
            .calc_out_given_in(
                fp("1000"),
                fp("50000"),
                fp("60000"),
                Token::Fyt,
                FixedPoint::ZERO,
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        let inverse = ElementModel
            .calc_in_given_out(
                forward.amount_out_without_fee,
                fp("50000"),
                fp("60000"),
                Token::Base,
                FixedPoint::ZERO,
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap();
        let recovered = inverse.amount_out_without_fee;
        let error = (recovered - fp("1000")).abs();
        assert!(error < fp("0.000000001"), "recovered {recovered}");
    }

    #[test]
    fn draining_the_out_side_is_a_domain_error() {
        let err = ElementModel
            .calc_in_given_out(
                fp("60000"),
                fp("50000"),
                fp("60000"),
                Token::Base,
                FixedPoint::ZERO,
                fp(T),
                FixedPoint::ONE,
                FixedPoint::ONE,
            )
            .unwrap_err();
        assert!(matches!(err, AmmError::NumericDomain { .. }));
    }
}
