//! Pricing-model abstraction for the historical simulator
//!
//! Three bonding-curve formulations share one capability set; the variant is
//! chosen once at construction time via [`ModelKind`], never by string
//! dispatch at call sites. The `c`/`u` parameters are the conversion rate
//! and normalizing constant of the yield source (the Element variant ignores
//! them).
//!
//! APY values cross this API in percent units (5 means 5%), matching the
//! historical trading records this engine is calibrated against.

use crate::element::ElementModel;
use crate::errors::AmmError;
use crate::yield_space::{YieldSpaceMinFeeModel, YieldSpaceModel};
use hyperdrive_types::{FixedPoint, Token, TradeQuote};
use serde::{Deserialize, Serialize};

/// Calibration constants for `calc_time_stretch`: `3.09396 / (0.02789 * apy)`
///
/// Fixed by protocol design; reproduced exactly, never re-derived.
pub const TIME_STRETCH_NUMERATOR: FixedPoint = FixedPoint::from_scaled(3_093_960_000_000_000_000);
pub const TIME_STRETCH_APR_COEFFICIENT: FixedPoint = FixedPoint::from_scaled(27_890_000_000_000_000);

/// Fee floor applied by the min-fee variant: 0.05% of the input amount
///
/// A policy choice, not an edge case: when the organically computed fee on
/// `calc_out_given_in` is below this share of the input, the floor is
/// charged instead. The mirror `calc_in_given_out` deliberately has no
/// floor.
pub const MINIMUM_FEE_RATE: FixedPoint = FixedPoint::from_scaled(500_000_000_000_000);

pub(crate) const DAYS_PER_YEAR: FixedPoint = FixedPoint::from_int(365);
pub(crate) const HUNDRED: FixedPoint = FixedPoint::from_int(100);

/// Bonding-curve variant selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelKind {
    Element,
    YieldSpace,
    YieldSpaceMinFee,
}

impl ModelKind {
    /// The model implementation for this variant
    pub fn model(self) -> &'static dyn PricingModel {
        match self {
            ModelKind::Element => &ElementModel,
            ModelKind::YieldSpace => &YieldSpaceModel,
            ModelKind::YieldSpaceMinFee => &YieldSpaceMinFeeModel,
        }
    }
}

/// Capability set shared by every bonding-curve variant
pub trait PricingModel: Send + Sync {
    fn model_name(&self) -> &'static str;

    /// Spot price of the bond in base for the given reserve state
    fn calc_spot_price(
        &self,
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        total_supply: FixedPoint,
        time_remaining: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError>;

    /// Input required to receive a fixed `out`; the fee is added to the
    /// input side, so the quote's amount fields carry the required input
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<TradeQuote, AmmError>;

    /// Output received for a fixed `amount_in`; the fee is subtracted from
    /// the output side
    #[allow(clippy::too_many_arguments)]
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
    ) -> Result<TradeQuote, AmmError>;

    /// Base reserves consistent with `y_reserves` at the given APY
    fn calc_x_reserves(
        &self,
        apy_percent: FixedPoint,
        y_reserves: FixedPoint,
        days_until_maturity: FixedPoint,
        time_stretch: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError>;

    /// Curve parameter from a target APY (in percent):
    /// `3.09396 / (0.02789 * apy)`
    fn calc_time_stretch(&self, apy_percent: FixedPoint) -> Result<FixedPoint, AmmError> {
        Ok(TIME_STRETCH_NUMERATOR
            .div_down(TIME_STRETCH_APR_COEFFICIENT.mul_down(apy_percent)?)?)
    }

    /// Annualized yield (in percent) implied by a spot price:
    /// `(1 - p) / (p * T) * 100`
    fn apy(
        &self,
        price: FixedPoint,
        days_until_maturity: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let annualized = days_until_maturity.div_down(DAYS_PER_YEAR)?;
        Ok(FixedPoint::ONE
            .checked_sub(price)?
            .div_down(price.mul_down(annualized)?)?
            .mul_down(HUNDRED)?)
    }

    /// Spot price consistent with an APY (in percent): `1 - apy * T / 100`
    fn calc_spot_price_from_apy(
        &self,
        apy_percent: FixedPoint,
        days_until_maturity: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let annualized = days_until_maturity.div_down(DAYS_PER_YEAR)?;
        Ok(FixedPoint::ONE
            .checked_sub(apy_percent.mul_down(annualized)?.div_down(HUNDRED)?)?)
    }

    /// APY (in percent) implied by a reserve state
    #[allow(clippy::too_many_arguments)]
    fn calc_apy_from_reserves(
        &self,
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        total_supply: FixedPoint,
        time_remaining: FixedPoint,
        time_stretch: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let price = self.calc_spot_price(
            x_reserves,
            y_reserves,
            total_supply,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )?;
        let days_until_maturity = time_remaining
            .mul_down(DAYS_PER_YEAR)?
            .mul_down(time_stretch)?;
        self.apy(price, days_until_maturity)
    }

    /// Largest trade the curve can absorb from the `in` side
    fn calc_max_trade(
        &self,
        in_reserves: FixedPoint,
        out_reserves: FixedPoint,
        time_remaining: FixedPoint,
    ) -> Result<FixedPoint, AmmError> {
        let one_minus_t = FixedPoint::ONE.checked_sub(time_remaining)?;
        let k = in_reserves
            .pow(one_minus_t)?
            .checked_add(out_reserves.pow(one_minus_t)?)?;
        Ok(k.pow(FixedPoint::ONE.div_down(one_minus_t)?)?
            .checked_sub(in_reserves)?)
    }

    /// Reserves achieving a target liquidity and APY simultaneously:
    /// `(x_reserves, y_reserves, liquidity)`
    ///
    /// Solves the APY constraint first, then rescales both reserves by one
    /// factor so their market value equals `target_liquidity`. The scale-up
    /// is a single pass: value is linear in the reserves at a fixed price.
    #[allow(clippy::too_many_arguments)]
    fn calc_liquidity(
        &self,
        target_liquidity: FixedPoint,
        market_price: FixedPoint,
        apy_percent: FixedPoint,
        days_until_maturity: FixedPoint,
        time_stretch: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
    ) -> Result<(FixedPoint, FixedPoint, FixedPoint), AmmError> {
        let spot_price = self.calc_spot_price_from_apy(apy_percent, days_until_maturity)?;
        let time_remaining =
            days_until_maturity.div_down(DAYS_PER_YEAR.mul_down(time_stretch)?)?;
        let rate_discount = FixedPoint::ONE.checked_sub(
            apy_percent
                .div_down(HUNDRED)?
                .mul_down(time_remaining)?,
        )?;
        let y_reserves = target_liquidity
            .div_down(market_price)?
            .div_down(FixedPoint::TWO)?
            .div_down(rate_discount)?;
        let x_reserves = self.calc_x_reserves(
            apy_percent,
            y_reserves,
            days_until_maturity,
            time_stretch,
            conversion_rate,
            normalizing_constant,
        )?;
        let pool_value = x_reserves.mul_down(market_price)?.checked_add(
            y_reserves.mul_down(market_price)?.mul_down(spot_price)?,
        )?;
        let scale_up_factor = target_liquidity.div_down(pool_value)?;
        let x_reserves = x_reserves.mul_down(scale_up_factor)?;
        let y_reserves = y_reserves.mul_down(scale_up_factor)?;
        let liquidity = x_reserves.mul_down(market_price)?.checked_add(
            y_reserves.mul_down(market_price)?.mul_down(spot_price)?,
        )?;
        Ok((x_reserves, y_reserves, liquidity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(s: &str) -> FixedPoint {
        FixedPoint::from_decimal_str(s).unwrap()
    }

    #[test]
    fn time_stretch_reproduces_the_calibration() {
        let model = ModelKind::Element.model();
        let stretch = model.calc_time_stretch(fp("5")).unwrap();
        // 3.09396 / (0.02789 * 5) = 22.18687...
        assert!((stretch - fp("22.186877016851918")).abs() < fp("0.000001"));
    }

    #[test]
    fn apy_and_spot_price_invert_each_other() {
        let model = ModelKind::YieldSpace.model();
        let price = model
            .calc_spot_price_from_apy(fp("5"), fp("365"))
            .unwrap();
        assert_eq!(price, fp("0.95"));
        let apy = model.apy(price, fp("365")).unwrap();
        // (1 - 0.95) / (0.95 * 1) * 100 = 5.263...% (APY, not APR)
        assert!((apy - fp("5.263157894736842105")).abs() < fp("0.000000001"));
    }

    #[test]
    fn every_variant_reports_its_name() {
        assert_eq!(ModelKind::Element.model().model_name(), "Element_Pricing_Model");
        assert_eq!(ModelKind::YieldSpace.model().model_name(), "YieldsSpacev2");
        assert_eq!(
            ModelKind::YieldSpaceMinFee.model().model_name(),
            "YieldsSpacev2_MinFee"
        );
    }

    #[test]
    fn liquidity_scale_up_hits_the_target() {
        for kind in [
            ModelKind::Element,
            ModelKind::YieldSpace,
            ModelKind::YieldSpaceMinFee,
        ] {
            let model = kind.model();
            let stretch = model.calc_time_stretch(fp("5")).unwrap();
            let (x, y, liquidity) = model
                .calc_liquidity(
                    fp("100000"),
                    fp("1"),
                    fp("5"),
                    fp("365"),
                    stretch,
                    fp("1"),
                    fp("1"),
                )
                .unwrap();
            assert!(x.is_positive() && y.is_positive());
            // within 1e-6 relative of the target
            let error = (liquidity - fp("100000")).abs();
            assert!(error < fp("0.1"), "{kind:?}: liquidity {liquidity}");
        }
    }

    #[test]
    fn max_trade_leaves_the_out_side_solvent() {
        let model = ModelKind::Element.model();
        let max = model
            .calc_max_trade(fp("50000"), fp("60000"), fp("0.045"))
            .unwrap();
        assert!(max.is_positive());
        // trading the max exactly drains the out side to the invariant floor
        let quote = model.calc_out_given_in(
            max,
            fp("50000"),
            fp("60000"),
            Token::Base,
            FixedPoint::ZERO,
            fp("0.045"),
            FixedPoint::ONE,
            FixedPoint::ONE,
        );
        // at or beyond the max the curve has no real solution left over
        if let Ok(quote) = quote {
            assert!(quote.amount_out_without_fee <= fp("60000"));
        }
    }
}
