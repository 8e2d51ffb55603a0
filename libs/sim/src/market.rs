//! Market state for the historical simulator
//!
//! Reserves, fee rate, time to maturity, and running trade accumulators for
//! one simulated pool. The state is a value: every operation returns a new
//! `Market` instead of mutating in place, so concurrent simulation runs can
//! never observe each other's updates.
//!
//! Bond-side liquidity is quoted as `y + total_supply` when trading, and a
//! quote whose fee is not positive is recorded but never applied to the
//! reserves — both behaviors carried over from the historical system this
//! engine models.

use crate::errors::SimError;
use hyperdrive_amm::PricingModel;
use hyperdrive_types::{FixedPoint, Token, TradeDirection, TradeQuote};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Market {
    pub x_reserves: FixedPoint,
    pub y_reserves: FixedPoint,
    pub total_supply: FixedPoint,
    /// Fee rate `g`, the fraction of slippage taken as a fee
    pub fee_percent: FixedPoint,
    /// Stretched time until maturity
    pub time_remaining: FixedPoint,
    /// Conversion rate `c` of the yield source
    pub conversion_rate: FixedPoint,
    /// Normalizing constant `u` fixed at pool creation
    pub normalizing_constant: FixedPoint,
    pub x_orders: u64,
    pub y_orders: u64,
    pub x_volume: FixedPoint,
    pub y_volume: FixedPoint,
    pub cum_x_slippage: FixedPoint,
    pub cum_y_slippage: FixedPoint,
    pub cum_x_fees: FixedPoint,
    pub cum_y_fees: FixedPoint,
    pub starting_fyt_price: FixedPoint,
}

impl Market {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        x_reserves: FixedPoint,
        y_reserves: FixedPoint,
        fee_percent: FixedPoint,
        time_remaining: FixedPoint,
        total_supply: FixedPoint,
        conversion_rate: FixedPoint,
        normalizing_constant: FixedPoint,
        model: &dyn PricingModel,
    ) -> Result<Self, SimError> {
        let starting_fyt_price = model.calc_spot_price(
            x_reserves,
            y_reserves,
            total_supply,
            time_remaining,
            conversion_rate,
            normalizing_constant,
        )?;
        Ok(Self {
            x_reserves,
            y_reserves,
            total_supply,
            fee_percent,
            time_remaining,
            conversion_rate,
            normalizing_constant,
            x_orders: 0,
            y_orders: 0,
            x_volume: FixedPoint::ZERO,
            y_volume: FixedPoint::ZERO,
            cum_x_slippage: FixedPoint::ZERO,
            cum_y_slippage: FixedPoint::ZERO,
            cum_x_fees: FixedPoint::ZERO,
            cum_y_fees: FixedPoint::ZERO,
            starting_fyt_price,
        })
    }

    pub fn spot_price(&self, model: &dyn PricingModel) -> Result<FixedPoint, SimError> {
        Ok(model.calc_spot_price(
            self.x_reserves,
            self.y_reserves,
            self.total_supply,
            self.time_remaining,
            self.conversion_rate,
            self.normalizing_constant,
        )?)
    }

    /// Current APY in percent for the given days until maturity
    pub fn apy(
        &self,
        model: &dyn PricingModel,
        days_until_maturity: FixedPoint,
    ) -> Result<FixedPoint, SimError> {
        let price = self.spot_price(model)?;
        Ok(model.apy(price, days_until_maturity)?)
    }

    /// One time step toward maturity
    pub fn tick(&self, step_size: FixedPoint) -> Self {
        let mut next = self.clone();
        next.time_remaining = self.time_remaining - step_size;
        next
    }

    /// Yield accrual lands in the conversion rate between trading days
    pub fn with_conversion_rate(&self, conversion_rate: FixedPoint) -> Self {
        let mut next = self.clone();
        next.conversion_rate = conversion_rate;
        next
    }

    /// Quote and (fee permitting) apply one trade, returning the updated
    /// market and the quote
    pub fn swap(
        &self,
        amount: FixedPoint,
        direction: TradeDirection,
        token_in: Token,
        token_out: Token,
        model: &dyn PricingModel,
    ) -> Result<(Self, TradeQuote), SimError> {
        if token_in == token_out {
            return Err(SimError::InvalidConfig {
                reason: "token_in and token_out must differ",
            });
        }
        let bond_side = self.y_reserves.checked_add(self.total_supply)?;
        let quote = match (direction, token_in) {
            (TradeDirection::In, Token::Fyt) => model.calc_in_given_out(
                amount,
                bond_side,
                self.x_reserves,
                token_in,
                self.fee_percent,
                self.time_remaining,
                self.conversion_rate,
                self.normalizing_constant,
            )?,
            (TradeDirection::In, Token::Base) => model.calc_in_given_out(
                amount,
                self.x_reserves,
                bond_side,
                token_in,
                self.fee_percent,
                self.time_remaining,
                self.conversion_rate,
                self.normalizing_constant,
            )?,
            (TradeDirection::Out, Token::Fyt) => model.calc_out_given_in(
                amount,
                bond_side,
                self.x_reserves,
                token_out,
                self.fee_percent,
                self.time_remaining,
                self.conversion_rate,
                self.normalizing_constant,
            )?,
            (TradeDirection::Out, Token::Base) => model.calc_out_given_in(
                amount,
                self.x_reserves,
                bond_side,
                token_out,
                self.fee_percent,
                self.time_remaining,
                self.conversion_rate,
                self.normalizing_constant,
            )?,
        };
        let next = self.apply(amount, direction, token_in, &quote)?;
        Ok((next, quote))
    }

    // for "in"-direction trades the fee lands on the input token's
    // accumulator, for "out"-direction trades on the output token's
    fn apply(
        &self,
        amount: FixedPoint,
        direction: TradeDirection,
        token_in: Token,
        quote: &TradeQuote,
    ) -> Result<Self, SimError> {
        let mut next = self.clone();
        if !quote.curve_fee.is_positive() {
            return Ok(next);
        }
        let slippage_gap = quote
            .amount_out_without_fee_or_slippage
            .checked_sub(quote.amount_out_without_fee)?
            .abs();
        match token_in {
            Token::Fyt => {
                next.x_reserves = self.x_reserves.checked_sub(quote.amount_out_with_fee)?;
                next.y_reserves = self.y_reserves.checked_add(amount)?;
                next.cum_x_slippage = self.cum_x_slippage.checked_add(slippage_gap)?;
                match direction {
                    TradeDirection::In => {
                        next.cum_y_fees = self.cum_y_fees.checked_add(quote.curve_fee)?;
                    }
                    TradeDirection::Out => {
                        next.cum_x_fees = self.cum_x_fees.checked_add(quote.curve_fee)?;
                    }
                }
                next.x_orders += 1;
                next.x_volume = self.x_volume.checked_add(quote.amount_out_with_fee)?;
            }
            Token::Base => {
                next.x_reserves = self.x_reserves.checked_add(amount)?;
                next.y_reserves = self.y_reserves.checked_sub(quote.amount_out_with_fee)?;
                next.cum_y_slippage = self.cum_y_slippage.checked_add(slippage_gap)?;
                match direction {
                    TradeDirection::In => {
                        next.cum_x_fees = self.cum_x_fees.checked_add(quote.curve_fee)?;
                    }
                    TradeDirection::Out => {
                        next.cum_y_fees = self.cum_y_fees.checked_add(quote.curve_fee)?;
                    }
                }
                next.y_orders += 1;
                next.y_volume = self.y_volume.checked_add(quote.amount_out_with_fee)?;
            }
        }
        if next.x_reserves.is_negative() || next.y_reserves.is_negative() {
            return Err(SimError::Amm(hyperdrive_amm::AmmError::NumericDomain {
                context: "swap: reserves driven below zero",
            }));
        }
        Ok(next)
    }
}
