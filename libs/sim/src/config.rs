//! Simulation configuration
//!
//! All the knobs of the historical simulator: sampling ranges for the
//! per-run parameters, market constants, the bonding-curve variant, and the
//! PRNG seed. Ranges are plain `f64` pairs — the sampled values cross into
//! fixed point once, at the start of a run, and all market math after that
//! point is exact.

use crate::errors::SimError;
use hyperdrive_amm::ModelKind;
use hyperdrive_types::{Token, TradeDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    /// Time resolution, in stretched-time units, removed per trading day
    pub step_size: f64,
    /// Fee-rate sampling range (fraction of slippage taken as fee)
    pub min_fee: f64,
    pub max_fee: f64,
    /// Stretched-time bounds for the run
    pub t_min: f64,
    pub t_max: f64,
    /// The two sides of the market, in draw order
    pub tokens: [Token; 2],
    pub min_target_liquidity: f64,
    pub max_target_liquidity: f64,
    pub min_target_volume: f64,
    pub max_target_volume: f64,
    /// Pool APY sampling range, in percent
    pub min_apy: f64,
    pub max_apy: f64,
    /// Vault age sampling range, in years
    pub min_vault_age: f64,
    pub max_vault_age: f64,
    /// Vault APY sampling range, in percent
    pub min_vault_apy: f64,
    pub max_vault_apy: f64,
    /// Pool age sampling range, in years
    pub min_pool_age: f64,
    pub max_pool_age: f64,
    pub base_asset_price: f64,
    /// Decimal places kept when deriving the conversion-rate constants
    pub precision: u32,
    pub model: ModelKind,
    pub trade_direction: TradeDirection,
    pub days_until_maturity: u32,
    pub num_trading_days: u32,
    /// Seed for the trade-draw PRNG; same seed, same trade sequence
    pub seed: u64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            step_size: 0.001,
            min_fee: 0.1,
            max_fee: 0.5,
            t_min: 0.001,
            t_max: 1.0,
            tokens: [Token::Base, Token::Fyt],
            min_target_liquidity: 100_000.0,
            max_target_liquidity: 1_000_000.0,
            min_target_volume: 10_000.0,
            max_target_volume: 100_000.0,
            min_apy: 0.5,
            max_apy: 5.0,
            min_vault_age: 0.0,
            max_vault_age: 1.0,
            min_vault_apy: 1.0,
            max_vault_apy: 10.0,
            min_pool_age: 0.0,
            max_pool_age: 1.0,
            base_asset_price: 1.0,
            precision: 10,
            model: ModelKind::YieldSpace,
            trade_direction: TradeDirection::Out,
            days_until_maturity: 365,
            num_trading_days: 10,
            seed: 1234,
        }
    }
}

impl SimConfig {
    pub fn validate(&self) -> Result<(), SimError> {
        let ranges = [
            (self.min_fee, self.max_fee, "fee range inverted"),
            (
                self.min_target_liquidity,
                self.max_target_liquidity,
                "target liquidity range inverted",
            ),
            (
                self.min_target_volume,
                self.max_target_volume,
                "target volume range inverted",
            ),
            (self.min_apy, self.max_apy, "apy range inverted"),
            (
                self.min_vault_age,
                self.max_vault_age,
                "vault age range inverted",
            ),
            (
                self.min_vault_apy,
                self.max_vault_apy,
                "vault apy range inverted",
            ),
        ];
        for (low, high, reason) in ranges {
            if low > high {
                return Err(SimError::InvalidConfig { reason });
            }
        }
        if self.min_fee < 0.0 || self.max_fee > 1.0 {
            return Err(SimError::InvalidConfig {
                reason: "fee rates must be within [0, 1]",
            });
        }
        if self.t_min < 0.0 || self.t_max > 1.0 || self.t_min > self.t_max {
            return Err(SimError::InvalidConfig {
                reason: "stretched-time bounds must satisfy 0 <= t_min <= t_max <= 1",
            });
        }
        if self.step_size <= 0.0 {
            return Err(SimError::InvalidConfig {
                reason: "step size must be positive",
            });
        }
        // the pool-age draw is floored by the sampled vault age, so its
        // upper bound must cover the vault-age range
        if self.min_pool_age > self.max_pool_age || self.max_vault_age > self.max_pool_age {
            return Err(SimError::InvalidConfig {
                reason: "pool age range must cover the vault age range",
            });
        }
        if self.base_asset_price <= 0.0 {
            return Err(SimError::InvalidConfig {
                reason: "base asset price must be positive",
            });
        }
        if self.tokens[0] == self.tokens[1] {
            return Err(SimError::InvalidConfig {
                reason: "the two market tokens must differ",
            });
        }
        if self.days_until_maturity == 0 || self.num_trading_days == 0 {
            return Err(SimError::InvalidConfig {
                reason: "maturity and trading-day counts must be non-zero",
            });
        }
        Ok(())
    }
}
