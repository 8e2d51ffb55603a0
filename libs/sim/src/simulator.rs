//! Historical market simulator
//!
//! Drives many days of randomized trading against a configured pricing
//! model and reports every trade as an analysis row. The lifecycle is a
//! strict state machine: construct, `set_sim_params` (draw the per-run
//! parameters), `run_simulation`. A completed instance refuses to run again
//! until it is re-parameterized.
//!
//! All randomness flows from one seeded `StdRng`: the same seed and config
//! always produce the identical trade sequence and identical rows.

use crate::analysis::TradeRecord;
use crate::config::SimConfig;
use crate::errors::SimError;
use crate::market::Market;
use hyperdrive_types::FixedPoint;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::debug;

/// Per-run parameters drawn from the configured ranges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimParams {
    pub target_liquidity: f64,
    pub target_daily_volume: f64,
    /// In percent
    pub start_apy: f64,
    pub fee_percent: f64,
    /// In years
    pub init_vault_age: f64,
    /// As a decimal (the percent range is scaled down when drawn)
    pub vault_apy: f64,
    /// In years
    pub pool_age: f64,
}

pub struct YieldSimulator {
    config: SimConfig,
    rng: StdRng,
    params: Option<SimParams>,
    completed: bool,
}

impl YieldSimulator {
    pub fn new(config: SimConfig) -> Result<Self, SimError> {
        config.validate()?;
        let rng = StdRng::seed_from_u64(config.seed);
        Ok(Self {
            config,
            rng,
            params: None,
            completed: false,
        })
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn params(&self) -> Option<&SimParams> {
        self.params.as_ref()
    }

    /// Draw the per-run parameters from their configured ranges
    ///
    /// Must be called before `run_simulation`, and again before any re-run.
    pub fn set_sim_params(&mut self) {
        let config = &self.config;
        let target_liquidity = self
            .rng
            .gen_range(config.min_target_liquidity..=config.max_target_liquidity);
        let target_daily_volume = self
            .rng
            .gen_range(config.min_target_volume..=config.max_target_volume);
        let start_apy = self.rng.gen_range(config.min_apy..=config.max_apy);
        let fee_percent = self.rng.gen_range(config.min_fee..=config.max_fee);
        let init_vault_age = self
            .rng
            .gen_range(config.min_vault_age..=config.max_vault_age);
        let vault_apy = self
            .rng
            .gen_range(config.min_vault_apy..=config.max_vault_apy)
            / 100.0;
        let pool_age_floor = config.min_pool_age.min(init_vault_age);
        let pool_age = self.rng.gen_range(pool_age_floor..=config.max_pool_age);
        self.params = Some(SimParams {
            target_liquidity,
            target_daily_volume,
            start_apy,
            fee_percent,
            init_vault_age,
            vault_apy,
            pool_age,
        });
        self.completed = false;
    }

    /// Run the configured number of trading days and return the trade rows
    pub fn run_simulation(&mut self) -> Result<Vec<TradeRecord>, SimError> {
        let params = self.params.ok_or(SimError::NotParameterized)?;
        if self.completed {
            return Err(SimError::AlreadyCompleted);
        }
        let config = self.config.clone();
        let model = config.model.model();

        let conversion_rate = round_to(
            (1.0 + params.vault_apy).powf(params.init_vault_age),
            config.precision,
        );
        let normalizing_constant = round_to(
            (1.0 + params.vault_apy).powf(params.pool_age),
            config.precision,
        );
        let c = FixedPoint::try_from_f64(conversion_rate)?;
        let u = FixedPoint::try_from_f64(normalizing_constant)?;

        let start_apy = FixedPoint::try_from_f64(params.start_apy)?;
        let t_stretch = model.calc_time_stretch(start_apy)?;
        let days_until_maturity = FixedPoint::from_int(config.days_until_maturity as i64);
        let base_asset_price = FixedPoint::try_from_f64(config.base_asset_price)?;
        let target_liquidity = FixedPoint::try_from_f64(params.target_liquidity)?;
        let target_daily_volume = FixedPoint::try_from_f64(params.target_daily_volume)?;
        let fee_percent = FixedPoint::try_from_f64(params.fee_percent)?;

        let (x_reserves, y_reserves, _liquidity) = model.calc_liquidity(
            target_liquidity,
            base_asset_price,
            start_apy,
            days_until_maturity,
            t_stretch,
            c,
            u,
        )?;
        let total_supply = x_reserves.checked_add(y_reserves)?;
        let time_remaining = days_until_maturity.div_down(
            FixedPoint::from_int(365).mul_down(t_stretch)?,
        )?;
        let mut market = Market::new(
            x_reserves,
            y_reserves,
            fee_percent,
            time_remaining,
            total_supply,
            c,
            u,
            model,
        )?;

        let step_size = FixedPoint::try_from_f64(config.step_size)?;
        // the historical accrual schedule scales the decimal vault APY down
        // by a further factor of 100
        let daily_accrual_rate =
            FixedPoint::try_from_f64(params.vault_apy / 100.0 / 365.0)?;
        let trade_size = Normal::new(
            params.target_daily_volume / 10.0,
            params.target_daily_volume / 100.0,
        )
        .map_err(|_| SimError::InvalidConfig {
            reason: "degenerate trade-size distribution",
        })?;

        let mut records = Vec::new();
        for day in 0..config.num_trading_days {
            let accrual = daily_accrual_rate.mul_down(market.normalizing_constant)?;
            market =
                market.with_conversion_rate(market.conversion_rate.checked_add(accrual)?);

            let mut day_volume = FixedPoint::ZERO;
            let mut trade_index = 0u32;
            while day_volume < target_daily_volume {
                let draw = trade_size.sample(&mut self.rng);
                let trade_amount =
                    FixedPoint::try_from_f64(draw / config.base_asset_price)?;
                let token_index = self.rng.gen_range(0..2usize);
                let token_in = config.tokens[token_index];
                let token_out = config.tokens[1 - token_index];

                let (next, quote) = market.swap(
                    trade_amount,
                    config.trade_direction,
                    token_in,
                    token_out,
                    model,
                )?;
                market = next;

                let days_remaining = config.days_until_maturity as i64 - day as i64 + 1;
                let current_apy =
                    market.apy(model, FixedPoint::from_int(days_remaining))?;
                records.push(TradeRecord {
                    day,
                    trade_index,
                    model_name: model.model_name().to_string(),
                    time_until_end: market.time_remaining,
                    t_stretch,
                    target_liquidity,
                    target_daily_volume,
                    start_apy,
                    current_apy,
                    fee_percent,
                    init_vault_age: FixedPoint::try_from_f64(params.init_vault_age)?,
                    vault_apy: FixedPoint::try_from_f64(params.vault_apy)?,
                    pool_age: FixedPoint::try_from_f64(params.pool_age)?,
                    x_reserves: market.x_reserves,
                    y_reserves: market.y_reserves,
                    total_supply: market.total_supply,
                    token_in,
                    token_out,
                    direction: config.trade_direction,
                    trade_amount,
                    conversion_rate: market.conversion_rate,
                    normalizing_constant: market.normalizing_constant,
                    out_without_fee_slippage: quote.amount_out_without_fee_or_slippage,
                    out_with_fee: quote.amount_out_with_fee,
                    out_without_fee: quote.amount_out_without_fee,
                    fee: quote.curve_fee,
                    days_until_maturity: config.days_until_maturity,
                    num_trading_days: config.num_trading_days,
                    spot_price: market.spot_price(model)?,
                    num_orders: market.x_orders + market.y_orders,
                });

                day_volume = day_volume.checked_add(trade_amount.mul_down(base_asset_price)?)?;
                trade_index += 1;
            }
            debug!(day, trades = trade_index, "trading day complete");
            market = market.tick(step_size);
        }

        self.completed = true;
        Ok(records)
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}
