//! Analysis output schema
//!
//! One row per executed trade, keyed by `{day, trade_index}`. The column set
//! is an external contract consumed by the analytics layer and must be
//! preserved field-for-field.

use hyperdrive_types::{FixedPoint, Token, TradeDirection};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TradeRecord {
    pub day: u32,
    pub trade_index: u32,
    pub model_name: String,
    pub time_until_end: FixedPoint,
    pub t_stretch: FixedPoint,
    pub target_liquidity: FixedPoint,
    pub target_daily_volume: FixedPoint,
    pub start_apy: FixedPoint,
    pub current_apy: FixedPoint,
    pub fee_percent: FixedPoint,
    pub init_vault_age: FixedPoint,
    pub vault_apy: FixedPoint,
    pub pool_age: FixedPoint,
    pub x_reserves: FixedPoint,
    pub y_reserves: FixedPoint,
    pub total_supply: FixedPoint,
    pub token_in: Token,
    pub token_out: Token,
    pub direction: TradeDirection,
    pub trade_amount: FixedPoint,
    pub conversion_rate: FixedPoint,
    pub normalizing_constant: FixedPoint,
    pub out_without_fee_slippage: FixedPoint,
    pub out_with_fee: FixedPoint,
    pub out_without_fee: FixedPoint,
    pub fee: FixedPoint,
    pub days_until_maturity: u32,
    pub num_trading_days: u32,
    pub spot_price: FixedPoint,
    pub num_orders: u64,
}
