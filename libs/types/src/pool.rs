//! Pool snapshot types mirroring the on-chain ABI structures
//!
//! The chain reader hands these over as scaled-integer structures with the
//! ABI's camelCase field names; the serde attributes keep that wire format
//! while the Rust side uses snake_case `FixedPoint` fields. Conversions are
//! lossless in both directions.

use crate::fixed_point::FixedPoint;
use serde::{Deserialize, Serialize};

/// Immutable parameters fixed at pool deployment
///
/// Created once when the pool is deployed and read-only thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolConfig {
    pub initial_share_price: FixedPoint,
    pub minimum_share_reserves: FixedPoint,
    pub minimum_transaction_amount: FixedPoint,
    pub precision_threshold: FixedPoint,
    /// Term of the pool, in seconds
    pub position_duration: u64,
    /// Time between checkpoints, in seconds
    pub checkpoint_duration: u64,
    pub time_stretch: FixedPoint,
    pub inv_time_stretch: FixedPoint,
    /// Fee rates, each in `[0, 1]`
    pub curve_fee: FixedPoint,
    pub flat_fee: FixedPoint,
    pub governance_fee: FixedPoint,
}

/// Mutable snapshot of a pool at a given block
///
/// Refetched per block; every derived number is invalidated by staleness, so
/// the pricing core treats this as an input value object and never caches it
/// beyond a single calculation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoolInfo {
    pub share_reserves: FixedPoint,
    /// Zeta offset; the one legitimately signed quantity in the snapshot
    pub share_adjustment: FixedPoint,
    pub bond_reserves: FixedPoint,
    /// Current vault share price
    pub share_price: FixedPoint,
    pub longs_outstanding: FixedPoint,
    pub shorts_outstanding: FixedPoint,
    pub lp_total_supply: FixedPoint,
    pub withdrawal_shares_outstanding: FixedPoint,
    pub block_number: u64,
    /// Block timestamp, in epoch seconds
    pub block_time: u64,
}

/// Per-checkpoint-interval state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    /// Vault share price recorded at checkpoint time
    pub share_price: FixedPoint,
    pub exposure: FixedPoint,
}
