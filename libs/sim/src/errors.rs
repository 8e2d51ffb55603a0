//! Simulator error taxonomy

use hyperdrive_amm::AmmError;
use hyperdrive_types::FixedPointError;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SimError {
    /// `run_simulation` was called before `set_sim_params`
    #[error("simulation parameters have not been set")]
    NotParameterized,

    /// A completed simulator must be re-parameterized before running again
    #[error("simulation already completed; re-parameterize before running again")]
    AlreadyCompleted,

    /// The configuration failed validation
    #[error("invalid simulation config: {reason}")]
    InvalidConfig { reason: &'static str },

    /// A curve calculation failed mid-simulation
    #[error(transparent)]
    Amm(#[from] AmmError),

    /// A fixed-point conversion or operation failed
    #[error(transparent)]
    FixedPoint(#[from] FixedPointError),
}
