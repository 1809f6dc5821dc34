//! Scheduler error types.

use lfg_core::CoreError;
use thiserror::Error;

/// Errors that can occur while driving a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation has finished, no further players are accepted")]
    Closed,

    #[error("party former task failed: {0}")]
    FormerFailed(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type SimResult<T> = Result<T, SimError>;
