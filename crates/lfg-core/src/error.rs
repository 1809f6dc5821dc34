//! Core error types.

use thiserror::Error;

/// Errors raised while interpreting role names and amounts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("unknown role: {0:?} (expected tank, healer or dps)")]
    UnknownRole(String),

    #[error("invalid amount: {0:?} (expected a positive integer)")]
    InvalidAmount(String),
}

/// Errors raised while collecting startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {input:?} (expected a non-negative integer)")]
    InvalidNumber { field: &'static str, input: String },

    #[error("input closed before {0} was provided")]
    InputClosed(&'static str),
}
