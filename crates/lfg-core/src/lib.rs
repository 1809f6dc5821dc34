pub mod config;
pub mod error;
pub mod types;

pub use config::{Field, PartialConfig, SimConfig};
pub use error::{ConfigError, CoreError};
pub use types::*;
