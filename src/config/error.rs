//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// A specialized `Result` type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The config file is not valid TOML for the expected schema.
    #[error("Failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// An environment override carried an unusable value.
    #[error("Invalid value for {key}: {value}")]
    InvalidOverride { key: &'static str, value: String },
}
