//! Application-wide error types using thiserror.

use baitscope_common::BaitscopeError;
use baitscope_config::ConfigError;

/// Main application error type.
#[derive(thiserror::Error, Debug)]
pub enum CliError {
    /// Configuration file could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Loading, selecting or aggregating failed.
    #[error(transparent)]
    Pipeline(#[from] BaitscopeError),

    /// Writing the dashboard view failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for the command line application.
pub type CliResult<T> = Result<T, CliError>;
