//! Error types and utilities for Baitscope

use thiserror::Error;

/// Result type alias for Baitscope operations
pub type Result<T> = std::result::Result<T, BaitscopeError>;

/// Main error type for Baitscope operations
#[derive(Error, Debug)]
pub enum BaitscopeError {
    /// Configuration related errors
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Malformed input detected while loading a data source
    #[error("Load error: {message}{}", line_suffix(.line))]
    Load {
        /// Human-readable description.
        message: String,
        /// 1-based line in the source, header included
        line: Option<u64>,
        /// Offending column, when known
        column: Option<String>,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Caller passed parameters outside the documented contract
    #[error("Contract violation: {message}")]
    Contract {
        /// Human-readable description.
        message: String,
        /// Name of the offending parameter, when known
        parameter: Option<String>,
    },

    /// I/O related errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with custom message
    #[error("{message}")]
    Generic {
        /// Human-readable description.
        message: String,
        /// Underlying cause, if any.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" (line {l})")).unwrap_or_default()
}

impl BaitscopeError {
    /// Create a new generic error with a custom message
    pub fn new(msg: impl Into<String>) -> Self {
        Self::Generic {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new generic error with a custom message and source
    pub fn with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Generic {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
            source: None,
        }
    }

    /// Create a new configuration error with source
    pub fn config_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Config {
            message: msg.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a new load error without position information
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load {
            message: msg.into(),
            line: None,
            column: None,
            source: None,
        }
    }

    /// Create a new load error pointing at a line and column of the source
    pub fn load_at(msg: impl Into<String>, line: u64, column: impl Into<String>) -> Self {
        Self::Load {
            message: msg.into(),
            line: Some(line),
            column: Some(column.into()),
            source: None,
        }
    }

    /// Create a new load error with source
    pub fn load_with_source(
        msg: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Load {
            message: msg.into(),
            line: None,
            column: None,
            source: Some(Box::new(source)),
        }
    }

    /// Create a new contract violation
    pub fn contract(msg: impl Into<String>) -> Self {
        Self::Contract {
            message: msg.into(),
            parameter: None,
        }
    }

    /// Create a new contract violation naming the offending parameter
    pub fn contract_param(msg: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::Contract {
            message: msg.into(),
            parameter: Some(parameter.into()),
        }
    }

    /// Whether this error was caused by malformed input data
    pub fn is_load(&self) -> bool {
        matches!(self, Self::Load { .. })
    }

    /// Whether this error was caused by a caller passing invalid parameters
    pub fn is_contract(&self) -> bool {
        matches!(self, Self::Contract { .. })
    }
}

// Error conversion implementations for external types

/// Convert from csv::Error to BaitscopeError
impl From<csv::Error> for BaitscopeError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(csv::Position::line);
        match err.kind() {
            csv::ErrorKind::Io(_) => Self::load_with_source("Failed to read delimited source", err),
            _ => Self::Load {
                message: "Malformed delimited source".to_string(),
                line,
                column: None,
                source: Some(Box::new(err)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_creation() {
        let error = BaitscopeError::new("test message");
        assert!(error.to_string().contains("test message"));

        let config_error = BaitscopeError::config("config issue");
        assert_eq!(config_error.to_string(), "Configuration error: config issue");

        let contract_error = BaitscopeError::contract_param("alpha must be in (0, 1]", "alpha");
        assert!(contract_error.is_contract());
        assert!(!contract_error.is_load());
        assert_eq!(
            contract_error.to_string(),
            "Contract violation: alpha must be in (0, 1]"
        );
    }

    #[test]
    fn test_load_error_display_includes_line() {
        let error = BaitscopeError::load_at("unparsable date '2018-13-45'", 7, "Date");
        assert!(error.is_load());
        assert_eq!(
            error.to_string(),
            "Load error: unparsable date '2018-13-45' (line 7)"
        );

        let error = BaitscopeError::load("missing required column 'Press'");
        assert_eq!(error.to_string(), "Load error: missing required column 'Press'");
    }

    #[test]
    fn test_error_chain_preservation() {
        let root_error = io::Error::new(io::ErrorKind::NotFound, "Root cause");
        let middle_error = BaitscopeError::config_with_source("Middle layer", root_error);
        let top_error = BaitscopeError::with_source("Top layer", middle_error);

        let mut current_error: &dyn std::error::Error = &top_error;
        let mut error_count = 0;
        while let Some(source) = current_error.source() {
            current_error = source;
            error_count += 1;
        }

        assert_eq!(error_count, 2);
    }

    #[test]
    fn test_io_conversion() {
        fn open() -> Result<()> {
            Err::<(), _>(io::Error::new(io::ErrorKind::PermissionDenied, "denied"))?;
            Ok(())
        }

        let error = open().unwrap_err();
        assert!(matches!(error, BaitscopeError::Io(_)));
    }
}
