//! Error handling for btcpulse
//!
//! Defines typed errors for construction-time validation and establishes a
//! unified Result type using anyhow for context chaining elsewhere.

use thiserror::Error;

/// Typed errors raised while building the runtime configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {reason}")]
    InvalidVar { name: &'static str, reason: String },

    #[error("io error")]
    Io(#[from] std::io::Error),
}

/// Result type alias for sync and dashboard operations
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_var_message_names_the_variable() {
        let err = ConfigError::MissingVar("MARKET_ENDPOINT");
        assert_eq!(
            err.to_string(),
            "missing required environment variable: MARKET_ENDPOINT"
        );
    }

    #[test]
    fn test_invalid_var_message_is_readable() {
        let err = ConfigError::InvalidVar {
            name: "MARKET_ENDPOINT",
            reason: "not an http(s) url".to_string(),
        };
        assert!(err.to_string().contains("MARKET_ENDPOINT"));
        assert!(err.to_string().contains("not an http(s) url"));
    }
}
