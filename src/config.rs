//! Runtime configuration
//!
//! All external settings come from the environment (optionally via a `.env`
//! file loaded in `main`). The configuration is an explicitly constructed
//! value validated up front: a missing or malformed setting fails the run
//! before any scraping or database work starts.

use std::path::PathBuf;

use crate::error::ConfigError;

/// Environment variable naming the SQLite database path.
pub const DB_CONNECTION: &str = "DB_CONNECTION";

/// Environment variable naming the Binance klines GET endpoint.
pub const MARKET_ENDPOINT: &str = "MARKET_ENDPOINT";

/// Validated runtime configuration for one invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path to the SQLite database file.
    pub db_path: PathBuf,
    /// Klines endpoint, e.g.
    /// `https://api.binance.com/api/v3/klines?symbol=BTCUSDT&interval=1m`.
    pub market_endpoint: String,
}

impl Config {
    /// Build the configuration from the environment.
    ///
    /// `DB_CONNECTION` is optional and falls back to
    /// `$HOME/.btcpulse/data.db` (directory created on demand).
    /// `MARKET_ENDPOINT` is required and must be an http(s) URL.
    pub fn from_env() -> Result<Self, ConfigError> {
        let db_path = match std::env::var(DB_CONNECTION) {
            Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
            _ => default_db_path()?,
        };

        let market_endpoint = std::env::var(MARKET_ENDPOINT)
            .map_err(|_| ConfigError::MissingVar(MARKET_ENDPOINT))?;
        let market_endpoint = market_endpoint.trim().to_string();
        if market_endpoint.is_empty() {
            return Err(ConfigError::MissingVar(MARKET_ENDPOINT));
        }
        if !market_endpoint.starts_with("http://") && !market_endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidVar {
                name: MARKET_ENDPOINT,
                reason: "not an http(s) url".to_string(),
            });
        }

        Ok(Config {
            db_path,
            market_endpoint,
        })
    }
}

/// Database path alone, for the read-only commands (`init`, `dashboard`)
/// that never touch the market endpoint.
pub fn db_path_from_env() -> Result<PathBuf, ConfigError> {
    match std::env::var(DB_CONNECTION) {
        Ok(value) if !value.trim().is_empty() => Ok(PathBuf::from(value)),
        _ => default_db_path(),
    }
}

/// Get the default database path (~/.btcpulse/data.db)
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let home = std::env::var("HOME").map_err(|_| ConfigError::MissingVar("HOME"))?;
    let app_dir = PathBuf::from(home).join(".btcpulse");

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&app_dir)?;

    Ok(app_dir.join("data.db"))
}
