//! Configuration loading from `config.toml`.
//!
//! The file carries the ledger behaviour switches under `[ledger]` and the
//! plans to seed on first run under `[[plans]]`. Both sections are optional.

/// Database connection and table creation
pub mod database;

/// Ledger behaviour switches
pub mod ledger;

use crate::entities::DepositFrequency;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::path::Path;

pub use ledger::{AdminRejectGate, LedgerSettings, MonthlyDueRule};

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Ledger behaviour switches
    #[serde(default)]
    pub ledger: LedgerSettings,
    /// Plans to seed into an empty catalog
    #[serde(default)]
    pub plans: Vec<PlanConfig>,
}

/// Configuration for a single seeded plan
#[derive(Debug, Deserialize, Clone)]
pub struct PlanConfig {
    pub name: String,
    pub deposit_frequency: DepositFrequency,
    pub deposit_amount: Decimal,
    pub duration_months: i32,
    pub interest_rate: Decimal,
    pub maturity_amount: Decimal,
}

/// Loads the configuration from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A field has the wrong type or an unknown enum value
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();
    tracing::debug!("Loading configuration from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })
}

/// Loads the configuration from the default location (./config.toml),
/// falling back to defaults when the file does not exist.
pub fn load_default_config() -> Result<Config> {
    let path = Path::new("config.toml");
    if path.exists() {
        load_config(path)
    } else {
        tracing::info!("No config.toml found, using default settings");
        Ok(Config::default())
    }
}
