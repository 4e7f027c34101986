//! # Terminal Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`MARKET_*`)
//! 2. Defaults (this file)
//!
//! | Variable                 | Default                          |
//! |--------------------------|----------------------------------|
//! | `MARKET_STORE_NAME`      | `Market POS`                     |
//! | `MARKET_CURRENCY_SYMBOL` | `$`                              |
//! | `MARKET_DB_PATH`         | platform data dir / `market.db`  |
//! | `MARKET_SEED_DEMO`       | off (`1`, `true`, `yes` enable)  |
//!
//! Configuration is read-only after startup, so no mutex is needed.

use std::path::PathBuf;

use directories::ProjectDirs;
use market_core::Money;
use serde::{Deserialize, Serialize};

/// Database file name inside the data directory.
pub const DATABASE_FILE: &str = "market.db";

/// Terminal configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TerminalConfig {
    /// Printed above receipts.
    pub store_name: String,

    /// Prefix for displayed amounts.
    pub currency_symbol: String,

    /// Explicit database path. `None` means the platform data directory.
    pub database_path: Option<PathBuf>,

    /// Seed the demo catalog into an empty database.
    pub seed_demo: bool,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        TerminalConfig {
            store_name: "Market POS".to_string(),
            currency_symbol: "$".to_string(),
            database_path: None,
            seed_demo: false,
        }
    }
}

impl TerminalConfig {
    /// Defaults overridden by `MARKET_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. `from_env` passes the process
    /// environment; tests pass a map.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = TerminalConfig::default();

        if let Some(name) = non_empty(lookup("MARKET_STORE_NAME")) {
            config.store_name = name;
        }
        if let Some(symbol) = non_empty(lookup("MARKET_CURRENCY_SYMBOL")) {
            config.currency_symbol = symbol;
        }
        config.database_path = non_empty(lookup("MARKET_DB_PATH")).map(PathBuf::from);
        config.seed_demo = lookup("MARKET_SEED_DEMO")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);

        config
    }

    /// Where the database lives.
    ///
    /// - Linux: `~/.local/share/market-pos/market.db`
    /// - macOS: `~/Library/Application Support/com.market.market-pos/market.db`
    /// - Windows: `%APPDATA%\market\market-pos\data\market.db`
    ///
    /// Falls back to the working directory when no home directory is known.
    pub fn resolve_database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }

        match ProjectDirs::from("com", "market", "market-pos") {
            Some(dirs) => dirs.data_dir().join(DATABASE_FILE),
            None => PathBuf::from(DATABASE_FILE),
        }
    }

    /// Formats an amount with the currency symbol, e.g. `$48.00`.
    pub fn format_money(&self, amount: Money) -> String {
        if amount.is_negative() {
            format!("-{}{}", self.currency_symbol, Money::from_cents(-amount.cents()))
        } else {
            format!("{}{}", self.currency_symbol, amount)
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
