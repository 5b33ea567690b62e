//! Configuration module for StockTracker.
//!
//! This module provides structured configuration loading from environment variables,
//! organized by domain: ML routing/backend and Market Data.

mod market_data_config;
mod ml_config;

pub use market_data_config::MarketDataEnvConfig;
pub use ml_config::{DEFAULT_API_BASE_URL, DEFAULT_MODEL_PATH, MlEnvConfig};

use anyhow::{Context, Result};

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub ml: MlEnvConfig,
    pub market_data: MarketDataEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` first to pick up a local `.env` file.
    pub fn from_env() -> Result<Self> {
        let ml = MlEnvConfig::from_env().context("Failed to load ML config")?;
        let market_data = MarketDataEnvConfig::from_env();
        Ok(Self { ml, market_data })
    }
}
