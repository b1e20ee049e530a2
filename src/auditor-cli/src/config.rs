//! Configuration management for auditor CLI

use anyhow::{bail, Context, Result};
use auditor::{BandFallback, MatchPolicy, PriceTable};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Price dump path
    pub prices: Option<PathBuf>,
    /// Cluster jewel Id,ItemLevel table path
    pub cluster_ids: Option<PathBuf>,
    pub week1_tolerance_days: Option<u32>,
    pub band_fallback: Option<BandFallback>,
    pub http_timeout_secs: Option<u64>,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("auditor");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or create default if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Matching policy, with command-line overrides taking precedence
    pub fn match_policy(
        &self,
        tolerance: Option<u32>,
        band_fallback: Option<BandFallback>,
    ) -> MatchPolicy {
        MatchPolicy {
            week1_tolerance_days: tolerance.or(self.week1_tolerance_days).unwrap_or(0),
            band_fallback: band_fallback.or(self.band_fallback).unwrap_or_default(),
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs.unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS))
    }

    /// Load the price table from the given or configured paths
    pub fn load_prices(
        &self,
        prices: Option<&Path>,
        cluster_ids: Option<&Path>,
    ) -> Result<PriceTable> {
        let Some(prices) = prices.or(self.prices.as_deref()) else {
            bail!("No price data given. Pass --prices or run: auditor configure --prices PATH");
        };
        let cluster_ids = cluster_ids.or(self.cluster_ids.as_deref());

        PriceTable::load(prices, cluster_ids)
            .with_context(|| format!("Failed to load price data from {}", prices.display()))
    }
}
