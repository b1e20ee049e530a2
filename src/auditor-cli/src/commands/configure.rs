//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up auditor CLI defaults.

use crate::config::Config;
use anyhow::Result;
use auditor::BandFallback;
use std::path::PathBuf;

/// Settings passed to `configure`
#[derive(Debug, Default)]
pub struct ConfigUpdate {
    pub prices: Option<PathBuf>,
    pub cluster_ids: Option<PathBuf>,
    pub tolerance: Option<u32>,
    pub band_fallback: Option<BandFallback>,
    pub http_timeout: Option<u64>,
}

impl ConfigUpdate {
    fn is_empty(&self) -> bool {
        self.prices.is_none()
            && self.cluster_ids.is_none()
            && self.tolerance.is_none()
            && self.band_fallback.is_none()
            && self.http_timeout.is_none()
    }

    /// Apply the given settings, leaving the rest untouched
    fn apply(self, config: &mut Config) {
        if let Some(p) = self.prices {
            config.prices = Some(p);
        }
        if let Some(p) = self.cluster_ids {
            config.cluster_ids = Some(p);
        }
        if let Some(t) = self.tolerance {
            config.week1_tolerance_days = Some(t);
        }
        if let Some(f) = self.band_fallback {
            config.band_fallback = Some(f);
        }
        if let Some(t) = self.http_timeout {
            config.http_timeout_secs = Some(t);
        }
    }
}

/// Handle the configure command
pub fn handle(update: ConfigUpdate, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if update.is_empty() {
        show_usage();
        return Ok(());
    }

    update.apply(&mut config);
    config.save()?;

    println!("Configuration updated");
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

fn display_path(path: &Option<PathBuf>) -> String {
    path.as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}

/// Display current configuration
fn show_config(config: &Config) {
    let policy = config.match_policy(None, None);
    println!("Prices:        {}", display_path(&config.prices));
    println!("Cluster ids:   {}", display_path(&config.cluster_ids));
    println!("Tolerance:     {} days", policy.week1_tolerance_days);
    println!("Band fallback: {}", policy.band_fallback);
    println!("HTTP timeout:  {}s", config.http_timeout().as_secs());

    if let Ok(path) = Config::config_path() {
        println!("Config file:   {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: auditor configure --prices PATH [--cluster-ids PATH]");
    println!("   or: auditor configure --show");
    println!();
    println!("Note: price data is the league economy dump (semicolon-separated).");
    println!("      Cluster jewel item levels come from a separate Id,ItemLevel file.");
}
