//! Core CLI definitions

use auditor::BandFallback;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Output format for audit and history
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

#[derive(Parser)]
#[command(name = "auditor")]
#[command(about = "League Start Auditor - price out a build's uniques and cluster jewels", long_about = None)]
pub struct Cli {
    /// Log progress (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Price a build's uniques and cluster jewels
    #[command(visible_alias = "a")]
    Audit {
        /// pobb.in / pastebin.com link, or a raw build code
        input: String,

        /// Price dump (semicolon-separated; uses configured default if not provided)
        #[arg(short, long, env = "AUDITOR_PRICES")]
        prices: Option<PathBuf>,

        /// Cluster jewel Id,ItemLevel table
        #[arg(long, env = "AUDITOR_CLUSTER_IDS")]
        cluster_ids: Option<PathBuf>,

        /// Days of slack allowed when looking up the week-1 price
        #[arg(short, long)]
        tolerance: Option<u32>,

        /// What to do when no item level band is below a cluster jewel
        #[arg(long)]
        band_fallback: Option<BandFallback>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Decode a build and show its items and stats without pricing
    #[command(visible_alias = "d")]
    Decode {
        /// pobb.in / pastebin.com link, or a raw build code
        input: String,

        /// Print the decoded XML instead
        #[arg(long)]
        xml: bool,
    },

    /// Encode a build XML file as a build code
    Encode {
        /// Path to XML file (reads stdin if omitted)
        input: Option<PathBuf>,
    },

    /// Show the recorded price series of a unique
    #[command(visible_alias = "h")]
    History {
        /// Unique item name
        name: String,

        /// Link variant (e.g. "6L"); unlinked rows when omitted
        #[arg(short, long)]
        links: Option<String>,

        /// Price dump (semicolon-separated; uses configured default if not provided)
        #[arg(short, long, env = "AUDITOR_PRICES")]
        prices: Option<PathBuf>,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Configure default settings
    #[command(visible_alias = "c")]
    Configure {
        /// Default price dump path
        #[arg(long)]
        prices: Option<PathBuf>,

        /// Default cluster jewel Id,ItemLevel table path
        #[arg(long)]
        cluster_ids: Option<PathBuf>,

        /// Default week-1 tolerance in days
        #[arg(long)]
        tolerance: Option<u32>,

        /// Default band fallback (no_data or nearest_above)
        #[arg(long)]
        band_fallback: Option<BandFallback>,

        /// Timeout for fetching pastes, in seconds
        #[arg(long)]
        http_timeout: Option<u64>,

        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
}
