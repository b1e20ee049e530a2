//! # auditor
//!
//! League start auditor library - what did a build cost to put together at
//! the start of a league, and how did those prices move in the first week.
//!
//! This library provides functionality to:
//! - Resolve paste links (pobb.in, pastebin.com) to build codes
//! - Decode build codes into a build document
//! - Extract unique items, cluster jewels, character info, and stats
//! - Price extracted items against a league's historical price dump
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let prices = auditor::PriceTable::load(
//!     Path::new("data/Kalandra/Kalandra.items.csv"),
//!     Some(Path::new("data/Kalandra/Kalandra.clusterjewels.ids.csv")),
//! )?;
//!
//! let auditor = auditor::Auditor::new(Arc::new(prices));
//! if let Some(audit) = auditor.audit("https://pobb.in/BL70qYjBEzI8") {
//!     println!("{} level {}", audit.character.class_name, audit.character.level);
//!     println!("Uniques: {}c", audit.uniques.total_cost);
//!     println!("Cluster jewels: {}c", audit.clusters.total_cost);
//! }
//! # Ok(())
//! # }
//! ```

pub mod audit;
pub mod code;
pub mod items;
pub mod matcher;
pub mod paste;
pub mod patterns;
pub mod prices;
pub mod stats;

// Re-export commonly used items
#[doc(inline)]
pub use audit::{AuditError, Auditor, BuildAudit};
#[doc(inline)]
pub use code::{decode, encode, try_decode, BuildDocument, DecodeError, Element};
#[doc(inline)]
pub use items::{
    extract_clusters, extract_items, extract_uniques, ClusterJewel, ClusterSize, ExtractedItems,
    UniqueItem,
};
#[doc(inline)]
pub use matcher::{
    price_cluster, price_unique, BandFallback, ClusterPrice, MatchPolicy, PriceOutcome,
    PriceSummary, PricedClusters, PricedUniques,
};
#[doc(inline)]
pub use paste::{resolve, HttpFetcher, PasteError, PasteFetcher};
#[doc(inline)]
pub use patterns::{ItemPatterns, PatternError};
#[doc(inline)]
pub use prices::{PricePoint, PriceRecord, PriceTable, PriceTableError};
#[doc(inline)]
pub use stats::{extract_stats, Character, StatGroup, StatSet, DISPLAY_STATS};
