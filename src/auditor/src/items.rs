//! Item extraction from a build document
//!
//! Scans the `Items` section and pulls out the two kinds of item the pricer
//! tracks: unique equipment and cluster jewels. Everything else (rare gear,
//! flasks, ordinary jewels) is skipped.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::code::BuildDocument;
use crate::patterns::{normalize_item_text, ItemMatch, ItemPatterns, DEFAULT_PATTERNS};

const PASSIVE_GRANT_PREFIX: &str = "Added Small Passive Skills grant: ";

/// A unique item, identified by name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UniqueItem {
    pub name: String,
}

/// Cluster jewel size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClusterSize {
    Small,
    Medium,
    Large,
}

impl ClusterSize {
    /// Parse from the jewel's base type line (e.g. "Large Cluster Jewel")
    pub fn from_base_type(base_type: &str) -> Option<Self> {
        match base_type.trim() {
            "Small Cluster Jewel" => Some(Self::Small),
            "Medium Cluster Jewel" => Some(Self::Medium),
            "Large Cluster Jewel" => Some(Self::Large),
            _ => None,
        }
    }

    /// Base type name as it appears in item text and price data
    pub fn base_type(&self) -> &'static str {
        match self {
            Self::Small => "Small Cluster Jewel",
            Self::Medium => "Medium Cluster Jewel",
            Self::Large => "Large Cluster Jewel",
        }
    }
}

impl fmt::Display for ClusterSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base_type())
    }
}

/// A cluster jewel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterJewel {
    pub size: ClusterSize,
    /// Item level
    pub level: u32,
    pub num_passives: u32,
    /// Granted small passives, comma-separated
    pub small_passives: String,
}

impl ClusterJewel {
    /// Price data variant label ("8 passives")
    pub fn variant(&self) -> String {
        format!("{} passives", self.num_passives)
    }
}

/// Both item kinds from one pass over the document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExtractedItems {
    pub uniques: Vec<UniqueItem>,
    pub clusters: Vec<ClusterJewel>,
}

/// Canonicalize the captured "Added Small Passive Skills grant" lines
pub fn canonical_passives(captured: &str) -> String {
    captured
        .trim()
        .lines()
        .map(|line| {
            let line = line.trim();
            line.strip_prefix(PASSIVE_GRANT_PREFIX).unwrap_or(line)
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn cluster_from_captures(caps: &regex::Captures<'_>) -> Option<ClusterJewel> {
    let size = ClusterSize::from_base_type(&caps["size"]);
    let level = caps["item_level"].parse::<u32>().ok();
    let num_passives = caps["num_passives"].parse::<u32>().ok();

    match (size, level, num_passives) {
        (Some(size), Some(level), Some(num_passives)) => Some(ClusterJewel {
            size,
            level,
            num_passives,
            small_passives: canonical_passives(&caps["small_passives"]),
        }),
        _ => {
            tracing::debug!("Skipping cluster jewel with unrecognized fields: {:?}", caps);
            None
        }
    }
}

/// Extract unique items and cluster jewels with a given pattern table.
///
/// Document order is kept and duplicates are not merged.
pub fn extract_items_with(doc: &BuildDocument, patterns: &ItemPatterns) -> ExtractedItems {
    let mut extracted = ExtractedItems::default();

    let Some(items) = doc.section("Items") else {
        return extracted;
    };

    for item in items.children_named("Item") {
        let Some(text) = item.text.as_deref() else {
            continue;
        };
        let text = normalize_item_text(text);

        match patterns.classify(&text) {
            Some(ItemMatch::Unique(caps)) => extracted.uniques.push(UniqueItem {
                name: caps["item_name"].to_string(),
            }),
            Some(ItemMatch::Cluster(caps)) => {
                if let Some(jewel) = cluster_from_captures(&caps) {
                    extracted.clusters.push(jewel);
                }
            }
            None => {}
        }
    }

    extracted
}

/// Extract unique items and cluster jewels with the built-in patterns
pub fn extract_items(doc: &BuildDocument) -> ExtractedItems {
    extract_items_with(doc, &DEFAULT_PATTERNS)
}

/// Unique items in document order, duplicates included
pub fn extract_uniques(doc: &BuildDocument) -> Vec<UniqueItem> {
    extract_items(doc).uniques
}

/// Cluster jewels in document order
pub fn extract_clusters(doc: &BuildDocument) -> Vec<ClusterJewel> {
    extract_items(doc).clusters
}
