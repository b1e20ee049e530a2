//! Price matching
//!
//! Joins extracted items against the price table. For each item the first
//! recorded price is its acquisition cost, and the price a week later shows
//! how the item moved after league start.
//!
//! Cluster jewels are priced by item level band: prices are recorded for a
//! few item level tiers, and a jewel is priced at the highest recorded tier
//! below its own level.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::items::{ClusterJewel, UniqueItem};
use crate::prices::{PriceRecord, PriceTable};

/// Days between the first price and the week-1 price
pub const WEEK1_OFFSET_DAYS: i64 = 7;

/// Largest usable week-1 tolerance; wider windows would reach into the first week
pub const MAX_WEEK1_TOLERANCE_DAYS: u32 = 3;

/// What to do when no recorded item level is below a cluster jewel's level
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BandFallback {
    /// Report the jewel as having no price data
    #[default]
    NoData,
    /// Use the lowest recorded level at or above the jewel's level
    NearestAbove,
}

impl std::fmt::Display for BandFallback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoData => write!(f, "no_data"),
            Self::NearestAbove => write!(f, "nearest_above"),
        }
    }
}

impl std::str::FromStr for BandFallback {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "no_data" | "no-data" => Ok(Self::NoData),
            "nearest_above" | "nearest-above" => Ok(Self::NearestAbove),
            _ => Err(format!("unknown band fallback '{}'", s)),
        }
    }
}

/// Matching knobs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchPolicy {
    /// Allowed distance in days from first date + 7 for the week-1 price.
    /// 0 requires the exact date. Values above [`MAX_WEEK1_TOLERANCE_DAYS`] are clamped.
    pub week1_tolerance_days: u32,
    pub band_fallback: BandFallback,
}

/// Price one week after the first observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekOnePrice {
    pub price: f64,
    pub date: NaiveDate,
    /// Signed percent change from the first price; absent when the first price is 0
    pub pct_change: Option<f64>,
}

/// First-seen price and early drift of one item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSummary {
    pub first_price: f64,
    pub first_date: NaiveDate,
    /// Absent when no row falls on (or within tolerance of) the week-1 date
    pub week1: Option<WeekOnePrice>,
}

impl PriceSummary {
    pub fn week1_price(&self) -> Option<f64> {
        self.week1.as_ref().map(|w| w.price)
    }

    pub fn week1_pct_change(&self) -> Option<f64> {
        self.week1.as_ref().and_then(|w| w.pct_change)
    }
}

/// Result of pricing one item
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PriceOutcome {
    Priced(PriceSummary),
    NoData,
}

impl PriceOutcome {
    /// Contribution to total cost
    pub fn cost(&self) -> f64 {
        match self {
            Self::Priced(summary) => summary.first_price,
            Self::NoData => 0.0,
        }
    }

    pub fn summary(&self) -> Option<&PriceSummary> {
        match self {
            Self::Priced(summary) => Some(summary),
            Self::NoData => None,
        }
    }
}

/// Signed percent change, `+20` for 100 -> 120
pub fn pct_change(first: f64, later: f64) -> Option<f64> {
    if first == 0.0 {
        return None;
    }
    Some((later - first) / first * 100.0)
}

/// Summarize a date-ordered series of rows for one item
pub fn summarize<'a>(
    rows: impl IntoIterator<Item = &'a PriceRecord>,
    policy: &MatchPolicy,
) -> PriceOutcome {
    let rows: Vec<&PriceRecord> = rows.into_iter().collect();
    let Some(first) = rows.first() else {
        return PriceOutcome::NoData;
    };

    let first_price = first.value.round();
    let target = first.date + Duration::days(WEEK1_OFFSET_DAYS);
    let tolerance = i64::from(policy.week1_tolerance_days.min(MAX_WEEK1_TOLERANCE_DAYS));

    let week1 = rows
        .iter()
        .filter_map(|r| {
            let distance = (r.date - target).num_days().abs();
            (distance <= tolerance).then_some((distance, *r))
        })
        .min_by_key(|(distance, r)| (*distance, r.date))
        .map(|(_, r)| {
            let price = r.value.round();
            WeekOnePrice {
                price,
                date: r.date,
                pct_change: pct_change(first_price, price),
            }
        });

    if week1.is_none() {
        tracing::debug!("No week-1 price for {} after {}", first.name, first.date);
    }

    PriceOutcome::Priced(PriceSummary {
        first_price,
        first_date: first.date,
        week1,
    })
}

/// Price a unique item with the default policy
pub fn price_unique(item: &UniqueItem, table: &PriceTable) -> PriceOutcome {
    price_unique_with(item, table, &MatchPolicy::default())
}

/// Price a unique item by name
pub fn price_unique_with(item: &UniqueItem, table: &PriceTable, policy: &MatchPolicy) -> PriceOutcome {
    let outcome = summarize(table.rows_named(&item.name), policy);
    if outcome == PriceOutcome::NoData {
        tracing::debug!("No price data for unique '{}'", item.name);
    }
    outcome
}

/// Pick the item level band for a jewel from the recorded levels
pub fn select_band(
    levels: impl IntoIterator<Item = u32>,
    jewel_level: u32,
    fallback: BandFallback,
) -> Option<u32> {
    let levels: BTreeSet<u32> = levels.into_iter().collect();
    let below = levels.range(..jewel_level).next_back().copied();
    match (below, fallback) {
        (Some(band), _) => Some(band),
        (None, BandFallback::NoData) => None,
        (None, BandFallback::NearestAbove) => levels.range(jewel_level..).next().copied(),
    }
}

/// Display name of a priced cluster jewel
pub fn cluster_display_name(jewel: &ClusterJewel, band: Option<u32>) -> String {
    let name = format!(
        "{}, {}, {} passives",
        jewel.small_passives, jewel.size, jewel.num_passives
    );
    match band {
        Some(band) => format!("{}, Level {}", name, band),
        None => name,
    }
}

/// A cluster jewel's price at its item level band
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterPrice {
    pub display_name: String,
    pub band: Option<u32>,
    pub outcome: PriceOutcome,
}

/// Price a cluster jewel with the default policy
pub fn price_cluster(jewel: &ClusterJewel, table: &PriceTable) -> ClusterPrice {
    price_cluster_with(jewel, table, &MatchPolicy::default())
}

/// Price a cluster jewel at the nearest recorded item level band
pub fn price_cluster_with(
    jewel: &ClusterJewel,
    table: &PriceTable,
    policy: &MatchPolicy,
) -> ClusterPrice {
    let variant = jewel.variant();
    let base_type = jewel.size.base_type();

    let levels = table
        .cluster_rows(&jewel.small_passives, base_type, &variant)
        .filter_map(|r| r.item_level);
    let band = select_band(levels, jewel.level, policy.band_fallback);

    let outcome = match band {
        Some(band) => summarize(
            table
                .cluster_rows(&jewel.small_passives, base_type, &variant)
                .filter(|r| r.item_level == Some(band)),
            policy,
        ),
        None => {
            tracing::debug!(
                "No item level band for {} {} (level {})",
                base_type,
                jewel.small_passives,
                jewel.level
            );
            PriceOutcome::NoData
        }
    };

    ClusterPrice {
        display_name: cluster_display_name(jewel, band),
        band,
        outcome,
    }
}

/// A unique item with its price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedUnique {
    pub item: UniqueItem,
    pub outcome: PriceOutcome,
}

/// All uniques of a build with their summed cost
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricedUniques {
    pub items: Vec<PricedUnique>,
    pub total_cost: f64,
}

/// Price every unique. Duplicates are each counted toward the total.
pub fn price_uniques(items: &[UniqueItem], table: &PriceTable, policy: &MatchPolicy) -> PricedUniques {
    let items: Vec<PricedUnique> = items
        .iter()
        .map(|item| PricedUnique {
            item: item.clone(),
            outcome: price_unique_with(item, table, policy),
        })
        .collect();
    let total_cost = items.iter().map(|p| p.outcome.cost()).sum();
    PricedUniques { items, total_cost }
}

/// A cluster jewel with its price
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedCluster {
    pub jewel: ClusterJewel,
    #[serde(flatten)]
    pub price: ClusterPrice,
}

/// All cluster jewels of a build with their summed cost
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PricedClusters {
    pub items: Vec<PricedCluster>,
    pub total_cost: f64,
}

/// Price every cluster jewel
pub fn price_clusters(
    jewels: &[ClusterJewel],
    table: &PriceTable,
    policy: &MatchPolicy,
) -> PricedClusters {
    let items: Vec<PricedCluster> = jewels
        .iter()
        .map(|jewel| PricedCluster {
            jewel: jewel.clone(),
            price: price_cluster_with(jewel, table, policy),
        })
        .collect();
    let total_cost = items.iter().map(|p| p.price.outcome.cost()).sum();
    PricedClusters { items, total_cost }
}
