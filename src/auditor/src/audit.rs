//! End-to-end build audit
//!
//! input -> paste resolution -> decode -> item/stat extraction -> pricing.
//! Each audit is independent; the price table is shared read-only.

use serde::Serialize;
use std::sync::Arc;

use crate::code::{self, BuildDocument, DecodeError};
use crate::items::extract_items_with;
use crate::matcher::{price_clusters, price_uniques, MatchPolicy, PricedClusters, PricedUniques};
use crate::paste::{self, HttpFetcher, PasteError, PasteFetcher};
use crate::patterns::ItemPatterns;
use crate::prices::PriceTable;
use crate::stats::{extract_stats, Character, StatSet};

/// Why an audit produced no build
#[derive(Debug, thiserror::Error)]
pub enum AuditError {
    #[error("Could not resolve build: {0}")]
    Resolve(#[from] PasteError),

    #[error("Could not decode build: {0}")]
    Decode(#[from] DecodeError),
}

/// Everything the presentation layer needs for one build
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuildAudit {
    pub character: Character,
    pub stats: StatSet,
    pub uniques: PricedUniques,
    pub clusters: PricedClusters,
}

impl BuildAudit {
    /// Combined first-seen cost of all uniques and cluster jewels
    pub fn total_cost(&self) -> f64 {
        self.uniques.total_cost + self.clusters.total_cost
    }
}

/// Runs build audits against a loaded price table
pub struct Auditor {
    prices: Arc<PriceTable>,
    patterns: ItemPatterns,
    policy: MatchPolicy,
    fetcher: Box<dyn PasteFetcher>,
}

impl Auditor {
    pub fn new(prices: Arc<PriceTable>) -> Self {
        Self {
            prices,
            patterns: ItemPatterns::default(),
            policy: MatchPolicy::default(),
            fetcher: Box::new(HttpFetcher::default()),
        }
    }

    pub fn with_policy(mut self, policy: MatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_patterns(mut self, patterns: ItemPatterns) -> Self {
        self.patterns = patterns;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Box<dyn PasteFetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    pub fn prices(&self) -> &PriceTable {
        &self.prices
    }

    /// Audit an already decoded build
    pub fn audit_document(&self, doc: &BuildDocument) -> BuildAudit {
        let items = extract_items_with(doc, &self.patterns);
        let (character, stats) = extract_stats(doc);

        BuildAudit {
            character,
            stats,
            uniques: price_uniques(&items.uniques, &self.prices, &self.policy),
            clusters: price_clusters(&items.clusters, &self.prices, &self.policy),
        }
    }

    /// Resolve and decode a link or code, reporting the failing stage
    pub fn try_load(&self, input: &str) -> Result<BuildDocument, AuditError> {
        let code = paste::try_resolve(input, self.fetcher.as_ref())?;
        Ok(code::try_decode(&code)?)
    }

    /// Audit a link or build code, reporting the failing stage
    pub fn try_audit(&self, input: &str) -> Result<BuildAudit, AuditError> {
        let doc = self.try_load(input)?;
        Ok(self.audit_document(&doc))
    }

    /// Audit a link or build code. `None` means no usable build was given.
    pub fn audit(&self, input: &str) -> Option<BuildAudit> {
        match self.try_audit(input) {
            Ok(audit) => Some(audit),
            Err(e) => {
                tracing::debug!("Audit failed: {}", e);
                None
            }
        }
    }
}
