//! Item text patterns
//!
//! Items in a build document are free-text blocks copied from the game's
//! item tooltip. Classification is driven by a table of regexes with named
//! capture groups so the patterns can be swapped when the export format
//! drifts, without touching the extraction code.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

/// Unique items: rarity line, then the item name
pub const UNIQUE_PATTERN: &str = r"^Rarity: UNIQUE\n(?P<item_name>[\w ']+)\n";

/// Cluster jewels: base type, item level, passive count, and the small passive grants
pub const CLUSTER_PATTERN: &str = concat!(
    r"^Rarity: \w+\s+[\w ]+\s+(?P<size>[\w ]+)\s+",
    r"(?:Unique ID: \w+\s+)?",
    r"Item Level: (?P<item_level>\d+)\s+",
    r"LevelReq: \d+\s+",
    r"Implicits: \d\s+",
    r"\{crafted\}Adds (?P<num_passives>\d) Passive Skills\s+",
    r"\{crafted\}[\w ]+\s+",
    r"\{crafted\}(?P<small_passives>(?:Added Small Passive Skills grant: [\w% ]+(?:\n|$))+)",
);

/// Named groups the unique pattern must define
pub const UNIQUE_GROUPS: &[&str] = &["item_name"];

/// Named groups the cluster pattern must define
pub const CLUSTER_GROUPS: &[&str] = &["size", "item_level", "num_passives", "small_passives"];

/// The built-in pattern table
pub static DEFAULT_PATTERNS: Lazy<ItemPatterns> = Lazy::new(|| {
    ItemPatterns::new(UNIQUE_PATTERN, CLUSTER_PATTERN).expect("built-in item patterns")
});

/// Errors building a pattern table
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    #[error("Invalid {kind} pattern: {source}")]
    Invalid {
        kind: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("{kind} pattern is missing named group '{group}'")]
    MissingGroup { kind: &'static str, group: &'static str },
}

/// What an item text block was recognized as
#[derive(Debug)]
pub enum ItemMatch<'t> {
    Unique(Captures<'t>),
    Cluster(Captures<'t>),
}

/// Compiled item patterns
#[derive(Debug, Clone)]
pub struct ItemPatterns {
    unique: Regex,
    cluster: Regex,
}

impl Default for ItemPatterns {
    fn default() -> Self {
        DEFAULT_PATTERNS.clone()
    }
}

fn compile(kind: &'static str, pattern: &str, groups: &[&'static str]) -> Result<Regex, PatternError> {
    let regex = Regex::new(pattern).map_err(|source| PatternError::Invalid { kind, source })?;
    for &group in groups {
        if !regex.capture_names().flatten().any(|n| n == group) {
            return Err(PatternError::MissingGroup { kind, group });
        }
    }
    Ok(regex)
}

impl ItemPatterns {
    /// Compile a pattern table, checking that each pattern defines its groups
    pub fn new(unique: &str, cluster: &str) -> Result<Self, PatternError> {
        Ok(Self {
            unique: compile("unique", unique, UNIQUE_GROUPS)?,
            cluster: compile("cluster", cluster, CLUSTER_GROUPS)?,
        })
    }

    /// Classify a normalized item text block.
    ///
    /// The cluster pattern is tried first, so a block is never reported as
    /// both kinds.
    pub fn classify<'t>(&self, text: &'t str) -> Option<ItemMatch<'t>> {
        if let Some(caps) = self.cluster.captures(text) {
            return Some(ItemMatch::Cluster(caps));
        }
        self.unique.captures(text).map(ItemMatch::Unique)
    }
}

/// Normalize an item text block for matching: line endings and surrounding whitespace
pub fn normalize_item_text(text: &str) -> String {
    text.replace("\r\n", "\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADHUNTER: &str = "Rarity: UNIQUE\nHeadhunter\nLeather Belt\nItem Level: 84";

    const CLUSTER: &str = "Rarity: RARE\nDusk Coil\nMedium Cluster Jewel\nUnique ID: 7a7a\n\
        Item Level: 75\nLevelReq: 54\nImplicits: 3\n{crafted}Adds 4 Passive Skills\n\
        {crafted}1 Added Passive Skill is a Jewel Socket\n\
        {crafted}Added Small Passive Skills grant: 5% increased Life\n\
        Added Small Passive Skills grant: 4% increased Mana\n\
        1 Added Passive Skill is Fettle";

    #[test]
    fn test_default_patterns_compile() {
        let patterns = ItemPatterns::default();
        assert!(patterns.classify("Rarity: RARE\nFoo").is_none());
    }

    #[test]
    fn test_classify_unique() {
        match DEFAULT_PATTERNS.classify(HEADHUNTER) {
            Some(ItemMatch::Unique(caps)) => assert_eq!(&caps["item_name"], "Headhunter"),
            other => panic!("expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_unique_with_apostrophe() {
        let text = "Rarity: UNIQUE\nBisco's Collar\nGold Amulet";
        match DEFAULT_PATTERNS.classify(text) {
            Some(ItemMatch::Unique(caps)) => assert_eq!(&caps["item_name"], "Bisco's Collar"),
            other => panic!("expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_name_with_hyphen_is_skipped() {
        // Names outside the word/space/apostrophe set are not recognized
        let text = "Rarity: UNIQUE\nLion's Roar-X\nGranite Flask";
        assert!(DEFAULT_PATTERNS.classify(text).is_none());
    }

    #[test]
    fn test_classify_cluster() {
        match DEFAULT_PATTERNS.classify(CLUSTER) {
            Some(ItemMatch::Cluster(caps)) => {
                assert_eq!(&caps["size"], "Medium Cluster Jewel");
                assert_eq!(&caps["item_level"], "75");
                assert_eq!(&caps["num_passives"], "4");
                assert_eq!(
                    &caps["small_passives"],
                    "Added Small Passive Skills grant: 5% increased Life\n\
                     Added Small Passive Skills grant: 4% increased Mana\n"
                );
            }
            other => panic!("expected cluster, got {:?}", other),
        }
    }

    #[test]
    fn test_cluster_without_unique_id() {
        let text = CLUSTER.replace("Unique ID: 7a7a\n", "");
        assert!(matches!(
            DEFAULT_PATTERNS.classify(&text),
            Some(ItemMatch::Cluster(_))
        ));
    }

    #[test]
    fn test_cluster_grant_at_end_of_text() {
        let text = CLUSTER.replace("\n1 Added Passive Skill is Fettle", "");
        match DEFAULT_PATTERNS.classify(&text) {
            Some(ItemMatch::Cluster(caps)) => {
                assert!(caps["small_passives"].ends_with("4% increased Mana"));
            }
            other => panic!("expected cluster, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_cluster_is_classified_once() {
        // A unique-rarity block that also satisfies the cluster layout
        let text = CLUSTER.replace("Rarity: RARE\nDusk Coil", "Rarity: UNIQUE\nDusk Coil");
        assert!(matches!(
            DEFAULT_PATTERNS.classify(&text),
            Some(ItemMatch::Cluster(_))
        ));
    }

    #[test]
    fn test_custom_patterns() {
        let patterns = ItemPatterns::new(
            r"^Rarity: Unique\n(?P<item_name>.+)\n",
            CLUSTER_PATTERN,
        )
        .unwrap();
        match patterns.classify("Rarity: Unique\nMageblood\nHeavy Belt") {
            Some(ItemMatch::Unique(caps)) => assert_eq!(&caps["item_name"], "Mageblood"),
            other => panic!("expected unique, got {:?}", other),
        }
    }

    #[test]
    fn test_pattern_missing_group() {
        let err = ItemPatterns::new(r"^Rarity: UNIQUE\n(.+)\n", CLUSTER_PATTERN).unwrap_err();
        assert!(matches!(
            err,
            PatternError::MissingGroup {
                kind: "unique",
                group: "item_name"
            }
        ));
    }

    #[test]
    fn test_pattern_invalid_regex() {
        let err = ItemPatterns::new(UNIQUE_PATTERN, r"(?P<size>").unwrap_err();
        assert!(matches!(err, PatternError::Invalid { kind: "cluster", .. }));
    }

    #[test]
    fn test_normalize_item_text() {
        assert_eq!(
            normalize_item_text("\n\t\tRarity: UNIQUE\r\nHeadhunter\r\n\t"),
            "Rarity: UNIQUE\nHeadhunter"
        );
    }
}
