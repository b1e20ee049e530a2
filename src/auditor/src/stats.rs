//! Character and stat extraction from a build document

use serde::{Serialize, Serializer};
use std::collections::HashMap;

use crate::code::BuildDocument;

/// Display grouping for a stat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatGroup {
    Offense,
    Defense,
    /// Attributes and charges
    Misc,
}

/// A stat the auditor reports
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayStat {
    /// Name as written in `PlayerStat` entries
    pub name: &'static str,
    pub group: StatGroup,
}

const fn stat(name: &'static str, group: StatGroup) -> DisplayStat {
    DisplayStat { name, group }
}

/// The stat allow-list, in display order
pub const DISPLAY_STATS: &[DisplayStat] = &[
    stat("AverageHit", StatGroup::Offense),
    stat("AverageDamage", StatGroup::Offense),
    stat("Speed", StatGroup::Offense),
    stat("CritChance", StatGroup::Offense),
    stat("CritMultiplier", StatGroup::Offense),
    stat("CombinedDPS", StatGroup::Offense),
    stat("Dex", StatGroup::Misc),
    stat("Int", StatGroup::Misc),
    stat("Str", StatGroup::Misc),
    stat("PowerChargesMax", StatGroup::Misc),
    stat("FrenzyChargesMax", StatGroup::Misc),
    stat("EnduranceChargesMax", StatGroup::Misc),
    stat("TotalEHP", StatGroup::Defense),
    stat("Life", StatGroup::Defense),
    stat("Armour", StatGroup::Defense),
    stat("EnergyShield", StatGroup::Defense),
    stat("Evasion", StatGroup::Defense),
    stat("FireResist", StatGroup::Defense),
    stat("ColdResist", StatGroup::Defense),
    stat("LightningResist", StatGroup::Defense),
    stat("ChaosResist", StatGroup::Defense),
    stat("SpellSuppressionChance", StatGroup::Defense),
];

/// Look up an allow-listed stat by name
pub fn display_stat(name: &str) -> Option<&'static DisplayStat> {
    DISPLAY_STATS.iter().find(|s| s.name == name)
}

/// Character summary from the `Build` section
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Character {
    pub level: u32,
    /// Ascendancy if one is chosen, otherwise the base class
    pub class_name: String,
    /// Per-skill full DPS, in document order
    pub full_dps_skills: Vec<(String, f64)>,
}

/// Allow-listed stat values. Absent stats are `None`, never an implicit zero.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatSet {
    values: HashMap<&'static str, f64>,
}

impl StatSet {
    /// Record a stat value. Names outside the allow-list are ignored.
    pub fn insert(&mut self, name: &str, value: f64) -> bool {
        match display_stat(name) {
            Some(stat) => {
                self.values.insert(stat.name, value);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.values.get(name).copied()
    }

    /// Value of a stat, or the caller's default when absent
    pub fn get_or(&self, name: &str, default: f64) -> f64 {
        self.get(name).unwrap_or(default)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Present stats in allow-list order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        DISPLAY_STATS
            .iter()
            .filter_map(move |s| self.get(s.name).map(|v| (s.name, v)))
    }

    /// Present stats of one group, in allow-list order
    pub fn group(&self, group: StatGroup) -> Vec<(&'static str, f64)> {
        DISPLAY_STATS
            .iter()
            .filter(|s| s.group == group)
            .filter_map(|s| self.get(s.name).map(|v| (s.name, v)))
            .collect()
    }
}

impl Serialize for StatSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

fn parse_value(tag: &str, name: &str, raw: &str) -> Option<f64> {
    match raw.trim().parse::<f64>() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Skipping {} '{}' with malformed value '{}'", tag, name, raw);
            None
        }
    }
}

/// Extract the character summary and allow-listed stats.
///
/// A document without a `Build` section yields empty results. Entries with
/// malformed values are skipped individually.
pub fn extract_stats(doc: &BuildDocument) -> (Character, StatSet) {
    let mut character = Character::default();
    let mut stats = StatSet::default();

    let Some(build) = doc.section("Build") else {
        return (character, stats);
    };

    character.level = match build.attr("level").map(|l| l.trim().parse::<u32>()) {
        Some(Ok(level)) => level,
        Some(Err(_)) | None => {
            tracing::warn!("Build has missing or malformed level: {:?}", build.attr("level"));
            0
        }
    };

    character.class_name = build
        .attr("ascendClassName")
        .filter(|a| !a.is_empty() && *a != "None")
        .or_else(|| build.attr("className"))
        .unwrap_or_default()
        .to_string();

    for entry in &build.children {
        let (Some(name), Some(raw)) = (entry.attr("stat"), entry.attr("value")) else {
            continue;
        };

        match entry.tag.as_str() {
            "PlayerStat" => {
                if display_stat(name).is_none() {
                    continue;
                }
                if let Some(value) = parse_value("PlayerStat", name, raw) {
                    stats.insert(name, value);
                }
            }
            "FullDPSSkill" => {
                if let Some(value) = parse_value("FullDPSSkill", name, raw) {
                    character.full_dps_skills.push((name.to_string(), value));
                }
            }
            _ => {}
        }
    }

    (character, stats)
}
