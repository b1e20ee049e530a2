//! Historical price table
//!
//! Price data comes from the economy dump of a league: a semicolon-separated
//! file with one row per item variant per day. Cluster jewel item levels are
//! not part of the dump and are joined in from a separate `Id,ItemLevel` file.
//!
//! The table is loaded once and only read afterwards. Row order is kept as
//! loaded (the dump is already date-ordered).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Columns the price file must have
const REQUIRED_COLUMNS: &[&str] = &["Name", "Date", "Value"];

/// Errors loading price data
#[derive(Debug, thiserror::Error)]
pub enum PriceTableError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read price data: {0}")]
    Csv(#[from] csv::Error),

    #[error("Price data is missing required column '{0}'")]
    MissingColumn(&'static str),
}

/// One price observation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceRecord {
    pub id: Option<String>,
    pub name: String,
    pub base_type: Option<String>,
    pub variant: Option<String>,
    pub links: Option<String>,
    /// Cluster jewel item level, from the id table
    pub item_level: Option<u32>,
    pub date: NaiveDate,
    pub value: f64,
}

/// A point in a price series
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub value: f64,
}

impl From<&PriceRecord> for PricePoint {
    fn from(record: &PriceRecord) -> Self {
        Self {
            date: record.date,
            value: record.value,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawPriceRow {
    #[serde(rename = "Id", default)]
    id: Option<String>,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "BaseType", default)]
    base_type: Option<String>,
    #[serde(rename = "Variant", default)]
    variant: Option<String>,
    #[serde(rename = "Links", default)]
    links: Option<String>,
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Value")]
    value: String,
}

#[derive(Debug, Deserialize)]
struct RawLevelRow {
    #[serde(rename = "Id")]
    id: String,
    #[serde(rename = "ItemLevel")]
    item_level: String,
}

fn non_empty(field: Option<String>) -> Option<String> {
    field.filter(|f| !f.trim().is_empty())
}

fn open(path: &Path) -> Result<File, PriceTableError> {
    File::open(path).map_err(|source| PriceTableError::Open {
        path: path.to_path_buf(),
        source,
    })
}

/// Read an `Id,ItemLevel` table
pub fn read_item_levels<R: Read>(reader: R) -> Result<HashMap<String, u32>, PriceTableError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut levels = HashMap::new();
    for row in reader.deserialize::<RawLevelRow>() {
        let row: RawLevelRow = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("Skipping unreadable item level row: {}", e);
                continue;
            }
        };
        // Levels may be written as floats ("84.0") by spreadsheet tools
        match row.item_level.parse::<f64>() {
            Ok(level) if level >= 0.0 => {
                levels.insert(row.id, level.round() as u32);
            }
            _ => tracing::warn!("Skipping item level row {} with value '{}'", row.id, row.item_level),
        }
    }
    Ok(levels)
}

/// Read-only price history
#[derive(Debug, Clone, Default)]
pub struct PriceTable {
    records: Vec<PriceRecord>,
    by_name: HashMap<String, Vec<usize>>,
}

impl PriceTable {
    /// Build a table from records, keeping their order
    pub fn from_records(records: Vec<PriceRecord>) -> Self {
        let mut by_name: HashMap<String, Vec<usize>> = HashMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_name.entry(record.name.clone()).or_default().push(idx);
        }
        Self { records, by_name }
    }

    /// Read a semicolon-separated price dump, joining item levels by `Id`
    pub fn from_reader<R: Read>(
        reader: R,
        item_levels: &HashMap<String, u32>,
    ) -> Result<Self, PriceTableError> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        for &column in REQUIRED_COLUMNS {
            if !headers.iter().any(|h| h == column) {
                return Err(PriceTableError::MissingColumn(column));
            }
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;
        for (line, row) in reader.deserialize::<RawPriceRow>().enumerate() {
            let row: RawPriceRow = match row {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!("Skipping unreadable price row {}: {}", line + 2, e);
                    skipped += 1;
                    continue;
                }
            };
            let date = NaiveDate::parse_from_str(&row.date, DATE_FORMAT);
            let value = row.value.parse::<f64>();
            let (Ok(date), Ok(value)) = (date, value) else {
                tracing::warn!(
                    "Skipping price row {} ({}): date '{}', value '{}'",
                    line + 2,
                    row.name,
                    row.date,
                    row.value
                );
                skipped += 1;
                continue;
            };

            let id = non_empty(row.id);
            let item_level = id.as_ref().and_then(|id| item_levels.get(id).copied());
            records.push(PriceRecord {
                id,
                name: row.name,
                base_type: non_empty(row.base_type),
                variant: non_empty(row.variant),
                links: non_empty(row.links),
                item_level,
                date,
                value,
            });
        }

        tracing::info!(
            "Loaded {} price rows ({} skipped, {} item levels)",
            records.len(),
            skipped,
            item_levels.len()
        );
        Ok(Self::from_records(records))
    }

    /// Load the price dump and optional cluster id table from disk
    pub fn load(prices: &Path, cluster_ids: Option<&Path>) -> Result<Self, PriceTableError> {
        let item_levels = match cluster_ids {
            Some(path) => read_item_levels(open(path)?)?,
            None => HashMap::new(),
        };
        Self::from_reader(open(prices)?, &item_levels)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[PriceRecord] {
        &self.records
    }

    /// Rows with the given name, in load order
    pub fn rows_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a PriceRecord> + 'a {
        self.by_name
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&idx| &self.records[idx])
    }

    /// Cluster jewel rows for a passive combination, base type, and variant label
    pub fn cluster_rows<'a>(
        &'a self,
        passives: &str,
        base_type: &'a str,
        variant: &'a str,
    ) -> impl Iterator<Item = &'a PriceRecord> + 'a {
        self.rows_named(passives).filter(move |r| {
            r.base_type.as_deref() == Some(base_type) && r.variant.as_deref() == Some(variant)
        })
    }

    /// Distinct link variants recorded for a unique, in first-seen order
    pub fn links_for(&self, name: &str) -> Vec<String> {
        let mut links: Vec<String> = Vec::new();
        for record in self.rows_named(name) {
            if let Some(l) = &record.links {
                if !links.contains(l) {
                    links.push(l.clone());
                }
            }
        }
        links
    }

    /// Price series of a unique. `links: None` selects the unlinked rows.
    pub fn unique_history(&self, name: &str, links: Option<&str>) -> Vec<PricePoint> {
        self.rows_named(name)
            .filter(|r| r.links.as_deref() == links)
            .map(PricePoint::from)
            .collect()
    }

    /// Price series of a cluster jewel at one item level
    pub fn cluster_history(
        &self,
        passives: &str,
        base_type: &str,
        variant: &str,
        item_level: u32,
    ) -> Vec<PricePoint> {
        self.cluster_rows(passives, base_type, variant)
            .filter(|r| r.item_level == Some(item_level))
            .map(PricePoint::from)
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::io::Write;

    pub(crate) const SAMPLE_PRICES: &str = "\
League;Date;Id;Type;Name;BaseType;Variant;Links;Value;Confidence
Kalandra;2022-08-19;101;UniqueAccessory;Headhunter;Leather Belt;;;100;High
Kalandra;2022-08-20;101;UniqueAccessory;Headhunter;Leather Belt;;;110;High
Kalandra;2022-08-26;101;UniqueAccessory;Headhunter;Leather Belt;;;120;High
Kalandra;2022-08-19;202;UniqueArmour;Tabula Rasa;Simple Robe;;6L;12.4;High
Kalandra;2022-08-26;202;UniqueArmour;Tabula Rasa;Simple Robe;;6L;9.6;High
Kalandra;2022-08-19;203;UniqueArmour;Tabula Rasa;Simple Robe;;;3;Low
Kalandra;2022-08-19;301;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;8 passives;;40;High
Kalandra;2022-08-26;301;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;8 passives;;60;High
Kalandra;2022-08-19;302;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;8 passives;;15;High
Kalandra;2022-08-26;302;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;8 passives;;12;High
Kalandra;2022-08-19;303;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;8 passives;;5;High
Kalandra;2022-08-19;304;ClusterJewel;12% increased Fire Damage;Large Cluster Jewel;9 passives;;2;High
";

    pub(crate) const SAMPLE_LEVELS: &str = "Id,ItemLevel\n301,84\n302,75\n303,1\n304,84\n";

    pub(crate) fn sample_table() -> PriceTable {
        let levels = read_item_levels(SAMPLE_LEVELS.as_bytes()).unwrap();
        PriceTable::from_reader(SAMPLE_PRICES.as_bytes(), &levels).unwrap()
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_load_sample() {
        let table = sample_table();
        assert_eq!(table.len(), 12);

        let first = &table.records()[0];
        assert_eq!(first.name, "Headhunter");
        assert_eq!(first.id.as_deref(), Some("101"));
        assert_eq!(first.variant, None);
        assert_eq!(first.links, None);
        assert_eq!(first.item_level, None);
        assert_eq!(first.date, date("2022-08-19"));
        assert_eq!(first.value, 100.0);

        let cluster = &table.records()[6];
        assert_eq!(cluster.base_type.as_deref(), Some("Large Cluster Jewel"));
        assert_eq!(cluster.variant.as_deref(), Some("8 passives"));
        assert_eq!(cluster.item_level, Some(84));
    }

    #[test]
    fn test_rows_named_keeps_load_order() {
        let table = sample_table();
        let dates: Vec<_> = table.rows_named("Headhunter").map(|r| r.date).collect();
        assert_eq!(
            dates,
            vec![date("2022-08-19"), date("2022-08-20"), date("2022-08-26")]
        );
        assert_eq!(table.rows_named("Mageblood").count(), 0);
    }

    #[test]
    fn test_links_and_unique_history() {
        let table = sample_table();
        assert_eq!(table.links_for("Tabula Rasa"), vec!["6L".to_string()]);
        assert!(table.links_for("Headhunter").is_empty());

        let six_link = table.unique_history("Tabula Rasa", Some("6L"));
        assert_eq!(
            six_link,
            vec![
                PricePoint {
                    date: date("2022-08-19"),
                    value: 12.4
                },
                PricePoint {
                    date: date("2022-08-26"),
                    value: 9.6
                },
            ]
        );
        assert_eq!(table.unique_history("Tabula Rasa", None).len(), 1);
    }

    #[test]
    fn test_cluster_history() {
        let table = sample_table();
        let series = table.cluster_history(
            "12% increased Fire Damage",
            "Large Cluster Jewel",
            "8 passives",
            75,
        );
        assert_eq!(series.len(), 2);
        assert_eq!(series[0].value, 15.0);
        assert_eq!(
            table
                .cluster_rows("12% increased Fire Damage", "Large Cluster Jewel", "9 passives")
                .count(),
            1
        );
    }

    #[test]
    fn test_malformed_rows_skipped() {
        let data = "Date;Name;Value\n2022-08-19;Headhunter;100\nyesterday;Headhunter;90\n2022-08-20;Headhunter;chaos\n";
        let table = PriceTable::from_reader(data.as_bytes(), &HashMap::new()).unwrap();
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_short_rows_skipped() {
        let data = "Date;Name;Value\n2022-08-19;Headhunter;100\n2022-08-20;Headhunter\n2022-08-26;Headhunter;120\n";
        let table = PriceTable::from_reader(data.as_bytes(), &HashMap::new()).unwrap();
        let values: Vec<_> = table.records().iter().map(|r| r.value).collect();
        assert_eq!(values, vec![100.0, 120.0]);

        let levels = read_item_levels("Id,ItemLevel\n1\n2,75\n".as_bytes()).unwrap();
        assert_eq!(levels.len(), 1);
        assert_eq!(levels.get("2"), Some(&75));
    }

    #[test]
    fn test_missing_column() {
        let data = "Date;Name\n2022-08-19;Headhunter\n";
        let err = PriceTable::from_reader(data.as_bytes(), &HashMap::new()).unwrap_err();
        assert!(matches!(err, PriceTableError::MissingColumn("Value")));
    }

    #[test]
    fn test_item_levels_accept_floats() {
        let levels = read_item_levels("Id,ItemLevel\n1,84.0\n2,x\n".as_bytes()).unwrap();
        assert_eq!(levels.get("1"), Some(&84));
        assert_eq!(levels.get("2"), None);
    }

    #[test]
    fn test_load_from_files() {
        let dir = tempfile::tempdir().unwrap();
        let prices = dir.path().join("prices.csv");
        let ids = dir.path().join("ids.csv");
        File::create(&prices)
            .unwrap()
            .write_all(SAMPLE_PRICES.as_bytes())
            .unwrap();
        File::create(&ids)
            .unwrap()
            .write_all(SAMPLE_LEVELS.as_bytes())
            .unwrap();

        let table = PriceTable::load(&prices, Some(&ids)).unwrap();
        assert_eq!(table.len(), 12);
        assert_eq!(table.records()[8].item_level, Some(75));

        let table = PriceTable::load(&prices, None).unwrap();
        assert!(table.records().iter().all(|r| r.item_level.is_none()));
    }

    #[test]
    fn test_load_missing_file() {
        let err = PriceTable::load(Path::new("/nonexistent/prices.csv"), None).unwrap_err();
        assert!(matches!(err, PriceTableError::Open { .. }));
    }
}
