//! Build audit command handler

use anyhow::{bail, Result};
use auditor::matcher::{PricedClusters, PricedUniques};
use auditor::{Auditor, BandFallback, BuildAudit, HttpFetcher, PriceOutcome, StatGroup};
use std::path::Path;
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::config::Config;

/// Format a price in chaos
pub fn format_price(price: f64) -> String {
    format!("{:.0}c", price)
}

/// Format the first / week-1 / change columns of an outcome
fn price_columns(outcome: &PriceOutcome) -> (String, String, String, String) {
    match outcome {
        PriceOutcome::NoData => (
            "no data".to_string(),
            "-".to_string(),
            "-".to_string(),
            "-".to_string(),
        ),
        PriceOutcome::Priced(summary) => {
            let (week1, change) = match &summary.week1 {
                Some(w) => (
                    format_price(w.price),
                    w.pct_change
                        .map(|p| format!("{:+.1}%", p))
                        .unwrap_or_else(|| "-".to_string()),
                ),
                None => ("no data".to_string(), "-".to_string()),
            };
            (
                format_price(summary.first_price),
                summary.first_date.to_string(),
                week1,
                change,
            )
        }
    }
}

fn print_row(name: &str, outcome: &PriceOutcome) {
    let (first, date, week1, change) = price_columns(outcome);
    println!(
        "{:<60} {:>10} {:>12} {:>10} {:>9}",
        name, first, date, week1, change
    );
}

fn print_header(title: &str) {
    println!("\n{}", title);
    println!(
        "{:<60} {:>10} {:>12} {:>10} {:>9}",
        "Item", "First", "Date", "Week 1", "Change"
    );
    println!("{}", "-".repeat(105));
}

fn print_stat_group(title: &str, stats: &[(&'static str, f64)]) {
    if stats.is_empty() {
        return;
    }
    println!("\n{}", title);
    for (name, value) in stats {
        println!("  {:<24} {:>14.2}", name, value);
    }
}

fn print_uniques(uniques: &PricedUniques) {
    if uniques.items.is_empty() {
        return;
    }
    print_header("Uniques");
    for priced in &uniques.items {
        print_row(&priced.item.name, &priced.outcome);
    }
    println!("Total: {}", format_price(uniques.total_cost));
}

fn print_clusters(clusters: &PricedClusters) {
    if clusters.items.is_empty() {
        return;
    }
    print_header("Cluster Jewels");
    for priced in &clusters.items {
        print_row(&priced.price.display_name, &priced.price.outcome);
    }
    println!("Total: {}", format_price(clusters.total_cost));
}

fn print_table(audit: &BuildAudit) {
    let character = &audit.character;
    println!("Level {} {}", character.level, character.class_name);

    print_stat_group("Offense", &audit.stats.group(StatGroup::Offense));
    print_stat_group("Defense", &audit.stats.group(StatGroup::Defense));
    print_stat_group("Misc", &audit.stats.group(StatGroup::Misc));

    if !character.full_dps_skills.is_empty() {
        println!("\nFull DPS");
        for (skill, dps) in &character.full_dps_skills {
            println!("  {:<24} {:>14.0}", skill, dps);
        }
    }

    print_uniques(&audit.uniques);
    print_clusters(&audit.clusters);

    println!("\nTotal cost: {}", format_price(audit.total_cost()));
}

/// Handle `audit`
pub fn handle(
    input: &str,
    prices: Option<&Path>,
    cluster_ids: Option<&Path>,
    tolerance: Option<u32>,
    band_fallback: Option<BandFallback>,
    format: OutputFormat,
) -> Result<()> {
    let config = Config::load()?;
    let table = config.load_prices(prices, cluster_ids)?;
    let policy = config.match_policy(tolerance, band_fallback);
    tracing::info!(
        records = table.len(),
        tolerance = policy.week1_tolerance_days,
        fallback = %policy.band_fallback,
        "Auditing build"
    );

    let auditor = Auditor::new(Arc::new(table))
        .with_policy(policy)
        .with_fetcher(Box::new(HttpFetcher::new(config.http_timeout())));

    let audit = match auditor.try_audit(input) {
        Ok(audit) => audit,
        Err(e) => bail!("No build: {}", e),
    };

    match format {
        OutputFormat::Table => print_table(&audit),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&audit)?),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditor::matcher::{PriceSummary, WeekOnePrice};
    use chrono::NaiveDate;

    fn summary(week1: Option<WeekOnePrice>) -> PriceOutcome {
        PriceOutcome::Priced(PriceSummary {
            first_price: 100.0,
            first_date: NaiveDate::from_ymd_opt(2022, 8, 19).unwrap(),
            week1,
        })
    }

    #[test]
    fn test_format_price() {
        assert_eq!(format_price(99.6), "100c");
        assert_eq!(format_price(0.0), "0c");
    }

    #[test]
    fn test_price_columns_no_data() {
        let (first, _, week1, change) = price_columns(&PriceOutcome::NoData);
        assert_eq!(first, "no data");
        assert_eq!(week1, "-");
        assert_eq!(change, "-");
    }

    #[test]
    fn test_price_columns_priced() {
        let outcome = summary(Some(WeekOnePrice {
            price: 80.0,
            date: NaiveDate::from_ymd_opt(2022, 8, 26).unwrap(),
            pct_change: Some(-20.0),
        }));
        let (first, date, week1, change) = price_columns(&outcome);
        assert_eq!(first, "100c");
        assert_eq!(date, "2022-08-19");
        assert_eq!(week1, "80c");
        assert_eq!(change, "-20.0%");
    }

    #[test]
    fn test_price_columns_missing_week1() {
        let (_, _, week1, change) = price_columns(&summary(None));
        assert_eq!(week1, "no data");
        assert_eq!(change, "-");
    }
}
