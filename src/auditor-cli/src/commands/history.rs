//! Price history command handler

use anyhow::Result;
use auditor::matcher::pct_change;
use auditor::PricePoint;
use std::path::Path;

use super::audit::format_price;
use crate::cli::OutputFormat;
use crate::config::Config;

/// Change of each point relative to the first point of the series
fn relative_changes(series: &[PricePoint]) -> Vec<Option<f64>> {
    let Some(first) = series.first() else {
        return Vec::new();
    };
    series
        .iter()
        .map(|p| pct_change(first.value, p.value))
        .collect()
}

/// Handle `history`
pub fn handle(
    name: &str,
    links: Option<&str>,
    prices: Option<&Path>,
    format: OutputFormat,
) -> Result<()> {
    let config = Config::load()?;
    let table = config.load_prices(prices, None)?;
    let series = table.unique_history(name, links);

    if let OutputFormat::Json = format {
        println!("{}", serde_json::to_string_pretty(&series)?);
        return Ok(());
    }

    if series.is_empty() {
        println!("No price data for '{}'", name);
        let variants = table.links_for(name);
        if !variants.is_empty() {
            println!("\nRecorded link variants: {}", variants.join(", "));
        }
        return Ok(());
    }

    match links {
        Some(l) => println!("{} ({})\n", name, l),
        None => println!("{}\n", name),
    }
    println!("{:<12} {:>10} {:>9}", "Date", "Price", "Change");
    println!("{}", "-".repeat(33));
    for (point, change) in series.iter().zip(relative_changes(&series)) {
        println!(
            "{:<12} {:>10} {:>9}",
            point.date.to_string(),
            format_price(point.value),
            change
                .map(|c| format!("{:+.1}%", c))
                .unwrap_or_else(|| "-".to_string())
        );
    }

    Ok(())
}
