//! Build code command handlers (decode, encode)

use anyhow::{Context, Result};
use auditor::paste::{self, HttpFetcher};
use auditor::{code, extract_items, extract_stats};
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::config::Config;

/// Handle `decode`
pub fn decode(input: &str, xml: bool) -> Result<()> {
    let config = Config::load()?;
    let fetcher = HttpFetcher::new(config.http_timeout());
    let build_code = paste::try_resolve(input, &fetcher).context("Could not resolve build")?;

    if xml {
        let text = code::decode_to_xml(&build_code).context("Could not decode build")?;
        println!("{}", text);
        return Ok(());
    }

    let doc = code::try_decode(&build_code).context("Could not decode build")?;
    let items = extract_items(&doc);
    let (character, stats) = extract_stats(&doc);

    println!("Level {} {}", character.level, character.class_name);

    println!("\nUniques ({})", items.uniques.len());
    for item in &items.uniques {
        println!("  {}", item.name);
    }

    println!("\nCluster Jewels ({})", items.clusters.len());
    for jewel in &items.clusters {
        println!(
            "  {} (ilvl {}, {} passives): {}",
            jewel.size, jewel.level, jewel.num_passives, jewel.small_passives
        );
    }

    println!("\nStats ({})", stats.len());
    for (name, value) in stats.iter() {
        println!("  {:<24} {:>14.2}", name, value);
    }

    Ok(())
}

/// Handle `encode`
pub fn encode(input: Option<&Path>) -> Result<()> {
    let xml = match input {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    // Reject documents the decoder would not accept
    auditor::BuildDocument::from_xml(&xml).context("Input is not a valid build document")?;

    println!("{}", code::encode(&xml)?);
    Ok(())
}
