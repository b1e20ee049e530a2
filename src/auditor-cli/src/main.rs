mod cli;
mod commands;
mod config;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;
use commands::configure::ConfigUpdate;

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Audit {
            input,
            prices,
            cluster_ids,
            tolerance,
            band_fallback,
            format,
        } => {
            commands::audit::handle(
                &input,
                prices.as_deref(),
                cluster_ids.as_deref(),
                tolerance,
                band_fallback,
                format,
            )?;
        }

        Commands::Decode { input, xml } => {
            commands::build::decode(&input, xml)?;
        }

        Commands::Encode { input } => {
            commands::build::encode(input.as_deref())?;
        }

        Commands::History {
            name,
            links,
            prices,
            format,
        } => {
            commands::history::handle(&name, links.as_deref(), prices.as_deref(), format)?;
        }

        Commands::Configure {
            prices,
            cluster_ids,
            tolerance,
            band_fallback,
            http_timeout,
            show,
        } => {
            let update = ConfigUpdate {
                prices,
                cluster_ids,
                tolerance,
                band_fallback,
                http_timeout,
            };
            commands::configure::handle(update, show)?;
        }
    }

    Ok(())
}
