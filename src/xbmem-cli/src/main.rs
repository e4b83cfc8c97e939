mod cli;
mod commands;
mod config;
mod dump;
mod render;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "xbmem=debug,xbmem_cli=debug" } else { "warn" };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Configure {
            ram,
            mappings_dir,
            show,
        } => {
            commands::configure::handle(ram, mappings_dir, show)?;
        }

        Commands::Map {
            snapshot,
            ram,
            title,
            mappings,
            output,
            json,
        } => {
            let config = Config::load()?;
            let dump = commands::open_snapshot(&snapshot)?;
            let options = commands::map::MapOptions {
                ram,
                title,
                mappings: mappings.as_deref(),
                output: &output,
                json,
            };
            commands::map::handle(&dump, options, &config)?;
        }

        Commands::Frame {
            snapshot,
            mappings,
            output,
        } => {
            let config = Config::load()?;
            let dump = commands::open_snapshot(&snapshot)?;
            commands::frame::handle(&dump, mappings.as_deref(), &output, &config)?;
        }

        Commands::Surface {
            snapshot,
            address,
            json,
        } => {
            let dump = commands::open_snapshot(&snapshot)?;
            commands::surface::handle(&dump, &address, json)?;
        }

        Commands::Translate {
            pitch,
            depth,
            tiled,
            linear,
            base,
        } => {
            commands::translate::handle(
                &pitch,
                depth,
                tiled.as_deref(),
                linear.as_deref(),
                base.as_deref(),
            )?;
        }
    }

    Ok(())
}
