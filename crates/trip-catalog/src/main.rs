//! Catalog manager: creates, fills, inspects and destroys the shared
//! trip catalog.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing_subscriber::EnvFilter;
use trip_catalog::manager::{self, AppendReport};
use trip_catalog::{Catalog, CatalogKey, DEFAULT_CATALOG_KEY};
use trip_core::limits::CATALOG_CAPACITY;
use trip_core::TripOffer;
use trip_protocol::text_codec::format_offer;

#[derive(Parser)]
#[command(name = "catalog-manager")]
#[command(about = "Manage the shared trip catalog")]
struct Cli {
    /// Catalog key shared by every tool
    #[arg(short, long, env = "TRIP_CATALOG_KEY", default_value = DEFAULT_CATALOG_KEY)]
    key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show whether the catalog exists and how full it is
    Status,

    /// Create the catalog, optionally adding trips
    Create {
        /// Number of slots (at most 4096)
        #[arg(short, long, default_value_t = CATALOG_CAPACITY)]
        capacity: usize,

        #[command(flatten)]
        trips: TripArgs,
    },

    /// Append trips to an existing catalog
    Add {
        #[command(flatten)]
        trips: TripArgs,
    },

    /// List active trips
    List {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Retire the trip in a slot (1-based)
    Retire { slot: usize },

    /// Remove the catalog and its lock
    Destroy,

    /// Corrupt the catalog for attached processes, then remove it
    Kill,
}

#[derive(clap::Args)]
struct TripArgs {
    /// Trip as NAME=PRICE; repeatable
    #[arg(short, long = "trip", value_name = "NAME=PRICE")]
    trips: Vec<String>,

    /// TOML file with [[trip]] entries
    #[arg(short, long, value_name = "FILE")]
    from: Option<PathBuf>,
}

impl TripArgs {
    fn offers(&self) -> Result<Vec<TripOffer>> {
        let mut offers = match &self.from {
            Some(path) => manager::load_seed(path)?,
            None => Vec::new(),
        };
        for arg in &self.trips {
            offers.push(manager::parse_trip_arg(arg)?);
        }
        Ok(offers)
    }
}

#[derive(Serialize)]
struct Listed<'a> {
    slot: usize,
    #[serde(flatten)]
    offer: &'a TripOffer,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let key = CatalogKey::new(cli.key)?;

    match cli.command {
        Command::Status => {
            println!("catalog {}: {}", key, manager::state(&key)?);
        }
        Command::Create { capacity, trips } => {
            let offers = trips.offers()?;
            let (catalog, report) = manager::create(&key, capacity, &offers)
                .with_context(|| format!("cannot create catalog {}", key))?;
            println!("Catalog {} created with {} slots.", key, catalog.capacity());
            print_report(&report);
            catalog.detach();
        }
        Command::Add { trips } => {
            let offers = trips.offers()?;
            let catalog = Catalog::attach(&key)?;
            let report = manager::append_all(&catalog, &offers)?;
            print_report(&report);
            catalog.detach();
        }
        Command::List { json } => {
            let catalog = Catalog::attach(&key)?;
            let count = catalog.count()?;
            let offers = catalog.snapshot()?;
            catalog.detach();

            if json {
                let listed: Vec<Listed<'_>> = offers
                    .iter()
                    .map(|(slot, offer)| Listed { slot: *slot, offer })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listed)?);
            } else {
                println!("=== Available Trips ===");
                println!("Total trips: {}", count);
                if offers.is_empty() {
                    println!("No trips available.");
                }
                for (slot, offer) in &offers {
                    println!("{}", format_offer(*slot, offer));
                }
            }
        }
        Command::Retire { slot } => {
            let catalog = Catalog::attach(&key)?;
            let offer = catalog.deactivate(slot)?;
            println!("Retired slot {} ({}).", slot, offer.name);
            catalog.detach();
        }
        Command::Destroy => {
            manager::destroy(&key)?;
            println!("Catalog {} removed.", key);
        }
        Command::Kill => {
            manager::kill(&key)?;
            println!("Catalog {} corrupted and removed.", key);
        }
    }

    Ok(())
}

fn print_report(report: &AppendReport) {
    println!("{} trip(s) added.", report.appended.len());
    if !report.rejected.is_empty() {
        println!(
            "Maximum trips reached; {} trip(s) not added.",
            report.rejected.len()
        );
    }
}
