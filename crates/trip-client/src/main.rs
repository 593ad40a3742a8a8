//! Booking client: lists the shared catalog and books trips on the server.

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use trip_catalog::{CatalogKey, DEFAULT_CATALOG_KEY};
use trip_client::session::{self, BookRequest};
use trip_client::DEFAULT_SERVER_ADDR;
use trip_core::Guest;
use trip_protocol::text_codec::{format_booking, format_offer};

#[derive(Parser)]
#[command(name = "trip-client")]
#[command(about = "Book trips from the shared catalog")]
struct Cli {
    /// Server address
    #[arg(short, long, env = "TRIP_SERVER_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    server: String,

    /// Catalog key shared with catalog-manager
    #[arg(short, long, env = "TRIP_CATALOG_KEY", default_value = DEFAULT_CATALOG_KEY)]
    key: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the available trips
    List,

    /// Book a trip and end the session
    Book {
        #[arg(long)]
        first: String,

        #[arg(long)]
        last: String,

        #[arg(long)]
        age: u32,

        #[arg(long)]
        address: String,

        /// Trip number as shown by `list`
        #[arg(short, long)]
        trip: usize,

        /// Number of people travelling
        #[arg(short, long, default_value_t = 1)]
        party: u32,

        /// Request the server summary after booking
        #[arg(long)]
        then_summary: bool,
    },

    /// Ask the server to print its running totals
    Summary,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let key = CatalogKey::new(cli.key)?;

    match cli.command {
        Command::List => {
            let offers = session::list(&key)?;
            println!("=== Available Trips ===");
            if offers.is_empty() {
                println!("No trips available!");
            }
            for (slot, offer) in &offers {
                println!("{}", format_offer(*slot, offer));
            }
        }
        Command::Book {
            first,
            last,
            age,
            address,
            trip,
            party,
            then_summary,
        } => {
            let request = BookRequest {
                guest: Guest {
                    first_name: first,
                    last_name: last,
                    age,
                    address,
                },
                slot: trip,
                party_size: party,
                then_summary,
            };
            let sent = session::book(&key, &cli.server, request).await?;
            println!("Booking sent: {}", format_booking(&sent));
        }
        Command::Summary => {
            session::summary(&key, &cli.server).await?;
            println!("Total display requested.");
        }
    }

    Ok(())
}
