//! Send hand-written records to a running server, no catalog needed.
//!
//! Lines on stdin:
//!   book FIRST LAST AGE ADDRESS DESTINATION PRICE PARTY
//!   summary
//!   quit          (sends TERMINATE and exits)

use std::env;
use std::error::Error;
use std::io::{self, BufRead, Write};

use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use trip_core::{BookingMessage, Guest, TripOffer};
use trip_protocol::encode_record;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let addr = env::var("TRIP_SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8888".to_string());

    println!("Connecting to {}...", addr);
    let mut stream = TcpStream::connect(&addr).await?;
    println!("Connected. Commands: book ..., summary, quit");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        print!(">> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;
        let words: Vec<&str> = line.split_whitespace().collect();

        let msg = match words.as_slice() {
            [] => continue,
            ["quit"] | ["exit"] => break,
            ["summary"] => BookingMessage::request_summary(),
            ["book", first, last, age, address, destination, price, party] => {
                match parse_booking(first, last, age, address, destination, price, party) {
                    Ok(msg) => msg,
                    Err(e) => {
                        eprintln!("Bad booking: {}", e);
                        continue;
                    }
                }
            }
            _ => {
                eprintln!("Unrecognised command.");
                continue;
            }
        };

        stream.write_all(&encode_record(&msg)?).await?;
    }

    stream
        .write_all(&encode_record(&BookingMessage::terminate())?)
        .await?;
    println!("Session terminated.");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn parse_booking(
    first: &str,
    last: &str,
    age: &str,
    address: &str,
    destination: &str,
    price: &str,
    party: &str,
) -> Result<BookingMessage, Box<dyn Error>> {
    let guest = Guest {
        first_name: first.to_string(),
        last_name: last.to_string(),
        age: age.parse()?,
        address: address.replace('_', " "),
    };
    let offer = TripOffer::new(destination.replace('_', " "), price.parse()?)?;
    Ok(BookingMessage::booking(guest, &offer, party.parse()?)?)
}
