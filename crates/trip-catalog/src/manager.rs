//! Catalog lifecycle as driven by the catalog manager.
//!
//! ```text
//! Absent --create--> Created --append*--> Populated --destroy--> Absent
//! ```
//!
//! The manager is the only legitimate writer of new offers. Two managers
//! on the same key are not supported: `create` on an existing key is an
//! error reported to the operator, not a race to resolve.

use std::fmt;
use std::path::Path;

use serde::Deserialize;
use tracing::{info, warn};
use trip_core::TripOffer;

use crate::catalog::Catalog;
use crate::error::CatalogError;
use crate::key::CatalogKey;

/// Observable state of the catalog under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogState {
    /// Nothing exists under the key.
    Absent,
    /// Created, nothing appended yet.
    Created { capacity: usize },
    /// `count` slots appended (tombstones included).
    Populated { count: usize, capacity: usize },
    /// Objects exist but do not hold a valid catalog.
    Corrupted,
}

impl fmt::Display for CatalogState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogState::Absent => write!(f, "absent"),
            CatalogState::Created { capacity } => write!(f, "created (0/{} slots)", capacity),
            CatalogState::Populated { count, capacity } => {
                write!(f, "populated ({}/{} slots)", count, capacity)
            }
            CatalogState::Corrupted => write!(f, "corrupted"),
        }
    }
}

/// Inspect the catalog without changing it.
pub fn state(key: &CatalogKey) -> Result<CatalogState, CatalogError> {
    let catalog = match Catalog::attach(key) {
        Ok(catalog) => catalog,
        Err(CatalogError::NotFound(_)) => return Ok(CatalogState::Absent),
        Err(CatalogError::Corrupted(_)) => return Ok(CatalogState::Corrupted),
        Err(err) => return Err(err),
    };

    let capacity = catalog.capacity();
    let state = match catalog.count() {
        Ok(0) => CatalogState::Created { capacity },
        Ok(count) => CatalogState::Populated { count, capacity },
        Err(CatalogError::Corrupted(_)) => CatalogState::Corrupted,
        Err(err) => return Err(err),
    };
    catalog.detach();
    Ok(state)
}

/// Outcome of appending a batch of offers.
#[derive(Debug, Default)]
pub struct AppendReport {
    /// Slot numbers of the offers that went in.
    pub appended: Vec<usize>,
    /// Offers that did not fit once the catalog filled up.
    pub rejected: Vec<TripOffer>,
}

/// Create the catalog and fill it with `offers`.
pub fn create(
    key: &CatalogKey,
    capacity: usize,
    offers: &[TripOffer],
) -> Result<(Catalog, AppendReport), CatalogError> {
    let catalog = Catalog::create(key, capacity)?;
    let report = append_all(&catalog, offers)?;
    Ok((catalog, report))
}

/// Append offers in order; a full catalog stops the batch without failing it.
pub fn append_all(catalog: &Catalog, offers: &[TripOffer]) -> Result<AppendReport, CatalogError> {
    let mut report = AppendReport::default();
    for (i, offer) in offers.iter().enumerate() {
        match catalog.append(offer) {
            Ok(slot) => {
                info!(slot, name = %offer.name, price = offer.price, "trip added");
                report.appended.push(slot);
            }
            Err(CatalogError::Full { capacity }) => {
                warn!(capacity, "maximum trips reached");
                report.rejected.extend_from_slice(&offers[i..]);
                break;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(report)
}

/// Destroy the catalog; leftovers that cannot be attached are unlinked.
pub fn destroy(key: &CatalogKey) -> Result<(), CatalogError> {
    match Catalog::attach(key) {
        Ok(catalog) => catalog.destroy(),
        Err(err @ CatalogError::NotFound(_)) | Err(err @ CatalogError::Corrupted(_)) => {
            warn!(error = %err, "catalog not attachable, removing leftovers");
            Catalog::remove(key)
        }
        Err(err) => Err(err),
    }
}

/// Fault injection: corrupt the catalog under its lock, then destroy it.
///
/// Processes still attached observe `Corrupted` on their next access.
pub fn kill(key: &CatalogKey) -> Result<(), CatalogError> {
    let catalog = Catalog::attach(key)?;
    catalog.force_corrupt()?;
    catalog.destroy()
}

// -----------------------------------------------------------------------------
// Offer input
// -----------------------------------------------------------------------------

/// A TOML seed file:
///
/// ```toml
/// [[trip]]
/// name = "Lagos"
/// price = 120.0
/// ```
#[derive(Debug, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub trip: Vec<TripOffer>,
}

/// Errors reading offers supplied by the operator.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("expected NAME=PRICE, got {0:?}")]
    Syntax(String),

    #[error("bad price in {0:?}")]
    Price(String),

    #[error("cannot read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse seed file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Invalid(#[from] trip_core::ValidationError),
}

/// Parse a `NAME=PRICE` argument.
pub fn parse_trip_arg(arg: &str) -> Result<TripOffer, SeedError> {
    let (name, price) = arg
        .rsplit_once('=')
        .ok_or_else(|| SeedError::Syntax(arg.to_string()))?;
    let price: f64 = price
        .trim()
        .parse()
        .map_err(|_| SeedError::Price(arg.to_string()))?;
    Ok(TripOffer::new(name.trim(), price)?)
}

/// Parse seed-file contents; every offer is validated.
pub fn parse_seed(text: &str) -> Result<Vec<TripOffer>, SeedError> {
    let seed: SeedFile = toml::from_str(text)?;
    for offer in &seed.trip {
        offer.validate()?;
    }
    Ok(seed.trip)
}

/// Read and parse a seed file.
pub fn load_seed(path: &Path) -> Result<Vec<TripOffer>, SeedError> {
    let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_seed(&text)
}
