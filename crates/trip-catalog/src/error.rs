//! Catalog error taxonomy.
//!
//! - setup: [`AlreadyExists`](CatalogError::AlreadyExists),
//!   [`NotFound`](CatalogError::NotFound), [`Os`](CatalogError::Os)
//! - capacity / selection: [`Full`](CatalogError::Full),
//!   [`OutOfRange`](CatalogError::OutOfRange),
//!   [`Inactive`](CatalogError::Inactive),
//!   [`Invalid`](CatalogError::Invalid)
//! - corruption: [`Corrupted`](CatalogError::Corrupted)

use std::io;

use thiserror::Error;
use trip_core::ValidationError;

#[derive(Debug, Error)]
pub enum CatalogError {
    /// A region or semaphore with this name already exists.
    #[error("{0} already exists")]
    AlreadyExists(String),

    /// No region or semaphore with this name.
    #[error("{0} not found; run `catalog-manager create` first")]
    NotFound(String),

    /// Every slot has been appended.
    #[error("catalog is full ({capacity} slots)")]
    Full { capacity: usize },

    /// Slot number outside `1..=count`.
    #[error("slot {index} is out of range (catalog has {count})")]
    OutOfRange { index: usize, count: usize },

    /// Slot exists but its offer has been retired.
    #[error("slot {0} is no longer offered")]
    Inactive(usize),

    /// Offer rejected before touching the region.
    #[error("invalid offer: {0}")]
    Invalid(#[from] ValidationError),

    /// Capacity outside `1..=MAX_CATALOG_CAPACITY`.
    #[error("unsupported capacity {0} (1 to {max} slots)", max = trip_core::limits::MAX_CATALOG_CAPACITY)]
    Capacity(usize),

    /// Key is not usable as a POSIX object name.
    #[error("invalid catalog key {0:?}")]
    InvalidKey(String),

    /// The region no longer holds a consistent catalog.
    #[error("catalog corrupted: {0}")]
    Corrupted(String),

    /// An OS call failed.
    #[error("{op} failed: {source}")]
    Os {
        op: &'static str,
        #[source]
        source: io::Error,
    },
}

impl CatalogError {
    pub(crate) fn os(op: &'static str) -> Self {
        CatalogError::Os {
            op,
            source: io::Error::last_os_error(),
        }
    }

    /// Map a failed `*_open`/`*_unlink` to the setup error it means.
    pub(crate) fn from_open(name: &str, op: &'static str) -> Self {
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EEXIST) => CatalogError::AlreadyExists(name.to_string()),
            Some(libc::ENOENT) => CatalogError::NotFound(name.to_string()),
            _ => CatalogError::Os { op, source: err },
        }
    }

    /// `true` for errors that must end the process touching the catalog.
    ///
    /// Capacity and selection errors are reported and the operation is
    /// simply aborted.
    pub fn is_fatal(&self) -> bool {
        matches!(self, CatalogError::Corrupted(_) | CatalogError::Os { .. })
    }
}
