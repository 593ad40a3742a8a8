//! Catalog reads and message construction.
//!
//! Listing and selecting are two separate locked reads. Whatever was
//! listed, the chosen slot is read again under a fresh lock, and only
//! that second read supplies the price the booking is built with.

use trip_catalog::{Catalog, CatalogError, CatalogKey};
use trip_core::{BookingMessage, Guest, TripOffer, ValidationError};

#[derive(Debug, thiserror::Error)]
pub enum BookingError {
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("invalid booking: {0}")]
    Invalid(#[from] ValidationError),
}

impl BookingError {
    /// Setup or corruption failures that should end the process.
    pub fn is_fatal(&self) -> bool {
        matches!(self, BookingError::Catalog(e) if e.is_fatal())
    }
}

/// A process's read-only view of the catalog.
#[derive(Debug)]
pub struct Selection {
    catalog: Catalog,
}

impl Selection {
    /// Attach to the catalog. Fails with `NotFound` when the catalog
    /// manager has not created it yet.
    pub fn attach(key: &CatalogKey) -> Result<Self, BookingError> {
        Ok(Selection {
            catalog: Catalog::attach(key)?,
        })
    }

    /// Active offers with their 1-based slot numbers.
    pub fn offers(&self) -> Result<Vec<(usize, TripOffer)>, BookingError> {
        Ok(self.catalog.snapshot()?)
    }

    /// Re-read slot `index`, rejecting it if it is out of range or retired.
    pub fn choose(&self, index: usize) -> Result<TripOffer, BookingError> {
        Ok(self.catalog.get(index)?)
    }

    /// Build the booking for `guest` on slot `index`.
    pub fn book(
        &self,
        guest: Guest,
        index: usize,
        party_size: u32,
    ) -> Result<BookingMessage, BookingError> {
        guest.validate()?;
        let offer = self.choose(index)?;
        Ok(BookingMessage::booking(guest, &offer, party_size)?)
    }

    pub fn detach(self) {
        self.catalog.detach();
    }
}
