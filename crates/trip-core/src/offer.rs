//! Trip offers: the entries of the shared catalog.

use serde::{Deserialize, Serialize};

use crate::error::{check_price, check_text, ValidationError};
use crate::limits::NAME_LEN;

/// A single bookable trip.
///
/// `active == false` is a tombstone: the slot still counts toward the
/// catalog's `count` but is skipped when listing and rejected when
/// selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripOffer {
    /// Destination name, at most [`NAME_LEN`] bytes.
    pub name: String,

    /// Price per traveller.
    pub price: f64,

    /// `false` once the offer has been retired.
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl TripOffer {
    /// Create an active offer, validating name and price.
    pub fn new(name: impl Into<String>, price: f64) -> Result<Self, ValidationError> {
        let offer = TripOffer {
            name: name.into(),
            price,
            active: true,
        };
        offer.validate()?;
        Ok(offer)
    }

    /// Same offer, retired.
    pub fn retired(mut self) -> Self {
        self.active = false;
        self
    }

    /// Check the invariants a catalog slot relies on.
    pub fn validate(&self) -> Result<(), ValidationError> {
        check_text("trip name", &self.name, NAME_LEN)?;
        check_price(self.price)
    }

    /// Price for `party_size` travellers.
    pub fn total_for(&self, party_size: u32) -> f64 {
        self.price * f64::from(party_size)
    }
}
