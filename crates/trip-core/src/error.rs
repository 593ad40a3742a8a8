//! Validation errors for the booking data model.
//!
//! Every constructor in this crate checks its inputs against
//! [`limits`](crate::limits) so that a value which exists is a value
//! that fits the fixed-width catalog slot and wire record.

use thiserror::Error;

/// A field failed validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required text field was empty.
    #[error("{0} must not be empty")]
    Empty(&'static str),

    /// A text field does not fit its fixed-width slot.
    #[error("{field} is {len} bytes, limit is {max}")]
    TooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// Age outside `MIN_AGE..=MAX_AGE`.
    #[error("age {0} is out of range")]
    AgeOutOfRange(u32),

    /// Party smaller than `MIN_PARTY_SIZE`.
    #[error("party size {0} is below the minimum")]
    PartySize(u32),

    /// Price is not a finite positive number.
    #[error("invalid price {0}")]
    Price(f64),
}

/// Check a text field against its byte limit.
pub fn check_text(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::Empty(field));
    }
    check_len(field, value, max)
}

/// Like [`check_text`] but allows the empty string.
pub fn check_len(field: &'static str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.len() > max {
        return Err(ValidationError::TooLong {
            field,
            len: value.len(),
            max,
        });
    }
    Ok(())
}

/// Check that a price is finite and strictly positive.
pub fn check_price(price: f64) -> Result<(), ValidationError> {
    if price.is_finite() && price > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::Price(price))
    }
}
