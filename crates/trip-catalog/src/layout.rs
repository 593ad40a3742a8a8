//! In-memory layout of the catalog region.
//!
//! ```text
//! offset 0            Header { magic, version, capacity, count }
//! offset SLOTS_OFFSET Slot[capacity]
//! ```
//!
//! Both types are plain data: every bit pattern is a valid value, so
//! reading a corrupted region is never undefined behaviour, only a value
//! that fails [`Header::check`] or [`Slot::to_offer`].

use std::mem::{align_of, size_of};

use trip_core::limits::NAME_LEN;
use trip_core::TripOffer;

use crate::error::CatalogError;

/// "TRIP" in ASCII.
pub const MAGIC: u32 = 0x5452_4950;

/// Bumped whenever `Header` or `Slot` change.
pub const LAYOUT_VERSION: u32 = 1;

/// Byte offset of the first slot.
pub const SLOTS_OFFSET: usize = {
    let align = align_of::<Slot>();
    (size_of::<Header>() + align - 1) / align * align
};

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub capacity: u32,
    /// Slots ever appended, tombstones included.
    pub count: u32,
}

impl Header {
    pub fn empty(capacity: usize) -> Self {
        Header {
            magic: MAGIC,
            version: LAYOUT_VERSION,
            capacity: capacity as u32,
            count: 0,
        }
    }

    /// Validate against the capacity implied by the mapping and return `count`.
    pub fn check(&self, mapped_capacity: usize) -> Result<usize, CatalogError> {
        if self.magic != MAGIC {
            return Err(CatalogError::Corrupted(format!(
                "bad magic {:#010x}",
                self.magic
            )));
        }
        if self.version != LAYOUT_VERSION {
            return Err(CatalogError::Corrupted(format!(
                "unknown layout version {}",
                self.version
            )));
        }
        if self.capacity as usize != mapped_capacity {
            return Err(CatalogError::Corrupted(format!(
                "capacity {} does not match mapped size ({} slots)",
                self.capacity, mapped_capacity
            )));
        }
        let count = self.count as usize;
        if count > mapped_capacity {
            return Err(CatalogError::Corrupted(format!(
                "count {} exceeds capacity {}",
                count, mapped_capacity
            )));
        }
        Ok(count)
    }
}

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Slot {
    pub price: f64,
    /// 1 = active, 0 = tombstone.
    pub active: u32,
    pub name_len: u32,
    pub name: [u8; NAME_LEN],
}

impl Slot {
    pub const EMPTY: Slot = Slot {
        price: 0.0,
        active: 0,
        name_len: 0,
        name: [0; NAME_LEN],
    };

    /// Pack a validated offer.
    pub fn from_offer(offer: &TripOffer) -> Self {
        let bytes = offer.name.as_bytes();
        let len = bytes.len().min(NAME_LEN);
        let mut name = [0u8; NAME_LEN];
        name[..len].copy_from_slice(&bytes[..len]);
        Slot {
            price: offer.price,
            active: u32::from(offer.active),
            name_len: len as u32,
            name,
        }
    }

    pub fn is_active(&self) -> Result<bool, CatalogError> {
        match self.active {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CatalogError::Corrupted(format!(
                "slot active flag is {}",
                other
            ))),
        }
    }

    /// Unpack, rejecting anything a valid append could not have written.
    pub fn to_offer(&self) -> Result<TripOffer, CatalogError> {
        let active = self.is_active()?;
        let len = self.name_len as usize;
        if len > NAME_LEN {
            return Err(CatalogError::Corrupted(format!(
                "slot name length {}",
                len
            )));
        }
        let name = std::str::from_utf8(&self.name[..len])
            .map_err(|_| CatalogError::Corrupted("slot name is not UTF-8".to_string()))?;

        let offer = TripOffer {
            name: name.to_string(),
            price: self.price,
            active,
        };
        offer
            .validate()
            .map_err(|e| CatalogError::Corrupted(format!("slot holds invalid offer: {}", e)))?;
        Ok(offer)
    }
}

/// Bytes needed for a catalog of `capacity` slots.
pub fn region_len(capacity: usize) -> usize {
    SLOTS_OFFSET + capacity * size_of::<Slot>()
}

/// Number of whole slots a mapping of `len` bytes holds.
pub fn capacity_for(len: usize) -> Option<usize> {
    len.checked_sub(SLOTS_OFFSET)
        .map(|rest| rest / size_of::<Slot>())
}
