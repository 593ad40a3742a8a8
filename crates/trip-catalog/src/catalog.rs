//! The shared trip catalog.
//!
//! Every operation takes the catalog semaphore, validates the header,
//! does its reads or writes, and releases the lock before returning, so
//! no process ever observes a half-written slot or a `count` that
//! disagrees with the appended slots.
//!
//! Slot numbers are 1-based, as shown to operators. A caller that lists
//! offers, lets a human choose, and then books must re-read the choice
//! with [`Catalog::get`]: the lock is not held across the two calls, so
//! an offer retired in between is rejected at selection time.

use std::ptr;

use tracing::{debug, info, warn};
use trip_core::limits::MAX_CATALOG_CAPACITY;
use trip_core::TripOffer;

use crate::error::CatalogError;
use crate::key::CatalogKey;
use crate::layout::{self, Header, Slot, SLOTS_OFFSET};
use crate::region::SharedRegion;
use crate::semaphore::NamedSemaphore;

/// A process's handle on the shared catalog.
#[derive(Debug)]
pub struct Catalog {
    key: CatalogKey,
    region: SharedRegion,
    lock: NamedSemaphore,
    capacity: usize,
}

impl Catalog {
    /// Create and initialize a new, empty catalog.
    ///
    /// Fails with `AlreadyExists` if either object already exists and
    /// with `Capacity` outside `1..=MAX_CATALOG_CAPACITY`; nothing is left
    /// behind on failure.
    pub fn create(key: &CatalogKey, capacity: usize) -> Result<Self, CatalogError> {
        if capacity == 0 || capacity > MAX_CATALOG_CAPACITY {
            return Err(CatalogError::Capacity(capacity));
        }

        // Lock first and hold it until the header is written: anyone who
        // attaches as soon as the region appears blocks on the semaphore
        // instead of reading a zeroed header.
        let lock = NamedSemaphore::create(&key.lock_name())?;
        if let Err(err) = lock.acquire() {
            let _ = lock.destroy();
            return Err(err);
        }

        let region = match SharedRegion::create(&key.region_name(), layout::region_len(capacity)) {
            Ok(region) => region,
            Err(err) => {
                let _ = lock.destroy();
                return Err(err);
            }
        };

        let catalog = Catalog {
            key: key.clone(),
            region,
            lock,
            capacity,
        };
        catalog.write_empty();
        if let Err(err) = catalog.lock.release() {
            let Catalog { region, lock, .. } = catalog;
            let _ = region.destroy();
            let _ = lock.destroy();
            return Err(err);
        }

        info!(key = %key, capacity, "catalog created");
        Ok(catalog)
    }

    /// Attach to an existing catalog.
    ///
    /// Fails with `NotFound` when no catalog manager has created it, and
    /// with `Corrupted` if the region is not a live catalog.
    pub fn attach(key: &CatalogKey) -> Result<Self, CatalogError> {
        let region = SharedRegion::attach(&key.region_name())?;
        let lock = NamedSemaphore::open(&key.lock_name())?;

        let capacity = layout::capacity_for(region.len()).ok_or_else(|| {
            CatalogError::Corrupted(format!("region is only {} bytes", region.len()))
        })?;

        let catalog = Catalog {
            key: key.clone(),
            region,
            lock,
            capacity,
        };
        catalog.count()?;

        debug!(key = %key, capacity, "catalog attached");
        Ok(catalog)
    }

    /// Unmap this process's view; the catalog itself lives on.
    pub fn detach(self) {
        debug!(key = %self.key, "catalog detached");
    }

    /// Remove the catalog from the system: region and semaphore.
    ///
    /// The header is invalidated under the lock first, so processes that
    /// are still attached get `Corrupted` instead of stale offers.
    pub fn destroy(self) -> Result<(), CatalogError> {
        {
            let guard = self.lock.lock()?;
            self.write_header(Header {
                magic: 0,
                ..self.read_header()
            });
            guard.unlock()?;
        }

        let Catalog {
            key, region, lock, ..
        } = self;
        let region_result = region.destroy();
        let lock_result = lock.destroy();
        region_result?;
        lock_result?;

        info!(key = %key, "catalog destroyed");
        Ok(())
    }

    /// Unlink whatever objects exist under `key` without attaching.
    ///
    /// Clears leftovers of a corrupted or half-created catalog. Returns
    /// `NotFound` only if neither object existed.
    pub fn remove(key: &CatalogKey) -> Result<(), CatalogError> {
        let removed_region = existed(SharedRegion::remove(&key.region_name()))?;
        let removed_lock = existed(NamedSemaphore::remove(&key.lock_name()))?;
        if !removed_region && !removed_lock {
            return Err(CatalogError::NotFound(key.region_name()));
        }
        info!(key = %key, "catalog objects removed");
        Ok(())
    }

    pub fn key(&self) -> &CatalogKey {
        &self.key
    }

    /// Slots available in total.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    // -------------------------------------------------------------------------
    // Locked operations
    // -------------------------------------------------------------------------

    /// Reset to `count = 0` with every slot inactive.
    pub fn initialize(&self) -> Result<(), CatalogError> {
        self.with_lock(|| {
            self.write_empty();
            Ok(())
        })
    }

    /// Number of slots appended so far, tombstones included.
    pub fn count(&self) -> Result<usize, CatalogError> {
        self.with_lock(|| self.checked_count())
    }

    /// Append an offer and return its slot number.
    ///
    /// A full catalog yields `Full` and is left unchanged.
    pub fn append(&self, offer: &TripOffer) -> Result<usize, CatalogError> {
        offer.validate()?;

        self.with_lock(|| {
            let count = self.checked_count()?;
            if count >= self.capacity {
                return Err(CatalogError::Full {
                    capacity: self.capacity,
                });
            }

            // Slot first, then count: a writer dying in between leaves
            // the count untouched.
            self.write_slot(count, Slot::from_offer(offer));
            self.write_header(Header {
                count: (count + 1) as u32,
                ..self.read_header()
            });
            Ok(count + 1)
        })
    }

    /// Active offers in slot order, with their slot numbers.
    pub fn snapshot(&self) -> Result<Vec<(usize, TripOffer)>, CatalogError> {
        self.with_lock(|| {
            let count = self.checked_count()?;
            let mut offers = Vec::with_capacity(count);
            for i in 0..count {
                let slot = self.read_slot(i);
                if slot.is_active()? {
                    offers.push((i + 1, slot.to_offer()?));
                }
            }
            Ok(offers)
        })
    }

    /// The active offer in slot `index`.
    ///
    /// Bounds and the active flag are checked under a fresh lock, so the
    /// returned price is safe to book with.
    pub fn get(&self, index: usize) -> Result<TripOffer, CatalogError> {
        self.with_lock(|| {
            let i = self.checked_index(index)?;
            let slot = self.read_slot(i);
            if !slot.is_active()? {
                return Err(CatalogError::Inactive(index));
            }
            slot.to_offer()
        })
    }

    /// Retire the offer in slot `index`; the slot keeps counting.
    pub fn deactivate(&self, index: usize) -> Result<TripOffer, CatalogError> {
        self.with_lock(|| {
            let i = self.checked_index(index)?;
            let mut slot = self.read_slot(i);
            if !slot.is_active()? {
                return Err(CatalogError::Inactive(index));
            }
            let offer = slot.to_offer()?;
            slot.active = 0;
            self.write_slot(i, slot);
            Ok(offer.retired())
        })
    }

    /// Fault injection: scribble over the header so every later access
    /// fails with `Corrupted`.
    pub fn force_corrupt(&self) -> Result<(), CatalogError> {
        self.with_lock(|| {
            warn!(key = %self.key, "corrupting catalog header");
            self.write_header(Header {
                magic: !layout::MAGIC,
                version: u32::MAX,
                capacity: 0,
                count: u32::MAX,
            });
            Ok(())
        })
    }

    // -------------------------------------------------------------------------
    // Helpers (callers hold the lock)
    // -------------------------------------------------------------------------

    fn with_lock<T>(
        &self,
        f: impl FnOnce() -> Result<T, CatalogError>,
    ) -> Result<T, CatalogError> {
        let guard = self.lock.lock()?;
        let result = f();
        guard.unlock()?;
        result
    }

    fn checked_count(&self) -> Result<usize, CatalogError> {
        self.read_header().check(self.capacity)
    }

    fn checked_index(&self, index: usize) -> Result<usize, CatalogError> {
        let count = self.checked_count()?;
        if index == 0 || index > count {
            return Err(CatalogError::OutOfRange { index, count });
        }
        Ok(index - 1)
    }

    fn write_empty(&self) {
        for i in 0..self.capacity {
            self.write_slot(i, Slot::EMPTY);
        }
        self.write_header(Header::empty(self.capacity));
    }

    fn read_header(&self) -> Header {
        // SAFETY: the mapping is at least SLOTS_OFFSET bytes (checked in
        // attach/create), page aligned, and Header is plain data.
        unsafe { ptr::read_volatile(self.region.as_ptr().cast::<Header>()) }
    }

    fn write_header(&self, header: Header) {
        // SAFETY: as in `read_header`.
        unsafe { ptr::write_volatile(self.region.as_ptr().cast::<Header>(), header) }
    }

    fn slot_ptr(&self, i: usize) -> *mut Slot {
        debug_assert!(i < self.capacity, "slot {} beyond mapped capacity", i);
        // SAFETY: `i < capacity` and capacity was derived from the mapped
        // length, so the slot lies inside the mapping; SLOTS_OFFSET keeps
        // Slot alignment.
        unsafe {
            self.region
                .as_ptr()
                .add(SLOTS_OFFSET)
                .cast::<Slot>()
                .add(i)
        }
    }

    fn read_slot(&self, i: usize) -> Slot {
        // SAFETY: `slot_ptr` bounds the index; Slot is plain data.
        unsafe { ptr::read_volatile(self.slot_ptr(i)) }
    }

    fn write_slot(&self, i: usize, slot: Slot) {
        // SAFETY: as in `read_slot`.
        unsafe { ptr::write_volatile(self.slot_ptr(i), slot) }
    }
}

fn existed(result: Result<(), CatalogError>) -> Result<bool, CatalogError> {
    match result {
        Ok(()) => Ok(true),
        Err(CatalogError::NotFound(_)) => Ok(false),
        Err(err) => Err(err),
    }
}
