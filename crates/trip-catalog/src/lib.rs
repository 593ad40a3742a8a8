//! trip-catalog
//!
//! The shared trip catalog: a fixed-capacity table of offers living in a
//! named POSIX shared-memory region, attached independently by any number
//! of processes, with every access serialized by a named semaphore.
//!
//! - [`semaphore`] : the cross-process binary lock
//! - [`region`]    : create/attach/unlink of the mapped region
//! - [`layout`]    : in-memory header and slot layout, validation
//! - [`catalog`]   : the locked catalog operations
//! - [`manager`]   : lifecycle actions used by the `catalog-manager` tool

pub mod error;
pub mod key;
pub mod semaphore;
pub mod region;
pub mod layout;
pub mod catalog;
pub mod manager;

pub use catalog::Catalog;
pub use error::CatalogError;
pub use key::{CatalogKey, DEFAULT_CATALOG_KEY};
pub use semaphore::NamedSemaphore;

/// Permission bits for the region and the semaphore.
pub const PERMISSIONS: u32 = 0o666;
