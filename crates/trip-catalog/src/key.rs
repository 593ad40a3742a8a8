//! System-wide names of the catalog objects.

use std::ffi::CString;

use crate::error::CatalogError;

/// Key used by every tool unless overridden.
pub const DEFAULT_CATALOG_KEY: &str = "trip-catalog";

/// Names the region and its lock.
///
/// A key `k` maps to the shared-memory object `/k` and the semaphore
/// `/k.lock`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CatalogKey {
    name: String,
}

impl CatalogKey {
    pub fn new(name: impl Into<String>) -> Result<Self, CatalogError> {
        let name = name.into();
        let valid = !name.is_empty()
            && name.len() <= 200
            && !name.contains('/')
            && !name.contains('\0');
        if !valid {
            return Err(CatalogError::InvalidKey(name));
        }
        Ok(CatalogKey { name })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn region_name(&self) -> String {
        format!("/{}", self.name)
    }

    pub fn lock_name(&self) -> String {
        format!("/{}.lock", self.name)
    }
}

impl Default for CatalogKey {
    fn default() -> Self {
        CatalogKey {
            name: DEFAULT_CATALOG_KEY.to_string(),
        }
    }
}

impl std::fmt::Display for CatalogKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

pub(crate) fn c_name(name: &str) -> Result<CString, CatalogError> {
    CString::new(name).map_err(|_| CatalogError::InvalidKey(name.to_string()))
}
