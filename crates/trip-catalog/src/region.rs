//! Named POSIX shared-memory regions mapped with `MAP_SHARED`.
//!
//! The region outlives every process that maps it: detaching only
//! unmaps, and the object stays in the system until
//! [`SharedRegion::destroy`] or [`SharedRegion::remove`] unlinks it.

use std::ffi::CString;
use std::io;
use std::ptr::NonNull;

use tracing::debug;

use crate::error::CatalogError;
use crate::key::c_name;
use crate::PERMISSIONS;

/// A mapping of a named shared-memory object.
#[derive(Debug)]
pub struct SharedRegion {
    ptr: NonNull<u8>,
    len: usize,
    name: CString,
}

// SAFETY: the mapping is valid for the lifetime of `SharedRegion`; all
// access to its contents goes through raw pointers guarded by the
// catalog semaphore.
unsafe impl Send for SharedRegion {}
unsafe impl Sync for SharedRegion {}

impl SharedRegion {
    /// Create a new zero-filled region of `len` bytes.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    pub fn create(name: &str, len: usize) -> Result<Self, CatalogError> {
        if len == 0 {
            return Err(CatalogError::Os {
                op: "shm create",
                source: io::Error::new(io::ErrorKind::InvalidInput, "size must be > 0"),
            });
        }

        let c = c_name(name)?;
        // SAFETY: `c` is a valid C string.
        let fd = unsafe {
            libc::shm_open(
                c.as_ptr(),
                libc::O_CREAT | libc::O_EXCL | libc::O_RDWR,
                PERMISSIONS as libc::mode_t,
            )
        };
        if fd < 0 {
            return Err(CatalogError::from_open(name, "shm_open create"));
        }

        // SAFETY: `fd` is an open shm descriptor.
        if unsafe { libc::ftruncate(fd, len as libc::off_t) } != 0 {
            let err = CatalogError::os("ftruncate");
            // SAFETY: cleanup of the object we just created.
            unsafe {
                libc::close(fd);
                libc::shm_unlink(c.as_ptr());
            }
            return Err(err);
        }

        // Reserve the pages now: a tmpfs without room fails here with
        // ENOSPC instead of faulting later while the catalog lock is held.
        if let Err(err) = reserve(fd, len) {
            // SAFETY: cleanup of the object we just created.
            unsafe {
                libc::close(fd);
                libc::shm_unlink(c.as_ptr());
            }
            return Err(err);
        }

        match map(fd, len) {
            Ok(ptr) => {
                debug!(name, len, "shared region created");
                Ok(SharedRegion { ptr, len, name: c })
            }
            Err(err) => {
                // SAFETY: as above.
                unsafe {
                    libc::shm_unlink(c.as_ptr());
                }
                Err(err)
            }
        }
    }

    /// Map an existing region; its size is taken from the object.
    ///
    /// Fails with `NotFound` if nothing has created it, or if its creator
    /// has not sized it yet.
    pub fn attach(name: &str) -> Result<Self, CatalogError> {
        let c = c_name(name)?;
        // SAFETY: `c` is a valid C string.
        let fd = unsafe { libc::shm_open(c.as_ptr(), libc::O_RDWR, 0) };
        if fd < 0 {
            return Err(CatalogError::from_open(name, "shm_open"));
        }

        // SAFETY: `stat` is plain data and fully written by fstat on success.
        let mut stat: libc::stat = unsafe { std::mem::zeroed() };
        if unsafe { libc::fstat(fd, &mut stat) } != 0 {
            let err = CatalogError::os("fstat");
            // SAFETY: `fd` is open and not used afterwards.
            unsafe {
                libc::close(fd);
            }
            return Err(err);
        }

        // Zero length means a creator is between shm_open and ftruncate:
        // the catalog does not exist yet.
        let len = usize::try_from(stat.st_size).unwrap_or(0);
        if len == 0 {
            // SAFETY: `fd` is open and not used afterwards.
            unsafe {
                libc::close(fd);
            }
            return Err(CatalogError::NotFound(name.to_string()));
        }

        let ptr = map(fd, len)?;
        debug!(name, len, "shared region attached");
        Ok(SharedRegion { ptr, len, name: c })
    }

    /// Unlink a region by name without mapping it.
    pub fn remove(name: &str) -> Result<(), CatalogError> {
        let c = c_name(name)?;
        // SAFETY: `c` is a valid C string.
        if unsafe { libc::shm_unlink(c.as_ptr()) } != 0 {
            return Err(CatalogError::from_open(name, "shm_unlink"));
        }
        Ok(())
    }

    /// Unmap this process's view.
    pub fn detach(self) {
        drop(self);
    }

    /// Unlink the region and unmap it.
    ///
    /// Other processes keep their mappings until they detach, but no new
    /// process can attach.
    pub fn destroy(self) -> Result<(), CatalogError> {
        // SAFETY: `self.name` is a valid C string.
        if unsafe { libc::shm_unlink(self.name.as_ptr()) } != 0 {
            return Err(CatalogError::os("shm_unlink"));
        }
        debug!(name = ?self.name, "shared region unlinked");
        Ok(())
    }

    /// Base address of the mapping.
    pub fn as_ptr(&self) -> *mut u8 {
        self.ptr.as_ptr()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Drop for SharedRegion {
    fn drop(&mut self) {
        // SAFETY: `ptr`/`len` describe a mapping created by `map`.
        unsafe {
            libc::munmap(self.ptr.as_ptr().cast(), self.len);
        }
    }
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn reserve(fd: libc::c_int, len: usize) -> Result<(), CatalogError> {
    // SAFETY: `fd` is an open shm descriptor.
    match unsafe { libc::posix_fallocate(fd, 0, len as libc::off_t) } {
        0 => Ok(()),
        rc => Err(CatalogError::Os {
            op: "posix_fallocate",
            source: io::Error::from_raw_os_error(rc),
        }),
    }
}

#[cfg(not(any(target_os = "linux", target_os = "android", target_os = "freebsd")))]
fn reserve(_fd: libc::c_int, _len: usize) -> Result<(), CatalogError> {
    Ok(())
}

/// Map `fd` shared read/write and close it; the mapping keeps the object alive.
fn map(fd: libc::c_int, len: usize) -> Result<NonNull<u8>, CatalogError> {
    // SAFETY: `fd` is an open descriptor of at least `len` bytes.
    let ptr = unsafe {
        libc::mmap(
            std::ptr::null_mut(),
            len,
            libc::PROT_READ | libc::PROT_WRITE,
            libc::MAP_SHARED,
            fd,
            0,
        )
    };
    let result = if ptr == libc::MAP_FAILED {
        Err(CatalogError::os("mmap"))
    } else {
        NonNull::new(ptr.cast::<u8>()).ok_or_else(|| CatalogError::os("mmap"))
    };
    // SAFETY: the descriptor is no longer needed once mapped (or failed).
    unsafe {
        libc::close(fd);
    }
    result
}
