//! Cross-process binary lock backed by a named POSIX semaphore.
//!
//! A freshly created semaphore holds one permit, so the first `lock`
//! succeeds immediately. `lock` blocks the calling thread until the
//! permit is free; dropping (or explicitly unlocking) the guard returns
//! it and wakes at most one waiter. Waiter order is up to the kernel.

use std::ffi::CString;
use std::io;

use tracing::{debug, error};

use crate::error::CatalogError;
use crate::key::c_name;
use crate::PERMISSIONS;

/// Handle on a named semaphore used as a mutex.
///
/// Each handle owns one `sem_open` reference and closes it on drop; the
/// semaphore itself lives until [`destroy`](NamedSemaphore::destroy) or
/// [`remove`](NamedSemaphore::remove) unlinks it.
#[derive(Debug)]
pub struct NamedSemaphore {
    sem: *mut libc::sem_t,
    name: CString,
}

// SAFETY: POSIX semaphores may be used concurrently from any thread; the
// handle itself is never mutated after construction.
unsafe impl Send for NamedSemaphore {}
unsafe impl Sync for NamedSemaphore {}

impl NamedSemaphore {
    /// Create a new semaphore in the available state.
    ///
    /// Fails with `AlreadyExists` if the name is taken.
    pub fn create(name: &str) -> Result<Self, CatalogError> {
        let c = c_name(name)?;
        // SAFETY: `c` is a valid NUL-terminated string; variadic mode and
        // value are passed as `c_uint` as sem_open expects.
        let sem = unsafe {
            libc::sem_open(
                c.as_ptr(),
                libc::O_CREAT | libc::O_EXCL,
                PERMISSIONS as libc::c_uint,
                1 as libc::c_uint,
            )
        };
        if sem == libc::SEM_FAILED {
            return Err(CatalogError::from_open(name, "sem_open create"));
        }
        debug!(name, "semaphore created");
        Ok(NamedSemaphore { sem, name: c })
    }

    /// Open an existing semaphore.
    ///
    /// Fails with `NotFound` if nothing has created it.
    pub fn open(name: &str) -> Result<Self, CatalogError> {
        let c = c_name(name)?;
        // SAFETY: as above; without O_CREAT no variadic arguments are read.
        let sem = unsafe { libc::sem_open(c.as_ptr(), 0) };
        if sem == libc::SEM_FAILED {
            return Err(CatalogError::from_open(name, "sem_open"));
        }
        debug!(name, "semaphore opened");
        Ok(NamedSemaphore { sem, name: c })
    }

    /// Block until the lock is held.
    ///
    /// A failing wait (the semaphore vanished or is invalid) is returned
    /// as an `Os` error, which callers treat as fatal.
    pub fn lock(&self) -> Result<SemaphoreGuard<'_>, CatalogError> {
        self.acquire()?;
        Ok(SemaphoreGuard {
            sem: self,
            released: false,
        })
    }

    /// Take the permit without a guard; pair with [`release`](Self::release).
    pub(crate) fn acquire(&self) -> Result<(), CatalogError> {
        loop {
            // SAFETY: `self.sem` came from a successful sem_open and is
            // only closed in Drop.
            if unsafe { libc::sem_wait(self.sem) } == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            if err.kind() != io::ErrorKind::Interrupted {
                return Err(CatalogError::Os {
                    op: "sem_wait",
                    source: err,
                });
            }
        }
    }

    /// Return the permit and wake at most one waiter.
    pub(crate) fn release(&self) -> Result<(), CatalogError> {
        // SAFETY: see `acquire`.
        if unsafe { libc::sem_post(self.sem) } != 0 {
            return Err(CatalogError::os("sem_post"));
        }
        Ok(())
    }

    /// Unlink the semaphore; this handle is closed afterwards.
    ///
    /// Only valid once no process intends to lock it again.
    pub fn destroy(self) -> Result<(), CatalogError> {
        // SAFETY: `self.name` is a valid C string.
        if unsafe { libc::sem_unlink(self.name.as_ptr()) } != 0 {
            return Err(CatalogError::os("sem_unlink"));
        }
        debug!(name = ?self.name, "semaphore unlinked");
        Ok(())
    }

    /// Unlink a semaphore by name without opening it.
    pub fn remove(name: &str) -> Result<(), CatalogError> {
        let c = c_name(name)?;
        // SAFETY: `c` is a valid C string.
        if unsafe { libc::sem_unlink(c.as_ptr()) } != 0 {
            return Err(CatalogError::from_open(name, "sem_unlink"));
        }
        Ok(())
    }
}

impl Drop for NamedSemaphore {
    fn drop(&mut self) {
        // SAFETY: closed exactly once; any guard borrowing `self` is gone.
        unsafe {
            libc::sem_close(self.sem);
        }
    }
}

/// Proof that the semaphore is held.
///
/// Prefer [`unlock`](SemaphoreGuard::unlock), which reports a failing
/// release; the drop fallback can only log it.
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct SemaphoreGuard<'a> {
    sem: &'a NamedSemaphore,
    released: bool,
}

impl SemaphoreGuard<'_> {
    /// Release the lock, reporting failure.
    pub fn unlock(mut self) -> Result<(), CatalogError> {
        self.released = true;
        self.sem.release()
    }
}

impl Drop for SemaphoreGuard<'_> {
    fn drop(&mut self) {
        if !self.released {
            if let Err(e) = self.sem.release() {
                error!(error = %e, "failed to release catalog lock");
            }
        }
    }
}
