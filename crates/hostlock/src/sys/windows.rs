//! Named kernel mutex backend.
//!
//! The resource behind a lock name is a kernel mutex in the global
//! namespace (`Global\<name>`), so unrelated processes on the host resolve
//! to the same object. The kernel provides a true bounded blocking wait, and
//! it grants an abandoned mutex (the previous holder exited while holding
//! it) to the next waiter as an ordinary acquisition.
//!
//! Kernel mutex ownership is tracked per thread. Two handles in one
//! process still exclude each other when they lock from different threads;
//! a thread waiting on a mutex it already owns is granted recursive
//! ownership by the OS, which is one reason the handle layer refuses to
//! lock twice.

#![allow(unsafe_code)]

use std::{ffi::OsStr, io, os::windows::ffi::OsStrExt, ptr, time::Duration};

use windows_sys::Win32::{
    Foundation::{CloseHandle, HANDLE, WAIT_ABANDONED, WAIT_OBJECT_0, WAIT_TIMEOUT},
    System::Threading::{CreateMutexW, ReleaseMutex, WaitForSingleObject},
};

use crate::error::LockError;

/// Prefix that places the mutex in the session-independent namespace.
const GLOBAL_NAMESPACE: &str = "Global\\";

/// An owned handle on the named kernel mutex.
///
/// Dropping it closes the handle; the kernel deletes the mutex once the
/// last handle on it closes.
#[derive(Debug)]
pub(crate) struct Resource {
    handle: HANDLE,
    object_name: String,
}

// HANDLE is a raw pointer and therefore not Send by default. A mutex
// handle may be waited on and closed from any thread; ownership of the
// mutex itself is tracked per thread by the kernel.
unsafe impl Send for Resource {}
unsafe impl Sync for Resource {}

impl Resource {
    /// Create or open the named mutex without acquiring it.
    ///
    /// `CreateMutexW` with `bInitialOwner = FALSE` opens the existing
    /// object when another process created it first, so concurrent
    /// initialization never races.
    pub(crate) fn open(name: &str) -> Result<Self, LockError> {
        let object_name = format!("{GLOBAL_NAMESPACE}{name}");
        let wide: Vec<u16> = OsStr::new(&object_name)
            .encode_wide()
            .chain(std::iter::once(0))
            .collect();

        let handle = unsafe { CreateMutexW(ptr::null(), 0, wide.as_ptr()) };
        if handle.is_null() {
            return Err(LockError::Open {
                name: name.to_string(),
                source: io::Error::last_os_error(),
            });
        }
        Ok(Self {
            handle,
            object_name,
        })
    }

    /// Wait for exclusive ownership within `timeout`.
    ///
    /// Returns `Ok(true)` on acquisition and `Ok(false)` on timeout. An
    /// abandoned wait counts as acquired: the previous holder died and the
    /// kernel hands ownership over. A zero timeout polls the mutex state
    /// once without waiting.
    pub(crate) fn acquire(&self, timeout: Duration) -> Result<bool, LockError> {
        // INFINITE is u32::MAX, so a finite timeout must stay below it.
        let millis = u32::try_from(timeout.as_millis())
            .unwrap_or(u32::MAX - 1)
            .min(u32::MAX - 1);
        match unsafe { WaitForSingleObject(self.handle, millis) } {
            WAIT_OBJECT_0 | WAIT_ABANDONED => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => Err(LockError::Acquire {
                source: io::Error::last_os_error(),
            }),
        }
    }

    /// Release ownership of the mutex.
    pub(crate) fn release(&self) -> Result<(), LockError> {
        let released = unsafe { ReleaseMutex(self.handle) };
        if released == 0 {
            return Err(LockError::Release {
                source: io::Error::last_os_error(),
            });
        }
        Ok(())
    }

    /// Identity of the backing resource, for log events.
    pub(crate) fn describe(&self) -> String {
        self.object_name.clone()
    }
}

impl Drop for Resource {
    fn drop(&mut self) {
        unsafe {
            CloseHandle(self.handle);
        }
    }
}
