//! Lock handle state machine.
//!
//! A [`LockHandle`] moves through initialized, locked, unlocked, and
//! terminated states. Terminated is reachable from every state and
//! absorbing. The platform backend only supplies the resource operations;
//! every state decision lives here so both backends honor one contract.

use std::time::{Duration, Instant};

use crate::{error::LockError, sys};

/// A named, host-wide exclusive lock.
///
/// A handle owns one OS resource from [`init`](Self::init) until
/// [`term`](Self::term) or drop, and tracks whether it currently holds the
/// exclusive claim on that resource. The state-changing operations take
/// `&mut self`, so the compiler enforces that threads sharing a handle
/// serialize their calls; the resource itself may move between threads
/// freely.
///
/// The reported lock state answers "does this handle hold the lock", never
/// "is anyone holding it".
#[derive(Debug)]
pub struct LockHandle {
    name: String,
    resource: Option<sys::Resource>,
    locked: bool,
}

impl LockHandle {
    /// Create a handle for `name`, opening the backing OS resource without
    /// acquiring the lock.
    ///
    /// All processes on the host that initialize the same name contend on
    /// the same resource. Concurrent initialization is safe: whoever loses
    /// the creation race opens the resource the winner created.
    ///
    /// # Errors
    ///
    /// - [`LockError::InvalidName`] when `name` is empty or contains a
    ///   separator or NUL that would change the resource identity
    /// - [`LockError::Open`] when the OS resource cannot be created or
    ///   opened
    pub fn init(name: &str) -> Result<Self, LockError> {
        validate_name(name)?;
        let resource = sys::Resource::open(name)?;
        tracing::debug!(name, resource = %resource.describe(), "lock handle initialized");
        Ok(Self {
            name: name.to_string(),
            resource: Some(resource),
            locked: false,
        })
    }

    /// Acquire the lock, waiting at most `timeout`.
    ///
    /// A zero timeout performs exactly one acquisition attempt without
    /// waiting. For finite timeouts the call blocks the current thread
    /// until it acquires, and never longer than `timeout` plus one poll
    /// interval of slack.
    ///
    /// # Errors
    ///
    /// - [`LockError::NotInitialized`] on a terminated handle
    /// - [`LockError::AlreadyLocked`] when this handle holds the lock; the
    ///   primitive is not reentrant
    /// - [`LockError::Busy`] when the lock stayed contended for the whole
    ///   timeout; retryable
    /// - [`LockError::Acquire`] when the OS call fails
    pub fn lock(&mut self, timeout: Duration) -> Result<(), LockError> {
        let resource = self.resource.as_ref().ok_or(LockError::NotInitialized)?;
        if self.locked {
            return Err(LockError::AlreadyLocked);
        }

        let start = Instant::now();
        if resource.acquire(timeout)? {
            self.locked = true;
            tracing::debug!(name = %self.name, waited = ?start.elapsed(), "lock acquired");
            Ok(())
        } else {
            tracing::debug!(name = %self.name, ?timeout, "lock busy");
            Err(LockError::Busy { timeout })
        }
    }

    /// Release the lock.
    ///
    /// Calling this while not locked, including on a terminated handle, is
    /// a successful no-op so cleanup paths can call it unconditionally.
    ///
    /// # Errors
    ///
    /// [`LockError::Release`] when the OS release call fails. The handle
    /// then still reports itself locked, so a retry or a forced
    /// [`term`](Self::term) observes consistent state.
    pub fn unlock(&mut self) -> Result<(), LockError> {
        if !self.locked {
            return Ok(());
        }
        let resource = self.resource.as_ref().ok_or(LockError::NotInitialized)?;
        resource.release()?;
        self.locked = false;
        tracing::debug!(name = %self.name, "lock released");
        Ok(())
    }

    /// Report whether this handle holds the lock.
    ///
    /// When the handle is initialized and unlocked, the resource is first
    /// probed with a zero-timeout acquire that is released again
    /// immediately. Other waiters can observe that probe as a brief
    /// acquisition; it is a liveness check on the resource, not a query of
    /// who holds it. Probe failures are swallowed.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        if self.locked {
            return true;
        }
        if let Some(resource) = &self.resource {
            if let Ok(true) = resource.acquire(Duration::ZERO) {
                if let Err(err) = resource.release() {
                    tracing::debug!(name = %self.name, %err, "probe release failed");
                }
            }
        }
        false
    }

    /// Dispose of the handle, releasing the lock if held and closing the
    /// OS resource.
    ///
    /// Idempotent: calling it on an already terminated handle is a no-op.
    /// Release failures during teardown are logged rather than returned,
    /// so teardown always completes; afterwards every operation on the
    /// handle fails or no-ops as documented.
    pub fn term(&mut self) -> Result<(), LockError> {
        let Some(resource) = self.resource.take() else {
            return Ok(());
        };
        if self.locked {
            if let Err(err) = resource.release() {
                tracing::debug!(name = %self.name, %err, "release during teardown failed");
            }
            self.locked = false;
        }
        drop(resource);
        tracing::debug!(name = %self.name, "lock handle terminated");
        Ok(())
    }

    /// Name this handle was initialized with.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        let _ = self.term();
    }
}

/// Reject names that are empty or would escape the backing namespace.
///
/// The name is spliced into a filesystem path on POSIX and a kernel object
/// namespace on Windows; a separator in either place would silently bind
/// the handle to a different resource than the caller asked for.
fn validate_name(name: &str) -> Result<(), LockError> {
    if name.is_empty() {
        return Err(LockError::InvalidName {
            reason: "name must not be empty".to_string(),
        });
    }
    if name.contains(['/', '\\']) {
        return Err(LockError::InvalidName {
            reason: "name must not contain path separators".to_string(),
        });
    }
    if name.contains('\0') {
        return Err(LockError::InvalidName {
            reason: "name must not contain NUL".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn unique_name(tag: &str) -> String {
        static COUNTER: AtomicU32 = AtomicU32::new(0);
        format!(
            "hostlock-handle-{}-{}-{}",
            std::process::id(),
            tag,
            COUNTER.fetch_add(1, Ordering::Relaxed)
        )
    }

    #[test]
    fn empty_name_is_rejected() {
        assert!(matches!(
            LockHandle::init(""),
            Err(LockError::InvalidName { .. })
        ));
    }

    #[test]
    fn names_with_separators_are_rejected() {
        for name in ["a/b", "a\\b", "..\\up", "nested/deeper/still"] {
            assert!(
                matches!(LockHandle::init(name), Err(LockError::InvalidName { .. })),
                "expected {name:?} to be rejected"
            );
        }
    }

    #[test]
    fn names_with_nul_are_rejected() {
        assert!(matches!(
            LockHandle::init("bad\0name"),
            Err(LockError::InvalidName { .. })
        ));
    }

    #[test]
    fn plain_names_are_accepted() {
        let name = unique_name("plain");
        let mut handle = LockHandle::init(&name).expect("init");
        assert_eq!(handle.name(), name);
        handle.term().unwrap();
    }

    #[test]
    fn lock_transitions_the_state_flag() {
        let name = unique_name("flag");
        let mut handle = LockHandle::init(&name).unwrap();

        assert!(!handle.is_locked());
        handle.lock(Duration::ZERO).unwrap();
        assert!(handle.is_locked());
        handle.unlock().unwrap();
        assert!(!handle.is_locked());

        handle.term().unwrap();
    }

    #[test]
    fn locking_twice_reports_already_locked() {
        let name = unique_name("reentry");
        let mut handle = LockHandle::init(&name).unwrap();

        handle.lock(Duration::ZERO).unwrap();
        assert!(matches!(
            handle.lock(Duration::ZERO),
            Err(LockError::AlreadyLocked)
        ));

        handle.unlock().unwrap();
        handle.term().unwrap();
    }

    #[test]
    fn unlock_without_lock_is_a_no_op() {
        let name = unique_name("noop");
        let mut handle = LockHandle::init(&name).unwrap();
        handle.unlock().unwrap();
        handle.unlock().unwrap();
        handle.term().unwrap();
    }

    #[test]
    fn terminated_handle_rejects_lock_and_noops_the_rest() {
        let name = unique_name("disposed");
        let mut handle = LockHandle::init(&name).unwrap();
        handle.term().unwrap();

        assert!(matches!(
            handle.lock(Duration::ZERO),
            Err(LockError::NotInitialized)
        ));
        handle.unlock().unwrap();
        assert!(!handle.is_locked());
        handle.term().unwrap();
    }

    #[test]
    fn term_is_idempotent() {
        let name = unique_name("twice");
        let mut handle = LockHandle::init(&name).unwrap();
        handle.term().unwrap();
        handle.term().unwrap();
        handle.term().unwrap();
    }

    #[test]
    fn term_releases_a_held_lock() {
        let name = unique_name("release");
        let mut holder = LockHandle::init(&name).unwrap();
        holder.lock(Duration::ZERO).unwrap();
        holder.term().unwrap();

        let mut next = LockHandle::init(&name).unwrap();
        next.lock(Duration::ZERO).unwrap();
        next.unlock().unwrap();
        next.term().unwrap();
    }
}
