//! # Hostlock
//!
//! Named, host-wide mutual exclusion between processes.
//!
//! A [`LockHandle`] is bound to a string name. Every process on the host
//! that initializes a handle with the same name contends on the same
//! underlying OS resource:
//!
//! - On POSIX systems the resource is a regular file under the system temp
//!   directory, locked whole-file with an advisory exclusive lock. Advisory
//!   means cooperative: only processes that also take the lock are excluded.
//! - On Windows the resource is a kernel mutex named `Global\<name>`, which
//!   excludes regardless of caller discipline.
//!
//! One backend is compiled per target. The two are alternate
//! implementations of the same contract for different hosts, not protocol
//! peers: a POSIX process and a Windows process never contend with each
//! other.
//!
//! ## Guarantees
//!
//! - **Mutual exclusion**: at most one holder per name while the lock is held
//! - **Bounded waits**: [`LockHandle::lock`] never blocks past its timeout
//!   plus at most one poll interval
//! - **Automatic cleanup**: dropping a handle releases the lock and closes
//!   the OS resource
//! - **No panics on contention**: a busy lock is an ordinary [`LockError`]
//!   value
//!
//! The primitive is neither reentrant nor a read/write lock, and there is
//! no wake-up notification beyond the bounded wait itself. Fairness among
//! waiters is whatever the OS primitive provides, which is usually none.
//!
//! ## Example
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use hostlock::LockHandle;
//!
//! # fn main() -> Result<(), hostlock::LockError> {
//! let mut handle = LockHandle::init("my-app")?;
//! handle.lock(Duration::from_millis(500))?;
//! // critical section
//! handle.unlock()?;
//! handle.term()?;
//! # Ok(())
//! # }
//! ```

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

mod error;
mod handle;
mod sys;

pub use error::LockError;
pub use handle::LockHandle;
