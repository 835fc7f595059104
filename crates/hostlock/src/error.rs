//! Error taxonomy for lock operations.

use std::{io, time::Duration};

use thiserror::Error;

/// Errors produced by [`LockHandle`](crate::LockHandle) operations.
///
/// [`Busy`](LockError::Busy) is the ordinary contention outcome and worth
/// retrying with a longer timeout or backoff. Every other variant is
/// terminal for the attempted operation: the name variants are caller
/// bugs, and the wrapped [`io::Error`] variants surface unexpected OS
/// failures verbatim.
#[derive(Debug, Error)]
pub enum LockError {
    /// Lock name is empty or would change the resource identity
    #[error("invalid lock name: {reason}")]
    InvalidName { reason: String },

    /// Operation attempted on a terminated handle
    #[error("lock handle is not initialized")]
    NotInitialized,

    /// This handle already holds the lock; the primitive is not reentrant
    #[error("lock is already held by this handle")]
    AlreadyLocked,

    /// The lock stayed contended for the whole timeout
    #[error("lock is busy after waiting {timeout:?}")]
    Busy { timeout: Duration },

    /// Backing OS resource could not be created or opened
    #[error("failed to open lock resource '{name}': {source}")]
    Open {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The OS acquire call failed for a reason other than contention
    #[error("failed to acquire lock: {source}")]
    Acquire {
        #[source]
        source: io::Error,
    },

    /// The OS release call failed
    #[error("failed to release lock: {source}")]
    Release {
        #[source]
        source: io::Error,
    },
}

impl LockError {
    /// True for the retryable contention outcome, false for everything else.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        matches!(self, Self::Busy { .. })
    }
}
