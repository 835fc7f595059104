//! Advisory file lock backend.
//!
//! The resource behind a lock name is a regular file at
//! `<system temp dir>/<name>`, locked whole-file through [`fs2::FileExt`].
//! The lock is advisory: it excludes only processes that also take it, and
//! it is scoped to the open descriptor, so two handles in one process
//! contend the same way two processes do.
//!
//! `flock` has no bounded blocking wait, so a bounded acquisition is a
//! non-blocking attempt repeated on a fixed short interval until the
//! deadline passes.

use std::{
    fs::{File, OpenOptions},
    io,
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

use fs2::FileExt;

use crate::error::LockError;

/// Sleep between non-blocking acquisition attempts.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

/// An open descriptor on the lock file.
///
/// Dropping it closes the descriptor, which also releases any lock still
/// held on it.
#[derive(Debug)]
pub(crate) struct Resource {
    file: File,
    path: PathBuf,
}

impl Resource {
    /// Open or create the lock file for `name` without acquiring the lock.
    ///
    /// Safe to call concurrently from unrelated processes: whoever loses
    /// the creation race opens the file the winner created.
    pub(crate) fn open(name: &str) -> Result<Self, LockError> {
        Self::open_at(std::env::temp_dir().join(name), name)
    }

    fn open_at(path: PathBuf, name: &str) -> Result<Self, LockError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                name: name.to_string(),
                source,
            })?;
        Ok(Self { file, path })
    }

    /// Wait for the exclusive lock within `timeout`.
    ///
    /// Returns `Ok(true)` on acquisition and `Ok(false)` once the timeout
    /// elapses without one. The first attempt happens before any deadline
    /// check, so a zero timeout performs exactly one attempt and never
    /// sleeps.
    pub(crate) fn acquire(&self, timeout: Duration) -> Result<bool, LockError> {
        let start = Instant::now();
        loop {
            match self.file.try_lock_exclusive() {
                Ok(()) => return Ok(true),
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
                    if start.elapsed() >= timeout {
                        return Ok(false);
                    }
                    thread::sleep(POLL_INTERVAL);
                }
                Err(source) => return Err(LockError::Acquire { source }),
            }
        }
    }

    /// Release the exclusive lock on the descriptor.
    pub(crate) fn release(&self) -> Result<(), LockError> {
        FileExt::unlock(&self.file).map_err(|source| LockError::Release { source })
    }

    /// Identity of the backing resource, for log events.
    pub(crate) fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
