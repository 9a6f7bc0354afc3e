//! Cross-process singleton lock
//!
//! Serializes every run that targets the same cache location. The guard
//! removes the lock file and drops the OS lock when it goes out of scope, on
//! success and on error alike. The OS lock is tied to the open handle, so a
//! holder that dies abnormally never wedges later runs.
//!
//! Advisory and local to one host. There is no acquisition timeout.

use crate::error::{PrebuildError, PrebuildResult};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default wait between acquisition attempts
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Shortest wait a configured interval is raised to
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Exclusive lock over a named path, held until dropped
#[derive(Debug)]
pub struct SingletonLock {
    file: Option<File>,
    path: PathBuf,
}

impl SingletonLock {
    /// Acquire the lock, sleeping `poll_interval` between attempts until the
    /// current holder releases it.
    pub fn acquire(path: &Path, poll_interval: Duration) -> PrebuildResult<Self> {
        loop {
            if let Some(lock) = Self::try_acquire(path)? {
                return Ok(lock);
            }
            info!(
                "Couldn't acquire lock {}, retrying in {} seconds",
                path.display(),
                poll_interval.as_secs_f32()
            );
            thread::sleep(poll_interval);
        }
    }

    /// Single non-blocking attempt. Returns `Ok(None)` while another holder
    /// owns the lock.
    pub fn try_acquire(path: &Path) -> PrebuildResult<Option<Self>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                PrebuildError::io(format!("creating lock directory {}", parent.display()), e)
            })?;
        }

        match sys::lock(path) {
            Ok(Some(file)) => {
                debug!("Acquired lock {}", path.display());
                Ok(Some(Self {
                    file: Some(file),
                    path: path.to_path_buf(),
                }))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(PrebuildError::io(
                format!("locking {}", path.display()),
                e,
            )),
        }
    }

    /// Path of the lock file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SingletonLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            if let Err(e) = sys::release(file, &self.path) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove lock file {}: {}", self.path.display(), e);
                }
            }
        }
        debug!("Released lock {}", self.path.display());
    }
}

#[cfg(unix)]
mod sys {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::unix::fs::MetadataExt;
    use std::os::unix::io::AsRawFd;
    use std::path::Path;

    pub fn lock(path: &Path) -> io::Result<Option<File>> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        // SAFETY: the descriptor is owned by `file` and stays open for the call.
        let rc = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            return match err.raw_os_error() {
                Some(code) if code == libc::EWOULDBLOCK || code == libc::EAGAIN => Ok(None),
                _ => Err(err),
            };
        }

        // The previous holder unlinks the path before unlocking; if we locked
        // that orphaned inode, the path no longer names our file.
        let held = file.metadata()?;
        match std::fs::metadata(path) {
            Ok(current) if current.dev() == held.dev() && current.ino() == held.ino() => {
                Ok(Some(file))
            }
            Ok(_) => Ok(None),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Unlink while still holding the lock so a waiter never keeps a lock on
    /// a file that is about to disappear.
    pub fn release(file: File, path: &Path) -> io::Result<()> {
        let removed = std::fs::remove_file(path);
        // SAFETY: the descriptor is owned by `file`.
        unsafe {
            libc::flock(file.as_raw_fd(), libc::LOCK_UN);
        }
        drop(file);
        removed
    }
}

#[cfg(windows)]
mod sys {
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::windows::fs::OpenOptionsExt;
    use std::path::Path;

    const ERROR_SHARING_VIOLATION: i32 = 32;
    const ERROR_ACCESS_DENIED: i32 = 5;

    pub fn lock(path: &Path) -> io::Result<Option<File>> {
        // Share mode 0 makes the handle exclusive for as long as it is open.
        match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .share_mode(0)
            .open(path)
        {
            Ok(file) => Ok(Some(file)),
            Err(e) => match e.raw_os_error() {
                Some(ERROR_SHARING_VIOLATION) | Some(ERROR_ACCESS_DENIED) => Ok(None),
                _ => Err(e),
            },
        }
    }

    /// An exclusive handle blocks deletion, so close it before unlinking.
    pub fn release(file: File, path: &Path) -> io::Result<()> {
        drop(file);
        std::fs::remove_file(path)
    }
}
