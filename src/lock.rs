//! Scoped exclusive lock over the knowledge base document.
//!
//! The lock is an OS advisory lock held on an open handle to a sidecar
//! `<document>.lock` file. The kernel drops it when the handle closes,
//! including when the owning process is killed, so a leftover lock file
//! never blocks later writers. The file itself is left in place: unlinking
//! it while another process waits on the same inode would let two writers
//! hold "the" lock at once.

use anyhow::{bail, Context, Result};
use std::fs::{File, OpenOptions, TryLockError};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::debug;

const RETRY_INTERVAL: Duration = Duration::from_millis(25);

#[derive(Debug)]
pub struct FileLock {
    // Held for its lock; closing it releases the lock.
    _file: File,
}

impl FileLock {
    /// Sidecar lock path for `document`: `<document>.lock`.
    pub fn path_for(document: &Path) -> PathBuf {
        let mut name = document.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Block until the lock is held or `timeout` elapses.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self> {
        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("Failed to open lock {}", path.display()))?;

        let deadline = Instant::now() + timeout;
        loop {
            match file.try_lock() {
                Ok(()) => break,
                Err(TryLockError::WouldBlock) => {
                    if Instant::now() >= deadline {
                        bail!(
                            "Timed out waiting for lock {} (another errkb process is appending)",
                            path.display()
                        );
                    }
                    std::thread::sleep(RETRY_INTERVAL);
                }
                Err(TryLockError::Error(e)) => {
                    return Err(e).with_context(|| format!("Failed to lock {}", path.display()))
                }
            }
        }

        // Best effort: the pid only tells a human who holds the lock.
        let _ = file
            .set_len(0)
            .and_then(|()| writeln!(file, "{}", std::process::id()));
        debug!(lock = %path.display(), "lock acquired");

        Ok(Self { _file: file })
    }
}
