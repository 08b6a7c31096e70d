//! Per-interface advisory locks
//!
//! Writers of an interface (apply, reset, peer edits) hold an exclusive
//! `fs2` lock on `<base_dir>/.<iface>.lock`. flock-style locks belong to the
//! open file description, so two threads of the same process contend just
//! like two processes do.

use std::fs::{File, OpenOptions};
use std::time::{Duration, Instant};

use backoff::ExponentialBackoffBuilder;
use fs2::FileExt;
use tracing::{debug, warn};

use crate::{Error, NormalizedPath, Result};

/// Retry policy for acquiring an interface lock.
#[derive(Debug, Clone, Copy)]
pub struct RobustnessConfig {
    /// Give up after this long and report contention.
    pub lock_timeout: Duration,
    /// First retry delay.
    pub initial_backoff: Duration,
    /// Ceiling for a single retry delay.
    pub max_backoff: Duration,
}

impl Default for RobustnessConfig {
    fn default() -> Self {
        Self {
            lock_timeout: Duration::from_secs(5),
            initial_backoff: Duration::from_millis(10),
            max_backoff: Duration::from_millis(250),
        }
    }
}

impl RobustnessConfig {
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }
}

/// Guard for an exclusive interface lock. Released on drop.
#[derive(Debug)]
pub struct InterfaceLock {
    file: File,
    path: NormalizedPath,
}

impl InterfaceLock {
    /// Acquire the exclusive lock at `path`, retrying with exponential backoff.
    pub fn acquire(path: &NormalizedPath, config: RobustnessConfig) -> Result<Self> {
        if let Some(parent) = path.parent() {
            crate::io::create_dir(&parent)?;
        }

        let native = path.to_native();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&native)
            .map_err(|e| Error::io(&native, e))?;

        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(config.initial_backoff)
            .with_max_interval(config.max_backoff)
            .with_max_elapsed_time(Some(config.lock_timeout))
            .build();

        let started = Instant::now();
        let attempt = || {
            FileExt::try_lock_exclusive(&file).map_err(|e| {
                if e.kind() == fs2::lock_contended_error().kind() {
                    debug!(path = %path, "interface lock busy, retrying");
                    backoff::Error::transient(e)
                } else {
                    backoff::Error::permanent(e)
                }
            })
        };

        match backoff::retry(policy, attempt) {
            Ok(()) => {
                debug!(path = %path, "acquired interface lock");
                Ok(Self {
                    file,
                    path: path.clone(),
                })
            }
            Err(backoff::Error::Transient { .. }) => {
                let waited = started.elapsed();
                warn!(path = %path, ?waited, "gave up waiting for interface lock");
                Err(Error::LockContended {
                    path: native,
                    waited,
                })
            }
            Err(backoff::Error::Permanent(e)) => Err(Error::io(&native, e)),
        }
    }

    pub fn path(&self) -> &NormalizedPath {
        &self.path
    }
}

impl Drop for InterfaceLock {
    fn drop(&mut self) {
        let _ = FileExt::unlock(&self.file);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn lock_is_reacquirable_after_drop() {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join(".wg0.lock"));

        let first = InterfaceLock::acquire(&path, RobustnessConfig::default()).unwrap();
        drop(first);
        let second = InterfaceLock::acquire(&path, RobustnessConfig::default());
        assert!(second.is_ok());
    }

    #[test]
    fn contended_lock_times_out() {
        let dir = tempdir().unwrap();
        let path = NormalizedPath::new(dir.path().join(".wg0.lock"));
        let config = RobustnessConfig::default().with_lock_timeout(Duration::from_millis(100));

        let _held = InterfaceLock::acquire(&path, config).unwrap();
        let err = InterfaceLock::acquire(&path, config).unwrap_err();
        assert!(matches!(err, Error::LockContended { .. }));
    }
}
