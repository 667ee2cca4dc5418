//! Whole-aggregate persistence.
//!
//! The aggregate is loaded in full, mutated by one engine operation, and
//! saved in full. [`JsonFileStore`] keeps it in `<data_dir>/hunt_data.json`
//! and replaces the file atomically through a temp file. Callers that run a
//! read-mutate-write cycle hold a [`StoreLock`] for its duration.

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};

use fs2::FileExt;
use tracing::debug;

use crate::error::{EngineError, ErrorCode};
use crate::state::AggregateState;

pub const STATE_FILE: &str = "hunt_data.json";
pub const LOCK_FILE: &str = "hunt_data.lock";

/// Default wait before giving up on a contended lock.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

/// Load and save the aggregate state.
pub trait StateStore {
    /// Stored state, or the empty aggregate when nothing is stored yet.
    ///
    /// # Errors
    ///
    /// [`EngineError::Persistence`] if stored data cannot be read or decoded.
    fn load(&self) -> Result<AggregateState, EngineError>;

    /// Replace the stored state.
    ///
    /// # Errors
    ///
    /// [`EngineError::Persistence`] if the state cannot be written.
    fn save(&self, state: &AggregateState) -> Result<(), EngineError>;
}

/// Advisory lock failures.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("lock timed out after {waited:?} at {}", path.display())]
    Timeout { path: PathBuf, waited: Duration },

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl LockError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout { .. } => ErrorCode::LockContention,
            Self::Io(_) => ErrorCode::StateWriteFailed,
        }
    }
}

impl From<LockError> for EngineError {
    fn from(err: LockError) -> Self {
        Self::Persistence {
            code: err.code(),
            message: err.to_string(),
        }
    }
}

/// RAII guard for the exclusive store lock. Released on drop.
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

impl StoreLock {
    /// Acquire an exclusive advisory lock on `path`, polling until `timeout`.
    ///
    /// # Errors
    ///
    /// [`LockError::Timeout`] if another process holds the lock for longer
    /// than `timeout`; [`LockError::Io`] if the lock file cannot be opened.
    pub fn acquire(path: &Path, timeout: Duration) -> Result<Self, LockError> {
        let parent = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "lock path has no parent"))?;
        fs::create_dir_all(parent)?;

        let start = Instant::now();
        loop {
            let file = OpenOptions::new()
                .create(true)
                .read(true)
                .write(true)
                .truncate(false)
                .open(path)?;

            if file.try_lock_exclusive().is_ok() {
                debug!(path = %path.display(), "acquired store lock");
                return Ok(Self {
                    file,
                    path: path.to_path_buf(),
                });
            }

            if start.elapsed() >= timeout {
                return Err(LockError::Timeout {
                    path: path.to_path_buf(),
                    waited: start.elapsed(),
                });
            }

            thread::sleep(Duration::from_millis(10));
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = self.file.unlock();
    }
}

/// [`StateStore`] backed by one pretty-printed JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILE)
    }

    /// Take the exclusive lock guarding this store's read-mutate-write cycle.
    ///
    /// # Errors
    ///
    /// See [`StoreLock::acquire`].
    pub fn lock(&self, timeout: Duration) -> Result<StoreLock, LockError> {
        StoreLock::acquire(&self.dir.join(LOCK_FILE), timeout)
    }
}

fn persistence(code: ErrorCode, message: String) -> EngineError {
    EngineError::Persistence { code, message }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> Result<AggregateState, EngineError> {
        let path = self.path();
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no stored state, starting empty");
                return Ok(AggregateState::default());
            }
            Err(err) => {
                return Err(persistence(
                    ErrorCode::StateReadFailed,
                    format!("failed to read {}: {err}", path.display()),
                ));
            }
        };

        let state: AggregateState = serde_json::from_str(&content).map_err(|err| {
            persistence(
                ErrorCode::StateReadFailed,
                format!("failed to parse {}: {err}", path.display()),
            )
        })?;
        debug!(
            path = %path.display(),
            hunts = state.hunts.len(),
            labels = state.labels.len(),
            "loaded state"
        );
        Ok(state)
    }

    fn save(&self, state: &AggregateState) -> Result<(), EngineError> {
        let write_failed =
            |what: &str, path: &Path, err: &dyn std::fmt::Display| {
                persistence(
                    ErrorCode::StateWriteFailed,
                    format!("failed to {what} {}: {err}", path.display()),
                )
            };

        fs::create_dir_all(&self.dir).map_err(|err| write_failed("create", &self.dir, &err))?;

        let path = self.path();
        let json = serde_json::to_string_pretty(state)
            .map_err(|err| write_failed("serialize", &path, &err))?;

        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|err| write_failed("write", &tmp, &err))?;
        fs::rename(&tmp, &path).map_err(|err| write_failed("persist", &path, &err))?;

        debug!(
            path = %path.display(),
            hunts = state.hunts.len(),
            labels = state.labels.len(),
            "saved state"
        );
        Ok(())
    }
}
