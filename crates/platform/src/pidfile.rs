//! PID file and state file management (§6, "On-disk state").

use std::io::Write as _;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// A PID-file or state-file operation failed.
#[derive(Debug, Error)]
pub enum StateFileError {
    /// The file could not be written.
    #[error("failed to write state file {path}: {source}")]
    Write {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The file could not be removed on shutdown.
    #[error("failed to remove state file {path}: {source}")]
    Remove {
        /// The path that could not be removed.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

/// Identifies one daemon instance's on-disk state, keyed by (working
/// directory, daemon name, listening port) per §6.
#[derive(Clone, Debug)]
pub struct StateFileKey {
    /// The daemon's configured working directory.
    pub working_directory: PathBuf,
    /// The client resource's configured name.
    pub daemon_name: String,
    /// The listening port this instance bound.
    pub port: u16,
}

impl StateFileKey {
    fn file_stem(&self) -> String {
        format!("{}.{}", self.daemon_name, self.port)
    }

    /// The PID file path for this instance.
    #[must_use]
    pub fn pid_file_path(&self) -> PathBuf {
        self.working_directory.join(format!("{}.pid", self.file_stem()))
    }

    /// The state file path for this instance.
    #[must_use]
    pub fn state_file_path(&self) -> PathBuf {
        self.working_directory.join(format!("{}.state", self.file_stem()))
    }
}

/// Writes the PID file, overwriting any stale one.
///
/// # Errors
///
/// Returns [`StateFileError::Write`] if the file could not be created.
pub fn write_pid_file(key: &StateFileKey, pid: u32) -> Result<(), StateFileError> {
    let path = key.pid_file_path();
    let mut file = std::fs::File::create(&path).map_err(|source| StateFileError::Write {
        path: path.clone(),
        source,
    })?;
    writeln!(file, "{pid}").map_err(|source| StateFileError::Write { path, source })
}

/// Removes the PID file and state file, ignoring a missing file (the
/// daemon may never have reached the point of writing one).
///
/// # Errors
///
/// Returns [`StateFileError::Remove`] if a file exists but could not be
/// removed.
pub fn remove_state_files(key: &StateFileKey) -> Result<(), StateFileError> {
    for path in [key.pid_file_path(), key.state_file_path()] {
        if let Err(source) = std::fs::remove_file(&path) {
            if source.kind() != std::io::ErrorKind::NotFound {
                return Err(StateFileError::Remove { path, source });
            }
        }
    }
    Ok(())
}

/// Reads the PID recorded in an existing PID file, if any.
#[must_use]
pub fn read_pid_file(path: &Path) -> Option<u32> {
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}
