//! Error types for the settings engine.

use std::path::PathBuf;
use thiserror::Error;

/// Failures of the persistent settings store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("settings store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("settings store is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unknown setting key: {0}")]
    KeyNotFound(String),
}

/// Failures while patching a target file. Carries the offending path;
/// the engine never retries on its own.
#[derive(Error, Debug)]
pub enum PatchError {
    #[error("could not read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PatchError {
    /// The target file the patch failed on.
    pub fn path(&self) -> &PathBuf {
        match self {
            PatchError::Read { path, .. } | PatchError::Write { path, .. } => path,
        }
    }
}

/// Failures of external process invocations.
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to spawn '{command}': {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{command}' exited with status {code}: {stderr}")]
    ExitNonZero {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("'{command}' timed out after {timeout_secs}s")]
    Timeout { command: String, timeout_secs: u64 },
}

/// Wraps the first underlying failure of a multi-step reconciliation.
#[derive(Error, Debug)]
pub enum ReconcileError {
    #[error("batch references unknown setting key: {0}")]
    UnknownKey(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Process(#[from] ProcessError),
}
