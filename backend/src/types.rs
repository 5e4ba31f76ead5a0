//! Data types and error definitions shared by the reconciler and the reaper.

use std::path::PathBuf;
use thiserror::Error;

/// A process entry matched from a listing snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    pub pid: i32,
    /// The listing line the pid was parsed from.
    pub line: String,
}

/// Errors that can occur while reconciling config or reaping processes.
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("External tool `{tool}` failed: {reason}")]
    ExternalTool { tool: String, reason: String },
    #[error("Process {0} not found")]
    ProcessNotFound(i32),
    #[error("Cannot parse a process id from line {0:?}")]
    Parse(String),
    #[error("Permission denied for PID {0}")]
    PermissionDenied(i32),
    #[error("Failed to send signal to PID {0}: {1}")]
    SignalError(i32, String),
    #[error("HOME is not set; cannot locate the siege config directory")]
    MissingHome,
    #[error("Procfs error: {0}")]
    ProcfsError(String),
}

impl OpsError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OpsError::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the reaper may log this error and move on to the next entry.
    pub fn is_skippable(&self) -> bool {
        matches!(self, OpsError::ProcessNotFound(_) | OpsError::Parse(_))
    }
}

impl From<procfs::ProcError> for OpsError {
    fn from(err: procfs::ProcError) -> Self {
        OpsError::ProcfsError(err.to_string())
    }
}
