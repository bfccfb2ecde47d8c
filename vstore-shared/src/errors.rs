//! Error types shared by every storage backend.
//!
//! Callers pattern-match on the variant to decide how to react:
//! - contract violations ([`VstoreError::Programmer`]) abort the operation,
//! - policy violations ([`VstoreError::StoragePath`]) go back to the administrator,
//! - operational failures ([`VstoreError::BlockDevice`], [`VstoreError::FileOp`], ...)
//!   carry diagnostics for manual remediation.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Result alias used across the workspace.
pub type VstoreResult<T> = Result<T, VstoreError>;

#[derive(Debug, Error)]
pub enum VstoreError {
    /// Generic block device failure (mount failures, missing attachment, ...).
    #[error("block device error: {0}")]
    BlockDevice(String),

    /// A path was rejected by the file storage path policy.
    #[error("file storage path error: {0}")]
    StoragePath(String),

    /// The caller broke the contract of the API (malformed unique id,
    /// unsupported options for a backend).
    #[error("programmer error: {0}")]
    Programmer(String),

    /// Host name could not be resolved to an address.
    #[error("resolver error: {0}")]
    Resolver(String),

    /// A system query (e.g. filesystem statistics) failed.
    #[error("command error: {0}")]
    Command(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// The backend or hypervisor cannot perform the requested operation.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// Invalid configuration or disk parameters.
    #[error("config: {0}")]
    Config(String),

    /// An OS-level file operation failed.
    #[error("{}: can't {action}: {source}", path.display())]
    FileOp {
        path: PathBuf,
        action: &'static str,
        #[source]
        source: io::Error,
    },
}

impl VstoreError {
    /// Wrap an I/O error raised while operating on `path`.
    pub fn file_op(path: impl Into<PathBuf>, action: &'static str, source: io::Error) -> Self {
        Self::FileOp {
            path: path.into(),
            action,
            source,
        }
    }

    /// True for errors caused by the path policy rather than by the system.
    pub fn is_policy(&self) -> bool {
        matches!(self, Self::StoragePath(_))
    }
}
