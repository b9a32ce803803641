use std::path::PathBuf;

use thiserror::Error;

/// Failures while loading or storing a credential snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot io error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot decode error at {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("snapshot encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("snapshot at {} is invalid: {reason}", .path.display())]
    Invalid { path: PathBuf, reason: String },
    #[error("no snapshot has been loaded, refusing to store")]
    NoPersistencePath,
    #[error("snapshot already loaded from {}", .bound.display())]
    PathAlreadyBound { bound: PathBuf },
}

impl SnapshotError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}
