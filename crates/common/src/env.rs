//! Environment/runtime helpers
//!
//! Sanity checks on the snapshot file at startup.

use std::path::Path;

/// Warn when the snapshot file is readable by group or others.
#[cfg(unix)]
pub async fn warn_if_world_readable(file: &Path) {
    use std::os::unix::fs::PermissionsExt;
    use tracing::warn;

    if let Ok(meta) = tokio::fs::metadata(file).await {
        let mode = meta.permissions().mode() & 0o777;
        if mode & 0o077 != 0 {
            warn!(path = %file.display(), mode = %format!("{mode:o}"), "snapshot file is accessible to other users");
        }
    }
}

#[cfg(not(unix))]
pub async fn warn_if_world_readable(_file: &Path) {}
