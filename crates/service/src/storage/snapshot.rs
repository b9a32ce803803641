use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::debug;

use crate::auth::domain::CredentialTable;
use crate::errors::SnapshotError;

/// Owner read/write only.
pub const DEFAULT_FILE_MODE: u32 = 0o600;

/// Trait abstraction for whole-table snapshot persistence.
/// Implementations decide the encoding and how the file is replaced.
#[async_trait]
pub trait SnapshotCodec: Send + Sync {
    async fn load(&self, path: &Path) -> Result<CredentialTable, SnapshotError>;
    async fn store(&self, table: &CredentialTable, path: &Path) -> Result<(), SnapshotError>;
}

/// JSON file snapshot.
///
/// Loads the full file into a table. Stores by writing a sibling `.tmp` file
/// with `file_mode` permissions and renaming it over the target, so a failed
/// store leaves the previous snapshot in place.
///
/// Stores through one codec (and its clones) run one at a time, since they
/// share the temp file name.
#[derive(Debug, Clone)]
pub struct JsonFileSnapshot {
    file_mode: u32,
    write_lock: Arc<Mutex<()>>,
}

impl Default for JsonFileSnapshot {
    fn default() -> Self { Self::with_mode(DEFAULT_FILE_MODE) }
}

impl JsonFileSnapshot {
    pub fn new() -> Self { Self::default() }

    pub fn with_mode(file_mode: u32) -> Self { Self { file_mode, write_lock: Arc::new(Mutex::new(())) } }

    async fn write_replace(&self, path: &Path, data: &[u8]) -> Result<(), SnapshotError> {
        let _serial = self.write_lock.lock().await;
        let tmp = temp_path(path);
        // a leftover from an interrupted store would keep its old mode
        let _ = fs::remove_file(&tmp).await;

        let mut options = fs::OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(self.file_mode);

        let mut file = options.open(&tmp).await.map_err(|e| SnapshotError::io(&tmp, e))?;
        let written = async {
            file.write_all(data).await?;
            file.sync_all().await
        }
        .await;
        drop(file);

        if let Err(e) = written {
            let _ = fs::remove_file(&tmp).await;
            return Err(SnapshotError::io(&tmp, e));
        }
        if let Err(e) = fs::rename(&tmp, path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(SnapshotError::io(path, e));
        }
        Ok(())
    }
}

#[async_trait]
impl SnapshotCodec for JsonFileSnapshot {
    async fn load(&self, path: &Path) -> Result<CredentialTable, SnapshotError> {
        let bytes = fs::read(path).await.map_err(|e| SnapshotError::io(path, e))?;
        let table: CredentialTable = serde_json::from_slice(&bytes)
            .map_err(|source| SnapshotError::Decode { path: path.to_path_buf(), source })?;
        if table.has_empty_key() {
            return Err(SnapshotError::Invalid { path: path.to_path_buf(), reason: "empty user key".into() });
        }
        debug!(path = %path.display(), users = table.len(), "snapshot decoded");
        Ok(table)
    }

    async fn store(&self, table: &CredentialTable, path: &Path) -> Result<(), SnapshotError> {
        let data = serde_json::to_vec(table).map_err(SnapshotError::Encode)?;
        self.write_replace(path, &data).await?;
        debug!(path = %path.display(), users = table.len(), bytes = data.len(), "snapshot written");
        Ok(())
    }
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".tmp");
    PathBuf::from(name)
}
