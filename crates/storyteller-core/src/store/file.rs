use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info};

use super::RecordStore;
use crate::errors::StoreError;

const STORE_META_FILE: &str = "store-meta.json";
const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreMeta {
    schema_version: u32,
}

/// Open handle produced by the one-time handshake.
#[derive(Debug)]
struct Connection {
    dir: PathBuf,
}

impl Connection {
    fn record_path(&self, key: &str) -> PathBuf {
        let file_stem: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{file_stem}.json"))
    }
}

/// File-backed engine: one JSON file per record under a data directory.
///
/// The directory is opened (created, schema-checked, upgraded) on first use.
/// Concurrent first callers all await the same handshake. A failed handshake
/// is not memoized, so the next call retries it.
pub struct FileRecordStore {
    root: PathBuf,
    connection: OnceCell<Arc<Connection>>,
    #[cfg(test)]
    handshakes: AtomicUsize,
}

impl FileRecordStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            connection: OnceCell::new(),
            #[cfg(test)]
            handshakes: AtomicUsize::new(0),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn connection(&self) -> Result<Arc<Connection>, StoreError> {
        self.connection
            .get_or_try_init(|| async {
                #[cfg(test)]
                self.handshakes.fetch_add(1, Ordering::SeqCst);
                let root = self.root.clone();
                let connection = tokio::task::spawn_blocking(move || open_blocking(root))
                    .await
                    .map_err(|e| StoreError::Unavailable(format!("open task failed: {e}")))??;
                Ok::<_, StoreError>(Arc::new(connection))
            })
            .await
            .cloned()
    }
}

fn open_blocking(root: PathBuf) -> Result<Connection, StoreError> {
    std::fs::create_dir_all(&root)
        .map_err(|e| StoreError::Unavailable(format!("create {}: {e}", root.display())))?;

    let meta_path = root.join(STORE_META_FILE);
    match std::fs::read_to_string(&meta_path) {
        Ok(raw) => {
            let meta: StoreMeta = serde_json::from_str(&raw).map_err(|e| {
                StoreError::Unavailable(format!("{}: {e}", meta_path.display()))
            })?;
            if meta.schema_version > SCHEMA_VERSION {
                return Err(StoreError::Unavailable(format!(
                    "store schema {} is newer than supported {SCHEMA_VERSION}",
                    meta.schema_version
                )));
            }
            if meta.schema_version < SCHEMA_VERSION {
                info!(
                    event = "store.upgraded",
                    from = meta.schema_version,
                    to = SCHEMA_VERSION
                );
                write_meta(&root, &meta_path)?;
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            write_meta(&root, &meta_path)?;
        }
        Err(e) => {
            return Err(StoreError::Unavailable(format!(
                "{}: {e}",
                meta_path.display()
            )));
        }
    }
    debug!(event = "store.opened", dir = %root.display());
    Ok(Connection { dir: root })
}

fn write_meta(root: &Path, meta_path: &Path) -> Result<(), StoreError> {
    let bytes = serde_json::to_vec_pretty(&StoreMeta {
        schema_version: SCHEMA_VERSION,
    })
    .map_err(|e| StoreError::Unavailable(e.to_string()))?;
    write_atomic(root, meta_path, &bytes)
        .map_err(|e| StoreError::Unavailable(format!("{}: {e}", meta_path.display())))
}

/// Temp file in the same directory, fsync, then rename over the target.
fn write_atomic(dir: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[async_trait::async_trait]
impl RecordStore for FileRecordStore {
    async fn read(&self, key: &str) -> Result<Option<serde_json::Value>, StoreError> {
        let path = self.connection().await?.record_path(key);
        tokio::task::spawn_blocking(move || match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|e| StoreError::OperationFailed(format!("{}: {e}", path.display()))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::OperationFailed(format!(
                "{}: {e}",
                path.display()
            ))),
        })
        .await
        .map_err(|e| StoreError::OperationFailed(format!("read task failed: {e}")))?
    }

    async fn write(&self, key: &str, value: serde_json::Value) -> Result<(), StoreError> {
        let connection = self.connection().await?;
        let path = connection.record_path(key);
        let dir = connection.dir.clone();
        let bytes = serde_json::to_vec(&value)
            .map_err(|e| StoreError::OperationFailed(e.to_string()))?;
        tokio::task::spawn_blocking(move || {
            write_atomic(&dir, &path, &bytes)
                .map_err(|e| StoreError::OperationFailed(format!("{}: {e}", path.display())))
        })
        .await
        .map_err(|e| StoreError::OperationFailed(format!("write task failed: {e}")))?
    }
}
