use crate::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};


/// Stores objects as files under a root directory.
pub struct LocalStore {
    root: PathBuf,
}


impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> LocalStore {
        Self { root: root.into() }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.root.join(path.trim_start_matches('/'))
    }
}


#[async_trait]
impl ObjectStore for LocalStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        tokio::fs::try_exists(self.resolve(path))
            .await
            .map_err(StoreError::transport)
    }

    async fn put(&self, path: &str, value: Bytes) -> Result<(), StoreError> {
        let dest = self.resolve(path);
        tokio::task::spawn_blocking(move || write_atomic(&dest, &value))
            .await
            .map_err(StoreError::transport)?
            .map_err(StoreError::transport)
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        match tokio::fs::read(self.resolve(path)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            },
            Err(err) => Err(StoreError::transport(err))
        }
    }
}


// Concurrent writers of the same path each rename their own temp file,
// so the last rename wins and nobody sees a torn file.
fn write_atomic(dest: &Path, value: &[u8]) -> anyhow::Result<()> {
    let dir = dest.parent().unwrap_or(Path::new("."));
    std::fs::create_dir_all(dir)?;
    let mut file = tempfile::NamedTempFile::new_in(dir)?;
    file.write_all(value)?;
    file.as_file().sync_data()?;
    file.persist(dest)?;
    Ok(())
}
