use crate::local::LocalStore;
use crate::s3::S3Store;
use anyhow::{anyhow, ensure};
use async_trait::async_trait;
use bytes::Bytes;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::sync::Arc;
use url::Url;


pub mod local;
pub mod memory;
pub mod s3;
mod staging;


pub use staging::*;


pub type StoreRef = Arc<dyn ObjectStore + Sync + Send>;


/// Flat key-value object storage addressed by `/`-separated paths.
#[async_trait]
pub trait ObjectStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError>;

    /// Stores the whole value under `path`, replacing any previous object.
    ///
    /// Readers never observe a partially written value.
    async fn put(&self, path: &str, value: Bytes) -> Result<(), StoreError>;

    async fn get(&self, path: &str) -> Result<Bytes, StoreError>;
}


#[derive(Debug)]
pub enum StoreError {
    NotFound(String),
    Transport(anyhow::Error),
}


impl StoreError {
    pub fn transport(err: impl Into<anyhow::Error>) -> Self {
        StoreError::Transport(err.into())
    }
}


impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::NotFound(path) => write!(f, "object {} does not exist", path),
            StoreError::Transport(err) => write!(f, "object store request failed: {:#}", err)
        }
    }
}


impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StoreError::NotFound(_) => None,
            StoreError::Transport(err) => Some(err.as_ref())
        }
    }
}


/// Connection settings for S3 compatible stores such as MinIO.
#[derive(Debug, Clone, Default)]
pub struct S3Settings {
    pub endpoint: Option<String>,
    pub access_key: Option<String>,
    pub secret_key: Option<String>,
}


/// Resolves `s3://bucket/prefix` to an S3 store and anything else to a local directory.
pub async fn create_store(dest: &str, settings: &S3Settings) -> anyhow::Result<StoreRef> {
    match Url::parse(dest) {
        Ok(u) => {
            if u.scheme() == "s3" {
                ensure!(!u.cannot_be_a_base(), "invalid s3 url - {}", dest);

                let bucket = u.host_str().ok_or_else(|| {
                    anyhow!("bucket is missing in {}", dest)
                })?;

                let path = u.path().trim_matches('/');

                let client = s3::create_client(settings).await;
                let store = S3Store::new(client, bucket.to_string(), path.to_string());
                Ok(Arc::new(store))
            } else {
                anyhow::bail!("unsupported protocol - {}", u.scheme())
            }
        }
        Err(_) => {
            let store = LocalStore::new(Path::new(dest));
            Ok(Arc::new(store))
        }
    }
}
