use crate::{ObjectStore, StoreError};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use std::collections::BTreeMap;


/// In-process store, handy for dry runs and tests.
#[derive(Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Bytes>>,
}


impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.lock().is_empty()
    }

    pub fn paths(&self) -> Vec<String> {
        self.objects.lock().keys().cloned().collect()
    }

    pub fn paths_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.objects.lock()
            .range(prefix.to_string()..)
            .take_while(|(path, _)| path.starts_with(prefix))
            .map(|(path, _)| path.clone())
            .collect()
    }
}


#[async_trait]
impl ObjectStore for MemoryStore {
    async fn exists(&self, path: &str) -> Result<bool, StoreError> {
        Ok(self.objects.lock().contains_key(path))
    }

    async fn put(&self, path: &str, value: Bytes) -> Result<(), StoreError> {
        self.objects.lock().insert(path.to_string(), value);
        Ok(())
    }

    async fn get(&self, path: &str) -> Result<Bytes, StoreError> {
        self.objects.lock()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }
}
