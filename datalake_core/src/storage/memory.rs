//! In-memory storage backend, files live as long as the process.

use super::{DatalakeStorage, DatalakeUrl, StorageError, StoredObject};
use crate::common::time::now_ms;
use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::trace;

#[derive(Debug, Clone)]
struct MemoryObject {
    metadata: Bytes,
    content: Bytes,
    last_modified_ms: u64,
}

/// Containers are keyed by name, each holding its objects keyed by object key.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    containers: RwLock<HashMap<String, HashMap<String, MemoryObject>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// The content stored at `url`, if any.
    pub async fn content(&self, url: &DatalakeUrl) -> Option<Bytes> {
        let containers = self.containers.read().await;
        containers
            .get(url.container())
            .and_then(|objects| objects.get(url.key()))
            .map(|object| object.content.clone())
    }
}

#[async_trait]
impl DatalakeStorage for InMemoryStorage {
    async fn fetch_metadata(&self, url: &DatalakeUrl) -> Result<StoredObject, StorageError> {
        let containers = self.containers.read().await;
        let objects = containers
            .get(url.container())
            .ok_or_else(|| StorageError::NoSuchContainer(url.container().to_string()))?;
        let object = objects.get(url.key()).ok_or_else(|| {
            StorageError::NoSuchObject(url.container().to_string(), url.key().to_string())
        })?;
        Ok(StoredObject {
            metadata: object.metadata.clone(),
            size: object.content.len() as u64,
            last_modified_ms: object.last_modified_ms,
        })
    }

    async fn put_object(
        &self,
        url: &DatalakeUrl,
        metadata: Bytes,
        content: Bytes,
    ) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        let objects = containers
            .get_mut(url.container())
            .ok_or_else(|| StorageError::NoSuchContainer(url.container().to_string()))?;
        trace!("InMemoryStorage::put_object {} ({} bytes)", url, content.len());
        objects.insert(url.key().to_string(), MemoryObject {
            metadata,
            content,
            last_modified_ms: now_ms(),
        });
        Ok(())
    }

    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        let mut containers = self.containers.write().await;
        containers.entry(container.to_string()).or_insert_with(HashMap::new);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::Metadata;
    use std::str::FromStr;

    #[test_log::test(tokio::test)]
    async fn it_stores_and_fetches_files() {
        let storage = InMemoryStorage::new();
        let url = DatalakeUrl::from_str("mem://foo/bar").unwrap();
        let metadata = Metadata::new(10, Some(20)).with_field("what", "syslog");
        storage.create_container("foo").await.unwrap();
        storage.put_file(&url, &metadata, Bytes::from_static(b"hello")).await.unwrap();
        let stored = storage.fetch_metadata(&url).await.unwrap();
        assert_eq!(stored.size, 5);
        assert_eq!(Metadata::from_json_slice(&stored.metadata).unwrap(), metadata);
        assert_eq!(storage.content(&url).await, Some(Bytes::from_static(b"hello")));
    }

    #[test_log::test(tokio::test)]
    async fn it_distinguishes_missing_container_and_object() {
        let storage = InMemoryStorage::new();
        let url = DatalakeUrl::from_str("mem://foo/bar").unwrap();
        assert!(matches!(
            storage.fetch_metadata(&url).await,
            Err(StorageError::NoSuchContainer(container)) if container == "foo"
        ));
        assert!(matches!(
            storage.put_object(&url, Bytes::new(), Bytes::new()).await,
            Err(StorageError::NoSuchContainer(_))
        ));
        storage.create_container("foo").await.unwrap();
        // creating twice keeps existing objects
        storage.put_object(&url, Bytes::from_static(b"{}"), Bytes::new()).await.unwrap();
        storage.create_container("foo").await.unwrap();
        assert!(storage.fetch_metadata(&url).await.is_ok());
        let missing = DatalakeUrl::from_str("mem://foo/baz").unwrap();
        assert!(matches!(
            storage.fetch_metadata(&missing).await,
            Err(StorageError::NoSuchObject(container, key)) if container == "foo" && key == "baz"
        ));
    }
}
