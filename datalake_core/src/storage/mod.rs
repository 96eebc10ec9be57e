//! Storage backends holding datalake files and their metadata.
//!
//! The [`DatalakeStorage`] trait is the boundary towards the object store. Backend specific
//! not-found conditions are reported as [`StorageError::NoSuchContainer`] or
//! [`StorageError::NoSuchObject`] and are translated by the record factory.

pub mod local;
pub mod memory;

use crate::config::storage::{StorageBackendKind, StorageConfig};
use crate::metadata::Metadata;
use async_trait::async_trait;
use bytes::Bytes;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};

pub use self::local::LocalStorage;
pub use self::memory::InMemoryStorage;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("No such container: {0}")]
    NoSuchContainer(String),
    #[error("No such object {1} in container {0}")]
    NoSuchObject(String, String),
    #[error("Invalid datalake url '{0}': {1}")]
    InvalidUrl(String, String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl StorageError {
    /// `is_not_found` is true for both a missing object and a missing container.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NoSuchContainer(_) | Self::NoSuchObject(_, _))
    }
}

/// A `scheme://container/key` address of a datalake file.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatalakeUrl {
    scheme: String,
    container: String,
    key: String,
}

impl DatalakeUrl {
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for DatalakeUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}/{}", self.scheme, self.container, self.key)
    }
}

impl FromStr for DatalakeUrl {
    type Err = StorageError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        lazy_static! {
            static ref DATALAKE_URL_PATTERN: Regex =
                Regex::new(r"^([A-Za-z][A-Za-z0-9+.-]*)://([^/]+)/(.+)$").unwrap();
        }
        match DATALAKE_URL_PATTERN.captures(input) {
            Some(captures) => Ok(Self {
                scheme: captures[1].to_string(),
                container: captures[2].to_string(),
                key: captures[3].to_string(),
            }),
            None => Err(StorageError::InvalidUrl(
                input.to_string(),
                String::from("expected scheme://container/key"),
            )),
        }
    }
}

/// What a backend knows about a stored file.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
    /// The JSON metadata document, decoded by the caller.
    pub metadata: Bytes,
    /// Size of the file content in bytes.
    pub size: u64,
    /// Epoch milliseconds of the last write.
    pub last_modified_ms: u64,
}

#[async_trait]
pub trait DatalakeStorage: fmt::Debug + Send + Sync {
    /// Fetches the metadata document of the file at `url`.
    async fn fetch_metadata(&self, url: &DatalakeUrl) -> Result<StoredObject, StorageError>;

    /// Stores `content` at `url` along with its JSON metadata document. The container must exist.
    async fn put_object(
        &self,
        url: &DatalakeUrl,
        metadata: Bytes,
        content: Bytes,
    ) -> Result<(), StorageError>;

    /// Creates a container, creating an existing one is not an error.
    async fn create_container(&self, container: &str) -> Result<(), StorageError>;

    async fn put_file(
        &self,
        url: &DatalakeUrl,
        metadata: &Metadata,
        content: Bytes,
    ) -> Result<(), StorageError> {
        let metadata = Bytes::from(metadata.to_json_vec()?);
        self.put_object(url, metadata, content).await
    }
}

/// `build_storage` instantiates the configured backend, `None` when no backend is configured.
pub fn build_storage(config: &StorageConfig) -> Option<Arc<dyn DatalakeStorage>> {
    let storage: Arc<dyn DatalakeStorage> = match config.backend {
        StorageBackendKind::None => {
            debug!("build_storage: no storage backend configured");
            return None;
        },
        StorageBackendKind::Memory => {
            warn!("build_storage: memory backend starts empty, only files stored through it exist");
            Arc::new(InMemoryStorage::default())
        },
        StorageBackendKind::Local => Arc::new(LocalStorage::new(config.local_root.clone())),
    };
    debug!("build_storage: using {:?}", storage);
    Some(storage)
}
