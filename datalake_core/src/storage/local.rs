//! Local filesystem storage backend.
//! Every container is a directory under `root`, a file is stored at `<root>/<container>/<key>`
//! and its metadata document next to it at `<root>/<container>/<key>.datalake.json`.
//!
//! Keys ending in `.datalake.json` are reserved for metadata documents. Keys map onto a directory
//! tree, so unlike an object store a key cannot also be the prefix of another key: once `a` is
//! stored, `a/b` is rejected with `StorageError::InvalidUrl`, and the other way around.

use super::{DatalakeStorage, DatalakeUrl, StorageError, StoredObject};
use crate::common::time::system_time_to_ms;
use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use tracing::{debug, trace};

pub const METADATA_SUFFIX: &str = ".datalake.json";

#[derive(Debug, Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn container_dir(&self, url: &DatalakeUrl) -> Result<PathBuf, StorageError> {
        let container = Path::new(url.container());
        if !is_plain_relative(container) || container.components().count() != 1 {
            return Err(StorageError::InvalidUrl(
                url.to_string(),
                String::from("container must be a single path component"),
            ));
        }
        Ok(self.root.join(container))
    }

    /// Returns the paths of the file content and of its metadata document.
    fn object_paths(&self, url: &DatalakeUrl) -> Result<(PathBuf, PathBuf), StorageError> {
        let container_dir = self.container_dir(url)?;
        let key = Path::new(url.key());
        if !is_plain_relative(key) {
            return Err(StorageError::InvalidUrl(
                url.to_string(),
                String::from("key must not contain '..' or absolute components"),
            ));
        }
        if url.key().ends_with(METADATA_SUFFIX) {
            return Err(StorageError::InvalidUrl(
                url.to_string(),
                format!("keys ending in {} are reserved for metadata", METADATA_SUFFIX),
            ));
        }
        let content_path = container_dir.join(key);
        let metadata_path = container_dir.join(format!("{}{}", url.key(), METADATA_SUFFIX));
        Ok((content_path, metadata_path))
    }

    async fn ensure_container(&self, url: &DatalakeUrl) -> Result<PathBuf, StorageError> {
        let container_dir = self.container_dir(url)?;
        match fs::metadata(&container_dir).await {
            Ok(stat) if stat.is_dir() => Ok(container_dir),
            Ok(_) => Err(StorageError::NoSuchContainer(url.container().to_string())),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NoSuchContainer(url.container().to_string()))
            },
            Err(err) => Err(StorageError::Io(err)),
        }
    }
}

/// The path below `container_dir` that prevents `key` from being stored as a regular file: either
/// an ancestor directory of the key that already exists as a file, or the key itself already
/// existing as a directory.
async fn conflicting_path(
    container_dir: &Path,
    key: &Path,
) -> Result<Option<PathBuf>, StorageError> {
    let mut path = container_dir.to_path_buf();
    let mut components = key.components().peekable();
    while let Some(component) = components.next() {
        path.push(component);
        let is_last = components.peek().is_none();
        match fs::metadata(&path).await {
            Ok(stat) if is_last && stat.is_dir() => return Ok(Some(path)),
            Ok(stat) if !is_last && !stat.is_dir() => return Ok(Some(path)),
            Ok(_) => {},
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(StorageError::Io(err)),
        }
    }
    Ok(None)
}

/// Only normal components, so a key can never escape its container directory.
fn is_plain_relative(path: &Path) -> bool {
    path.components().all(|component| matches!(component, Component::Normal(_)))
}

#[async_trait]
impl DatalakeStorage for LocalStorage {
    async fn fetch_metadata(&self, url: &DatalakeUrl) -> Result<StoredObject, StorageError> {
        let container_dir = self.ensure_container(url).await?;
        let (content_path, metadata_path) = self.object_paths(url)?;
        let not_found =
            || StorageError::NoSuchObject(url.container().to_string(), url.key().to_string());
        if conflicting_path(&container_dir, Path::new(url.key())).await?.is_some() {
            return Err(not_found());
        }
        let metadata = match fs::read(&metadata_path).await {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(StorageError::Io(err)),
        };
        let stat = match fs::metadata(&content_path).await {
            Ok(stat) => stat,
            Err(err) if err.kind() == ErrorKind::NotFound => return Err(not_found()),
            Err(err) => return Err(StorageError::Io(err)),
        };
        trace!("LocalStorage::fetch_metadata {} from {}", url, metadata_path.display());
        Ok(StoredObject {
            metadata: Bytes::from(metadata),
            size: stat.len(),
            last_modified_ms: system_time_to_ms(stat.modified()?),
        })
    }

    async fn put_object(
        &self,
        url: &DatalakeUrl,
        metadata: Bytes,
        content: Bytes,
    ) -> Result<(), StorageError> {
        let container_dir = self.ensure_container(url).await?;
        let (content_path, metadata_path) = self.object_paths(url)?;
        if let Some(conflict) = conflicting_path(&container_dir, Path::new(url.key())).await? {
            return Err(StorageError::InvalidUrl(
                url.to_string(),
                format!(
                    "key collides with {}, a key cannot also be the prefix of another key",
                    conflict.display()
                ),
            ));
        }
        if let Some(parent) = content_path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&content_path, &content).await?;
        // The metadata document is written last, a file is only visible once it exists.
        fs::write(&metadata_path, &metadata).await?;
        debug!("LocalStorage::put_object {} -> {}", url, content_path.display());
        Ok(())
    }

    async fn create_container(&self, container: &str) -> Result<(), StorageError> {
        let path = Path::new(container);
        if container.is_empty() || !is_plain_relative(path) || path.components().count() != 1 {
            return Err(StorageError::InvalidUrl(
                container.to_string(),
                String::from("container must be a single path component"),
            ));
        }
        fs::create_dir_all(self.root.join(path)).await?;
        Ok(())
    }
}
