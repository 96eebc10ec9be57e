//! Datalake Records
//! A `DatalakeRecord` points at one datalake file from one time bucket. A file whose interval
//! overlaps several buckets is represented by one record per bucket, all sharing the same url and
//! metadata.

pub mod time_bucket;

use self::time_bucket::BucketIndexer;
use crate::common::time::now_ms;
use crate::config::{DatalakeConfig, DatalakeConfigError};
use crate::errors::DatalakeError;
use crate::metadata::Metadata;
use crate::storage::{self, DatalakeStorage, DatalakeUrl};
use serde_derive::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, trace};
use tracing_attributes::instrument;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatalakeRecord {
    /// The time bucket this record is indexed under.
    pub bucket: u64,
    pub url: String,
    pub metadata: Metadata,
    /// Epoch milliseconds the file was created.
    pub create_time: u64,
    /// Size of the file content in bytes, 0 when not known.
    pub size: u64,
}

/// `RecordFactory` builds the records of a file, either from caller supplied metadata or from the
/// metadata held by the configured storage backend.
#[derive(Debug, Clone, Default)]
pub struct RecordFactory {
    indexer: BucketIndexer,
    storage: Option<Arc<dyn DatalakeStorage>>,
}

impl RecordFactory {
    pub fn new(indexer: BucketIndexer) -> Self {
        Self { indexer, storage: None }
    }

    pub fn with_storage(mut self, storage: Arc<dyn DatalakeStorage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Builds the bucket indexer and the storage backend described by the configuration.
    pub fn from_config(config: &DatalakeConfig) -> Result<Self, DatalakeConfigError> {
        let indexer = config.bucket.indexer()?;
        let storage = storage::build_storage(&config.storage);
        Ok(Self { indexer, storage })
    }

    pub fn indexer(&self) -> &BucketIndexer {
        &self.indexer
    }

    /// Whether a storage backend is configured, `list_from_url` fails without one.
    pub fn backend_available(&self) -> bool {
        self.storage.is_some()
    }

    /// The records of the file at `url` described by `metadata`, one per bucket its interval
    /// overlaps, in ascending bucket order. Storage is not consulted.
    pub fn list_from_metadata(
        &self,
        url: &str,
        metadata: &Metadata,
    ) -> Result<Vec<DatalakeRecord>, DatalakeError> {
        self.build_records(url, metadata, now_ms(), 0)
    }

    /// The records of the file at `url`, using the metadata, size and creation time held by the
    /// storage backend. A missing file and a missing container are both reported as
    /// `NoSuchDatalakeFile`.
    #[instrument(skip(self))]
    pub async fn list_from_url(&self, url: &str) -> Result<Vec<DatalakeRecord>, DatalakeError> {
        let storage = match &self.storage {
            Some(storage) => storage,
            None => {
                return Err(DatalakeError::InsufficientConfiguration(format!(
                    "a storage backend is required to list records from {}",
                    url
                )))
            },
        };
        let datalake_url = DatalakeUrl::from_str(url)?;
        let stored = match storage.fetch_metadata(&datalake_url).await {
            Ok(stored) => stored,
            Err(err) if err.is_not_found() => {
                debug!("list_from_url: {} not found: {}", url, err);
                return Err(DatalakeError::NoSuchDatalakeFile {
                    url: url.to_string(),
                    source: err,
                });
            },
            Err(err) => {
                error!("list_from_url: Unable to fetch metadata for {}: {}", url, err);
                return Err(DatalakeError::Storage(err));
            },
        };
        let metadata = Metadata::from_json_slice(&stored.metadata).map_err(|source| {
            DatalakeError::InvalidMetadata { url: url.to_string(), source }
        })?;
        self.build_records(url, &metadata, stored.last_modified_ms, stored.size)
    }

    fn build_records(
        &self,
        url: &str,
        metadata: &Metadata,
        create_time: u64,
        size: u64,
    ) -> Result<Vec<DatalakeRecord>, DatalakeError> {
        let buckets = self.indexer.bucket_range(metadata.start, metadata.end)?;
        let records: Vec<DatalakeRecord> = buckets
            .map(|bucket| DatalakeRecord {
                bucket,
                url: url.to_string(),
                metadata: metadata.clone(),
                create_time,
                size,
            })
            .collect();
        trace!("build_records: {} -> {} records", url, records.len());
        Ok(records)
    }
}
