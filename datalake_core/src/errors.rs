//! Errors surfaced to callers of the record factory.

use crate::storage::StorageError;
use thiserror::Error;

/// `DatalakeError` is returned by the bucketing and record listing operations. None of these are
/// retried internally, they are all fatal to the call that raised them.
#[derive(Error, Debug)]
pub enum DatalakeError {
    #[error("Insufficient configuration: {0}")]
    InsufficientConfiguration(String),
    #[error(
        "Unsupported time range [{start}, {end:?}]: spans {span} buckets, maximum is {maximum}"
    )]
    UnsupportedTimeRange { start: u64, end: Option<u64>, span: u64, maximum: u64 },
    #[error("No such datalake file: {url}")]
    NoSuchDatalakeFile {
        url: String,
        #[source]
        source: StorageError,
    },
    #[error("Invalid metadata stored for {url}: {source}")]
    InvalidMetadata {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

impl DatalakeError {
    /// Whether the error was raised because the interval touches too many buckets.
    pub fn is_unsupported_time_range(&self) -> bool {
        matches!(self, Self::UnsupportedTimeRange { .. })
    }

    /// Whether the requested file, or the container holding it, does not exist.
    pub fn is_no_such_datalake_file(&self) -> bool {
        matches!(self, Self::NoSuchDatalakeFile { .. })
    }

    pub fn is_insufficient_configuration(&self) -> bool {
        matches!(self, Self::InsufficientConfiguration(_))
    }
}
