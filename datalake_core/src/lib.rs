#![warn(rust_2018_idioms)]
//! Datalake Core
//! Maps datalake files onto fixed-width time buckets so that the files relevant to a time window
//! can be found without scanning the whole store.

pub mod common;
pub mod config;
pub mod errors;
pub mod metadata;
pub mod record;
pub mod storage;
pub mod utils;

pub use errors::DatalakeError;
pub use metadata::Metadata;
pub use record::time_bucket::{BucketIndexer, MAXIMUM_BUCKET_SPAN, TIME_BUCKET_SIZE_IN_MS};
pub use record::{DatalakeRecord, RecordFactory};
