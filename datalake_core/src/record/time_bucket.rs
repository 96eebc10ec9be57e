//! Time Buckets
//! The time axis is split into contiguous, non-overlapping, half-open buckets of
//! `bucket_size_ms` milliseconds counted from the Unix epoch:
//! `[0, S)`, `[S, 2S)`, `[2S, 3S)`, ...
//! A timestamp exactly on a boundary belongs to the bucket it opens.

use crate::config::DatalakeConfigError;
use crate::errors::DatalakeError;
use std::ops::RangeInclusive;
use tracing::trace;

/// Width of a single bucket, one day.
pub const TIME_BUCKET_SIZE_IN_MS: u64 = 24 * 60 * 60 * 1000;

/// Maximum number of buckets a single interval may touch.
pub const MAXIMUM_BUCKET_SPAN: u64 = 30;

/// `BucketIndexer` converts millisecond intervals into the buckets they overlap.
/// Once built its parameters never change, indices produced with a different bucket size are not
/// comparable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketIndexer {
    bucket_size_ms: u64,
    maximum_bucket_span: u64,
}

impl Default for BucketIndexer {
    fn default() -> Self {
        Self { bucket_size_ms: TIME_BUCKET_SIZE_IN_MS, maximum_bucket_span: MAXIMUM_BUCKET_SPAN }
    }
}

impl BucketIndexer {
    pub fn new(bucket_size_ms: u64, maximum_bucket_span: u64) -> Result<Self, DatalakeConfigError> {
        if bucket_size_ms == 0 {
            return Err(DatalakeConfigError::InvalidValue(String::from(
                "bucket size must be at least 1ms",
            )));
        }
        if maximum_bucket_span == 0 {
            return Err(DatalakeConfigError::InvalidValue(String::from(
                "maximum bucket span must be at least 1",
            )));
        }
        Ok(Self { bucket_size_ms, maximum_bucket_span })
    }

    pub fn bucket_size_ms(&self) -> u64 {
        self.bucket_size_ms
    }

    /// The bucket a timestamp falls in.
    pub fn bucket_of(&self, timestamp_ms: u64) -> u64 {
        timestamp_ms / self.bucket_size_ms
    }

    /// The first millisecond covered by `bucket`, saturating at `u64::MAX`.
    pub fn bucket_start_ms(&self, bucket: u64) -> u64 {
        bucket.saturating_mul(self.bucket_size_ms)
    }

    /// `bucket_range` returns the inclusive range of buckets overlapped by `[start_ms, end_ms]`.
    /// An absent `end_ms` is a single point. An inverted interval collapses onto the bucket of
    /// `start_ms`. The span is checked before anything is enumerated.
    pub fn bucket_range(
        &self,
        start_ms: u64,
        end_ms: Option<u64>,
    ) -> Result<RangeInclusive<u64>, DatalakeError> {
        let first = self.bucket_of(start_ms);
        let last = self.bucket_of(end_ms.unwrap_or(start_ms)).max(first);
        // last - first + 1 > maximum, written so that it cannot overflow
        if last - first >= self.maximum_bucket_span {
            return Err(DatalakeError::UnsupportedTimeRange {
                start: start_ms,
                end: end_ms,
                span: (last - first).saturating_add(1),
                maximum: self.maximum_bucket_span,
            });
        }
        trace!("bucket_range: [{}, {:?}] -> {}..={}", start_ms, end_ms, first, last);
        Ok(first..=last)
    }

    /// `compute_buckets` returns the ascending, duplicate-free buckets overlapped by
    /// `[start_ms, end_ms]`.
    pub fn compute_buckets(
        &self,
        start_ms: u64,
        end_ms: Option<u64>,
    ) -> Result<Vec<u64>, DatalakeError> {
        Ok(self.bucket_range(start_ms, end_ms)?.collect())
    }
}
