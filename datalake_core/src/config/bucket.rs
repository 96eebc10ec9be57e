//! Datalake Config - Time Bucket Configuration
use super::{ConfigSet, DatalakeConfigError};
use crate::common::config_def::{ConfigDef, ConfigDefImportance};
use crate::record::time_bucket::{BucketIndexer, MAXIMUM_BUCKET_SPAN, TIME_BUCKET_SIZE_IN_MS};
use const_format::concatcp;
use enum_iterator::IntoEnumIterator;
use std::fmt;
use std::str::FromStr;
use tracing::trace;

// Config Keys
pub const TIME_BUCKET_SIZE_MS_PROP: &str = "time.bucket.size.ms";
pub const MAXIMUM_BUCKET_SPAN_PROP: &str = "maximum.bucket.span";

// Documentation
pub const TIME_BUCKET_SIZE_MS_DOC: &str =
    "The width in milliseconds of one time bucket. Changing this value invalidates every bucket \
     index generated before the change.";
pub const MAXIMUM_BUCKET_SPAN_DOC: &str = concatcp!(
    "The maximum number of buckets a single file or query interval may span. Intervals touching \
     more buckets are rejected. Together with `",
    TIME_BUCKET_SIZE_MS_PROP,
    "` this bounds the widest interval that can be indexed."
);

#[derive(Debug, IntoEnumIterator)]
pub enum BucketConfigKey {
    TimeBucketSizeMs,
    MaximumBucketSpan,
}

impl fmt::Display for BucketConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TimeBucketSizeMs => write!(f, "{}", TIME_BUCKET_SIZE_MS_PROP),
            Self::MaximumBucketSpan => write!(f, "{}", MAXIMUM_BUCKET_SPAN_PROP),
        }
    }
}

impl FromStr for BucketConfigKey {
    type Err = DatalakeConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            TIME_BUCKET_SIZE_MS_PROP => Ok(Self::TimeBucketSizeMs),
            MAXIMUM_BUCKET_SPAN_PROP => Ok(Self::MaximumBucketSpan),
            _ => Err(DatalakeConfigError::UnknownKey(input.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct BucketConfigProperties {
    time_bucket_size_ms: ConfigDef<u64>,
    maximum_bucket_span: ConfigDef<u64>,
}

impl Default for BucketConfigProperties {
    fn default() -> Self {
        Self {
            time_bucket_size_ms: ConfigDef::default()
                .with_key(TIME_BUCKET_SIZE_MS_PROP)
                .with_importance(ConfigDefImportance::High)
                .with_doc(TIME_BUCKET_SIZE_MS_DOC)
                .with_default(TIME_BUCKET_SIZE_IN_MS)
                .with_validator(Box::new(|data: Option<&u64>| {
                    ConfigDef::at_least(data, &1, TIME_BUCKET_SIZE_MS_PROP)
                })),
            maximum_bucket_span: ConfigDef::default()
                .with_key(MAXIMUM_BUCKET_SPAN_PROP)
                .with_importance(ConfigDefImportance::Medium)
                .with_doc(MAXIMUM_BUCKET_SPAN_DOC)
                .with_default(MAXIMUM_BUCKET_SPAN)
                .with_validator(Box::new(|data: Option<&u64>| {
                    ConfigDef::at_least(data, &1, MAXIMUM_BUCKET_SPAN_PROP)
                })),
        }
    }
}

impl ConfigSet for BucketConfigProperties {
    type ConfigKey = BucketConfigKey;
    type ConfigType = BucketConfig;

    fn try_set_property(
        &mut self,
        property_name: &str,
        property_value: &str,
    ) -> Result<(), DatalakeConfigError> {
        let config_key = Self::ConfigKey::from_str(property_name)?;
        match config_key {
            Self::ConfigKey::TimeBucketSizeMs => {
                self.time_bucket_size_ms.try_set_parsed_value(property_value)?
            },
            Self::ConfigKey::MaximumBucketSpan => {
                self.maximum_bucket_span.try_set_parsed_value(property_value)?
            },
        };
        Ok(())
    }

    fn resolve(&mut self) -> Result<Self::ConfigType, DatalakeConfigError> {
        trace!("BucketConfigProperties::resolve()");
        let time_bucket_size_ms = self.time_bucket_size_ms.build()?;
        let maximum_bucket_span = self.maximum_bucket_span.build()?;
        Ok(Self::ConfigType { time_bucket_size_ms, maximum_bucket_span })
    }

    fn describe(&self) -> Vec<String> {
        vec![self.time_bucket_size_ms.describe(), self.maximum_bucket_span.describe()]
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct BucketConfig {
    pub time_bucket_size_ms: u64,
    pub maximum_bucket_span: u64,
}

impl Default for BucketConfig {
    fn default() -> Self {
        Self { time_bucket_size_ms: TIME_BUCKET_SIZE_IN_MS, maximum_bucket_span: MAXIMUM_BUCKET_SPAN }
    }
}

impl BucketConfig {
    pub fn indexer(&self) -> Result<BucketIndexer, DatalakeConfigError> {
        BucketIndexer::new(self.time_bucket_size_ms, self.maximum_bucket_span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test_log::test]
    fn it_sets_config() {
        let mut conf_props = BucketConfigProperties::default();
        let conf = conf_props.build().unwrap();
        assert_eq!(conf, BucketConfig::default());
        assert_eq!(conf.indexer().unwrap(), BucketIndexer::default());
        conf_props.try_set_property(TIME_BUCKET_SIZE_MS_PROP, "60000").unwrap();
        let conf = conf_props.build().unwrap();
        assert_eq!(conf.time_bucket_size_ms, 60_000);
        assert_eq!(conf.indexer().unwrap().bucket_size_ms(), 60_000);
        conf_props.try_set_property(MAXIMUM_BUCKET_SPAN_PROP, "0").unwrap();
        assert_eq!(
            conf_props.build().unwrap_err(),
            DatalakeConfigError::InvalidValue(format!(
                "{}: '0' should be at least 1",
                MAXIMUM_BUCKET_SPAN_PROP
            ))
        );
    }

    #[test_log::test]
    fn it_rejects_unparseable_values() {
        let mut conf_props = BucketConfigProperties::default();
        assert!(conf_props.try_set_property(TIME_BUCKET_SIZE_MS_PROP, "one day").is_err());
        assert_eq!(
            conf_props.try_set_property("time.bucket.size", "1").unwrap_err(),
            DatalakeConfigError::UnknownKey(String::from("time.bucket.size"))
        );
    }
}
