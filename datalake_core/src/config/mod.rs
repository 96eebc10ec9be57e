//! Datalake Config
//! Properties are read from a java-style `.properties` file and may be overridden one by one,
//! for example from the command line. Each area of the configuration is a `ConfigSet`.

pub mod bucket;
pub mod storage;

use self::bucket::{BucketConfig, BucketConfigKey, BucketConfigProperties};
use self::storage::{StorageConfig, StorageConfigKey, StorageConfigProperties};
use enum_iterator::IntoEnumIterator;
use fs_err::File;
use std::collections::HashMap;
use std::fmt;
use std::io::{self, BufReader};
use std::num;
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, trace};

/// A helper enum to dispatch a property name to the config set that owns it.
#[derive(Debug)]
pub enum DatalakeConfigKey {
    Bucket(BucketConfigKey),
    Storage(StorageConfigKey),
}

impl fmt::Display for DatalakeConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bucket(val) => write!(f, "{}", val),
            Self::Storage(val) => write!(f, "{}", val),
        }
    }
}

impl FromStr for DatalakeConfigKey {
    type Err = DatalakeConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if let Ok(val) = BucketConfigKey::from_str(input) {
            return Ok(Self::Bucket(val));
        }
        if let Ok(val) = StorageConfigKey::from_str(input) {
            return Ok(Self::Storage(val));
        }
        Err(DatalakeConfigError::UnknownKey(input.to_string()))
    }
}

/// `DatalakeConfigError` is returned when properties are invalid, unknown, missing or the config
/// file is not readable.
#[derive(Error, Debug)]
pub enum DatalakeConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Property error: {0}")]
    Property(#[from] java_properties::PropertiesError),
    #[error("ParseInt error: {0}")]
    ParseInt(#[from] num::ParseIntError),
    #[error("Infallible String Error {0:?}")]
    Infallible(#[from] std::convert::Infallible),
    #[error("Missing Key error: {0:?}")]
    MissingKey(String),
    #[error("Invalid Value: {0}")]
    InvalidValue(String),
    #[error("Unknown Key: {0}")]
    UnknownKey(String),
    #[error("Attempt to compare a value that is not provided and has no default: {0}")]
    ComparisonOnNone(String),
    #[error("Unknown storage backend: {0}")]
    UnknownStorageBackend(String),
}

/// This implementation is only for testing, for example any I/O error is considered equal
impl PartialEq for DatalakeConfigError {
    fn eq(&self, rhs: &Self) -> bool {
        match self {
            Self::Io(_) => matches!(rhs, Self::Io(_)),
            Self::Property(lhs) => {
                matches!(rhs, Self::Property(rhs) if lhs.line_number() == rhs.line_number())
            },
            Self::ParseInt(lhs) => matches!(rhs, Self::ParseInt(rhs) if lhs == rhs),
            Self::Infallible(lhs) => matches!(rhs, Self::Infallible(rhs) if lhs == rhs),
            Self::MissingKey(lhs) => matches!(rhs, Self::MissingKey(rhs) if lhs == rhs),
            Self::InvalidValue(lhs) => matches!(rhs, Self::InvalidValue(rhs) if lhs == rhs),
            Self::UnknownKey(lhs) => matches!(rhs, Self::UnknownKey(rhs) if lhs == rhs),
            Self::ComparisonOnNone(lhs) => matches!(rhs, Self::ComparisonOnNone(rhs) if lhs == rhs),
            Self::UnknownStorageBackend(lhs) => {
                matches!(rhs, Self::UnknownStorageBackend(rhs) if lhs == rhs)
            },
        }
    }
}

/// A set of functions that the different configuration sets must implement, including building,
/// parsing, returning keys, etc.
pub trait ConfigSet {
    type ConfigKey;
    type ConfigType;
    /// `try_set_property` transforms a string value from the config into our actual types
    fn try_set_property(
        &mut self,
        property_name: &str,
        property_value: &str,
    ) -> Result<(), DatalakeConfigError>;
    /// `resolve` builds each property into the final ConfigType.
    /// NOTE: This doesn't consume self, properties may be overridden after the file is read.
    fn resolve(&mut self) -> Result<Self::ConfigType, DatalakeConfigError>;
    /// `build` resolves every property and then makes sure that the values are compatible with
    /// each-other
    fn build(&mut self) -> Result<Self::ConfigType, DatalakeConfigError> {
        let res = self.resolve()?;
        self.validate_values(&res)?;
        Ok(res)
    }
    /// `config_names` returns a list of config keys used
    fn config_names() -> Vec<String>
    where
        Self::ConfigKey: IntoEnumIterator + fmt::Display,
    {
        Self::ConfigKey::into_enum_iter().map(|val| val.to_string()).collect()
    }
    /// `describe` returns one line per property with its key, importance, value and doc.
    fn describe(&self) -> Vec<String>;
    /// `validate_values` ensures values are compatible with others and within limits not provided
    /// by the per-property validators.
    fn validate_values(&self, _cfg: &Self::ConfigType) -> Result<(), DatalakeConfigError> {
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct DatalakeConfigProperties {
    bucket: BucketConfigProperties,
    storage: StorageConfigProperties,
}

impl DatalakeConfigProperties {
    pub fn try_set_property(
        &mut self,
        property_name: &str,
        property_value: &str,
    ) -> Result<(), DatalakeConfigError> {
        let config_key = DatalakeConfigKey::from_str(property_name)?;
        match config_key {
            DatalakeConfigKey::Bucket(_) => {
                self.bucket.try_set_property(property_name, property_value)?
            },
            DatalakeConfigKey::Storage(_) => {
                self.storage.try_set_property(property_name, property_value)?
            },
        };
        Ok(())
    }

    /// `config_names` returns a list of config keys used by DatalakeConfigProperties
    pub fn config_names() -> Vec<String> {
        let mut res = vec![];
        res.append(&mut BucketConfigProperties::config_names());
        res.append(&mut StorageConfigProperties::config_names());
        res
    }

    /// `describe` returns one line per known property, see `ConfigDef::describe`
    pub fn describe(&self) -> Vec<String> {
        let mut res = self.bucket.describe();
        res.append(&mut self.storage.describe());
        res
    }

    /// `build` validates and resolves the properties into a DatalakeConfig
    pub fn build(&mut self) -> Result<DatalakeConfig, DatalakeConfigError> {
        trace!("DatalakeConfigProperties::build() INIT");
        let bucket = self.bucket.build()?;
        let storage = self.storage.build()?;
        trace!("DatalakeConfigProperties::build() DONE");
        Ok(DatalakeConfig { bucket, storage })
    }

    /// Transforms from a HashMap of configs into a DatalakeConfigProperties object
    /// This may return DatalakeConfigError::UnknownKey errors
    pub fn from_properties_hashmap(
        input_config: HashMap<String, String>,
    ) -> Result<Self, DatalakeConfigError> {
        let mut config_builder = Self::default();
        for (property, property_value) in &input_config {
            debug!("from_properties_hashmap: {} = {}", property, property_value);
            config_builder.try_set_property(property, property_value)?;
        }
        Ok(config_builder)
    }

    /// `read_config_file` reads the datalake properties file.
    pub fn read_config_file(filename: &str) -> Result<Self, DatalakeConfigError> {
        debug!("read_config_file: Reading {}", filename);
        let mut config_file_content = File::open(filename)?;
        let input_config = java_properties::read(BufReader::new(&mut config_file_content))?;
        DatalakeConfigProperties::from_properties_hashmap(input_config)
    }
}

#[derive(Debug, PartialEq, Clone, Default)]
pub struct DatalakeConfig {
    pub bucket: BucketConfig,
    pub storage: StorageConfig,
}
