//! Datalake Config - Storage Backend Configuration
use super::{ConfigSet, DatalakeConfigError};
use crate::common::config_def::{ConfigDef, ConfigDefImportance};
use const_format::concatcp;
use enum_iterator::IntoEnumIterator;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use tracing::trace;

// Config Keys
pub const STORAGE_BACKEND_PROP: &str = "storage.backend";
pub const STORAGE_LOCAL_ROOT_PROP: &str = "storage.local.root";

// Documentation
pub const STORAGE_BACKEND_DOC: &str =
    "The storage backend holding datalake files, one of `none`, `memory` or `local`. With `none` \
     files can only be indexed from metadata supplied by the caller. `memory` starts empty and \
     lives as long as the process, it is only useful when the library is embedded and files are \
     stored through it, a one-shot command line run will never find a file in it.";
pub const STORAGE_LOCAL_ROOT_DOC: &str = concatcp!(
    "Root directory of the local storage backend, each container is a directory under it. \
     Required when `",
    STORAGE_BACKEND_PROP,
    "` is `local`."
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    None,
    Memory,
    Local,
}

impl fmt::Display for StorageBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "none"),
            Self::Memory => write!(f, "memory"),
            Self::Local => write!(f, "local"),
        }
    }
}

impl FromStr for StorageBackendKind {
    type Err = DatalakeConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.to_lowercase().as_str() {
            "none" => Ok(Self::None),
            "memory" => Ok(Self::Memory),
            "local" => Ok(Self::Local),
            _ => Err(DatalakeConfigError::UnknownStorageBackend(input.to_string())),
        }
    }
}

#[derive(Debug, IntoEnumIterator)]
pub enum StorageConfigKey {
    Backend,
    LocalRoot,
}

impl fmt::Display for StorageConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backend => write!(f, "{}", STORAGE_BACKEND_PROP),
            Self::LocalRoot => write!(f, "{}", STORAGE_LOCAL_ROOT_PROP),
        }
    }
}

impl FromStr for StorageConfigKey {
    type Err = DatalakeConfigError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input {
            STORAGE_BACKEND_PROP => Ok(Self::Backend),
            STORAGE_LOCAL_ROOT_PROP => Ok(Self::LocalRoot),
            _ => Err(DatalakeConfigError::UnknownKey(input.to_string())),
        }
    }
}

#[derive(Debug)]
pub struct StorageConfigProperties {
    backend: ConfigDef<StorageBackendKind>,
    local_root: ConfigDef<PathBuf>,
}

impl Default for StorageConfigProperties {
    fn default() -> Self {
        Self {
            backend: ConfigDef::default()
                .with_key(STORAGE_BACKEND_PROP)
                .with_importance(ConfigDefImportance::High)
                .with_doc(STORAGE_BACKEND_DOC)
                .with_default(StorageBackendKind::None),
            local_root: ConfigDef::default()
                .with_key(STORAGE_LOCAL_ROOT_PROP)
                .with_importance(ConfigDefImportance::Low)
                .with_doc(STORAGE_LOCAL_ROOT_DOC),
        }
    }
}

impl ConfigSet for StorageConfigProperties {
    type ConfigKey = StorageConfigKey;
    type ConfigType = StorageConfig;

    fn try_set_property(
        &mut self,
        property_name: &str,
        property_value: &str,
    ) -> Result<(), DatalakeConfigError> {
        let config_key = Self::ConfigKey::from_str(property_name)?;
        match config_key {
            Self::ConfigKey::Backend => self.backend.try_set_parsed_value(property_value)?,
            Self::ConfigKey::LocalRoot => self.local_root.try_set_parsed_value(property_value)?,
        };
        Ok(())
    }

    fn resolve(&mut self) -> Result<Self::ConfigType, DatalakeConfigError> {
        trace!("StorageConfigProperties::resolve()");
        let backend = self.backend.build()?;
        // The root is only needed, and thus only required, by the local backend.
        let local_root = match backend {
            StorageBackendKind::Local => self.local_root.build()?,
            _ => self.local_root.get_value().cloned().unwrap_or_default(),
        };
        Ok(Self::ConfigType { backend, local_root })
    }

    fn describe(&self) -> Vec<String> {
        vec![self.backend.describe(), self.local_root.describe()]
    }

    fn validate_values(&self, cfg: &Self::ConfigType) -> Result<(), DatalakeConfigError> {
        if cfg.backend == StorageBackendKind::Local && cfg.local_root.as_os_str().is_empty() {
            return Err(DatalakeConfigError::InvalidValue(format!(
                "{}: must not be empty when {} is {}",
                STORAGE_LOCAL_ROOT_PROP, STORAGE_BACKEND_PROP, cfg.backend
            )));
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackendKind,
    pub local_root: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self { backend: StorageBackendKind::None, local_root: PathBuf::new() }
    }
}
