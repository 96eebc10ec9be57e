//! This module is used for specifying the set of expected configurations.
use crate::config::DatalakeConfigError;
use std::fmt;
use std::str::FromStr;
use tracing::{error, trace};

/// `ConfigDefImportance` provides the levels of importance that different properties have.
#[derive(Debug, PartialEq, Clone)]
pub enum ConfigDefImportance {
    High,
    Medium,
    Low,
}

type ConfigValidator<T> = Box<dyn Fn(Option<&T>) -> Result<(), DatalakeConfigError>>;

/// `ConfigDef` defines a configuration property, its documentation, default and validation.
pub struct ConfigDef<T> {
    /// The configuration key that is used to apply this value
    pub key: String,
    /// How important the configuration definition is
    importance: ConfigDefImportance,
    /// `default` of the value
    default: Option<T>,
    /// The documentation of the field, used for showing errors
    doc: &'static str,
    /// Whether or not this variable was provided by the configuration file.
    provided: bool,
    /// The current value, be it the default or overwritten by config
    value: Option<T>,
    /// A validator to ensure the new field value is correct
    validator: Option<ConfigValidator<T>>,
}

impl<T> fmt::Debug for ConfigDef<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigDef")
            .field("key", &self.key)
            .field("importance", &self.importance)
            .field("default", &self.default)
            .field("provided", &self.provided)
            .field("value", &self.value)
            .field("validator_exists", &self.validator.is_some())
            .finish()
    }
}

impl<T> Default for ConfigDef<T> {
    fn default() -> Self {
        Self {
            importance: ConfigDefImportance::Low,
            doc: "",
            key: String::from("unset.key"),
            default: None,
            provided: false,
            value: None,
            validator: None,
        }
    }
}

impl<T> ConfigDef<T>
where
    T: FromStr,
    DatalakeConfigError: From<<T as FromStr>::Err>,
    <T as FromStr>::Err: fmt::Display,
    T: fmt::Debug,
{
    /// Sets the `key` value, this comes from const &str values in the calling modules
    pub fn with_key(mut self, key: &str) -> Self {
        self.key = key.to_string();
        self
    }

    pub fn with_doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }

    pub fn with_importance(mut self, importance: ConfigDefImportance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_default(mut self, default: T) -> Self
    where
        T: Clone,
    {
        self.value = Some(default.clone());
        self.default = Some(default);
        self
    }

    pub fn with_validator(mut self, validator: ConfigValidator<T>) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn set_value(&mut self, value: T) {
        self.value = Some(value);
        self.provided = true;
    }

    pub fn try_set_parsed_value(&mut self, value: &str) -> Result<(), DatalakeConfigError> {
        match value.trim().parse::<_>() {
            Ok(val) => {
                trace!("ConfigDef {} = {:?}", self.key, val);
                self.set_value(val);
                Ok(())
            },
            Err(err) => {
                error!(
                    "Unable to parse property {} {:?} : {}. Doc: {}",
                    self.key, value, err, self.doc
                );
                Err(DatalakeConfigError::from(err))
            },
        }
    }

    pub fn at_least(data: Option<&T>, rhs: &T, key: &str) -> Result<(), DatalakeConfigError>
    where
        T: PartialOrd + fmt::Display,
    {
        match data {
            Some(val) => {
                if val < rhs {
                    Err(DatalakeConfigError::InvalidValue(format!(
                        "{}: '{}' should be at least {}",
                        key, val, rhs
                    )))
                } else {
                    Ok(())
                }
            },
            None => {
                error!("Running at_least() with no value provided for ConfigDef {}", key);
                Err(DatalakeConfigError::ComparisonOnNone(key.to_string()))
            },
        }
    }

    pub fn get_value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    /// One line describing the property: key, importance, current value and documentation.
    pub fn describe(&self) -> String {
        let value = match &self.value {
            Some(value) => format!("{:?}", value),
            None => String::from("<unset>"),
        };
        format!("{}\t{:?}\t{}\t{}", self.key, self.importance, value, self.doc)
    }

    pub fn is_provided(&self) -> bool {
        self.provided
    }

    pub fn validate(&self) -> Result<(), DatalakeConfigError> {
        match &self.validator {
            Some(validator) => (validator)(self.value.as_ref()),
            None => Ok(()),
        }
    }

    /// `build` does not consume self, a property may be read initially from a .properties file
    /// and later overridden from the command line, the validator and default must survive that.
    pub fn build(&mut self) -> Result<T, DatalakeConfigError>
    where
        T: Clone,
    {
        self.validate()?;
        match &self.value {
            Some(value) => Ok(value.clone()),
            None => Err(DatalakeConfigError::MissingKey(self.key.to_string())),
        }
    }
}
