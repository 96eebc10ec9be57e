//! Metadata describing a single datalake file.
//! Only `start` and `end` are interpreted here, any other field is carried as-is in `extra`.

use serde_derive::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Epoch milliseconds of the first event in the file.
    pub start: u64,
    /// Epoch milliseconds of the last event in the file, absent for instantaneous files.
    /// An explicit `"end": null` reads as `None` and `None` is never written, so such a document
    /// is re-encoded without the `end` key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<u64>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metadata {
    pub fn new(start: u64, end: Option<u64>) -> Self {
        Self { start, end, extra: BTreeMap::new() }
    }

    /// Adds an opaque descriptive field.
    pub fn with_field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    /// The end of the interval, an absent `end` is the same as `start`.
    pub fn effective_end(&self) -> u64 {
        self.end.unwrap_or(self.start)
    }

    pub fn from_json_slice(input: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(input)
    }

    pub fn to_json_vec(&self) -> Result<Vec<u8>, serde_json::Error> {
        serde_json::to_vec(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn it_round_trips_extra_fields() {
        let metadata = Metadata::new(1_000, Some(2_000))
            .with_field("what", "syslog")
            .with_field("where", "webserver02")
            .with_field("version", 0);
        let encoded = metadata.to_json_vec().unwrap();
        let decoded = Metadata::from_json_slice(&encoded).unwrap();
        assert_eq!(decoded, metadata);
        assert_eq!(decoded.extra.get("what"), Some(&json!("syslog")));
    }

    #[test]
    fn it_omits_absent_end() {
        let metadata = Metadata::new(1_000, None);
        let encoded: Value = serde_json::from_slice(&metadata.to_json_vec().unwrap()).unwrap();
        assert_eq!(encoded, json!({"start": 1_000}));
        assert_eq!(metadata.effective_end(), 1_000);
    }

    #[test]
    fn it_treats_null_end_as_absent() {
        let decoded =
            Metadata::from_json_slice(br#"{"start": 5, "end": null, "id": "abc"}"#).unwrap();
        assert_eq!(decoded.end, None);
        assert_eq!(decoded.extra.get("id"), Some(&json!("abc")));
        let encoded: Value = serde_json::from_slice(&decoded.to_json_vec().unwrap()).unwrap();
        assert_eq!(encoded, json!({"start": 5, "id": "abc"}));
    }

    #[test]
    fn it_requires_start() {
        assert!(Metadata::from_json_slice(br#"{"end": 5}"#).is_err());
        assert!(Metadata::from_json_slice(br#"{"start": -5}"#).is_err());
    }
}
