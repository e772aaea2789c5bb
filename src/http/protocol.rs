//! HTTP endpoints and the JSON bodies they exchange

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::Fields;

/// Lists every field of a hash
pub const ENDPOINT_LIST: &str = "/list";
/// Writes fields into a hash
pub const ENDPOINT_ADD: &str = "/add";

#[derive(Debug, Serialize, Deserialize)]
pub struct ListRequest {
    /// Hash key; absent decodes as empty and is rejected by validation
    #[serde(default)]
    pub key: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct ListResponse {
    pub data: Fields,
}

/// Body of an add request: the hash key plus any number of fields.
///
/// `{"key": "jobs", "job_1": "queued", "attempts": 3}` writes `job_1=queued`
/// and `attempts=3` under `jobs`.
#[derive(Debug, Deserialize)]
pub struct AddRequest {
    #[serde(default)]
    pub key: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl AddRequest {
    /// Payload as hash fields; non-string values are stored as compact JSON
    pub fn fields(&self) -> Fields {
        self.payload
            .iter()
            .map(|(field, value)| {
                let value = match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                };
                (field.clone(), value)
            })
            .collect()
    }
}
