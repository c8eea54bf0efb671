//! Generic response envelope returned by every logical operation.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Untyped key/value payload of a secret.
pub type SecretData = Map<String, Value>;

/// Query parameters sent with `read_with_data` and `delete_with_data`.
pub type QueryData = BTreeMap<String, Vec<String>>;

/// Response-wrapping information attached to a wrapped response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WrapInfo {
    /// Single-use token that unwraps the response.
    pub token: String,
    /// Accessor of the wrapping token.
    #[serde(default)]
    pub accessor: String,
    /// Time-to-live of the wrapping token in seconds.
    #[serde(default)]
    pub ttl: u64,
    /// RFC 3339 creation timestamp.
    #[serde(default)]
    pub creation_time: String,
    /// Path of the request that produced the wrapped response.
    #[serde(default)]
    pub creation_path: String,
}

/// Secret envelope as returned by the backend.
///
/// Engines only ever look at `data`; the remaining fields are carried so the
/// envelope can be inspected or logged as a whole.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Secret {
    #[serde(default, deserialize_with = "null_as_default")]
    pub request_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub lease_id: String,
    #[serde(default)]
    pub lease_duration: u64,
    #[serde(default)]
    pub renewable: bool,
    /// Response payload.
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: SecretData,
    #[serde(default, deserialize_with = "null_as_default")]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub wrap_info: Option<WrapInfo>,
}

impl Secret {
    /// Create an envelope carrying only `data`.
    pub fn with_data(data: SecretData) -> Self {
        Self {
            data,
            ..Self::default()
        }
    }

    /// Whether the envelope carries a non-empty payload.
    pub fn has_data(&self) -> bool {
        !self.data.is_empty()
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
