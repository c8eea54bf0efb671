//! Decoding of envelope payloads into typed values.
//!
//! An absent envelope and an envelope with an empty `data` map are both
//! "nothing to decode"; callers decide whether that is an error. Anything
//! else is decoded against the target type's schema and either fully
//! succeeds or fails with [`Error::Decode`].

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use vaultkv_common::{Error, Result};
use vaultkv_logical::{Secret, SecretData};

/// Key listing returned by `list` operations.
#[derive(Debug, Clone, Deserialize)]
pub struct KeyList {
    pub keys: Vec<String>,
}

/// Extract the payload of an envelope, if there is one to decode.
pub fn payload(secret: Option<Secret>) -> Option<SecretData> {
    secret.map(|s| s.data).filter(|data| !data.is_empty())
}

/// Decode a payload into `T`.
pub fn decode<T: DeserializeOwned>(data: SecretData) -> Result<T> {
    serde_json::from_value(Value::Object(data)).map_err(|e| Error::Decode(e.to_string()))
}

/// Encode `value` as a payload for a write.
pub fn encode<T: Serialize>(value: &T) -> Result<SecretData> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(Error::Decode(format!(
            "expected an object payload, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: Value) -> SecretData {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_payload_absent_or_empty() {
        assert!(payload(None).is_none());
        assert!(payload(Some(Secret::default())).is_none());

        let secret = Secret::with_data(data(json!({"a": 1})));
        assert_eq!(payload(Some(secret)).unwrap()["a"], 1);
    }

    #[test]
    fn test_decode_key_list() {
        let list: KeyList = decode(data(json!({"keys": ["foo", "bar/"]}))).unwrap();
        assert_eq!(list.keys, vec!["foo", "bar/"]);
    }

    #[test]
    fn test_decode_wrong_shape_fails() {
        let result: Result<KeyList> = decode(data(json!({"keys": "foo"})));
        assert!(matches!(result, Err(Error::Decode(_))));

        let result: Result<KeyList> = decode(data(json!({"other": []})));
        assert!(matches!(result, Err(Error::Decode(_))));
    }

    #[test]
    fn test_encode_requires_object() {
        assert!(encode(&json!({"a": 1})).is_ok());
        assert!(matches!(encode(&42), Err(Error::Decode(_))));
    }
}
