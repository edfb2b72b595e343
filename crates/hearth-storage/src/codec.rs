//! JSON encoding shared by the adapters.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::{ReadError, Snapshot, WriteError};

pub fn encode(key: &str, snapshot: &Snapshot) -> Result<String, WriteError> {
    serde_json::to_string(snapshot).map_err(|source| WriteError::Encode {
        key: key.to_string(),
        source,
    })
}

/// `null` documents decode as absent. Bytes that are not UTF-8 JSON are
/// `Malformed`, like any other unparsable document.
pub fn decode(key: &str, raw: &[u8]) -> Result<Option<Snapshot>, ReadError> {
    match serde_json::from_slice::<Snapshot>(raw) {
        Ok(Snapshot::Null) => Ok(None),
        Ok(v) => Ok(Some(v)),
        Err(source) => Err(ReadError::Malformed {
            key: key.to_string(),
            source,
        }),
    }
}

/// Convert a typed value into a snapshot.
pub fn to_snapshot<T: Serialize>(value: &T) -> serde_json::Result<Snapshot> {
    serde_json::to_value(value)
}

/// Read a snapshot back as a typed value.
pub fn from_snapshot<T: DeserializeOwned>(snapshot: &Snapshot) -> serde_json::Result<T> {
    T::deserialize(snapshot)
}
