use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::StorageError;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

/// Encode a JSON column value.
pub(super) fn to_json<T: Serialize>(field: &'static str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value)
        .map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

/// Decode a JSON column value.
pub(super) fn from_json<T: DeserializeOwned>(
    field: &'static str,
    raw: &str,
) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(|e| StorageError::Serialization(format!("{field}: {e}")))
}

pub(super) fn version_from_i64(value: i64) -> Result<u32, StorageError> {
    u32::try_from(value).map_err(|_| StorageError::Serialization(format!("invalid version: {value}")))
}
