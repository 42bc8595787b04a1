//! # JSON Payload Serialization
//!
//! Every frame payload is a JSON document. This module provides the shared
//! trait used by request and response bodies, plus serde adapters that
//! normalise the two field encodings that JSON has no native form for:
//!
//! - **Byte fields** (ciphertext, file contents) travel as standard base64 strings
//! - **Timestamps** travel as RFC3339 strings with nanosecond precision
//!
//! ## Usage
//! ```ignore
//! use vault_protocol::core::serialization::JsonBody;
//!
//! let payload = request.to_payload()?;
//! let decoded = AuthRequest::from_payload(&payload)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ProtocolError, Result};

/// Trait for message bodies carried as a JSON payload
pub trait JsonBody: Serialize + for<'de> Deserialize<'de> + Sized {
    /// Serialize the body to payload bytes
    fn to_payload(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(ProtocolError::Json)
    }

    /// Deserialize a body from payload bytes
    fn from_payload(data: &[u8]) -> Result<Self> {
        serde_json::from_slice(data).map_err(ProtocolError::Json)
    }
}

/// Serde adapter for `Vec<u8>` fields encoded as standard base64 strings.
pub mod base64_bytes {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&STANDARD.encode(bytes))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        // null decodes to an empty buffer, matching clients that omit empty data
        let encoded = Option::<String>::deserialize(deserializer)?.unwrap_or_default();
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(|e| serde::de::Error::custom(format!("invalid base64: {e}")))
    }
}

/// Serde adapter for RFC3339 timestamps with nanosecond precision.
pub mod rfc3339 {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        super::parse_timestamp(&raw).map_err(serde::de::Error::custom)
    }
}

/// Serde adapter for sync cursors: an empty or missing value means the epoch.
pub mod sync_cursor {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(DateTime::UNIX_EPOCH),
            Some(raw) if raw.trim().is_empty() => Ok(DateTime::UNIX_EPOCH),
            Some(raw) => super::parse_timestamp(&raw).map_err(serde::de::Error::custom),
        }
    }
}

/// Deserialize `null` as `T::default()` (empty maps and lists).
pub fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn parse_timestamp(raw: &str) -> std::result::Result<chrono::DateTime<chrono::Utc>, String> {
    chrono::DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&chrono::Utc))
        .map_err(|e| format!("invalid RFC3339 timestamp '{raw}': {e}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "base64_bytes")]
        data: Vec<u8>,
        #[serde(with = "rfc3339")]
        at: DateTime<Utc>,
    }

    impl JsonBody for Blob {}

    #[derive(Debug, Deserialize)]
    struct Cursor {
        #[serde(default = "epoch", with = "sync_cursor")]
        last_sync: DateTime<Utc>,
    }

    fn epoch() -> DateTime<Utc> {
        DateTime::UNIX_EPOCH
    }

    #[test]
    fn test_bytes_encode_as_base64() {
        let blob = Blob {
            data: b"hello".to_vec(),
            at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        };
        let json = String::from_utf8(blob.to_payload().unwrap()).unwrap();
        assert!(json.contains(r#""data":"aGVsbG8=""#), "{json}");
        assert!(json.contains(r#""at":"2024-05-01T12:00:00Z""#), "{json}");
    }

    #[test]
    fn test_nanosecond_precision_survives() {
        let at = Utc.timestamp_opt(1_700_000_000, 123_456_789).unwrap();
        let blob = Blob { data: vec![], at };
        let back = Blob::from_payload(&blob.to_payload().unwrap()).unwrap();
        assert_eq!(back.at, at);
    }

    #[test]
    fn test_null_bytes_decode_empty() {
        let back = Blob::from_payload(br#"{"data":null,"at":"2024-01-01T00:00:00Z"}"#).unwrap();
        assert!(back.data.is_empty());
    }

    #[test]
    fn test_invalid_base64_rejected() {
        let result = Blob::from_payload(br#"{"data":"!!!","at":"2024-01-01T00:00:00Z"}"#);
        assert!(matches!(result, Err(ProtocolError::Json(_))));
    }

    #[test]
    fn test_sync_cursor_defaults_to_epoch() {
        let empty: Cursor = serde_json::from_str(r#"{"last_sync":""}"#).unwrap();
        let missing: Cursor = serde_json::from_str("{}").unwrap();
        let null: Cursor = serde_json::from_str(r#"{"last_sync":null}"#).unwrap();
        assert_eq!(empty.last_sync, DateTime::UNIX_EPOCH);
        assert_eq!(missing.last_sync, DateTime::UNIX_EPOCH);
        assert_eq!(null.last_sync, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn test_sync_cursor_accepts_offsets() {
        let cursor: Cursor =
            serde_json::from_str(r#"{"last_sync":"2024-03-01T10:00:00+02:00"}"#).unwrap();
        assert_eq!(
            cursor.last_sync,
            Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap()
        );
    }
}
