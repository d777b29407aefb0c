//! Stored item envelope
//!
//! Values are persisted wrapped in a small JSON envelope carrying the write
//! timestamp and an optional TTL, so expiry can be evaluated lazily on read
//! without any background process.

use crate::error::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Envelope persisted in place of a raw value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItem {
    pub value: String,
    /// Epoch milliseconds at write time
    pub timestamp: i64,
    /// Time-to-live in seconds; `None` never expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl: Option<u64>,
}

/// Result of decoding a raw stored string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decoded {
    pub value: String,
    pub expired: bool,
}

/// Current wall-clock time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

impl StorageItem {
    /// Create an envelope stamped with the current time
    pub fn new(value: impl Into<String>, ttl: Option<u64>) -> Self {
        Self::with_timestamp(value, now_millis(), ttl)
    }

    /// Create an envelope with an explicit timestamp
    pub fn with_timestamp(value: impl Into<String>, timestamp: i64, ttl: Option<u64>) -> Self {
        Self {
            value: value.into(),
            timestamp,
            ttl,
        }
    }

    /// Epoch milliseconds at which the item expires, if it has a TTL
    pub fn expires_at(&self) -> Option<i64> {
        self.ttl.map(|ttl| {
            let ttl_ms = i64::try_from(ttl).unwrap_or(i64::MAX).saturating_mul(1000);
            self.timestamp.saturating_add(ttl_ms)
        })
    }

    /// Expired iff a TTL is present and `now >= timestamp + ttl * 1000`
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at().is_some_and(|expires| now >= expires)
    }

    /// Check expiry against the current time
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(now_millis())
    }
}

/// Wrap `value` in a fresh envelope and serialize it.
///
/// An explicit `ttl` wins over `default_ttl`.
pub fn encode(value: &str, ttl: Option<u64>, default_ttl: Option<u64>) -> Result<String> {
    let item = StorageItem::new(value, ttl.or(default_ttl));
    Ok(serde_json::to_string(&item)?)
}

/// Decode a raw stored string using the current time
pub fn decode(raw: &str) -> Decoded {
    decode_at(raw, now_millis())
}

/// Decode a raw stored string, evaluating expiry at `now`.
///
/// Anything that is not an envelope is a value written before envelopes
/// existed: it is returned unchanged and never expires.
pub fn decode_at(raw: &str, now: i64) -> Decoded {
    match serde_json::from_str::<StorageItem>(raw) {
        Ok(item) => Decoded {
            expired: item.is_expired_at(now),
            value: item.value,
        },
        Err(_) => Decoded {
            value: raw.to_string(),
            expired: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_produces_envelope() {
        let raw = encode("hello", Some(60), None).unwrap();
        let item: StorageItem = serde_json::from_str(&raw).unwrap();

        assert_eq!(item.value, "hello");
        assert_eq!(item.ttl, Some(60));
        assert!((now_millis() - item.timestamp).abs() < 5_000);
    }

    #[test]
    fn test_encode_ttl_precedence() {
        let explicit: StorageItem =
            serde_json::from_str(&encode("v", Some(5), Some(100)).unwrap()).unwrap();
        assert_eq!(explicit.ttl, Some(5));

        let defaulted: StorageItem =
            serde_json::from_str(&encode("v", None, Some(100)).unwrap()).unwrap();
        assert_eq!(defaulted.ttl, Some(100));

        let none: StorageItem = serde_json::from_str(&encode("v", None, None).unwrap()).unwrap();
        assert_eq!(none.ttl, None);
    }

    #[test]
    fn test_absent_ttl_is_omitted_from_json() {
        let raw = serde_json::to_string(&StorageItem::with_timestamp("v", 42, None)).unwrap();
        assert_eq!(raw, r#"{"value":"v","timestamp":42}"#);
    }

    #[test]
    fn test_expiry_boundary() {
        let item = StorageItem::with_timestamp("v", 1_000, Some(1));
        assert_eq!(item.expires_at(), Some(2_000));
        assert!(!item.is_expired_at(1_999));
        assert!(item.is_expired_at(2_000));
        assert!(item.is_expired_at(2_100));
    }

    #[test]
    fn test_zero_ttl_is_immediately_expired() {
        let item = StorageItem::with_timestamp("v", 1_000, Some(0));
        assert!(item.is_expired_at(1_000));
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let item = StorageItem::with_timestamp("v", 0, None);
        assert!(!item.is_expired_at(i64::MAX));
    }

    #[test]
    fn test_huge_ttl_does_not_overflow() {
        let item = StorageItem::with_timestamp("v", now_millis(), Some(u64::MAX));
        assert_eq!(item.expires_at(), Some(i64::MAX));
        assert!(!item.is_expired());
    }

    #[test]
    fn test_decode_envelope() {
        let raw = r#"{"value":"abc","timestamp":1000,"ttl":10}"#;
        assert_eq!(
            decode_at(raw, 5_000),
            Decoded {
                value: "abc".into(),
                expired: false
            }
        );
        assert!(decode_at(raw, 11_000).expired);
    }

    #[test]
    fn test_decode_null_ttl() {
        let decoded = decode_at(r#"{"value":"abc","timestamp":1000,"ttl":null}"#, i64::MAX);
        assert_eq!(decoded.value, "abc");
        assert!(!decoded.expired);
    }

    #[test]
    fn test_decode_legacy_values() {
        for raw in ["plain-token", "", "{not json", r#"{"id":1,"name":"x"}"#, "42"] {
            let decoded = decode(raw);
            assert_eq!(decoded.value, raw);
            assert!(!decoded.expired);
        }
    }
}
