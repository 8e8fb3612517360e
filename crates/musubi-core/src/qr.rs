//! QR check-in payload.
//!
//! A member's QR code encodes a small JSON object such as
//! `{"type":"musubi_member","uid":"..."}`. The `type` marker identifies
//! payloads minted by this application; scanners must check it before
//! trusting the uid.

use serde::{Deserialize, Serialize};

/// Marker carried by payloads this application generates.
pub const MEMBER_PAYLOAD_TYPE: &str = "musubi_member";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrPayload {
    #[serde(rename = "type")]
    pub payload_type: String,
    pub uid: String,
}

impl QrPayload {
    /// The payload a member shows to be scanned in.
    pub fn for_member(uid: impl Into<String>) -> Self {
        Self {
            payload_type: MEMBER_PAYLOAD_TYPE.into(),
            uid: uid.into(),
        }
    }

    pub fn encode(&self) -> String {
        // Serializing two string fields cannot fail.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a scanned string. Only the JSON shape is checked here; the
    /// caller validates the marker.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw.trim())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn member_payload_has_marker() {
        let encoded = QrPayload::for_member("uid-1").encode();
        assert!(encoded.contains("\"type\":\"musubi_member\""));
        assert!(encoded.contains("\"uid\":\"uid-1\""));
    }

    #[test]
    fn decodes_scanned_text() {
        let payload = QrPayload::decode(" {\"type\":\"musubi_member\",\"uid\":\"abc\"} ").unwrap();
        assert_eq!(payload, QrPayload::for_member("abc"));
    }

    #[test]
    fn rejects_non_json() {
        assert!(QrPayload::decode("https://example.com").is_err());
        assert!(QrPayload::decode("{\"uid\":\"abc\"}").is_err());
    }
}
