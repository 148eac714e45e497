//! Serde helpers for opaque byte payloads.

/// Serializes `Vec<u8>` as a standard base64 string.
///
/// Use with `#[serde(with = "relay_core::encoding::base64")]`.
pub mod base64 {
    use ::base64::Engine;
    use ::base64::engine::general_purpose::STANDARD;
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
        let encoded = String::deserialize(deserializer)?;
        STANDARD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super::base64")]
        payload: Vec<u8>,
    }

    #[test]
    fn test_payload_is_base64_text() {
        let json = serde_json::to_string(&Wrapper {
            payload: b"partial-result-1".to_vec(),
        })
        .unwrap();
        assert_eq!(json, r#"{"payload":"cGFydGlhbC1yZXN1bHQtMQ=="}"#);
    }

    #[test]
    fn test_invalid_base64_is_rejected() {
        let result = serde_json::from_str::<Wrapper>(r#"{"payload":"not base64!"}"#);
        assert!(result.is_err());
    }
}
