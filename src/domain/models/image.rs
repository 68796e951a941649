use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// A chart image in the transport encoding the backend expects (standard base64).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(STANDARD.encode(bytes))
    }

    /// Wrap an already-encoded payload. A `data:<mime>;base64,` prefix is stripped.
    pub fn from_base64(encoded: impl Into<String>) -> Self {
        let encoded: String = encoded.into();
        match encoded.split_once(";base64,") {
            Some((prefix, data)) if prefix.starts_with("data:") => Self(data.to_string()),
            _ => Self(encoded),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
