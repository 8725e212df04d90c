//! Unpadded, URL-safe base64 as used by every JOSE structure

use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error;

/// Owned bytes that are encoded as unpadded base64url when displayed or
/// serialized
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Base64Url(Vec<u8>);

impl Base64Url {
    /// Wraps raw, unencoded bytes
    #[inline]
    pub fn from_raw(raw: impl Into<Vec<u8>>) -> Self {
        Self(raw.into())
    }

    /// Decodes an unpadded base64url value
    ///
    /// # Errors
    ///
    /// The value contains characters outside of the base64url alphabet, or
    /// has trailing padding.
    pub fn from_encoded(enc: impl AsRef<[u8]>) -> Result<Self, error::InvalidBase64Data> {
        URL_SAFE_NO_PAD
            .decode(enc)
            .map(Self)
            .map_err(error::InvalidBase64Data::from)
    }

    /// The raw bytes
    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Base64Url {
    #[inline]
    fn from(raw: Vec<u8>) -> Self {
        Self(raw)
    }
}

impl fmt::Display for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&URL_SAFE_NO_PAD.encode(&self.0))
    }
}

impl fmt::Debug for Base64Url {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "\"{self}\"")
    }
}

impl Serialize for Base64Url {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Base64Url {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::from_encoded(raw.as_bytes()).map_err(serde::de::Error::custom)
    }
}
