//! Published RSA verification keys ([RFC7517][])
//!
//! [RFC7517]: https://tools.ietf.org/html/rfc7517

use aliri_braid::braid;
use serde::{Deserialize, Serialize};

use crate::{error::KeyRefused, jwa};

/// The `kid` a key is published under
#[braid(serde, ref_doc = "A borrowed reference to a [`KeyId`]")]
pub struct KeyId;

/// A public key from an issuer's key set
///
/// Only RSA keys (`"kty": "RSA"`) deserialize. The optional `kid`, `use`,
/// and `alg` members narrow which tokens the key will verify.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[must_use]
pub struct Jwk {
    kty: KeyType,

    #[serde(rename = "kid", default, skip_serializing_if = "Option::is_none")]
    key_id: Option<KeyId>,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    usage: Option<jwa::Usage>,

    #[serde(rename = "alg", default, skip_serializing_if = "Option::is_none")]
    algorithm: Option<jwa::Algorithm>,

    #[serde(flatten)]
    key: jwa::RsaPublicKey,
}

impl Jwk {
    /// The identifier the key is published under
    #[must_use]
    pub fn key_id(&self) -> Option<&KeyIdRef> {
        self.key_id.as_deref()
    }

    /// The declared use of the key
    #[must_use]
    pub fn usage(&self) -> Option<jwa::Usage> {
        self.usage
    }

    /// The only algorithm the key may be used with, if pinned
    #[must_use]
    pub fn algorithm(&self) -> Option<jwa::Algorithm> {
        self.algorithm
    }

    /// Whether this key may check a signature made with `alg`
    #[must_use]
    pub fn permits(&self, alg: jwa::Algorithm) -> bool {
        self.check_permits(alg).is_ok()
    }

    /// Checks `signature` over `data`
    ///
    /// # Errors
    ///
    /// The key is published for encryption, is pinned to an algorithm other
    /// than `alg`, or did not make the signature.
    pub fn verify(
        &self,
        alg: jwa::Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), KeyRefused> {
        self.check_permits(alg)?;
        self.key.verify(alg, data, signature)
    }

    fn check_permits(&self, alg: jwa::Algorithm) -> Result<(), KeyRefused> {
        if self.usage.is_some_and(|u| u != jwa::Usage::Signing) {
            return Err(KeyRefused::NotForSigning);
        }

        match self.algorithm {
            Some(key_alg) if key_alg != alg => Err(KeyRefused::AlgorithmMismatch {
                key_alg,
                token_alg: alg,
            }),
            _ => Ok(()),
        }
    }
}

impl From<jwa::RsaPublicKey> for Jwk {
    fn from(key: jwa::RsaPublicKey) -> Self {
        Self {
            kty: KeyType::Rsa,
            key_id: None,
            usage: None,
            algorithm: None,
            key,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
enum KeyType {
    #[serde(rename = "RSA")]
    Rsa,
}
