use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use super::Algorithm;
use crate::{error, Base64Url};

const MIN_MODULUS_LEN: usize = 2048 / 8;
const MAX_MODULUS_LEN: usize = 8192 / 8;

/// RSA public key components
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PublicKeyDto")]
pub struct PublicKey {
    /// The public modulus
    #[serde(rename = "n")]
    modulus: Base64Url,

    /// The public exponent
    #[serde(rename = "e")]
    exponent: Base64Url,
}

impl PublicKey {
    /// The public key's modulus
    #[must_use]
    pub fn modulus(&self) -> &Base64Url {
        &self.modulus
    }

    /// The public key's exponent
    #[must_use]
    pub fn exponent(&self) -> &Base64Url {
        &self.exponent
    }

    /// Constructs a public key from the modulus and exponent
    ///
    /// # Errors
    ///
    /// The modulus is shorter than 2048 bits or longer than 8192 bits, or
    /// the exponent is empty.
    pub fn from_components(
        modulus: impl Into<Base64Url>,
        exponent: impl Into<Base64Url>,
    ) -> Result<Self, error::InvalidRsaKey> {
        let modulus = modulus.into();
        let exponent = exponent.into();

        let significant = modulus
            .as_slice()
            .iter()
            .skip_while(|&&b| b == 0)
            .count();
        if !(MIN_MODULUS_LEN..=MAX_MODULUS_LEN).contains(&significant) {
            return Err(error::InvalidRsaKey(
                "modulus must be between 2048 and 8192 bits",
            ));
        }

        if exponent.as_slice().iter().all(|&b| b == 0) {
            return Err(error::InvalidRsaKey("exponent must be non-zero"));
        }

        Ok(Self { modulus, exponent })
    }

    /// Verifies `signature` over `data` with the given algorithm
    ///
    /// # Errors
    ///
    /// The signature was not produced by the private half of this key.
    pub fn verify(
        &self,
        alg: Algorithm,
        data: &[u8],
        signature: &[u8],
    ) -> Result<(), error::KeyRefused> {
        let pk = ring::signature::RsaPublicKeyComponents {
            n: self.modulus.as_slice(),
            e: self.exponent.as_slice(),
        };

        pk.verify(alg.verification_params(), data, signature)
            .map_err(|_| error::KeyRefused::SignatureMismatch)
    }
}

impl TryFrom<PublicKeyDto> for PublicKey {
    type Error = error::InvalidRsaKey;

    fn try_from(dto: PublicKeyDto) -> Result<Self, Self::Error> {
        Self::from_components(dto.modulus, dto.exponent)
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
struct PublicKeyDto {
    #[serde(rename = "n")]
    modulus: Base64Url,

    #[serde(rename = "e")]
    exponent: Base64Url,
}
