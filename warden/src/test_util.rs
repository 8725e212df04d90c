//! Fixed RSA keys and a token signer for tests
//!
//! Nothing here is meant for production use: the private keys are checked
//! into the repository.

use base64::{engine::general_purpose::STANDARD, Engine};
use ring::{rand::SystemRandom, signature::RsaKeyPair};
use serde::Serialize;
use thiserror::Error;

use crate::{jwa, jwk, jwt, Base64Url, Jwt};

/// Published key material for the fixed test keys
pub mod rsa {
    /// Key ID of the key that signs tokens by default
    pub const PRIMARY_KEY_ID: &str = "q8JH3Vf2sLr0";
    /// Public JWK of the primary key
    pub const PRIMARY_JWK: &str = include_str!("../data/rsa/primary-jwk.json");
    /// PKCS#8 private key of the primary key
    pub const PRIMARY_PRIVATE_PEM: &str = include_str!("../data/rsa/primary.pem");

    /// Key ID of a second key, used to model key rotation
    pub const ROTATED_KEY_ID: &str = "Zx91kPwNe7Ma";
    /// Public JWK of the rotated key
    pub const ROTATED_JWK: &str = include_str!("../data/rsa/rotated-jwk.json");
    /// PKCS#8 private key of the rotated key
    pub const ROTATED_PRIVATE_PEM: &str = include_str!("../data/rsa/rotated.pem");

    /// A key set publishing only the primary key
    pub const JWKS: &str = include_str!("../data/rsa/jwks.json");
}

/// Failure to produce a test token
#[derive(Debug, Error)]
pub enum SigningError {
    /// The PEM could not be decoded into a usable key pair
    #[error("invalid test key: {0}")]
    InvalidKey(String),
    /// The header or payload could not be serialized
    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
    /// The signing operation failed
    #[error("signing failed")]
    Signing,
}

/// Signs tokens with one of the fixed test keys
#[derive(Debug, Clone)]
#[must_use]
pub struct TestSigner {
    pem: &'static str,
    kid: Option<jwk::KeyId>,
    alg: jwa::Algorithm,
}

impl TestSigner {
    /// Signs as the primary key, naming it in the `kid` header
    pub fn primary() -> Self {
        Self {
            pem: rsa::PRIMARY_PRIVATE_PEM,
            kid: Some(jwk::KeyId::from_static(rsa::PRIMARY_KEY_ID)),
            alg: jwa::Algorithm::RS256,
        }
    }

    /// Signs as the rotated key, naming it in the `kid` header
    pub fn rotated() -> Self {
        Self {
            pem: rsa::ROTATED_PRIVATE_PEM,
            kid: Some(jwk::KeyId::from_static(rsa::ROTATED_KEY_ID)),
            alg: jwa::Algorithm::RS256,
        }
    }

    /// Overrides the `kid` header without changing the signing key
    pub fn with_key_id(self, kid: &str) -> Self {
        Self {
            kid: Some(jwk::KeyId::new(kid.to_owned())),
            ..self
        }
    }

    /// Omits the `kid` header
    pub fn without_key_id(self) -> Self {
        Self { kid: None, ..self }
    }

    /// Signs with a different algorithm and names it in the `alg` header
    pub fn with_algorithm(self, alg: jwa::Algorithm) -> Self {
        Self { alg, ..self }
    }

    /// Serializes `claims` as the payload and signs the token
    ///
    /// # Errors
    ///
    /// The claims cannot be serialized or the key cannot sign.
    pub fn sign<P: Serialize>(&self, claims: &P) -> Result<Jwt, SigningError> {
        self.sign_raw_payload(&serde_json::to_vec(claims)?)
    }

    /// Signs an arbitrary payload, which need not be JSON
    ///
    /// # Errors
    ///
    /// The key cannot sign.
    pub fn sign_raw_payload(&self, payload: &[u8]) -> Result<Jwt, SigningError> {
        let headers = match &self.kid {
            Some(kid) => jwt::BasicHeaders::with_key_id(self.alg, kid.clone()),
            None => jwt::BasicHeaders::new(self.alg),
        };

        let h_raw = Base64Url::from_raw(serde_json::to_vec(&headers)?);
        let p_raw = Base64Url::from_raw(payload);
        let message = format!("{h_raw}.{p_raw}");

        let key_pair = RsaKeyPair::from_pkcs8(&pem_to_der(self.pem)?)
            .map_err(|err| SigningError::InvalidKey(err.to_string()))?;
        let mut signature = vec![0; key_pair.public().modulus_len()];
        key_pair
            .sign(
                signing_params(self.alg),
                &SystemRandom::new(),
                message.as_bytes(),
                &mut signature,
            )
            .map_err(|_| SigningError::Signing)?;

        Ok(Jwt::new(format!("{message}.{}", Base64Url::from_raw(signature))))
    }
}

fn pem_to_der(pem: &str) -> Result<Vec<u8>, SigningError> {
    let body: String = pem
        .lines()
        .filter(|line| !line.starts_with("-----"))
        .collect();

    STANDARD
        .decode(body.trim())
        .map_err(|err| SigningError::InvalidKey(err.to_string()))
}

fn signing_params(alg: jwa::Algorithm) -> &'static dyn ring::signature::RsaEncoding {
    match alg {
        jwa::Algorithm::RS256 => &ring::signature::RSA_PKCS1_SHA256,
        jwa::Algorithm::RS384 => &ring::signature::RSA_PKCS1_SHA384,
        jwa::Algorithm::RS512 => &ring::signature::RSA_PKCS1_SHA512,
        jwa::Algorithm::PS256 => &ring::signature::RSA_PSS_SHA256,
        jwa::Algorithm::PS384 => &ring::signature::RSA_PSS_SHA384,
        jwa::Algorithm::PS512 => &ring::signature::RSA_PSS_SHA512,
    }
}
