//! Reasons a key or token is refused
//!
//! A token fails verification in one of three ways, and [`JwtVerifyError`]
//! keeps them apart: it cannot be decoded, the selected key refuses it, or
//! its claims do not pass the [`CoreValidator`](crate::jwt::CoreValidator).
//! Only [`ClaimsRejected`] carries detail meant to be shown to a client.

#![allow(missing_copy_implementations)]

use std::{error::Error as StdError, fmt};

use thiserror::Error;

use crate::jwa;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// A value was not unpadded base64url
#[derive(Debug, Error)]
#[error("invalid base64url data")]
pub struct InvalidBase64Data(#[from] base64::DecodeError);

/// An algorithm name outside the supported RSA family
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unsupported algorithm '{0}'")]
pub struct UnknownAlgorithm(pub(crate) String);

/// Published RSA parameters that cannot form a usable key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
#[error("unusable RSA key: {0}")]
pub struct InvalidRsaKey(pub(crate) &'static str);

/// The key selected for a token refused to verify it
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum KeyRefused {
    /// The key is published for a use other than signatures
    #[error("key is not published for signature verification")]
    NotForSigning,

    /// The key is pinned to a different algorithm than the token names
    #[error("key only verifies {key_alg}, token is signed with {token_alg}")]
    AlgorithmMismatch {
        /// The algorithm the key is pinned to
        key_alg: jwa::Algorithm,
        /// The algorithm named in the token header
        token_alg: jwa::Algorithm,
    },

    /// The signature was not made by this key
    #[error("signature does not match")]
    SignatureMismatch,
}

/// A section of a compact token
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Section {
    /// The JOSE header
    Header,
    /// The claims
    Payload,
    /// The signature
    Signature,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Header => "header",
            Self::Payload => "payload",
            Self::Signature => "signature",
        })
    }
}

/// A token failed verification
#[derive(Debug, Error)]
pub enum JwtVerifyError {
    /// The token is not three `.`-separated sections
    #[error("token does not have three sections")]
    NotThreeSections,

    /// A section is not valid base64url or not valid JSON
    #[error("token {section} cannot be decoded")]
    Undecodable {
        /// The offending section
        section: Section,
        /// What went wrong while decoding it
        #[source]
        source: BoxError,
    },

    /// The selected key refused the token
    #[error("token refused by key")]
    KeyRefused(#[from] KeyRefused),

    /// The claims failed validation
    #[error("token claims rejected")]
    ClaimsRejected(#[from] ClaimsRejected),
}

impl JwtVerifyError {
    /// The section that could not be decoded, if that is why the token
    /// failed
    #[must_use]
    pub fn undecodable_section(&self) -> Option<Section> {
        match self {
            Self::Undecodable { section, .. } => Some(*section),
            _ => None,
        }
    }
}

pub(crate) fn undecodable(section: Section, source: impl Into<BoxError>) -> JwtVerifyError {
    JwtVerifyError::Undecodable {
        section,
        source: source.into(),
    }
}

/// A claim failed validation
///
/// The messages name the claim without quoting its value, except for
/// [`UnexpectedClaimValue`](Self::UnexpectedClaimValue), whose source
/// describes the offending JSON.
#[derive(Debug, Error)]
pub enum ClaimsRejected {
    /// The header algorithm is not approved
    #[error("algorithm not approved")]
    InvalidAlgorithm,

    /// None of the token's audiences is accepted
    #[error("invalid audience")]
    InvalidAudience,

    /// The issuer is not the required one
    #[error("invalid issuer")]
    InvalidIssuer,

    /// `exp` lies in the past
    #[error("token has expired")]
    TokenExpired,

    /// `nbf` lies in the future
    #[error("token is not valid yet")]
    TokenNotYetValid,

    /// A claim the validator requires is absent
    #[error("required {_0} claim missing")]
    MissingRequiredClaim(&'static str),

    /// The payload is JSON but does not have the shape of the claims type
    #[error("unexpected claim value: {0}")]
    UnexpectedClaimValue(#[source] serde_json::Error),
}
