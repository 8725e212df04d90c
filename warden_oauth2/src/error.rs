//! Failures of the verification and authorization pipeline

use reqwest::StatusCode;
use thiserror::Error;
use warden::error::{ClaimsRejected, JwtVerifyError};

use crate::InsufficientScope;

/// The key set could not be retrieved from its endpoint
#[derive(Debug, Error)]
#[error("key set unavailable from {url}")]
pub struct KeySetUnavailable {
    url: String,
    #[source]
    source: reqwest::Error,
}

pub(crate) fn key_set_unavailable(url: &str, source: reqwest::Error) -> KeySetUnavailable {
    KeySetUnavailable {
        url: url.to_owned(),
        source,
    }
}

impl KeySetUnavailable {
    /// The endpoint that failed
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// The HTTP status returned by the endpoint, if it answered at all
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        self.source.status()
    }
}

/// Why a token was considered invalid
#[derive(Debug, Error)]
pub enum InvalidToken {
    /// No bearer token was presented, or the `Authorization` header could
    /// not be read
    #[error("authorization token is missing or malformed")]
    MissingOrMalformed,

    /// The token header names an algorithm that is not approved
    #[error("token algorithm is not approved")]
    UnapprovedAlgorithm,

    /// No key in the key set matches the token header
    #[error("no matching key found to validate token")]
    UnknownKeyId,

    /// The token is malformed or its signature does not verify
    #[error(transparent)]
    Rejected(JwtVerifyError),
}

/// A request was not authorized
#[derive(Debug, Error)]
pub enum AuthorityError {
    /// The key set needed to verify the token could not be fetched
    #[error("verification keys are unavailable")]
    KeySetUnavailable(#[from] KeySetUnavailable),

    /// The token is missing, malformed, or not signed by a trusted key
    #[error("invalid token")]
    InvalidToken(#[from] InvalidToken),

    /// The token was correctly signed but has expired
    #[error("token expired")]
    ExpiredToken,

    /// The token was correctly signed but one of its claims was rejected
    #[error("token claims rejected")]
    InvalidClaims(#[source] ClaimsRejected),

    /// The token is valid but lacks a scope required by the route
    #[error("access denied")]
    InsufficientScope(#[from] InsufficientScope),
}

impl From<JwtVerifyError> for AuthorityError {
    fn from(err: JwtVerifyError) -> Self {
        match err {
            JwtVerifyError::ClaimsRejected(ClaimsRejected::TokenExpired) => Self::ExpiredToken,
            JwtVerifyError::ClaimsRejected(ClaimsRejected::InvalidAlgorithm) => {
                Self::InvalidToken(InvalidToken::UnapprovedAlgorithm)
            }
            JwtVerifyError::ClaimsRejected(claims) => Self::InvalidClaims(claims),
            other => Self::InvalidToken(InvalidToken::Rejected(other)),
        }
    }
}
