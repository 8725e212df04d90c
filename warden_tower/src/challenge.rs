//! `WWW-Authenticate` challenges for rejected requests
//!
//! Challenges follow [RFC 6750 §3](https://datatracker.ietf.org/doc/html/rfc6750#section-3):
//!
//! ```http
//! HTTP/1.1 403 Forbidden
//! www-authenticate: Bearer scope="read:messages", error="insufficient_scope", error_description="…"
//! ```
//!
//! Attribute values are escaped, so a description containing quotes,
//! backslashes, or non-ASCII text still yields a valid header.

use std::{borrow::Cow, fmt};

use http::{header, HeaderValue, Response, StatusCode};
use warden::error::ClaimsRejected;
use warden_oauth2::{scope::ScopeCatalog, AuthorityError, InvalidToken, RequiredScopes};

const SIGNATURE_INVALID: &str = "The access token signature is invalid";
const SIGNATURE_EXPIRED: &str = "The access token signature has expired.";
const SCOPE_MISSING: &str = "The access token does not contain the required scope";

/// The `error` attribute of a challenge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The token is missing, malformed, expired, or otherwise invalid
    InvalidToken,
    /// The token lacks a scope required by the resource
    InsufficientScope,
}

impl ErrorCode {
    /// The code as it appears in the header
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InvalidToken => "invalid_token",
            Self::InsufficientScope => "insufficient_scope",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The attributes of a `Bearer` challenge
///
/// With no attributes the challenge is just `Bearer`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[must_use]
pub struct AuthChallenge {
    scope: Option<String>,
    error: Option<(ErrorCode, Cow<'static, str>)>,
}

impl AuthChallenge {
    /// A bare `Bearer` challenge
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Advertises the scopes the resource requires
    ///
    /// An empty scope string is left out of the challenge.
    pub fn with_scope(self, scope: impl Into<String>) -> Self {
        let scope = scope.into();
        Self {
            scope: (!scope.is_empty()).then_some(scope),
            ..self
        }
    }

    /// Reports why the request was rejected
    pub fn with_error(self, code: ErrorCode, description: impl Into<Cow<'static, str>>) -> Self {
        Self {
            error: Some((code, description.into())),
            ..self
        }
    }

    /// The challenge for an authorization failure on a route requiring
    /// `required`
    ///
    /// Returns `None` when the failure is not the client's doing and no
    /// challenge should be sent.
    pub fn for_error<S: ScopeCatalog>(
        error: &AuthorityError,
        required: &RequiredScopes<S>,
    ) -> Option<Self> {
        let (code, description): (_, Cow<'static, str>) = match error {
            AuthorityError::KeySetUnavailable(_) => return None,
            AuthorityError::InvalidToken(InvalidToken::MissingOrMalformed) => (
                ErrorCode::InvalidToken,
                InvalidToken::MissingOrMalformed.to_string().into(),
            ),
            AuthorityError::InvalidToken(_) => (ErrorCode::InvalidToken, SIGNATURE_INVALID.into()),
            AuthorityError::ExpiredToken => (ErrorCode::InvalidToken, SIGNATURE_EXPIRED.into()),
            AuthorityError::InvalidClaims(reason) => {
                (ErrorCode::InvalidToken, claims_description(reason))
            }
            AuthorityError::InsufficientScope(_) => {
                (ErrorCode::InsufficientScope, SCOPE_MISSING.into())
            }
        };

        Some(
            Self::new()
                .with_scope(required.scope_str())
                .with_error(code, description),
        )
    }

    /// The challenge as a header value
    #[must_use]
    pub fn header_value(&self) -> HeaderValue {
        // Escaped attributes are printable ASCII
        HeaderValue::try_from(self.to_string())
            .unwrap_or_else(|_| HeaderValue::from_static("Bearer"))
    }
}

impl fmt::Display for AuthChallenge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Bearer")?;

        let mut separator = " ";
        if let Some(scope) = &self.scope {
            write!(f, r#"{separator}scope="{}""#, scope.escape_default())?;
            separator = ", ";
        }

        if let Some((code, description)) = &self.error {
            write!(f, r#"{separator}error="{code}""#)?;
            if !description.is_empty() {
                write!(f, r#", error_description="{}""#, description.escape_default())?;
            }
        }

        Ok(())
    }
}

// Serde messages can quote claim values, so only the claim is named
fn claims_description(reason: &ClaimsRejected) -> Cow<'static, str> {
    match reason {
        ClaimsRejected::UnexpectedClaimValue(_) => "unexpected claim value".into(),
        other => other.to_string().into(),
    }
}

/// Builds a `401 Unauthorized` response carrying the challenge
pub fn unauthorized<Body: Default>(challenge: &AuthChallenge) -> Response<Body> {
    with_challenge(StatusCode::UNAUTHORIZED, challenge)
}

/// Builds a `403 Forbidden` response carrying the challenge
pub fn forbidden<Body: Default>(challenge: &AuthChallenge) -> Response<Body> {
    with_challenge(StatusCode::FORBIDDEN, challenge)
}

/// Builds a `503 Service Unavailable` response without a challenge
pub fn unavailable<Body: Default>() -> Response<Body> {
    let mut resp = Response::new(Body::default());
    *resp.status_mut() = StatusCode::SERVICE_UNAVAILABLE;
    resp
}

/// Builds the rejection response for an authorization failure
///
/// | failure | status |
/// | --- | --- |
/// | key set unavailable | 503, no challenge |
/// | invalid, expired, or rejected token | 401 |
/// | insufficient scope | 403 |
pub fn rejection<Body: Default, S: ScopeCatalog>(
    error: &AuthorityError,
    required: &RequiredScopes<S>,
) -> Response<Body> {
    match AuthChallenge::for_error(error, required) {
        None => unavailable(),
        Some(challenge) => match error {
            AuthorityError::InsufficientScope(_) => forbidden(&challenge),
            _ => unauthorized(&challenge),
        },
    }
}

fn with_challenge<Body: Default>(status: StatusCode, challenge: &AuthChallenge) -> Response<Body> {
    let mut resp = Response::new(Body::default());
    *resp.status_mut() = status;
    resp.headers_mut()
        .insert(header::WWW_AUTHENTICATE, challenge.header_value());
    resp
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use warden::error::JwtVerifyError;
    use warden_oauth2::{scope_catalog, InsufficientScope};

    use super::*;

    scope_catalog! {
        enum TestScope {
            ReadMessages = ("read:messages", "Read Messages"),
            CreateMessages = ("create:messages", "Create Messages"),
        }
    }

    fn both() -> RequiredScopes<TestScope> {
        RequiredScopes::new([TestScope::ReadMessages, TestScope::CreateMessages])
    }

    fn insufficient_scope() -> AuthorityError {
        let err: InsufficientScope = RequiredScopes::new([TestScope::ReadMessages])
            .evaluate::<String>(&[])
            .unwrap_err();
        err.into()
    }

    fn extract_www_authenticate_headers<B>(resp: &Response<B>) -> BTreeSet<&str> {
        resp.headers()
            .get_all(header::WWW_AUTHENTICATE)
            .iter()
            .map(|v| v.to_str().unwrap())
            .collect::<BTreeSet<_>>()
    }

    #[test]
    fn bare_challenge_is_scheme_only() {
        assert_eq!(AuthChallenge::new().to_string(), "Bearer");
    }

    #[test]
    fn scope_only() {
        let challenge = AuthChallenge::new().with_scope("read:messages");
        assert_eq!(challenge.to_string(), r#"Bearer scope="read:messages""#);
    }

    #[test]
    fn empty_scope_is_left_out() {
        let challenge = AuthChallenge::new()
            .with_scope("")
            .with_error(ErrorCode::InvalidToken, "bad");
        assert_eq!(
            challenge.to_string(),
            r#"Bearer error="invalid_token", error_description="bad""#
        );
    }

    #[test]
    fn attributes_are_comma_separated_in_order() {
        let challenge = AuthChallenge::new()
            .with_scope("read:messages create:messages")
            .with_error(ErrorCode::InsufficientScope, "not enough");
        assert_eq!(
            challenge.to_string(),
            r#"Bearer scope="read:messages create:messages", error="insufficient_scope", error_description="not enough""#
        );
    }

    #[test]
    fn empty_description_is_left_out() {
        let challenge = AuthChallenge::new().with_error(ErrorCode::InvalidToken, "");
        assert_eq!(challenge.to_string(), r#"Bearer error="invalid_token""#);
    }

    #[test]
    fn unicode_and_non_printing_description_is_escaped() {
        let resp = unauthorized::<()>(&AuthChallenge::new().with_error(
            ErrorCode::InvalidToken,
            "\0\n\ttest™: \"Ĉu oni povas bone ŝanĝi ĉi tiu mesaĝon en respondon?\"",
        ));

        let headers = extract_www_authenticate_headers(&resp);

        let expected = BTreeSet::from([
            r#"Bearer error="invalid_token", error_description="\u{0}\n\ttest\u{2122}: \"\u{108}u oni povas bone \u{15d}an\u{11d}i \u{109}i tiu mesa\u{11d}on en respondon?\"""#,
        ]);

        assert_eq!(headers, expected);
    }

    #[test]
    fn backslashes_are_escaped() {
        let challenge = AuthChallenge::new().with_error(ErrorCode::InvalidToken, r"a\b");
        assert_eq!(
            challenge.to_string(),
            r#"Bearer error="invalid_token", error_description="a\\b""#
        );
    }

    #[test]
    fn expired_token_challenge() {
        let resp = rejection::<(), _>(&AuthorityError::ExpiredToken, &both());

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            extract_www_authenticate_headers(&resp),
            BTreeSet::from([
                r#"Bearer scope="read:messages create:messages", error="invalid_token", error_description="The access token signature has expired.""#
            ])
        );
    }

    #[test]
    fn invalid_token_challenge_without_scopes() {
        let error = AuthorityError::InvalidToken(InvalidToken::UnknownKeyId);
        let resp = rejection::<(), _>(&error, &RequiredScopes::<TestScope>::none());

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            extract_www_authenticate_headers(&resp),
            BTreeSet::from([
                r#"Bearer error="invalid_token", error_description="The access token signature is invalid""#
            ])
        );
    }

    #[test]
    fn missing_token_challenge() {
        let error = AuthorityError::InvalidToken(InvalidToken::MissingOrMalformed);
        let challenge = AuthChallenge::for_error(&error, &RequiredScopes::<TestScope>::none());

        assert_eq!(
            challenge.map(|c| c.to_string()).as_deref(),
            Some(
                r#"Bearer error="invalid_token", error_description="authorization token is missing or malformed""#
            )
        );
    }

    #[test]
    fn claims_challenge_names_the_claim() {
        let error = AuthorityError::from(JwtVerifyError::from(ClaimsRejected::InvalidAudience));
        let resp = rejection::<(), _>(&error, &both());

        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            extract_www_authenticate_headers(&resp),
            BTreeSet::from([
                r#"Bearer scope="read:messages create:messages", error="invalid_token", error_description="invalid audience""#
            ])
        );
    }

    #[test]
    fn claim_values_are_not_echoed() -> color_eyre::Result<()> {
        let serde_err = serde_json::from_str::<u64>(r#""secret-value""#).unwrap_err();
        let error = AuthorityError::InvalidClaims(ClaimsRejected::UnexpectedClaimValue(serde_err));

        let challenge = AuthChallenge::for_error(&error, &both())
            .ok_or_else(|| color_eyre::eyre::eyre!("expected a challenge"))?;
        assert!(!challenge.to_string().contains("secret-value"));
        assert!(challenge.to_string().contains("unexpected claim value"));
        Ok(())
    }

    #[test]
    fn insufficient_scope_is_forbidden() {
        let resp = rejection::<(), _>(&insufficient_scope(), &both());

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            extract_www_authenticate_headers(&resp),
            BTreeSet::from([
                r#"Bearer scope="read:messages create:messages", error="insufficient_scope", error_description="The access token does not contain the required scope""#
            ])
        );
    }
}
