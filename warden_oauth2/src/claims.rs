use aliri_braid::braid;
use serde::{Deserialize, Serialize};
use warden::{
    clock::UnixTime,
    jwt::{self, CoreClaims},
};

/// The client an access token was issued to
#[braid(serde, ref_doc = "A borrowed reference to a [`ClientId`]")]
pub struct ClientId;

/// The verified payload of an access token
///
/// Values of this type handed out by an [`Authority`](crate::Authority)
/// have had their signature, expiry, audience, and issuer checked. Absent
/// `permissions` read as an empty list; the `scope` string is carried for
/// reference but never used to grant access.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iss: Option<jwt::Issuer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sub: Option<jwt::Subject>,
    #[serde(default)]
    aud: jwt::Audiences,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    exp: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    nbf: Option<UnixTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    azp: Option<ClientId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    scope: Option<String>,
    #[serde(default)]
    permissions: Vec<String>,
}

impl TokenClaims {
    /// The time at which the token was issued
    #[must_use]
    pub fn iat(&self) -> Option<UnixTime> {
        self.iat
    }

    /// The authorized party, the client the token was issued to
    #[must_use]
    pub fn azp(&self) -> Option<&ClientIdRef> {
        self.azp.as_deref()
    }

    /// The space-delimited `scope` claim, if present
    #[must_use]
    pub fn scope(&self) -> Option<&str> {
        self.scope.as_deref()
    }

    /// The permissions granted to the bearer
    #[must_use]
    pub fn permissions(&self) -> &[String] {
        &self.permissions
    }
}

impl CoreClaims for TokenClaims {
    fn nbf(&self) -> Option<UnixTime> {
        self.nbf
    }

    fn exp(&self) -> Option<UnixTime> {
        self.exp
    }

    fn aud(&self) -> &jwt::Audiences {
        &self.aud
    }

    fn iss(&self) -> Option<&jwt::IssuerRef> {
        self.iss.as_deref()
    }

    fn sub(&self) -> Option<&jwt::SubjectRef> {
        self.sub.as_deref()
    }
}
