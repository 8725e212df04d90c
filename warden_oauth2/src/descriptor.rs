use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;
use warden::{jwa, jwt};

use crate::{scope::ScopeCatalog, RequiredScopes};

/// The descriptor could not be built from its inputs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum DescriptorError {
    /// The issuer domain was empty
    #[error("issuer domain must not be empty")]
    EmptyDomain,
    /// The API audience was empty
    #[error("API audience must not be empty")]
    EmptyAudience,
}

/// Describes the OAuth2 issuer that protects an API
///
/// Built once from the issuer's domain and the API audience, then shared
/// read-only. Every endpoint is derived from the domain:
///
/// ```
/// use warden_oauth2::{scope_catalog, SecurityDescriptor};
///
/// scope_catalog! {
///     enum Scope {
///         ReadMessages = ("read:messages", "Read Messages"),
///     }
/// }
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let descriptor = SecurityDescriptor::<Scope>::new("tenant.example.com", "https://api.example.com")?;
///
/// assert_eq!(descriptor.issuer().as_str(), "https://tenant.example.com/");
/// assert_eq!(
///     descriptor.authorization_url(),
///     "https://tenant.example.com/authorize?audience=https%3A%2F%2Fapi.example.com",
/// );
/// assert_eq!(descriptor.token_url(), "https://tenant.example.com/oauth/token");
/// assert_eq!(descriptor.jwks_url(), "https://tenant.example.com/.well-known/jwks.json");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct SecurityDescriptor<S> {
    domain: String,
    audience: jwt::Audience,
    issuer: jwt::Issuer,
    authorization_url: String,
    token_url: String,
    jwks_url: String,
    scopes: Vec<(S, String)>,
}

impl<S: ScopeCatalog> SecurityDescriptor<S> {
    /// Derives the issuer endpoints from `domain` and `audience`
    ///
    /// The scope catalog is described with each scope's own description.
    /// No network requests are made.
    ///
    /// # Errors
    ///
    /// Either input is empty once surrounding whitespace is removed.
    pub fn new(domain: &str, audience: &str) -> Result<Self, DescriptorError> {
        let domain = domain.trim();
        if domain.is_empty() {
            return Err(DescriptorError::EmptyDomain);
        }

        let audience = audience.trim();
        if audience.is_empty() {
            return Err(DescriptorError::EmptyAudience);
        }

        let base = format!("https://{domain}");
        let encoded_audience: String =
            url::form_urlencoded::byte_serialize(audience.as_bytes()).collect();

        Ok(Self {
            domain: domain.to_owned(),
            audience: jwt::Audience::new(audience.to_owned()),
            issuer: jwt::Issuer::new(format!("{base}/")),
            authorization_url: format!("{base}/authorize?audience={encoded_audience}"),
            token_url: format!("{base}/oauth/token"),
            jwks_url: format!("{base}/.well-known/jwks.json"),
            scopes: S::all()
                .iter()
                .map(|&s| (s, s.description().to_owned()))
                .collect(),
        })
    }

    /// Replaces the scope catalog published for discovery
    ///
    /// Only affects documentation; enforcement is unchanged.
    #[must_use]
    pub fn with_scopes<D: Into<String>>(self, scopes: impl IntoIterator<Item = (S, D)>) -> Self {
        Self {
            scopes: scopes.into_iter().map(|(s, d)| (s, d.into())).collect(),
            ..self
        }
    }

    /// The issuer's domain
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// The audience tokens must be issued for
    #[must_use]
    pub fn audience(&self) -> &jwt::AudienceRef {
        &self.audience
    }

    /// The issuer identifier tokens must carry
    #[must_use]
    pub fn issuer(&self) -> &jwt::IssuerRef {
        &self.issuer
    }

    /// The authorization endpoint, scoped to the audience
    #[must_use]
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// The token endpoint
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// The endpoint publishing the issuer's signing keys
    #[must_use]
    pub fn jwks_url(&self) -> &str {
        &self.jwks_url
    }

    /// The documented scopes and their descriptions
    pub fn scopes(&self) -> impl Iterator<Item = (S, &str)> + '_ {
        self.scopes.iter().map(|(s, d)| (*s, d.as_str()))
    }

    /// Declares the scopes a route requires
    pub fn require(&self, scopes: impl IntoIterator<Item = S>) -> RequiredScopes<S> {
        RequiredScopes::new(scopes)
    }

    /// The claim checks implied by this issuer
    ///
    /// Only RS256 is approved. The audience and issuer must match and an
    /// unexpired `exp` claim is required.
    pub fn core_validator(&self) -> jwt::CoreValidator {
        jwt::CoreValidator::default()
            .add_approved_algorithm(jwa::Algorithm::RS256)
            .add_allowed_audience(self.audience.clone())
            .require_issuer(self.issuer.clone())
    }

    /// Describes the authorization code flow for API documentation tooling
    pub fn oauth2_scheme(&self, client_id: &str) -> OAuth2Scheme {
        OAuth2Scheme {
            authorization_url: self.authorization_url.clone(),
            token_url: self.token_url.clone(),
            scopes: self
                .scopes
                .iter()
                .map(|(s, d)| (s.as_str(), d.clone()))
                .collect(),
            client_id: client_id.to_owned(),
            use_pkce_with_authorization_code_grant: true,
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for SecurityDescriptor<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityDescriptor")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("jwks_url", &self.jwks_url)
            .field("scopes", &self.scopes)
            .finish_non_exhaustive()
    }
}

/// The OAuth2 authorization code flow of an issuer, as published for
/// discovery
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuth2Scheme {
    authorization_url: String,
    token_url: String,
    #[serde(serialize_with = "serialize_scopes")]
    scopes: Vec<(&'static str, String)>,
    client_id: String,
    use_pkce_with_authorization_code_grant: bool,
}

impl OAuth2Scheme {
    /// The authorization endpoint
    #[must_use]
    pub fn authorization_url(&self) -> &str {
        &self.authorization_url
    }

    /// The token endpoint
    #[must_use]
    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    /// The client that documentation tooling should log in as
    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }
}

// Serialized as an object, keeping catalog order
fn serialize_scopes<S: Serializer>(
    scopes: &[(&'static str, String)],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_map(scopes.iter().map(|(s, d)| (s, d)))
}
