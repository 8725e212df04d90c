use std::{fmt, future::Future, marker::PhantomData, pin::Pin, sync::Arc};

use http::{Request, Response};
use http_body::Body;
use tower_http::auth::{AsyncAuthorizeRequest, AsyncRequireAuthorizationLayer};
use warden::Jwt;
use warden_oauth2::{
    scope::ScopeCatalog, Authority, AuthorityError, InvalidToken, KeySetSource, RequiredScopes,
};

use crate::challenge;

/// Builder for layers that authenticate bearer tokens and authorize access
/// based on the token's granted permissions
///
/// Each layer runs the full check on every request it guards: the bearer
/// token is extracted, verified against the [`Authority`], and its
/// permissions compared with the scopes the route requires. On success the
/// verified [`TokenClaims`](warden_oauth2::TokenClaims) are placed in the
/// request extensions. On failure the request is answered with `401`, `403`,
/// or `503` and never reaches the inner service.
///
/// `ResBody` is the body type of the inner service's responses, such as
/// `axum::body::Body`.
pub struct Oauth2Authorizer<K, S, ResBody> {
    authority: Authority<K>,
    _marker: PhantomData<fn() -> (S, ResBody)>,
}

impl<K, S, ResBody> Clone for Oauth2Authorizer<K, S, ResBody> {
    fn clone(&self) -> Self {
        Self {
            authority: self.authority.clone(),
            _marker: PhantomData,
        }
    }
}

impl<K: fmt::Debug, S, ResBody> fmt::Debug for Oauth2Authorizer<K, S, ResBody> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Oauth2Authorizer")
            .field("authority", &self.authority)
            .finish()
    }
}

impl<K, S, ResBody> Oauth2Authorizer<K, S, ResBody>
where
    K: KeySetSource + 'static,
    S: ScopeCatalog,
    ResBody: Body + Default + Send + 'static,
{
    /// Guards routes with tokens verified by `authority`
    #[inline]
    pub fn new(authority: Authority<K>) -> Self {
        Self {
            authority,
            _marker: PhantomData,
        }
    }

    /// The authority used to verify tokens
    #[inline]
    pub fn authority(&self) -> &Authority<K> {
        &self.authority
    }

    /// Requires a valid token granting every one of `scopes`
    #[inline]
    pub fn security(
        &self,
        scopes: impl IntoIterator<Item = S>,
    ) -> AsyncRequireAuthorizationLayer<VerifyBearer<K, S, ResBody>> {
        self.with_required(RequiredScopes::new(scopes))
    }

    /// Requires a valid token, without regard to its permissions
    #[inline]
    pub fn authenticated(&self) -> AsyncRequireAuthorizationLayer<VerifyBearer<K, S, ResBody>> {
        self.with_required(RequiredScopes::none())
    }

    /// Requires a valid token granting every scope in `required`
    pub fn with_required(
        &self,
        required: RequiredScopes<S>,
    ) -> AsyncRequireAuthorizationLayer<VerifyBearer<K, S, ResBody>> {
        AsyncRequireAuthorizationLayer::new(VerifyBearer {
            authority: self.authority.clone(),
            required: Arc::new(required),
            _body: PhantomData,
        })
    }
}

/// Verifies the bearer token on each request and enforces the required
/// scopes
///
/// Built by [`Oauth2Authorizer`].
pub struct VerifyBearer<K, S, ResBody> {
    authority: Authority<K>,
    required: Arc<RequiredScopes<S>>,
    _body: PhantomData<fn() -> ResBody>,
}

impl<K, S, ResBody> Clone for VerifyBearer<K, S, ResBody> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            authority: self.authority.clone(),
            required: Arc::clone(&self.required),
            _body: PhantomData,
        }
    }
}

impl<K: fmt::Debug, S: fmt::Debug, ResBody> fmt::Debug for VerifyBearer<K, S, ResBody> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("VerifyBearer")
            .field("authority", &self.authority)
            .field("required", &self.required)
            .finish()
    }
}

impl<K, S, ReqBody, ResBody> AsyncAuthorizeRequest<ReqBody> for VerifyBearer<K, S, ResBody>
where
    K: KeySetSource + 'static,
    S: ScopeCatalog,
    ReqBody: Send + 'static,
    ResBody: Body + Default + Send + 'static,
{
    type RequestBody = ReqBody;
    type ResponseBody = ResBody;
    type Future =
        Pin<Box<dyn Future<Output = Result<Request<ReqBody>, Response<ResBody>>> + Send>>;

    fn authorize(&mut self, mut request: Request<ReqBody>) -> Self::Future {
        let authority = self.authority.clone();
        let required = Arc::clone(&self.required);

        Box::pin(async move {
            let token = request
                .headers()
                .get(http::header::AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(extract_bearer);

            let result = match token {
                Some(token) => authority.authorize(&token, &required).await,
                None => Err(InvalidToken::MissingOrMalformed.into()),
            };

            match result {
                Ok(claims) => {
                    tracing::trace!("bearer token was valid");
                    request.extensions_mut().insert(claims);
                    Ok(request)
                }
                Err(err) => {
                    log_rejection(&err);
                    Err(challenge::rejection(&err, &required))
                }
            }
        })
    }
}

fn log_rejection(err: &AuthorityError) {
    let error: &dyn std::error::Error = err;
    match err {
        AuthorityError::KeySetUnavailable(_) => {
            tracing::warn!(error, "unable to authorize request: signing keys unavailable")
        }
        _ => tracing::debug!(error, "request rejected"),
    }
}

fn extract_bearer(auth: &str) -> Option<Jwt> {
    let (scheme, token) = auth.split_at_checked(7)?;
    if !scheme.eq_ignore_ascii_case("bearer ") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then(|| Jwt::from(token))
}
