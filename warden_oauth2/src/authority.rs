use std::sync::Arc;

use warden::{
    clock::{Clock, System},
    jwt::{self, CoreHeaders, HasAlgorithm},
    JwtRef,
};

use crate::{
    error::InvalidToken,
    jwks::KeySetSource,
    scope::ScopeCatalog,
    AuthorityError, RequiredScopes, SecurityDescriptor, TokenClaims,
};

#[derive(Debug)]
struct Inner<K> {
    keys: K,
    validator: jwt::CoreValidator,
}

/// Verifies bearer tokens against the signing keys of an issuer
///
/// Cheap to clone; clones share the key source.
#[derive(Debug)]
#[must_use]
pub struct Authority<K> {
    inner: Arc<Inner<K>>,
}

impl<K> Clone for Authority<K> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<K: KeySetSource> Authority<K> {
    /// Verifies tokens with keys from `keys`, checking claims with
    /// `validator`
    pub fn new(keys: K, validator: jwt::CoreValidator) -> Self {
        Self {
            inner: Arc::new(Inner { keys, validator }),
        }
    }

    /// Verifies tokens issued by the issuer described by `descriptor`
    pub fn from_descriptor<S: ScopeCatalog>(descriptor: &SecurityDescriptor<S>, keys: K) -> Self {
        Self::new(keys, descriptor.core_validator())
    }

    /// The claim checks applied to every token
    pub fn validator(&self) -> &jwt::CoreValidator {
        &self.inner.validator
    }

    /// Verifies the token and returns its claims
    ///
    /// # Errors
    ///
    /// The key set is unavailable, or the token is invalid, expired, or
    /// carries a rejected claim.
    pub async fn verify(&self, token: &JwtRef) -> Result<TokenClaims, AuthorityError> {
        self.verify_with_clock(token, &System).await
    }

    /// Verifies the token against the time reported by `clock`
    ///
    /// The key set is fetched first, so an unavailable key set is reported
    /// no matter what the token holds. The signature is checked before any
    /// claim is looked at, and an expired token is reported as expired even
    /// if other claims are also wrong.
    ///
    /// If the token names a key that the key set does not hold, the source
    /// is asked once for a newer set before the token is rejected.
    ///
    /// # Errors
    ///
    /// The key set is unavailable, or the token is invalid, expired, or
    /// carries a rejected claim.
    pub async fn verify_with_clock<C>(
        &self,
        token: &JwtRef,
        clock: &C,
    ) -> Result<TokenClaims, AuthorityError>
    where
        C: Clock + Sync,
    {
        let mut jwks = self.inner.keys.key_set().await?;

        let decomposed: jwt::Decomposed = token.decompose()?;
        let kid = decomposed.kid();
        let alg = decomposed.alg();

        self.inner.validator.check_algorithm(alg).map_err(|_| {
            tracing::debug!(jwt.alg = %alg, "token algorithm not approved");
            InvalidToken::UnapprovedAlgorithm
        })?;

        if jwks.get_key_by_opt(kid, alg).is_none() {
            match self.inner.keys.refresh().await {
                Ok(Some(refreshed)) => jwks = refreshed,
                Ok(None) => {}
                Err(err) => {
                    let error: &dyn std::error::Error = &err;
                    tracing::debug!(error, "unable to refresh JWKS for unknown key");
                }
            }
        }

        let key = jwks.get_key_by_opt(kid, alg).ok_or_else(|| {
            if let Some(kid) = kid {
                tracing::debug!(jwk.kid = %kid, jwt.alg = %alg, "unable to find matching key");
            } else {
                tracing::debug!(jwt.alg = %alg, "unable to find matching key");
            }
            InvalidToken::UnknownKeyId
        })?;

        let validated: jwt::Validated<TokenClaims> =
            decomposed.verify_with_clock(key, &self.inner.validator, clock)?;

        let (_, claims) = validated.extract();
        Ok(claims)
    }

    /// Verifies the token and checks that it grants every required scope
    ///
    /// # Errors
    ///
    /// Verification fails as in [`verify`](Self::verify), or a required
    /// scope is missing from the token's permissions.
    pub async fn authorize<S: ScopeCatalog>(
        &self,
        token: &JwtRef,
        required: &RequiredScopes<S>,
    ) -> Result<TokenClaims, AuthorityError> {
        let claims = self.verify(token).await?;
        required.evaluate(claims.permissions())?;
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use color_eyre::Result;
    use serde_json::{json, Value};
    use tracing_test::traced_test;
    use warden::{
        clock::{TestClock, UnixTime},
        jwa,
        jwt::CoreClaims,
        test_util::{rsa::*, TestSigner},
        Jwks,
    };
    use wiremock::{matchers::method, Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::{scope::tests::TestScope, CachedKeySet, RemoteKeySet, StaticKeySet};

    const NOW: u64 = 1_700_000_000;
    const DOMAIN: &str = "tenant.example.com";
    const AUDIENCE: &str = "https://api.example.com";

    fn descriptor() -> Result<SecurityDescriptor<TestScope>> {
        Ok(SecurityDescriptor::new(DOMAIN, AUDIENCE)?)
    }

    fn primary_jwks() -> Result<Jwks> {
        Ok(serde_json::from_str(JWKS)?)
    }

    fn authority() -> Result<Authority<StaticKeySet>> {
        Ok(Authority::from_descriptor(
            &descriptor()?,
            StaticKeySet::new(primary_jwks()?),
        ))
    }

    fn claims() -> Value {
        json!({
            "iss": "https://tenant.example.com/",
            "sub": "auth0|5f7c8ec7c33c6c004bbafe82",
            "aud": [AUDIENCE, "https://tenant.example.com/userinfo"],
            "iat": NOW - 60,
            "exp": NOW + 3600,
            "azp": "rhM2Y0aGHmtR6Q3V",
            "scope": "openid read:messages",
            "permissions": ["read:messages"],
        })
    }

    fn with(mut claims: Value, key: &str, value: Value) -> Value {
        claims[key] = value;
        claims
    }

    fn without(mut claims: Value, key: &str) -> Value {
        if let Some(map) = claims.as_object_mut() {
            map.remove(key);
        }
        claims
    }

    async fn verify_at_now<K: KeySetSource>(
        authority: &Authority<K>,
        token: &JwtRef,
    ) -> Result<TokenClaims, AuthorityError> {
        authority
            .verify_with_clock(token, &TestClock::new(UnixTime(NOW)))
            .await
    }

    #[tokio::test]
    async fn accepts_valid_token() -> Result<()> {
        let token = TestSigner::primary().sign(&claims())?;

        let claims = verify_at_now(&authority()?, &token).await?;
        assert_eq!(claims.permissions(), ["read:messages"]);
        assert_eq!(
            claims.sub(),
            Some(jwt::SubjectRef::from_str("auth0|5f7c8ec7c33c6c004bbafe82"))
        );
        Ok(())
    }

    #[tokio::test]
    async fn accepts_single_string_audience() -> Result<()> {
        let token = TestSigner::primary().sign(&with(claims(), "aud", json!(AUDIENCE)))?;
        assert!(verify_at_now(&authority()?, &token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn absent_permissions_read_as_empty() -> Result<()> {
        let token = TestSigner::primary().sign(&without(claims(), "permissions"))?;

        let claims = verify_at_now(&authority()?, &token).await?;
        assert!(claims.permissions().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn rejects_expired_token() -> Result<()> {
        let token = TestSigner::primary().sign(&with(claims(), "exp", json!(NOW - 1)))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::ExpiredToken));
        Ok(())
    }

    #[tokio::test]
    async fn token_expiring_now_is_still_valid() -> Result<()> {
        let token = TestSigner::primary().sign(&with(claims(), "exp", json!(NOW)))?;
        assert!(verify_at_now(&authority()?, &token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn leeway_extends_expiry() -> Result<()> {
        let authority = Authority::new(
            StaticKeySet::new(primary_jwks()?),
            descriptor()?.core_validator().with_leeway(Duration::from_secs(30)),
        );
        let token = TestSigner::primary().sign(&with(claims(), "exp", json!(NOW - 20)))?;

        assert!(verify_at_now(&authority, &token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn expiry_is_reported_before_other_claims() -> Result<()> {
        let payload = with(
            with(claims(), "exp", json!(NOW - 100)),
            "aud",
            json!("https://other.example.com"),
        );
        let token = TestSigner::primary().sign(&payload)?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::ExpiredToken));
        Ok(())
    }

    #[tokio::test]
    async fn expiry_is_reported_before_mistyped_claim() -> Result<()> {
        let payload = with(
            with(claims(), "exp", json!(NOW - 100)),
            "permissions",
            json!("read:messages"),
        );
        let token = TestSigner::primary().sign(&payload)?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::ExpiredToken), "{err:?}");
        Ok(())
    }

    #[tokio::test]
    async fn rejects_audience_mismatch_as_claims_failure() -> Result<()> {
        let token = TestSigner::primary()
            .sign(&with(claims(), "aud", json!(["https://other.example.com"])))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        match err {
            AuthorityError::InvalidClaims(reason) => {
                assert_eq!(reason.to_string(), "invalid audience");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn rejects_empty_audience_as_claims_failure() -> Result<()> {
        let token = TestSigner::primary().sign(&with(claims(), "aud", json!([])))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidClaims(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_wrong_issuer() -> Result<()> {
        let token = TestSigner::primary()
            .sign(&with(claims(), "iss", json!("https://evil.example.com/")))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidClaims(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_missing_expiry_as_claims_failure() -> Result<()> {
        let token = TestSigner::primary().sign(&without(claims(), "exp"))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        match err {
            AuthorityError::InvalidClaims(reason) => {
                assert_eq!(reason.to_string(), "required exp claim missing");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn rejects_mistyped_claim_as_claims_failure() -> Result<()> {
        let token = TestSigner::primary().sign(&with(claims(), "permissions", json!(42)))?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidClaims(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_payload_that_is_not_json() -> Result<()> {
        let token = TestSigner::primary().sign_raw_payload(b"not json")?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidToken(_)));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_malformed_token() -> Result<()> {
        let err = verify_at_now(&authority()?, JwtRef::from_str("abc.def"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::InvalidToken(InvalidToken::Rejected(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_tampered_signature() -> Result<()> {
        let token = TestSigner::primary().sign(&claims())?;
        let forged = TestSigner::primary().sign(&with(claims(), "permissions", json!(["admin"])))?;

        // Payload of one token with the signature of another
        let mut parts: Vec<&str> = forged.as_str().split('.').collect();
        let original: Vec<&str> = token.as_str().split('.').collect();
        parts[2] = original[2];
        let tampered = jwt::Jwt::new(parts.join("."));

        let err = verify_at_now(&authority()?, &tampered).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::InvalidToken(InvalidToken::Rejected(_))
        ));
        Ok(())
    }

    #[tokio::test]
    async fn rejects_token_signed_by_unpublished_key() -> Result<()> {
        // Signed by the rotated key while claiming to be the primary one
        let token = TestSigner::rotated()
            .with_key_id(PRIMARY_KEY_ID)
            .sign(&claims())?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(err, AuthorityError::InvalidToken(_)));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn rejects_unknown_key_id() -> Result<()> {
        let token = TestSigner::rotated().sign(&claims())?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::InvalidToken(InvalidToken::UnknownKeyId)
        ));
        assert!(logs_contain("unable to find matching key"));
        Ok(())
    }

    #[tokio::test]
    async fn accepts_token_without_key_id() -> Result<()> {
        let token = TestSigner::primary().without_key_id().sign(&claims())?;
        assert!(verify_at_now(&authority()?, &token).await.is_ok());
        Ok(())
    }

    #[tokio::test]
    async fn rejects_unapproved_algorithm() -> Result<()> {
        let token = TestSigner::primary()
            .with_algorithm(jwa::Algorithm::PS256)
            .sign(&claims())?;

        let err = verify_at_now(&authority()?, &token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::InvalidToken(InvalidToken::UnapprovedAlgorithm)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn empty_key_set_rejects_every_token() -> Result<()> {
        let authority = Authority::from_descriptor(&descriptor()?, StaticKeySet::new(Jwks::default()));
        let token = TestSigner::primary().sign(&claims())?;

        let err = verify_at_now(&authority, &token).await.unwrap_err();
        assert!(matches!(
            err,
            AuthorityError::InvalidToken(InvalidToken::UnknownKeyId)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn unavailable_key_set_is_reported_before_the_token_is_read() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let authority = Authority::from_descriptor(&descriptor()?, RemoteKeySet::new(server.uri())?);

        let err = verify_at_now(&authority, JwtRef::from_str("garbage"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthorityError::KeySetUnavailable(_)));
        Ok(())
    }

    #[tokio::test]
    async fn fetches_keys_from_remote_source() -> Result<()> {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(JWKS))
            .expect(2)
            .mount(&server)
            .await;
        let authority = Authority::from_descriptor(&descriptor()?, RemoteKeySet::new(server.uri())?);
        let token = TestSigner::primary().sign(&claims())?;

        verify_at_now(&authority, &token).await?;
        verify_at_now(&authority, &token).await?;
        Ok(())
    }

    #[tokio::test]
    async fn rotated_key_is_picked_up_through_cache_refresh() -> Result<()> {
        let mut rotated_jwks = primary_jwks()?;
        rotated_jwks.add_key(serde_json::from_str(ROTATED_JWK)?);

        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string(JWKS))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&rotated_jwks))
            .expect(1)
            .mount(&server)
            .await;

        let keys = CachedKeySet::new(RemoteKeySet::new(server.uri())?, Duration::from_secs(600))
            .with_min_refresh_interval(Duration::ZERO);
        let authority = Authority::from_descriptor(&descriptor()?, keys);

        verify_at_now(&authority, &TestSigner::primary().sign(&claims())?).await?;
        verify_at_now(&authority, &TestSigner::rotated().sign(&claims())?).await?;
        verify_at_now(&authority, &TestSigner::rotated().sign(&claims())?).await?;
        Ok(())
    }

    #[tokio::test]
    async fn authorize_requires_every_scope() -> Result<()> {
        let authority = Authority::from_descriptor(&descriptor()?, StaticKeySet::new(primary_jwks()?));
        let token = TestSigner::primary().sign(&with(
            claims(),
            "exp",
            json!(u64::MAX / 2),
        ))?;

        let read = RequiredScopes::new([TestScope::ReadMessages]);
        assert!(authority.authorize(&token, &read).await.is_ok());

        let create = RequiredScopes::new([TestScope::ReadMessages, TestScope::CreateMessages]);
        let err = authority.authorize(&token, &create).await.unwrap_err();
        match err {
            AuthorityError::InsufficientScope(missing) => {
                assert_eq!(missing.missing(), "create:messages");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let none = RequiredScopes::<TestScope>::none();
        assert!(authority.authorize(&token, &none).await.is_ok());
        Ok(())
    }
}
