//! Bearer token authorization for `tower_http` and the services built on
//! it, including `axum`.
//!
//! An [`Oauth2Authorizer`] hands out one layer per protected route. Each
//! layer verifies the bearer token with a
//! [`warden_oauth2::Authority`], checks the token's permissions against the
//! scopes the route requires, and either forwards the request with the
//! verified [`TokenClaims`](warden_oauth2::TokenClaims) in its extensions
//! or answers it directly:
//!
//! | outcome | status | `WWW-Authenticate` |
//! | --- | --- | --- |
//! | missing, malformed, expired, or invalid token | `401` | `error="invalid_token"` |
//! | token lacks a required scope | `403` | `error="insufficient_scope"` |
//! | signing keys could not be fetched | `503` | none |
//!
//! Routes without a layer are never touched.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use axum::{body::Body, routing::get, Extension, Router};
//! use warden_oauth2::{
//!     scope_catalog, Authority, CachedKeySet, RemoteKeySet, SecurityDescriptor, TokenClaims,
//! };
//! use warden_tower::Oauth2Authorizer;
//!
//! scope_catalog! {
//!     enum Scope {
//!         ReadMessages = ("read:messages", "Read Messages"),
//!     }
//! }
//!
//! # fn build() -> Result<Router, Box<dyn std::error::Error>> {
//! let descriptor = SecurityDescriptor::<Scope>::new("tenant.example.com", "https://api.example.com")?;
//! let keys = CachedKeySet::new(RemoteKeySet::new(descriptor.jwks_url())?, Duration::from_secs(300));
//! let authorizer = Oauth2Authorizer::<_, Scope, Body>::new(Authority::from_descriptor(&descriptor, keys));
//!
//! let app = Router::new()
//!     .route(
//!         "/messages",
//!         get(|Extension(claims): Extension<TokenClaims>| async move {
//!             format!("{:?}", claims.permissions())
//!         })
//!         .route_layer(authorizer.security([Scope::ReadMessages])),
//!     )
//!     .route("/public", get(|| async { "hello" }));
//! # Ok(app)
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    unused_import_braces,
    unused_imports,
    unused_qualifications
)]
#![deny(
    missing_debug_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod authorizer;
pub mod challenge;

pub use authorizer::{Oauth2Authorizer, VerifyBearer};
pub use challenge::{AuthChallenge, ErrorCode};
