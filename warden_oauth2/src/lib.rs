//! Bearer token verification and OAuth2 scope authorization
//!
//! An [`Authority`] verifies access tokens presented under
//! [RFC 6750](https://datatracker.ietf.org/doc/html/rfc6750) against the
//! signing keys an issuer publishes at its JWKS endpoint, then
//! [`RequiredScopes`] decides whether the token's `permissions` grant
//! access to a route.
//!
//! The issuer is described once by a [`SecurityDescriptor`], which derives
//! the endpoint URLs from the issuer domain and holds the catalog of scopes
//! the API understands.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use warden_oauth2::{scope_catalog, Authority, CachedKeySet, RemoteKeySet, SecurityDescriptor};
//!
//! scope_catalog! {
//!     enum Scope {
//!         ReadMessages = ("read:messages", "Read Messages"),
//!     }
//! }
//!
//! # async fn run(token: &warden::JwtRef) -> Result<(), Box<dyn std::error::Error>> {
//! let descriptor = SecurityDescriptor::<Scope>::new("tenant.example.com", "https://api.example.com")?;
//! let keys = CachedKeySet::new(RemoteKeySet::new(descriptor.jwks_url())?, Duration::from_secs(300));
//! let authority = Authority::from_descriptor(&descriptor, keys);
//!
//! let required = descriptor.require([Scope::ReadMessages]);
//! let claims = authority.authorize(token, &required).await?;
//! println!("granted {:?}", claims.permissions());
//! # Ok(())
//! # }
//! ```
//!
//! # Feature flags
//!
//! TLS for the JWKS fetch comes from `reqwest`. The `default-tls` feature
//! is on by default; disable default features and enable `rustls-tls` to
//! use `rustls` instead.

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

mod authority;
mod claims;
mod descriptor;
pub mod error;
pub mod jwks;
pub mod scope;

pub use authority::Authority;
pub use claims::{ClientId, ClientIdRef, TokenClaims};
pub use descriptor::{DescriptorError, OAuth2Scheme, SecurityDescriptor};
pub use error::{AuthorityError, InvalidToken, KeySetUnavailable};
pub use jwks::{CachedKeySet, KeySetSource, RemoteKeySet, StaticKeySet};
pub use scope::{InsufficientScope, RequiredScopes};
