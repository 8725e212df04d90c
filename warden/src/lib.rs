//! Verification of RSA-signed JSON Web Tokens against a JSON Web Key Set
//!
//! This crate implements the parts of the JOSE standards needed by a
//! resource server that accepts bearer tokens:
//!
//! * JSON Web Signature (JWS) verification: [RFC7515][]
//! * JSON Web Key (JWK) and key sets: [RFC7517][]
//! * The RSA family of JSON Web Algorithms (JWA): [RFC7518][]
//! * JSON Web Token (JWT) claim validation: [RFC7519][]
//!
//! Signing is only available to tests, through the `test-util` feature.
//!
//! [RFC7515]: https://tools.ietf.org/html/rfc7515
//! [RFC7517]: https://tools.ietf.org/html/rfc7517
//! [RFC7518]: https://tools.ietf.org/html/rfc7518
//! [RFC7519]: https://tools.ietf.org/html/rfc7519
//!
//! # Example
//!
//! ```
//! use warden::{jwa, jwt, Jwks, JwtRef};
//! use warden::jwt::{CoreHeaders, HasAlgorithm};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let keys: Jwks = serde_json::from_str(r#"{"keys": []}"#)?;
//!
//! let validator = jwt::CoreValidator::default()
//!     .add_approved_algorithm(jwa::Algorithm::RS256)
//!     .add_allowed_audience(jwt::Audience::from_static("https://api.example.com"))
//!     .require_issuer(jwt::Issuer::from_static("https://tenant.example.com/"));
//!
//! let token = JwtRef::from_str(concat!(
//!     "eyJhbGciOiJSUzI1NiIsImtpZCI6InJldGlyZWQifQ.",
//!     "eyJzdWIiOiJ3YXJkZW4ifQ.",
//!     "c2lnbmF0dXJl",
//! ));
//!
//! let decomposed: jwt::Decomposed = token.decompose()?;
//! assert_eq!(decomposed.alg(), jwa::Algorithm::RS256);
//!
//! // The key set does not publish the key that signed this token
//! assert!(keys.get_key_by_opt(decomposed.kid(), decomposed.alg()).is_none());
//! # let _ = validator;
//! # Ok(())
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
    missing_copy_implementations,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code,
    unused_must_use
)]

mod b64;
pub mod clock;
pub mod error;
pub mod jwa;
pub mod jwk;
mod jwks;
pub mod jwt;

#[cfg(any(test, feature = "test-util"))]
#[cfg_attr(docsrs, doc(cfg(feature = "test-util")))]
pub mod test_util;

#[doc(inline)]
pub use b64::Base64Url;
#[doc(inline)]
pub use jwk::Jwk;
#[doc(inline)]
pub use jwks::Jwks;
#[doc(inline)]
pub use jwt::{Jwt, JwtRef};
