//! OAuth2 scopes drawn from a closed, application-defined catalog
//!
//! Routes declare the scopes they require as values of an enumeration
//! rather than as free-form strings, so a misspelled scope fails to compile
//! instead of silently locking every caller out.
//!
//! ```
//! use warden_oauth2::{scope::ScopeCatalog, scope_catalog, RequiredScopes};
//!
//! scope_catalog! {
//!     /// Scopes understood by the messages API
//!     pub enum ApiScope {
//!         /// Read access to messages
//!         ReadMessages = ("read:messages", "Read Messages"),
//!         /// Permission to post new messages
//!         CreateMessages = ("create:messages", "Create Messages"),
//!     }
//! }
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! assert_eq!(ApiScope::ReadMessages.as_str(), "read:messages");
//! assert_eq!("create:messages".parse::<ApiScope>()?, ApiScope::CreateMessages);
//!
//! let required = RequiredScopes::new([ApiScope::ReadMessages]);
//! let granted = vec!["read:messages".to_owned(), "other".to_owned()];
//! assert!(required.evaluate(&granted).is_ok());
//! assert!(required.evaluate::<String>(&[]).is_err());
//! # Ok(())
//! # }
//! ```

use std::{fmt, slice};

use thiserror::Error;

/// A closed set of scope identifiers
///
/// Usually implemented with the [`scope_catalog!`](crate::scope_catalog)
/// macro.
pub trait ScopeCatalog: Copy + Eq + fmt::Debug + fmt::Display + Send + Sync + 'static {
    /// The scope as it appears in a token's `permissions` claim
    fn as_str(&self) -> &'static str;

    /// A human-readable description, for documentation and discovery
    fn description(&self) -> &'static str;

    /// Every scope in the catalog, in declaration order
    fn all() -> &'static [Self];
}

/// Defines an enumeration of scopes and implements [`ScopeCatalog`] for it
///
/// Each variant names the scope string and a description. The generated
/// type also implements `Display` and `FromStr` using the scope string.
#[macro_export]
macro_rules! scope_catalog {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident = ($scope:literal, $description:literal)
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $crate::scope::ScopeCatalog for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $scope,)+
                }
            }

            fn description(&self) -> &'static str {
                match self {
                    $(Self::$variant => $description,)+
                }
            }

            fn all() -> &'static [Self] {
                &[$(Self::$variant,)+]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::scope::ScopeCatalog::as_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::scope::UnknownScope;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($scope => Ok(Self::$variant),)+
                    _ => Err($crate::scope::UnknownScope::new(s)),
                }
            }
        }
    };
}

/// A string that does not name any scope in the catalog
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown scope: {scope}")]
pub struct UnknownScope {
    scope: String,
}

impl UnknownScope {
    #[doc(hidden)]
    pub fn new(scope: &str) -> Self {
        Self {
            scope: scope.to_owned(),
        }
    }

    /// The string that was not recognized
    #[must_use]
    pub fn scope(&self) -> &str {
        &self.scope
    }
}

/// Indicates the requester held insufficient scope to be granted access
/// to a controlled resource
#[derive(Copy, Clone, Debug, Hash, Eq, PartialEq, Error)]
#[error("insufficient scope: {missing} was not granted")]
pub struct InsufficientScope {
    missing: &'static str,
}

impl InsufficientScope {
    /// The first required scope that the token did not carry
    #[must_use]
    pub fn missing(&self) -> &'static str {
        self.missing
    }
}

/// The scopes a route requires, in declaration order
///
/// Access is granted only when every listed scope is present in the
/// token's permissions. An empty list grants access to any verified token.
#[derive(Clone, Debug, PartialEq, Eq)]
#[must_use]
pub struct RequiredScopes<S> {
    scopes: Vec<S>,
}

impl<S: ScopeCatalog> RequiredScopes<S> {
    /// Requires the given scopes
    ///
    /// Repeated scopes are collapsed, keeping the first occurrence.
    pub fn new(scopes: impl IntoIterator<Item = S>) -> Self {
        let mut deduped: Vec<S> = Vec::new();
        for scope in scopes {
            if !deduped.contains(&scope) {
                deduped.push(scope);
            }
        }

        Self { scopes: deduped }
    }

    /// Requires nothing beyond a verified token
    #[inline]
    pub fn none() -> Self {
        Self { scopes: Vec::new() }
    }

    /// Whether no scopes are required
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }

    /// The number of distinct scopes required
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Iterates over the required scopes
    #[inline]
    pub fn iter(&self) -> slice::Iter<'_, S> {
        self.scopes.iter()
    }

    /// The required scopes as a space-delimited string
    #[must_use]
    pub fn scope_str(&self) -> String {
        let parts: Vec<&str> = self.scopes.iter().map(ScopeCatalog::as_str).collect();
        parts.join(" ")
    }

    /// Checks the granted permissions against the required scopes
    ///
    /// Permissions that are not required are ignored.
    ///
    /// # Errors
    ///
    /// Returns the first required scope not found among `permissions`.
    pub fn evaluate<P: AsRef<str>>(&self, permissions: &[P]) -> Result<(), InsufficientScope> {
        for scope in &self.scopes {
            let wanted = scope.as_str();
            if !permissions.iter().any(|p| p.as_ref() == wanted) {
                tracing::trace!(scope = wanted, "required scope not granted");
                return Err(InsufficientScope { missing: wanted });
            }
        }

        Ok(())
    }
}

impl<S: ScopeCatalog> Default for RequiredScopes<S> {
    #[inline]
    fn default() -> Self {
        Self::none()
    }
}

impl<S: ScopeCatalog> FromIterator<S> for RequiredScopes<S> {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

impl<'a, S> IntoIterator for &'a RequiredScopes<S> {
    type Item = &'a S;
    type IntoIter = slice::Iter<'a, S>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.scopes.iter()
    }
}
