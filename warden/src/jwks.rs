use serde::{Deserialize, Deserializer, Serialize};

use crate::{jwa, jwk, Jwk};

/// A JSON Web Key Set, as published at an issuer's `jwks_uri`
///
/// Entries that do not describe a usable RSA key are skipped with a warning
/// while deserializing. Issuers often publish encryption or symmetric keys
/// next to their signing keys.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Jwks {
    #[serde(deserialize_with = "usable_keys")]
    keys: Vec<Jwk>,
}

impl Jwks {
    /// Adds a key to the set
    pub fn add_key(&mut self, key: Jwk) {
        self.keys.push(key);
    }

    /// The keys in publication order
    pub fn keys(&self) -> &[Jwk] {
        &self.keys
    }

    /// Whether the set holds no usable keys
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Picks the key to verify a token signed with `alg`, naming `kid` if
    /// the token has one
    ///
    /// Keys that refuse `alg`, or that publish a different `kid`, are never
    /// picked. Among the rest, a matching `kid` outranks a pinned
    /// algorithm, which outranks a declared use. Ties go to the key
    /// published first.
    pub fn get_key_by_opt(
        &self,
        kid: Option<&jwk::KeyIdRef>,
        alg: jwa::Algorithm,
    ) -> Option<&Jwk> {
        self.keys
            .iter()
            .rev()
            .filter(|key| key.permits(alg))
            .filter_map(|key| {
                let id_rank = match (kid, key.key_id()) {
                    (Some(wanted), Some(id)) if id == wanted => 4,
                    (Some(_), Some(_)) => return None,
                    _ => 0,
                };
                let alg_rank = if key.algorithm().is_some() { 2 } else { 0 };
                let use_rank = u8::from(key.usage().is_some());
                Some((key, id_rank + alg_rank + use_rank))
            })
            .max_by_key(|&(_, rank)| rank)
            .map(|(key, _)| key)
    }
}

fn usable_keys<'de, D>(deserializer: D) -> Result<Vec<Jwk>, D::Error>
where
    D: Deserializer<'de>,
{
    let published = Vec::<serde_json::Value>::deserialize(deserializer)?;

    let keys = published
        .iter()
        .enumerate()
        .filter_map(|(idx, entry)| match Jwk::deserialize(entry) {
            Ok(key) => Some(key),
            Err(err) => {
                let error: &dyn std::error::Error = &err;
                tracing::warn!(
                    error,
                    jwks.idx = idx,
                    jwk.kid = ?entry.get("kid"),
                    jwk.kty = ?entry.get("kty"),
                    jwk.alg = ?entry.get("alg"),
                    "ignoring unusable JWK"
                );
                None
            }
        })
        .collect();

    Ok(keys)
}
