use jsonwebtoken::DecodingKey;
use serde::Deserialize;

use crate::error::AuthError;

/// Raw JWK structure as returned by a JWKS endpoint.
/// Extra fields are allowed by serde's default behavior; we only capture
/// the fields we need plus a few common ones.
#[derive(Debug, Clone, Deserialize)]
#[allow(dead_code)]
pub(crate) struct Jwk {
    /// Key ID
    pub kid: Option<String>,
    /// Key type (e.g. "RSA")
    pub kty: String,
    /// Algorithm (e.g. "RS256")
    #[serde(default)]
    pub alg: Option<String>,
    /// RSA modulus (base64url)
    #[serde(default)]
    pub n: Option<String>,
    /// RSA exponent (base64url)
    #[serde(default)]
    pub e: Option<String>,
}

/// JWKS response envelope.
#[derive(Debug, Deserialize)]
pub(crate) struct JwkSet {
    pub keys: Vec<Jwk>,
}

/// Key material stored as reconstructible components, since `DecodingKey`
/// does not implement `Clone`.
#[derive(Debug, Clone)]
enum KeyMaterial {
    Rsa { n: String, e: String },
    Secret(Vec<u8>),
}

/// A public verification key, optionally tagged with its `kid`.
///
/// Static keys come from operator configuration; discovered keys come from
/// the provider's JWKS. Both are held in this form and turned into a
/// `DecodingKey` on demand at verification time.
#[derive(Debug, Clone)]
pub struct SigningKey {
    pub kid: Option<String>,
    material: KeyMaterial,
}

impl SigningKey {
    /// Build an RSA key from its base64url modulus and exponent.
    pub fn rsa(n: impl Into<String>, e: impl Into<String>) -> Self {
        Self {
            kid: None,
            material: KeyMaterial::Rsa {
                n: n.into(),
                e: e.into(),
            },
        }
    }

    /// Build a symmetric key from a shared secret (HS* algorithms).
    pub fn secret(secret: impl Into<Vec<u8>>) -> Self {
        Self {
            kid: None,
            material: KeyMaterial::Secret(secret.into()),
        }
    }

    /// Tag this key with a key identifier.
    pub fn with_kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Construct the `DecodingKey` for this key material.
    pub(crate) fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        match &self.material {
            KeyMaterial::Rsa { n, e } => DecodingKey::from_rsa_components(n, e).map_err(|err| {
                AuthError::Malformed(format!("Failed to construct RSA decoding key: {err}"))
            }),
            KeyMaterial::Secret(secret) => Ok(DecodingKey::from_secret(secret)),
        }
    }
}

impl TryFrom<&Jwk> for SigningKey {
    type Error = AuthError;

    fn try_from(jwk: &Jwk) -> Result<Self, AuthError> {
        match jwk.kty.as_str() {
            "RSA" => {
                let n = jwk.n.as_deref().ok_or_else(|| {
                    AuthError::Malformed("RSA key missing 'n' component".into())
                })?;
                let e = jwk.e.as_deref().ok_or_else(|| {
                    AuthError::Malformed("RSA key missing 'e' component".into())
                })?;
                let mut key = SigningKey::rsa(n, e);
                key.kid = jwk.kid.clone();
                Ok(key)
            }
            other => Err(AuthError::Malformed(format!(
                "Unsupported key type: {other}"
            ))),
        }
    }
}
