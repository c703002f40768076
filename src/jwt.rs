use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, DecodingKey, Header, Validation};
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::ValidationConfig;
use crate::discovery::{DiscoveryCache, DiscoveryFetcher, HttpDiscoveryFetcher};
use crate::error::AuthError;
use crate::identity::Identity;
use crate::keys::SigningKey;
use crate::params::{compose, EffectiveParams};

/// Bearer token authenticator.
///
/// Composes the static [`ValidationConfig`] with the lazily discovered
/// provider configuration on every call, then verifies the token's
/// signature, issuer, audience, and lifetime. Exposes one operation:
/// [`authenticate`](TokenAuthenticator::authenticate).
///
/// When discovery fails, validation degrades to the static rules alone so a
/// misconfigured or unreachable provider does not take down authentication
/// for tokens the static configuration can verify.
pub struct TokenAuthenticator<F: DiscoveryFetcher = HttpDiscoveryFetcher> {
    config: ValidationConfig,
    discovery: Option<DiscoveryCache<F>>,
}

impl TokenAuthenticator {
    /// Create an authenticator from the static configuration.
    ///
    /// When `config.authority` is set, discovery runs against its well-known
    /// endpoint on first use; otherwise validation is static-only.
    pub fn new(config: ValidationConfig) -> Self {
        let discovery = config
            .authority
            .as_deref()
            .map(|authority| DiscoveryCache::new(HttpDiscoveryFetcher::new(authority)));
        Self { config, discovery }
    }
}

impl<F: DiscoveryFetcher> TokenAuthenticator<F> {
    /// Create an authenticator with a custom discovery fetch capability.
    pub fn with_fetcher(config: ValidationConfig, fetcher: F) -> Self {
        Self {
            config,
            discovery: Some(DiscoveryCache::new(fetcher)),
        }
    }

    /// Returns the static validation configuration.
    pub fn config(&self) -> &ValidationConfig {
        &self.config
    }

    /// Authenticate a bearer token.
    ///
    /// `header_value` is the raw `Authorization` value; a case-insensitive
    /// `Bearer ` prefix is stripped if present, and a bare token is accepted
    /// as-is. Verification never retries and mutates no shared state beyond
    /// the possible first-use discovery fetch.
    pub async fn authenticate(&self, header_value: &str) -> Result<Identity, AuthError> {
        let token = strip_bearer(header_value);

        let mut discovery_err = None;
        let document = match &self.discovery {
            None => None,
            Some(cache) => match cache.document().await {
                Ok(doc) => Some(doc),
                Err(err) => {
                    warn!(error = %err, "Discovery unavailable, validating with static rules only");
                    discovery_err = Some(err);
                    None
                }
            },
        };

        let params = compose(&self.config, document.as_deref());

        if params.validate_signing_key && params.signing_keys.is_empty() {
            // No key can verify anything; surface the actual cause instead
            // of a misleading signature failure.
            return Err(discovery_err.unwrap_or_else(|| {
                AuthError::DiscoveryUnavailable("no signing keys available".into())
            }));
        }

        let claims = verify(token, &params).map_err(|err| {
            warn!(error = %err, "Token validation failed");
            err
        })?;

        let identity = Identity::from_claims(claims);
        debug!(sub = %identity.sub, "Token validated");
        Ok(identity)
    }
}

/// Strip a case-insensitive `Bearer ` prefix, tolerating its absence.
fn strip_bearer(header_value: &str) -> &str {
    let trimmed = header_value.trim();
    match trimmed.get(..7) {
        Some(prefix) if prefix.eq_ignore_ascii_case("bearer ") => trimmed[7..].trim_start(),
        _ => trimmed,
    }
}

/// Verify a token against the effective parameters. Pure CPU work.
fn verify(token: &str, params: &EffectiveParams) -> Result<Value, AuthError> {
    let header = decode_header(token)
        .map_err(|e| AuthError::Malformed(format!("Failed to decode header: {e}")))?;

    debug!(algorithm = ?header.alg, kid = ?header.kid, "Decoded JWT header");

    if params.allowed_algorithms.is_empty() {
        return Err(AuthError::Malformed(
            "No allowed JWT algorithms configured".into(),
        ));
    }

    if !params.allowed_algorithms.contains(&header.alg) {
        return Err(AuthError::Malformed(format!(
            "Disallowed JWT algorithm: {:?}",
            header.alg
        )));
    }

    // Lifetime is checked first so Expired/NotYetValid are reported
    // independent of signature validity.
    if params.validate_lifetime {
        check_lifetime(token, &header, params)?;
    }

    let validation = claims_validation(&header, params);

    if !params.validate_signing_key {
        let mut validation = validation;
        validation.insecure_disable_signature_validation();
        let data = decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)
            .map_err(map_decode_error)?;
        return Ok(data.claims);
    }

    match header.kid.as_deref() {
        Some(kid) => {
            let Some(key) = params
                .signing_keys
                .iter()
                .find(|k| k.kid.as_deref() == Some(kid))
            else {
                warn!(kid = %kid, "No signing key matches token 'kid'");
                return Err(AuthError::BadSignature);
            };
            decode_with_key(token, key, &validation)
        }
        None => try_each_key(token, params, &validation),
    }
}

/// Validate exp/nbf alone, with signature checking disabled.
fn check_lifetime(token: &str, header: &Header, params: &EffectiveParams) -> Result<(), AuthError> {
    let mut validation = Validation::new(header.alg);
    validation.algorithms = params.allowed_algorithms.clone();
    validation.insecure_disable_signature_validation();
    validation.validate_exp = true;
    validation.validate_nbf = true;
    validation.validate_aud = false;

    decode::<Value>(token, &DecodingKey::from_secret(&[]), &validation)
        .map(|_| ())
        .map_err(map_decode_error)
}

/// Validation parameters for the signature/issuer/audience phase.
/// Lifetime flags are off here: exp/nbf were already checked.
fn claims_validation(header: &Header, params: &EffectiveParams) -> Validation {
    let mut validation = Validation::new(header.alg);
    validation.algorithms = params.allowed_algorithms.clone();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.set_required_spec_claims::<&str>(&[]);

    if params.validate_issuer {
        let issuers: Vec<&str> = params.issuers.iter().map(String::as_str).collect();
        validation.set_issuer(&issuers);
    }

    validation.validate_aud = params.validate_audience;
    if params.validate_audience {
        let audiences: Vec<&str> = params.audiences.iter().map(String::as_str).collect();
        validation.set_audience(&audiences);
    }

    validation
}

fn decode_with_key(
    token: &str,
    key: &SigningKey,
    validation: &Validation,
) -> Result<Value, AuthError> {
    let decoding_key = key.decoding_key()?;
    decode::<Value>(token, &decoding_key, validation)
        .map(|data| data.claims)
        .map_err(map_decode_error)
}

/// Trial verification across the whole effective key set, for tokens whose
/// header carries no `kid`. Signature mismatches move on to the next key;
/// any other failure means the signature matched and the claim error is real.
fn try_each_key(
    token: &str,
    params: &EffectiveParams,
    validation: &Validation,
) -> Result<Value, AuthError> {
    for key in &params.signing_keys {
        let decoding_key = match key.decoding_key() {
            Ok(k) => k,
            Err(err) => {
                warn!(kid = ?key.kid, error = %err, "Skipping unusable signing key");
                continue;
            }
        };

        match decode::<Value>(token, &decoding_key, validation) {
            Ok(data) => return Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm) => {
                continue;
            }
            Err(e) => return Err(map_decode_error(e)),
        }
    }

    Err(AuthError::BadSignature)
}

fn map_decode_error(e: jsonwebtoken::errors::Error) -> AuthError {
    match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::Expired,
        ErrorKind::ImmatureSignature => AuthError::NotYetValid,
        ErrorKind::InvalidIssuer => AuthError::UnknownIssuer,
        ErrorKind::InvalidAudience => AuthError::BadAudience,
        ErrorKind::InvalidSignature => AuthError::BadSignature,
        // Pre-checked against the allow-list, so this is a key/algorithm
        // family mismatch.
        ErrorKind::InvalidAlgorithm => AuthError::BadSignature,
        ErrorKind::MissingRequiredClaim(claim) => match claim.as_str() {
            "iss" => AuthError::UnknownIssuer,
            "aud" => AuthError::BadAudience,
            _ => AuthError::Malformed(e.to_string()),
        },
        _ => AuthError::Malformed(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::strip_bearer;

    #[test]
    fn strips_bearer_prefix() {
        assert_eq!(strip_bearer("Bearer abc123"), "abc123");
    }

    #[test]
    fn strips_case_insensitively() {
        assert_eq!(strip_bearer("bearer abc123"), "abc123");
        assert_eq!(strip_bearer("BEARER abc123"), "abc123");
        assert_eq!(strip_bearer("bEaReR abc123"), "abc123");
    }

    #[test]
    fn bare_token_passes_through() {
        assert_eq!(strip_bearer("abc123"), "abc123");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(strip_bearer("  Bearer   abc123"), "abc123");
        assert_eq!(strip_bearer(" abc123 "), "abc123");
    }

    #[test]
    fn bearer_without_space_is_a_bare_token() {
        // "Bearerabc" has no scheme separator; treat the whole value as the token.
        assert_eq!(strip_bearer("Bearerabc"), "Bearerabc");
    }

    #[test]
    fn empty_value() {
        assert_eq!(strip_bearer(""), "");
        assert_eq!(strip_bearer("Bearer "), "");
    }
}
