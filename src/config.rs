use jsonwebtoken::Algorithm;

use crate::keys::SigningKey;

/// Static validation rules for bearer tokens.
///
/// This is the operator-supplied baseline: it is created once at startup and
/// never mutated afterwards. Discovery-derived issuers and keys are merged
/// with it per call (see [`compose`](crate::params::compose)), never into it.
#[derive(Clone, Debug)]
pub struct ValidationConfig {
    /// Base URL of the identity provider, used to derive the well-known
    /// discovery endpoint. When `None`, validation runs static-only.
    pub authority: Option<String>,

    /// Audience allow-list checked against the "aud" claim.
    pub audiences: Vec<String>,

    /// Issuer allow-list checked against the "iss" claim.
    pub issuers: Vec<String>,

    /// Statically configured verification keys, checked ahead of any
    /// discovered keys.
    pub signing_keys: Vec<SigningKey>,

    /// Validate the "iss" claim against the effective issuer allow-list.
    pub validate_issuer: bool,

    /// Validate the "aud" claim against the effective audience allow-list.
    pub validate_audience: bool,

    /// Validate "exp" and "nbf" against the current time.
    pub validate_lifetime: bool,

    /// Verify the token signature against the effective key set.
    pub validate_signing_key: bool,

    /// Allowed JWT algorithms. Tokens using other algorithms are rejected.
    /// Default: RS256 only.
    pub allowed_algorithms: Vec<Algorithm>,
}

impl ValidationConfig {
    /// Create a config with all validation checks enabled and RS256 allowed.
    pub fn new() -> Self {
        Self {
            authority: None,
            audiences: Vec::new(),
            issuers: Vec::new(),
            signing_keys: Vec::new(),
            validate_issuer: true,
            validate_audience: true,
            validate_lifetime: true,
            validate_signing_key: true,
            allowed_algorithms: vec![Algorithm::RS256],
        }
    }

    /// Set the identity provider authority URL used for discovery.
    pub fn with_authority(mut self, authority: impl Into<String>) -> Self {
        self.authority = Some(authority.into());
        self
    }

    /// Add an audience to the allow-list.
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audiences.push(audience.into());
        self
    }

    /// Add an issuer to the allow-list.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuers.push(issuer.into());
        self
    }

    /// Add a statically configured verification key.
    pub fn with_signing_key(mut self, key: SigningKey) -> Self {
        self.signing_keys.push(key);
        self
    }

    /// Set the allowed JWT algorithms. Empty lists will cause validation to fail.
    pub fn with_allowed_algorithms(
        mut self,
        algorithms: impl IntoIterator<Item = Algorithm>,
    ) -> Self {
        self.allowed_algorithms = algorithms.into_iter().collect();
        self
    }

    /// Convenience method to allow a single algorithm.
    pub fn with_allowed_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.allowed_algorithms = vec![algorithm];
        self
    }

    /// Disable issuer validation.
    pub fn without_issuer_check(mut self) -> Self {
        self.validate_issuer = false;
        self
    }

    /// Disable audience validation.
    pub fn without_audience_check(mut self) -> Self {
        self.validate_audience = false;
        self
    }

    /// Disable expiry and not-before validation.
    pub fn without_lifetime_check(mut self) -> Self {
        self.validate_lifetime = false;
        self
    }

    /// Disable signature verification. Only sensible behind a trusted
    /// gateway that has already verified the token.
    pub fn without_signature_check(mut self) -> Self {
        self.validate_signing_key = false;
        self
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new()
    }
}
