use jsonwebtoken::Algorithm;

use crate::config::ValidationConfig;
use crate::discovery::DiscoveryDocument;
use crate::keys::SigningKey;

/// Effective validation parameters for one `authenticate` call.
///
/// Derived by [`compose`] from the static config and the discovery document.
/// Ephemeral: rebuilt on every call and never shared, so concurrent callers
/// can never observe a partially merged value.
#[derive(Debug, Clone)]
pub struct EffectiveParams {
    pub issuers: Vec<String>,
    pub audiences: Vec<String>,
    pub signing_keys: Vec<SigningKey>,
    pub validate_issuer: bool,
    pub validate_audience: bool,
    pub validate_lifetime: bool,
    pub validate_signing_key: bool,
    pub allowed_algorithms: Vec<Algorithm>,
}

/// Merge the static baseline with the discovery result.
///
/// Discovery-sourced issuer and keys are appended after the static entries.
/// No deduplication: the verification engine performs membership checks, so
/// duplicates are harmless. When discovery is absent the static rules stand
/// alone (degraded-but-available mode). The baseline is never mutated.
pub fn compose(
    config: &ValidationConfig,
    discovery: Option<&DiscoveryDocument>,
) -> EffectiveParams {
    let mut issuers = config.issuers.clone();
    let mut signing_keys = config.signing_keys.clone();

    if let Some(doc) = discovery {
        issuers.push(doc.issuer.clone());
        signing_keys.extend(doc.signing_keys.iter().cloned());
    }

    EffectiveParams {
        issuers,
        audiences: config.audiences.clone(),
        signing_keys,
        validate_issuer: config.validate_issuer,
        validate_audience: config.validate_audience,
        validate_lifetime: config.validate_lifetime,
        validate_signing_key: config.validate_signing_key,
        allowed_algorithms: config.allowed_algorithms.clone(),
    }
}
