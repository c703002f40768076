use serde::{Deserialize, Serialize};

/// Trait for extracting roles from JWT claims.
///
/// Different OIDC providers store roles in different claim locations.
/// Implement this trait to customize role extraction for your provider.
pub trait RoleExtractor: Send + Sync {
    /// Extract roles from the given JWT claims.
    fn extract_roles(&self, claims: &serde_json::Value) -> Vec<String>;
}

/// Standard OIDC role extractor that reads from the top-level `roles` claim.
/// Zero-sized type, implements `Copy`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRoleExtractor;

impl RoleExtractor for StandardRoleExtractor {
    fn extract_roles(&self, claims: &serde_json::Value) -> Vec<String> {
        extract_string_array(claims, &["roles"])
    }
}

/// Extract a string array from a nested JSON path.
///
/// Returns an empty vec when any path segment is missing or the leaf is not
/// an array. Useful for providers that nest roles, e.g.
/// `extract_string_array(&claims, &["realm_access", "roles"])`.
pub fn extract_string_array(value: &serde_json::Value, path: &[&str]) -> Vec<String> {
    let mut current = value;

    for key in path {
        match current.get(*key) {
            Some(v) => current = v,
            None => return Vec::new(),
        }
    }

    current
        .as_array()
        .map(|arr| {
            arr.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

/// The identity established by a successful validation.
///
/// For HTTP this lives for one request (attached to request extensions by the
/// middleware); for WebSocket it lives for the whole connection (moved into
/// the socket task at upgrade time).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Identity {
    /// Subject claim ("sub") - unique caller identifier.
    pub sub: String,

    /// Email claim ("email"), if present in the token.
    pub email: Option<String>,

    /// Roles extracted from the token claims.
    pub roles: Vec<String>,

    /// Raw claims for advanced access.
    pub claims: serde_json::Value,
}

impl Identity {
    /// Build an `Identity` from validated JWT claims using the standard
    /// role extractor.
    pub fn from_claims(claims: serde_json::Value) -> Self {
        Self::from_claims_with(claims, &StandardRoleExtractor)
    }

    /// Build an `Identity` from claims with a custom role extractor.
    pub fn from_claims_with(claims: serde_json::Value, extractor: &impl RoleExtractor) -> Self {
        let sub = claims
            .get("sub")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();

        let email = claims
            .get("email")
            .and_then(|v| v.as_str())
            .map(String::from);

        let roles = extractor.extract_roles(&claims);

        Identity {
            sub,
            email,
            roles,
            claims,
        }
    }

    /// Check whether the identity has a specific role.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check whether the identity has any of the specified roles.
    pub fn has_any_role(&self, roles: &[&str]) -> bool {
        roles.iter().any(|role| self.has_role(role))
    }
}
