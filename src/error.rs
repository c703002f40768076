use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Authentication errors for token validation and discovery.
///
/// Each validation failure has a distinct variant so callers can log and
/// observe the specific cause. None of these are retried internally.
#[derive(Debug)]
pub enum AuthError {
    /// The discovery document could not be fetched or parsed.
    /// Recoverable: the next call may retry the fetch.
    DiscoveryUnavailable(String),

    /// The token is not structurally parseable (or uses a disallowed algorithm).
    Malformed(String),

    /// The token's signature does not verify against any allow-listed key.
    BadSignature,

    /// The token's issuer is not in the effective issuer allow-list.
    UnknownIssuer,

    /// The token's audience is not in the effective audience allow-list.
    BadAudience,

    /// The token's expiry is in the past.
    Expired,

    /// The token's not-before is in the future.
    NotYetValid,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::DiscoveryUnavailable(msg) => write!(f, "Discovery unavailable: {msg}"),
            AuthError::Malformed(msg) => write!(f, "Malformed token: {msg}"),
            AuthError::BadSignature => write!(f, "Invalid token signature"),
            AuthError::UnknownIssuer => write!(f, "Unknown issuer"),
            AuthError::BadAudience => write!(f, "Invalid audience"),
            AuthError::Expired => write!(f, "Token expired"),
            AuthError::NotYetValid => write!(f, "Token not yet valid"),
        }
    }
}

impl std::error::Error for AuthError {}

impl AuthError {
    /// Message safe to return to unauthenticated callers over HTTP.
    /// The specific failure cause is logged, not disclosed.
    pub fn public_message(&self) -> &'static str {
        "Unauthorized"
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.public_message() });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}
