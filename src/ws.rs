//! WebSocket-upgrade authentication.
//!
//! Runs once at connection establishment, before any message exchange. An
//! accepted connection carries its [`Identity`] for the connection's entire
//! lifetime; a rejection terminates the upgrade and no partial connection is
//! established. No retry happens here: the client must re-attempt the
//! handshake with a corrected token.

use std::collections::HashMap;
use std::future::Future;

use axum::extract::ws::{WebSocket, WebSocketUpgrade};
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde_json::Value;
use tracing::{debug, warn};

use crate::discovery::DiscoveryFetcher;
use crate::identity::Identity;
use crate::jwt::TokenAuthenticator;

/// Outcome of a WebSocket connection attempt.
///
/// A missing or non-string token rejects with no reason, so probing clients
/// learn nothing; a failed validation rejects with the failure's message.
#[derive(Debug)]
pub enum ConnectionStatus {
    Accepted(Identity),
    Rejected(Option<String>),
}

impl ConnectionStatus {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ConnectionStatus::Accepted(_))
    }

    /// The accepted identity, if any.
    pub fn identity(self) -> Option<Identity> {
        match self {
            ConnectionStatus::Accepted(identity) => Some(identity),
            ConnectionStatus::Rejected(_) => None,
        }
    }
}

async fn decide<F: DiscoveryFetcher>(
    authenticator: &TokenAuthenticator<F>,
    token: &str,
) -> ConnectionStatus {
    match authenticator.authenticate(token).await {
        Ok(identity) => {
            debug!(sub = %identity.sub, "WebSocket connection authenticated");
            ConnectionStatus::Accepted(identity)
        }
        Err(err) => {
            warn!(error = %err, "WebSocket connection rejected");
            ConnectionStatus::Rejected(Some(err.to_string()))
        }
    }
}

/// Authenticate a WebSocket upgrade from the handshake request headers.
pub async fn authenticate_upgrade<F: DiscoveryFetcher>(
    authenticator: &TokenAuthenticator<F>,
    headers: &HeaderMap,
) -> ConnectionStatus {
    match headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(value) => decide(authenticator, value).await,
        None => ConnectionStatus::Rejected(None),
    }
}

/// Authenticate a WebSocket connection from a connection-parameter property
/// bag, keyed by the `Authorization` header name.
///
/// Subscription protocols commonly carry credentials in an init payload
/// rather than the upgrade headers. A missing or non-string value rejects
/// immediately without touching the authenticator (and thus without
/// triggering a discovery fetch).
pub async fn authenticate_connection_params<F: DiscoveryFetcher>(
    authenticator: &TokenAuthenticator<F>,
    params: &HashMap<String, Value>,
) -> ConnectionStatus {
    let value = params
        .get("Authorization")
        .or_else(|| params.get(AUTHORIZATION.as_str()));

    match value.and_then(|v| v.as_str()) {
        Some(token) => decide(authenticator, token).await,
        None => ConnectionStatus::Rejected(None),
    }
}

/// 401 response terminating a rejected upgrade.
pub fn rejection_response(reason: Option<String>) -> Response {
    match reason {
        Some(reason) => (StatusCode::UNAUTHORIZED, reason).into_response(),
        None => StatusCode::UNAUTHORIZED.into_response(),
    }
}

/// Gate an upgrade and, on acceptance, run the socket task with the bound
/// identity.
///
/// # Example
///
/// ```ignore
/// async fn subscriptions(
///     ws: WebSocketUpgrade,
///     headers: HeaderMap,
///     State(authenticator): State<Arc<TokenAuthenticator>>,
/// ) -> Response {
///     ws::upgrade_with_identity(&authenticator, ws, &headers, |socket, identity| async move {
///         serve_subscriptions(socket, identity).await;
///     })
///     .await
/// }
/// ```
pub async fn upgrade_with_identity<F, H, Fut>(
    authenticator: &TokenAuthenticator<F>,
    ws: WebSocketUpgrade,
    headers: &HeaderMap,
    handler: H,
) -> Response
where
    F: DiscoveryFetcher,
    H: FnOnce(WebSocket, Identity) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    match authenticate_upgrade(authenticator, headers).await {
        ConnectionStatus::Accepted(identity) => {
            ws.on_upgrade(move |socket| handler(socket, identity))
        }
        ConnectionStatus::Rejected(reason) => rejection_response(reason),
    }
}
