use std::sync::Arc;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request, State};
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tracing::{debug, warn};

use crate::discovery::DiscoveryFetcher;
use crate::identity::Identity;
use crate::jwt::TokenAuthenticator;

/// Per-request authentication middleware.
///
/// Reads the `Authorization` header, authenticates it, and on success
/// attaches the resulting [`Identity`] to the request's extensions. On
/// failure the request proceeds unauthenticated: whether an anonymous caller
/// is acceptable is a downstream authorization decision, not this layer's.
///
/// # Example
///
/// ```ignore
/// let authenticator = Arc::new(TokenAuthenticator::new(config));
/// let app = Router::new()
///     .route("/graphql", post(graphql_handler))
///     .layer(middleware::from_fn_with_state(
///         authenticator.clone(),
///         authenticate_request,
///     ));
/// ```
pub async fn authenticate_request<F: DiscoveryFetcher>(
    State(authenticator): State<Arc<TokenAuthenticator<F>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    if let Some(value) = header {
        match authenticator.authenticate(&value).await {
            Ok(identity) => {
                debug!(uri = %request.uri(), sub = %identity.sub, "Authenticated request");
                request.extensions_mut().insert(identity);
            }
            Err(err) => {
                warn!(
                    uri = %request.uri(),
                    error = %err,
                    "Request authentication failed; continuing unauthenticated"
                );
            }
        }
    }

    next.run(request).await
}

/// Rejection for handlers that require an [`Identity`] when none was
/// attached by [`authenticate_request`].
#[derive(Debug)]
pub struct Unauthorized;

impl std::fmt::Display for Unauthorized {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Unauthorized")
    }
}

impl std::error::Error for Unauthorized {}

impl IntoResponse for Unauthorized {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": "Unauthorized" });
        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Require an authenticated identity.
///
/// Responds 401 when the middleware attached no identity (missing header or
/// failed validation).
///
/// ```ignore
/// async fn protected(identity: Identity) -> impl IntoResponse {
///     format!("Hello, {}!", identity.sub)
/// }
/// ```
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<Identity>().cloned().ok_or_else(|| {
            warn!(uri = %parts.uri, "Handler requires an identity but none was attached");
            Unauthorized
        })
    }
}

/// Optional identity for endpoints that serve both authenticated and
/// anonymous callers: `Option<Identity>` is `None` when no identity was
/// attached and never rejects.
impl<S> OptionalFromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = Unauthorized;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned())
    }
}
