//! OpenID Connect discovery: document types, fetch capability, and the
//! process-lifetime cache.
//!
//! The cache is populated lazily, exactly once: concurrent first callers
//! converge on a single in-flight fetch and share its result or its failure.
//! A failed attempt leaves the cache unpopulated so a later call retries.
//! The document is never refreshed after a successful fetch, so provider key
//! rotation is only picked up on process restart.

use std::future::Future;
use std::sync::Arc;

use futures_util::future::{BoxFuture, FutureExt, Shared};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::keys::{JwkSet, SigningKey};

/// The identity provider's discovery result: its issuer identifier and the
/// verification keys referenced by its metadata.
#[derive(Debug, Clone)]
pub struct DiscoveryDocument {
    pub issuer: String,
    pub signing_keys: Vec<SigningKey>,
}

/// Discovery metadata envelope. We only capture the fields we use.
#[derive(Debug, Deserialize)]
struct DiscoveryMetadata {
    issuer: String,
    jwks_uri: String,
}

/// Capability to fetch the discovery document.
///
/// The production implementation is [`HttpDiscoveryFetcher`]. Tests and
/// embedders with non-standard providers can supply their own.
pub trait DiscoveryFetcher: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = Result<DiscoveryDocument, AuthError>> + Send;
}

/// Fetches the well-known discovery metadata and the JWK set it references,
/// treating both as one logical fetch.
pub struct HttpDiscoveryFetcher {
    client: reqwest::Client,
    authority: String,
}

impl HttpDiscoveryFetcher {
    pub fn new(authority: impl Into<String>) -> Self {
        Self::with_client(authority, reqwest::Client::new())
    }

    /// Use a preconfigured client (timeouts, proxies, TLS settings).
    pub fn with_client(authority: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            client,
            authority: authority.into(),
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T, AuthError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AuthError::DiscoveryUnavailable(e.to_string()))?;

        let response = response
            .error_for_status()
            .map_err(|e| AuthError::DiscoveryUnavailable(e.to_string()))?;

        response
            .json()
            .await
            .map_err(|e| AuthError::DiscoveryUnavailable(format!("Failed to parse response: {e}")))
    }
}

impl DiscoveryFetcher for HttpDiscoveryFetcher {
    async fn fetch(&self) -> Result<DiscoveryDocument, AuthError> {
        let discovery_url = format!(
            "{}/.well-known/openid-configuration",
            self.authority.trim_end_matches('/')
        );
        let metadata: DiscoveryMetadata = self.get_json(&discovery_url).await?;
        let jwks: JwkSet = self.get_json(&metadata.jwks_uri).await?;

        let signing_keys = jwks
            .keys
            .iter()
            .filter_map(|jwk| match SigningKey::try_from(jwk) {
                Ok(key) => Some(key),
                Err(err) => {
                    warn!(kid = ?jwk.kid, error = %err, "Skipping unusable JWK");
                    None
                }
            })
            .collect();

        Ok(DiscoveryDocument {
            issuer: metadata.issuer,
            signing_keys,
        })
    }
}

/// The shared future's output must be `Clone`, so errors travel as their
/// message and are rewrapped per waiter.
type SharedFetch = Shared<BoxFuture<'static, Result<Arc<DiscoveryDocument>, String>>>;

enum FetchState {
    Empty,
    InFlight(SharedFetch),
    Ready(Arc<DiscoveryDocument>),
}

/// Lazy, exactly-once cache for the discovery document.
///
/// The first caller starts the fetch; concurrent callers await the same
/// shared future. A caller that is cancelled simply stops polling its clone:
/// the fetch itself is resumed by whichever waiter polls next, so one
/// caller's cancellation never aborts the fetch for the others.
pub struct DiscoveryCache<F> {
    fetcher: Arc<F>,
    state: Mutex<FetchState>,
}

impl<F: DiscoveryFetcher> DiscoveryCache<F> {
    pub fn new(fetcher: F) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            state: Mutex::new(FetchState::Empty),
        }
    }

    /// Return the cached document, fetching it on first use.
    ///
    /// After the first success this never touches the network again. On
    /// failure every current waiter receives the same
    /// [`AuthError::DiscoveryUnavailable`] and the cache stays unpopulated.
    pub async fn document(&self) -> Result<Arc<DiscoveryDocument>, AuthError> {
        let fut = {
            let mut state = self.state.lock().await;
            match &*state {
                FetchState::Ready(doc) => return Ok(Arc::clone(doc)),
                FetchState::InFlight(fut) => fut.clone(),
                FetchState::Empty => {
                    let fetcher = Arc::clone(&self.fetcher);
                    let fut: SharedFetch = async move {
                        fetcher.fetch().await.map(Arc::new).map_err(|e| match e {
                            AuthError::DiscoveryUnavailable(msg) => msg,
                            other => other.to_string(),
                        })
                    }
                    .boxed()
                    .shared();
                    *state = FetchState::InFlight(fut.clone());
                    fut
                }
            }
        };

        match fut.clone().await {
            Ok(doc) => {
                let mut state = self.state.lock().await;
                if !matches!(&*state, FetchState::Ready(_)) {
                    debug!(
                        issuer = %doc.issuer,
                        keys = doc.signing_keys.len(),
                        "Discovery document cached"
                    );
                    *state = FetchState::Ready(Arc::clone(&doc));
                }
                Ok(doc)
            }
            Err(msg) => {
                let mut state = self.state.lock().await;
                // Reset only if this attempt is still the current one, so a
                // newer in-flight fetch is never clobbered.
                if let FetchState::InFlight(current) = &*state {
                    if Shared::ptr_eq(current, &fut) {
                        warn!(error = %msg, "Discovery fetch failed");
                        *state = FetchState::Empty;
                    }
                }
                Err(AuthError::DiscoveryUnavailable(msg))
            }
        }
    }
}
