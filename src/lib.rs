//! Bearer-token authentication for axum services, over two transports: a
//! per-request HTTP middleware and a per-connection WebSocket-upgrade gate,
//! both backed by one [`TokenAuthenticator`].
//!
//! Validation rules are the operator's static [`ValidationConfig`] merged on
//! every call with the identity provider's lazily discovered OpenID Connect
//! configuration (issuer + signing keys). The discovery document is fetched
//! at most once per process, with concurrent first callers sharing a single
//! in-flight fetch.

pub mod config;
pub mod discovery;
pub mod error;
pub mod extractor;
pub mod identity;
pub mod jwt;
pub mod keys;
pub mod params;
pub mod ws;

// Re-export primary public types for convenience.
pub use config::ValidationConfig;
pub use discovery::{DiscoveryCache, DiscoveryDocument, DiscoveryFetcher, HttpDiscoveryFetcher};
pub use error::AuthError;
pub use extractor::{authenticate_request, Unauthorized};
pub use identity::{Identity, RoleExtractor, StandardRoleExtractor};
pub use jwt::TokenAuthenticator;
pub use keys::SigningKey;
pub use params::{compose, EffectiveParams};
pub use ws::ConnectionStatus;

pub mod prelude {
    //! Re-exports of the most commonly used types.
    pub use crate::{
        authenticate_request, AuthError, ConnectionStatus, Identity, SigningKey,
        TokenAuthenticator, ValidationConfig,
    };
}
