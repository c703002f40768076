use jsonwebtoken::Algorithm;

use oidc_gate::discovery::DiscoveryDocument;
use oidc_gate::keys::SigningKey;
use oidc_gate::params::compose;
use oidc_gate::ValidationConfig;

fn config() -> ValidationConfig {
    ValidationConfig::new()
        .with_issuer("https://static-a.example")
        .with_issuer("https://static-b.example")
        .with_audience("api")
        .with_signing_key(SigningKey::secret(b"static-key".to_vec()).with_kid("s1"))
        .with_allowed_algorithm(Algorithm::HS256)
}

fn document() -> DiscoveryDocument {
    DiscoveryDocument {
        issuer: "https://idp.example".to_string(),
        signing_keys: vec![
            SigningKey::secret(b"d-one".to_vec()).with_kid("d1"),
            SigningKey::secret(b"d-two".to_vec()).with_kid("d2"),
        ],
    }
}

#[test]
fn discovery_entries_appended_after_static() {
    let params = compose(&config(), Some(&document()));
    assert_eq!(
        params.issuers,
        vec![
            "https://static-a.example",
            "https://static-b.example",
            "https://idp.example"
        ]
    );
    let kids: Vec<_> = params
        .signing_keys
        .iter()
        .map(|k| k.kid.as_deref().unwrap())
        .collect();
    assert_eq!(kids, vec!["s1", "d1", "d2"]);
}

#[test]
fn absent_discovery_uses_static_rules_alone() {
    let params = compose(&config(), None);
    assert_eq!(
        params.issuers,
        vec!["https://static-a.example", "https://static-b.example"]
    );
    assert_eq!(params.signing_keys.len(), 1);
    assert_eq!(params.audiences, vec!["api"]);
}

#[test]
fn duplicates_are_preserved() {
    let doc = DiscoveryDocument {
        issuer: "https://static-a.example".to_string(),
        signing_keys: Vec::new(),
    };
    let params = compose(&config(), Some(&doc));
    assert_eq!(
        params.issuers,
        vec![
            "https://static-a.example",
            "https://static-b.example",
            "https://static-a.example"
        ]
    );
}

#[test]
fn baseline_is_never_mutated() {
    let config = config();
    let doc = document();
    let first = compose(&config, Some(&doc));
    let second = compose(&config, Some(&doc));
    assert_eq!(first.issuers, second.issuers);
    assert_eq!(first.signing_keys.len(), second.signing_keys.len());
    assert_eq!(config.issuers.len(), 2);
    assert_eq!(config.signing_keys.len(), 1);
}

#[test]
fn flags_carry_over() {
    let config = config().without_lifetime_check().without_audience_check();
    let params = compose(&config, None);
    assert!(params.validate_issuer);
    assert!(!params.validate_audience);
    assert!(!params.validate_lifetime);
    assert!(params.validate_signing_key);
    assert_eq!(params.allowed_algorithms, vec![Algorithm::HS256]);
}
