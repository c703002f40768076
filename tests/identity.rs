use serde_json::json;

use oidc_gate::identity::{extract_string_array, Identity, RoleExtractor, StandardRoleExtractor};

#[test]
fn from_claims_reads_standard_fields() {
    let identity = Identity::from_claims(json!({
        "sub": "user-123",
        "email": "user@example.com",
        "roles": ["admin", "reader"],
    }));
    assert_eq!(identity.sub, "user-123");
    assert_eq!(identity.email.as_deref(), Some("user@example.com"));
    assert_eq!(identity.roles, vec!["admin", "reader"]);
}

#[test]
fn missing_fields_default_gracefully() {
    let identity = Identity::from_claims(json!({}));
    assert_eq!(identity.sub, "");
    assert!(identity.email.is_none());
    assert!(identity.roles.is_empty());
}

#[test]
fn raw_claims_are_preserved() {
    let identity = Identity::from_claims(json!({
        "sub": "user-123",
        "tenant_id": "acme",
    }));
    assert_eq!(identity.claims["tenant_id"], "acme");
}

#[test]
fn has_role_checks() {
    let identity = Identity::from_claims(json!({
        "sub": "user-123",
        "roles": ["admin"],
    }));
    assert!(identity.has_role("admin"));
    assert!(!identity.has_role("reader"));
    assert!(identity.has_any_role(&["reader", "admin"]));
    assert!(!identity.has_any_role(&["reader", "writer"]));
}

#[test]
fn standard_extractor_ignores_non_string_entries() {
    let roles = StandardRoleExtractor.extract_roles(&json!({
        "roles": ["admin", 42, null, "reader"],
    }));
    assert_eq!(roles, vec!["admin", "reader"]);
}

#[test]
fn nested_path_extraction() {
    let claims = json!({
        "realm_access": {
            "roles": ["admin", "user"]
        }
    });
    assert_eq!(
        extract_string_array(&claims, &["realm_access", "roles"]),
        vec!["admin", "user"]
    );
    assert!(extract_string_array(&claims, &["resource_access", "roles"]).is_empty());
    assert!(extract_string_array(&claims, &["realm_access"]).is_empty());
}

#[test]
fn custom_extractor_via_from_claims_with() {
    struct NestedExtractor;
    impl RoleExtractor for NestedExtractor {
        fn extract_roles(&self, claims: &serde_json::Value) -> Vec<String> {
            extract_string_array(claims, &["realm_access", "roles"])
        }
    }

    let identity = Identity::from_claims_with(
        json!({
            "sub": "user-123",
            "realm_access": { "roles": ["operator"] },
        }),
        &NestedExtractor,
    );
    assert_eq!(identity.roles, vec!["operator"]);
}
