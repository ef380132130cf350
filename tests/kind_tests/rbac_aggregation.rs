//! Integration tests for ClusterRole aggregation
//!
//! The aggregated roles are the reason admins, editors, and viewers can touch
//! metacontroller custom resources without extra grants. These stories verify
//! the cluster's aggregation controller actually picks our labels up, which
//! is exactly what breaks when a label is misspelled.

use std::time::Duration;

use k8s_openapi::api::rbac::v1::ClusterRole;
use kube::{Api, Client};

use metacontroller_operator::apply;

use super::helpers::{cleanup, eventually, test_client, test_manifests};

/// True when the built-in role's aggregated rules cover the metacontroller
/// API group
async fn role_covers_metacontroller(client: &Client, role_name: &str) -> bool {
    let api: Api<ClusterRole> = Api::all(client.clone());
    let Ok(role) = api.get(role_name).await else {
        return false;
    };
    role.rules
        .unwrap_or_default()
        .iter()
        .any(|rule| {
            rule.api_groups
                .as_deref()
                .unwrap_or_default()
                .contains(&"metacontroller.k8s.io".to_string())
        })
}

/// Story: Editors inherit custom-resource permissions through aggregation
///
/// After applying the RBAC bundle, the cluster's aggregation controller must
/// merge the `aggregate-metacontroller-edit` rules into the built-in `edit`
/// and `admin` roles, with no binding changes on our side.
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_edit_and_admin_inherit_custom_resource_access() {
    let client = test_client().await.expect("failed to connect to cluster");
    cleanup(&client).await;

    let set = test_manifests();
    apply::apply_all(&client, &set.rbac).await.expect("rbac apply");

    for role in ["edit", "admin"] {
        let propagated = eventually(Duration::from_secs(60), || {
            role_covers_metacontroller(&client, role)
        })
        .await;
        assert!(
            propagated,
            "built-in '{}' role should aggregate metacontroller rules",
            role
        );
    }

    cleanup(&client).await;
}

/// Story: Viewers get read-only access through aggregation
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_view_inherits_readonly_access() {
    let client = test_client().await.expect("failed to connect to cluster");
    cleanup(&client).await;

    let set = test_manifests();
    apply::apply_all(&client, &set.rbac).await.expect("rbac apply");

    let propagated = eventually(Duration::from_secs(60), || {
        role_covers_metacontroller(&client, "view")
    })
    .await;
    assert!(propagated, "built-in 'view' role should aggregate metacontroller rules");

    // The aggregated view rules must never include mutation verbs
    let api: Api<ClusterRole> = Api::all(client.clone());
    let view = api.get("view").await.expect("get view role");
    for rule in view.rules.unwrap_or_default() {
        let groups = rule.api_groups.clone().unwrap_or_default();
        if groups.contains(&"metacontroller.k8s.io".to_string()) {
            let verbs = rule.verbs;
            assert!(!verbs.contains(&"create".to_string()));
            assert!(!verbs.contains(&"delete".to_string()));
            assert!(!verbs.contains(&"update".to_string()));
        }
    }

    cleanup(&client).await;
}
