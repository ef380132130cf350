//! Integration tests for the install / check / remove lifecycle
//!
//! These tests tell the story of a lifecycle manager driving the charm
//! against a real cluster: installing the full manifest set, verifying
//! idempotent re-application, and removing everything again.

use std::time::Duration;

use kube::api::{Api, DynamicObject};

use metacontroller_operator::apply::{self, ObjectRef};
use metacontroller_operator::lifecycle::{Lifecycle, Status};
use metacontroller_operator::manifest::RbacProfile;
use metacontroller_operator::{check, Error};

use super::helpers::{
    cleanup, ensure_namespace, eventually, test_client, test_context, test_manifests,
};

/// Story: Install creates every rendered object in the cluster
///
/// When the lifecycle manager emits the install event, the charm applies
/// the RBAC bundle, the CRDs, and the controller StatefulSet. Every object
/// must be retrievable afterwards under its rendered name.
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_install_creates_all_objects() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");
    cleanup(&client).await;

    let set = test_manifests();
    apply::apply_all(&client, &set.rbac)
        .await
        .expect("rbac apply");
    apply::apply_all(&client, &set.crds)
        .await
        .expect("crd apply");
    apply::apply_all(&client, &set.controller)
        .await
        .expect("controller apply");

    for obj in set.all() {
        let found = apply::get_object(&client, obj).await.expect("get");
        let object_ref = ObjectRef::from_manifest(obj).unwrap();
        assert!(
            found.is_some(),
            "{} '{}' should exist after install",
            object_ref.resource.kind,
            object_ref.name
        );
    }

    cleanup(&client).await;
}

/// Story: Re-applying the same manifest set is a no-op
///
/// Server-side apply with a stable field manager must converge: applying the
/// identical set twice may not bump the StatefulSet generation or duplicate
/// any object.
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_reapply_produces_no_diff() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");
    cleanup(&client).await;

    let set = test_manifests();
    for obj in set.all() {
        apply::apply_object(&client, obj).await.expect("first apply");
    }

    let sts_ref = ObjectRef::from_manifest(&set.controller[0]).unwrap();
    let api: Api<DynamicObject> = sts_ref.api(&client);
    let before = api.get(&sts_ref.name).await.expect("get after first apply");

    for obj in set.all() {
        apply::apply_object(&client, obj).await.expect("second apply");
    }

    let after = api.get(&sts_ref.name).await.expect("get after second apply");
    assert_eq!(
        before.metadata.generation, after.metadata.generation,
        "re-apply must not change the StatefulSet generation"
    );

    cleanup(&client).await;
}

/// Story: The readiness check converges once the controller starts
///
/// After install, the charm polls until the StatefulSet reports one ready
/// replica. With the real upstream image this takes an image pull plus
/// startup, so the deadline is generous.
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_readiness_check_converges() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");
    cleanup(&client).await;

    let set = test_manifests();
    apply::apply_all(&client, &set.rbac).await.expect("rbac");
    apply::apply_all(&client, &set.crds).await.expect("crds");
    apply::apply_all(&client, &set.controller)
        .await
        .expect("controller");

    check::wait_until_ready(&client, &set, Duration::from_secs(300))
        .await
        .expect("deployment should become ready");

    cleanup(&client).await;
}

/// Story: A missing object fails the check with a named culprit
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_check_names_missing_objects() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");
    cleanup(&client).await;

    let set = test_manifests();
    // Apply everything except the StatefulSet
    apply::apply_all(&client, &set.rbac).await.expect("rbac");
    apply::apply_all(&client, &set.crds).await.expect("crds");

    let err = check::check_deployed_resources(&client, &set)
        .await
        .expect_err("check must fail with the controller missing");
    match err {
        Error::CheckFailed(msg) => {
            assert!(msg.contains("StatefulSet"), "culprit named: {}", msg)
        }
        other => panic!("expected CheckFailed, got {:?}", other),
    }

    cleanup(&client).await;
}

/// Story: Drift reports maintenance while it reinstalls
///
/// When update-status finds the controller StatefulSet gone, it surfaces a
/// transient maintenance status, reinstalls, and ends up active again.
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_drift_reports_maintenance_and_reinstalls() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");
    cleanup(&client).await;

    let lifecycle = Lifecycle::new(client.clone(), test_context(), RbacProfile::Standalone)
        .with_check_deadline(Duration::from_secs(300));
    let installed = lifecycle.install().await.expect("install");
    assert_eq!(installed, Status::Active);

    // Simulate drift by deleting the controller StatefulSet out from under
    // the charm
    let set = test_manifests();
    apply::delete_all(&client, &set.controller)
        .await
        .expect("delete controller");

    let mut seen = Vec::new();
    let final_status = lifecycle
        .update_status(|status| seen.push(status.clone()))
        .await
        .expect("update-status");

    assert!(
        seen.iter().any(|s| matches!(s, Status::Maintenance(_))),
        "drift must surface a maintenance status, saw: {:?}",
        seen
    );
    assert_eq!(
        final_status,
        Status::Active,
        "reinstall must converge back to active"
    );

    cleanup(&client).await;
}

/// Story: Remove deletes everything and tolerates repeats
#[tokio::test]
#[ignore = "requires kind cluster - run with: cargo test --test kind -- --ignored"]
async fn story_remove_is_idempotent() {
    let client = test_client().await.expect("failed to connect to cluster");
    ensure_namespace(&client).await.expect("namespace setup");

    let set = test_manifests();
    for obj in set.all() {
        apply::apply_object(&client, obj).await.expect("apply");
    }

    apply::delete_all(&client, &set.controller).await.expect("delete controller");
    apply::delete_all(&client, &set.crds).await.expect("delete crds");
    apply::delete_all(&client, &set.rbac).await.expect("delete rbac");

    // Deleting again must not fail
    apply::delete_all(&client, &set.rbac)
        .await
        .expect("repeat delete tolerated");

    let gone = eventually(Duration::from_secs(60), || async {
        for obj in set.all() {
            if apply::get_object(&client, obj)
                .await
                .map(|o| o.is_some())
                .unwrap_or(true)
            {
                return false;
            }
        }
        true
    })
    .await;
    assert!(gone, "all objects should be gone after remove");
}
