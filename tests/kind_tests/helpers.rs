//! Shared helpers for the kind integration suite

use std::time::Duration;

use kube::Client;

use metacontroller_operator::manifest::{self, DeployContext, ManifestSet, RbacProfile};
use metacontroller_operator::{apply, Result};

/// Namespace the integration stories deploy into
pub const TEST_NAMESPACE: &str = "metacontroller-integration-test";

/// Connect to the cluster selected by the ambient kubeconfig
pub async fn test_client() -> Result<Client> {
    Ok(Client::try_default().await?)
}

/// Descriptor used by all integration stories
pub fn test_context() -> DeployContext {
    DeployContext::new(
        TEST_NAMESPACE,
        "metacontroller-operator",
        metacontroller_operator::DEFAULT_METACONTROLLER_IMAGE,
    )
    .expect("test descriptor must validate")
}

/// Render the standalone-profile manifest set for the test descriptor
pub fn test_manifests() -> ManifestSet {
    manifest::render(&test_context(), RbacProfile::Standalone).expect("render must succeed")
}

/// Ensure the test namespace exists
pub async fn ensure_namespace(client: &Client) -> Result<()> {
    let ns = serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": { "name": TEST_NAMESPACE }
    });
    apply::apply_object(client, &ns).await
}

/// Best-effort cleanup of everything a story may have left behind
pub async fn cleanup(client: &Client) {
    let set = test_manifests();
    let _ = apply::delete_all(client, &set.controller).await;
    let _ = apply::delete_all(client, &set.crds).await;
    let _ = apply::delete_all(client, &set.rbac).await;
}

/// Poll a condition until it holds or the deadline passes
pub async fn eventually<F, Fut>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let start = std::time::Instant::now();
    loop {
        if condition().await {
            return true;
        }
        if start.elapsed() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_secs(2)).await;
    }
}
