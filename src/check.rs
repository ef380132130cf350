//! Deployed-resource readiness checking
//!
//! After an install, the cluster owns the lifecycle of the applied objects;
//! this module only observes. It verifies that every rendered object exists
//! and that every StatefulSet reports as many ready replicas as it declares,
//! polling with backoff until a deadline. All abnormalities are captured in
//! logs before the aggregate failure is surfaced.

use std::time::Duration;

use k8s_openapi::api::apps::v1::StatefulSet;
use kube::{Api, Client};
use tracing::info;

use crate::apply::{self, ObjectRef};
use crate::error::Error;
use crate::manifest::ManifestSet;
use crate::retry::{retry_with_backoff, RetryConfig};
use crate::Result;

/// Validate a StatefulSet's readiness, returning a description of the problem
/// if its ready replica count differs from the desired count
pub fn validate_statefulset(sts: &StatefulSet) -> Option<String> {
    let name = sts.metadata.name.as_deref().unwrap_or("<unnamed>");
    let namespace = sts.metadata.namespace.as_deref().unwrap_or("<unset>");
    let expected = sts.spec.as_ref().and_then(|s| s.replicas).unwrap_or(1);
    let ready = sts
        .status
        .as_ref()
        .and_then(|s| s.ready_replicas)
        .unwrap_or(0);

    if ready != expected {
        Some(format!(
            "StatefulSet {} in namespace {} has {} readyReplicas, expected {}",
            name, namespace, ready, expected
        ))
    } else {
        None
    }
}

/// Check the current state of all deployed resources once
///
/// Returns `Ok(())` when every rendered object exists and all StatefulSets
/// are ready; otherwise an [`Error::CheckFailed`] naming every problem found.
pub async fn check_deployed_resources(client: &Client, set: &ManifestSet) -> Result<()> {
    let mut errors = Vec::new();

    info!("Checking for expected resources");
    for obj in set.all() {
        let object_ref = ObjectRef::from_manifest(obj)?;
        if apply::get_object(client, obj).await?.is_none() {
            errors.push(format!(
                "cannot find {} '{}'{}",
                object_ref.resource.kind,
                object_ref.name,
                object_ref
                    .namespace
                    .as_deref()
                    .map(|ns| format!(" in namespace '{}'", ns))
                    .unwrap_or_default()
            ));
        }
    }

    info!("Checking readiness of found StatefulSets");
    for obj in set.all() {
        let object_ref = ObjectRef::from_manifest(obj)?;
        if object_ref.resource.kind != "StatefulSet" {
            continue;
        }
        let Some(namespace) = object_ref.namespace.as_deref() else {
            continue;
        };
        let api: Api<StatefulSet> = Api::namespaced(client.clone(), namespace);
        match api.get(&object_ref.name).await {
            Ok(sts) => {
                if let Some(problem) = validate_statefulset(&sts) {
                    errors.push(problem);
                }
            }
            Err(kube::Error::Api(resp)) if resp.code == 404 => {
                // Already reported as missing above
            }
            Err(e) => return Err(Error::Kube(e)),
        }
    }

    for err in &errors {
        info!("{}", err);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(Error::check_failed(format!(
            "some Kubernetes resources missing/not ready: {}",
            errors.join("; ")
        )))
    }
}

/// Poll the deployed resources with backoff until they are all ready or the
/// deadline passes
pub async fn wait_until_ready(
    client: &Client,
    set: &ManifestSet,
    deadline: Duration,
) -> Result<()> {
    info!(
        deadline_secs = deadline.as_secs(),
        "Checking status of deployment in Kubernetes"
    );
    let config = RetryConfig {
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(15),
        ..RetryConfig::with_deadline(deadline)
    };
    retry_with_backoff(&config, "check_deployed_resources", || {
        check_deployed_resources(client, set)
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::{StatefulSetSpec, StatefulSetStatus};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn statefulset(replicas: i32, ready: Option<i32>) -> StatefulSet {
        StatefulSet {
            metadata: ObjectMeta {
                name: Some("metacontroller-operator".to_string()),
                namespace: Some("test-namespace".to_string()),
                ..Default::default()
            },
            spec: Some(StatefulSetSpec {
                replicas: Some(replicas),
                ..Default::default()
            }),
            status: Some(StatefulSetStatus {
                ready_replicas: ready,
                ..Default::default()
            }),
        }
    }

    // =========================================================================
    // Story: Readiness means readyReplicas matches the declared count
    // =========================================================================

    #[test]
    fn test_ready_statefulset_passes() {
        assert_eq!(validate_statefulset(&statefulset(1, Some(1))), None);
    }

    #[test]
    fn test_not_yet_ready_statefulset_reported() {
        let problem = validate_statefulset(&statefulset(1, Some(0))).unwrap();
        assert!(problem.contains("has 0 readyReplicas, expected 1"));
        assert!(problem.contains("metacontroller-operator"));
        assert!(problem.contains("test-namespace"));
    }

    #[test]
    fn test_absent_status_counts_as_zero_ready() {
        let problem = validate_statefulset(&statefulset(1, None)).unwrap();
        assert!(problem.contains("has 0 readyReplicas"));
    }

    #[test]
    fn test_unspecified_replicas_defaults_to_one() {
        let mut sts = statefulset(1, Some(1));
        sts.spec.as_mut().unwrap().replicas = None;
        assert_eq!(validate_statefulset(&sts), None);
    }
}
