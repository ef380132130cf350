//! Workload types for the Metacontroller deployment
//!
//! This module defines the Kubernetes resource types rendered for the wrapped
//! controller's workload. The types are plain serde structs so that rendering
//! is a pure, deterministic serialization: BTreeMap-backed labels and fixed
//! field order make identical inputs produce byte-identical YAML.
//!
//! The controller runs as a single-replica StatefulSet with no persistent
//! volume claims; this layer never scales it horizontally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::DeployContext;
use crate::{HEALTHZ_PATH, HEALTH_PORT, METRICS_PORT, READYZ_PATH};

// =============================================================================
// Kubernetes Resource Types
// =============================================================================

/// Standard Kubernetes ObjectMeta
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ObjectMeta {
    /// Resource name
    pub name: String,
    /// Resource namespace (absent for cluster-scoped objects)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Labels
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    /// Annotations
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl ObjectMeta {
    /// Create metadata for a namespaced object with standard app labels
    pub fn namespaced(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            labels: standard_labels(&name),
            name,
            namespace: Some(namespace.into()),
            annotations: BTreeMap::new(),
        }
    }

    /// Create metadata for a cluster-scoped object with standard app labels
    pub fn cluster_scoped(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            labels: standard_labels(&name),
            name,
            namespace: None,
            annotations: BTreeMap::new(),
        }
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

fn standard_labels(name: &str) -> BTreeMap<String, String> {
    let mut labels = BTreeMap::new();
    labels.insert("app.kubernetes.io/name".to_string(), name.to_string());
    labels.insert(
        "app.kubernetes.io/managed-by".to_string(),
        "metacontroller-operator".to_string(),
    );
    labels
}

// =============================================================================
// StatefulSet
// =============================================================================

/// Kubernetes StatefulSet
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSet {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Spec
    pub spec: StatefulSetSpec,
}

/// StatefulSet spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StatefulSetSpec {
    /// Number of replicas. Always 1 for the wrapped controller.
    pub replicas: u32,
    /// Label selector
    pub selector: LabelSelector,
    /// Governing service name
    pub service_name: String,
    /// Pod template
    pub template: PodTemplateSpec,
    /// Volume claim templates. Always rendered, always empty: the controller
    /// keeps no persistent state in this deployment.
    pub volume_claim_templates: Vec<serde_json::Value>,
}

/// Label selector
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Match labels
    pub match_labels: BTreeMap<String, String>,
}

/// Pod template spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodTemplateSpec {
    /// Pod metadata
    pub metadata: PodMeta,
    /// Pod spec
    pub spec: PodSpec,
}

/// Pod metadata (subset of ObjectMeta)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodMeta {
    /// Labels
    pub labels: BTreeMap<String, String>,
}

/// Pod spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Service account name
    pub service_account_name: String,
    /// Containers
    pub containers: Vec<Container>,
}

/// Container spec
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    /// Container name
    pub name: String,
    /// Image
    pub image: String,
    /// Command
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    /// Args
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<Vec<String>>,
    /// Ports
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<ContainerPort>,
    /// Liveness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub liveness_probe: Option<ProbeSpec>,
    /// Readiness probe
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub readiness_probe: Option<ProbeSpec>,
}

/// Container port
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPort {
    /// Port name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Port number
    pub container_port: u16,
}

/// Probe specification
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProbeSpec {
    /// HTTP GET probe
    pub http_get: HttpGetAction,
    /// Initial delay seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay_seconds: Option<u32>,
    /// Period seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_seconds: Option<u32>,
}

/// HTTP GET action for probe
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HttpGetAction {
    /// Path
    pub path: String,
    /// Port
    pub port: u16,
}

// =============================================================================
// Workload Generation
// =============================================================================

/// Build the Metacontroller StatefulSet for the given deployment descriptor
///
/// The wrapped binary is invoked with a fixed argument surface
/// (`--zap-log-level=4 --discovery-interval=120s`); liveness and readiness
/// probes against its health endpoints are always rendered.
pub fn metacontroller_statefulset(ctx: &DeployContext) -> StatefulSet {
    let mut match_labels = BTreeMap::new();
    match_labels.insert("app.kubernetes.io/name".to_string(), ctx.app_name.clone());

    StatefulSet {
        api_version: "apps/v1".to_string(),
        kind: "StatefulSet".to_string(),
        metadata: ObjectMeta::namespaced(&ctx.app_name, &ctx.namespace),
        spec: StatefulSetSpec {
            replicas: 1,
            selector: LabelSelector {
                match_labels: match_labels.clone(),
            },
            service_name: String::new(),
            template: PodTemplateSpec {
                metadata: PodMeta {
                    labels: match_labels,
                },
                spec: PodSpec {
                    service_account_name: ctx.app_name.clone(),
                    containers: vec![Container {
                        name: ctx.app_name.clone(),
                        image: ctx.image.clone(),
                        command: Some(vec!["/usr/bin/metacontroller".to_string()]),
                        args: Some(vec![
                            "--zap-log-level=4".to_string(),
                            "--discovery-interval=120s".to_string(),
                        ]),
                        ports: vec![ContainerPort {
                            name: Some("metrics".to_string()),
                            container_port: METRICS_PORT,
                        }],
                        liveness_probe: Some(ProbeSpec {
                            http_get: HttpGetAction {
                                path: HEALTHZ_PATH.to_string(),
                                port: HEALTH_PORT,
                            },
                            initial_delay_seconds: Some(15),
                            period_seconds: Some(20),
                        }),
                        readiness_probe: Some(ProbeSpec {
                            http_get: HttpGetAction {
                                path: READYZ_PATH.to_string(),
                                port: HEALTH_PORT,
                            },
                            initial_delay_seconds: Some(5),
                            period_seconds: Some(10),
                        }),
                    }],
                },
            },
            volume_claim_templates: Vec::new(),
        },
    }
}
