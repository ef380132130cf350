//! RBAC bundle for the Metacontroller deployment
//!
//! The operator's permission scope is a declared, reviewable policy object:
//! a named [`RbacProfile`] selected by configuration, never an ad hoc YAML
//! variant. Two profiles exist, matching the two deployment shapes observed
//! in the field:
//!
//! - [`RbacProfile::Standalone`]: full wildcard permissions, for clusters
//!   where the controller manages arbitrary child resources.
//! - [`RbacProfile::MeshIntegrated`]: a scoped rule set covering the core
//!   resources plus Istio traffic policy, for mesh-and-dispatcher clusters.
//!
//! The bundle also carries two aggregated ClusterRoles whose labels hook the
//! metacontroller custom resources into the cluster's built-in admin/edit/view
//! roles. Those labels must be spelled exactly as the aggregation convention
//! requires or permissions silently fail to propagate.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::workload::ObjectMeta;
use super::DeployContext;
use crate::error::Error;

/// API group of the metacontroller custom resources (consumed, not owned)
pub const METACONTROLLER_API_GROUP: &str = "metacontroller.k8s.io";

/// Custom resource plural names in the metacontroller API group
pub const METACONTROLLER_RESOURCES: [&str; 3] = [
    "compositecontrollers",
    "controllerrevisions",
    "decoratorcontrollers",
];

// =============================================================================
// RBAC Resource Types
// =============================================================================

/// Kubernetes ServiceAccount
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceAccount {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
}

/// Kubernetes ClusterRole
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRole {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Permission rules
    pub rules: Vec<PolicyRule>,
}

/// A single RBAC policy rule
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    /// API groups the rule applies to
    pub api_groups: Vec<String>,
    /// Resources the rule applies to
    pub resources: Vec<String>,
    /// Allowed verbs
    pub verbs: Vec<String>,
}

impl PolicyRule {
    /// Build a rule from static string slices
    pub fn new(api_groups: &[&str], resources: &[&str], verbs: &[&str]) -> Self {
        Self {
            api_groups: api_groups.iter().map(|s| s.to_string()).collect(),
            resources: resources.iter().map(|s| s.to_string()).collect(),
            verbs: verbs.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Kubernetes ClusterRoleBinding
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClusterRoleBinding {
    /// API version
    pub api_version: String,
    /// Kind
    pub kind: String,
    /// Metadata
    pub metadata: ObjectMeta,
    /// Referenced role
    pub role_ref: RoleRef,
    /// Bound subjects
    pub subjects: Vec<Subject>,
}

/// Reference to the granted role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoleRef {
    /// API group of the role
    pub api_group: String,
    /// Role kind
    pub kind: String,
    /// Role name
    pub name: String,
}

/// A subject bound to a role
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    /// Subject kind
    pub kind: String,
    /// Subject name
    pub name: String,
    /// Subject namespace
    pub namespace: String,
}

// =============================================================================
// Permission Profiles
// =============================================================================

/// Named permission profile for the operator's own ClusterRole
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RbacProfile {
    /// Full wildcard permissions. The controller may manage arbitrary child
    /// resources, so the standalone deployment grants everything.
    #[default]
    Standalone,
    /// Scoped permissions for clusters where the controller runs alongside a
    /// service mesh and dispatcher and only touches a known resource set.
    MeshIntegrated,
}

impl RbacProfile {
    /// Canonical name of the profile, as used in configuration
    pub fn name(&self) -> &'static str {
        match self {
            Self::Standalone => "standalone",
            Self::MeshIntegrated => "mesh-integrated",
        }
    }

    /// Permission rules granted to the operator under this profile
    pub fn rules(&self) -> Vec<PolicyRule> {
        match self {
            Self::Standalone => vec![PolicyRule::new(&["*"], &["*"], &["*"])],
            Self::MeshIntegrated => vec![
                PolicyRule::new(
                    &[""],
                    &[
                        "namespaces",
                        "secrets",
                        "serviceaccounts",
                        "configmaps",
                        "services",
                        "events",
                    ],
                    &["create", "delete", "get", "list", "patch", "update", "watch"],
                ),
                PolicyRule::new(
                    &["apps"],
                    &["deployments", "statefulsets"],
                    &["create", "delete", "get", "list", "patch", "update", "watch"],
                ),
                PolicyRule::new(
                    &["networking.istio.io"],
                    &["destinationrules"],
                    &["create", "delete", "get", "list", "patch", "update", "watch"],
                ),
                PolicyRule::new(
                    &["security.istio.io"],
                    &["authorizationpolicies"],
                    &["create", "delete", "get", "list", "patch", "update", "watch"],
                ),
                PolicyRule::new(
                    &[METACONTROLLER_API_GROUP],
                    &METACONTROLLER_RESOURCES,
                    &["get", "list", "watch"],
                ),
            ],
        }
    }
}

impl FromStr for RbacProfile {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "standalone" => Ok(Self::Standalone),
            "mesh-integrated" => Ok(Self::MeshIntegrated),
            other => Err(Error::invalid_config(format!(
                "unknown rbac profile '{}', expected 'standalone' or 'mesh-integrated'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for RbacProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Bundle Generation
// =============================================================================

/// Build the operator ServiceAccount
pub fn service_account(ctx: &DeployContext) -> ServiceAccount {
    ServiceAccount {
        api_version: "v1".to_string(),
        kind: "ServiceAccount".to_string(),
        metadata: ObjectMeta::namespaced(&ctx.app_name, &ctx.namespace),
    }
}

/// Build the operator ClusterRole for the selected profile
pub fn operator_cluster_role(ctx: &DeployContext, profile: RbacProfile) -> ClusterRole {
    ClusterRole {
        api_version: "rbac.authorization.k8s.io/v1".to_string(),
        kind: "ClusterRole".to_string(),
        metadata: ObjectMeta::cluster_scoped(&ctx.app_name)
            .with_label("metacontroller-operator/rbac-profile", profile.name()),
        rules: profile.rules(),
    }
}

/// Build the binding of the operator ServiceAccount to its ClusterRole
pub fn operator_cluster_role_binding(ctx: &DeployContext) -> ClusterRoleBinding {
    ClusterRoleBinding {
        api_version: "rbac.authorization.k8s.io/v1".to_string(),
        kind: "ClusterRoleBinding".to_string(),
        metadata: ObjectMeta::cluster_scoped(&ctx.app_name),
        role_ref: RoleRef {
            api_group: "rbac.authorization.k8s.io".to_string(),
            kind: "ClusterRole".to_string(),
            name: ctx.app_name.clone(),
        },
        subjects: vec![Subject {
            kind: "ServiceAccount".to_string(),
            name: ctx.app_name.clone(),
            namespace: ctx.namespace.clone(),
        }],
    }
}

/// Build the aggregated ClusterRole merged into the built-in admin/edit roles
///
/// Anyone holding the cluster's admin or edit role inherits full access to
/// the metacontroller custom resources through label aggregation.
pub fn aggregate_edit_cluster_role() -> ClusterRole {
    ClusterRole {
        api_version: "rbac.authorization.k8s.io/v1".to_string(),
        kind: "ClusterRole".to_string(),
        metadata: ObjectMeta::cluster_scoped("aggregate-metacontroller-edit")
            .with_label("rbac.authorization.k8s.io/aggregate-to-admin", "true")
            .with_label("rbac.authorization.k8s.io/aggregate-to-edit", "true"),
        rules: vec![PolicyRule::new(
            &[METACONTROLLER_API_GROUP],
            &METACONTROLLER_RESOURCES,
            &[
                "create",
                "delete",
                "deletecollection",
                "get",
                "list",
                "patch",
                "update",
                "watch",
            ],
        )],
    }
}

/// Build the aggregated ClusterRole merged into the built-in view role
pub fn aggregate_view_cluster_role() -> ClusterRole {
    ClusterRole {
        api_version: "rbac.authorization.k8s.io/v1".to_string(),
        kind: "ClusterRole".to_string(),
        metadata: ObjectMeta::cluster_scoped("aggregate-metacontroller-view")
            .with_label("rbac.authorization.k8s.io/aggregate-to-view", "true"),
        rules: vec![PolicyRule::new(
            &[METACONTROLLER_API_GROUP],
            &METACONTROLLER_RESOURCES,
            &["get", "list", "watch"],
        )],
    }
}
