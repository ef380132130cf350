//! Deterministic manifest rendering for the Metacontroller deployment
//!
//! Rendering is pure text generation: given the same
//! `(namespace, app_name, image)` descriptor and RBAC profile, the output is
//! byte-identical. There is no partial render: any substitution or
//! serialization failure aborts the whole set before anything is applied.
//!
//! The rendered set is grouped the way it is applied: the RBAC bundle first
//! (the group whose failure means missing cluster trust), then the CRDs, then
//! the controller workload.

pub mod crds;
pub mod rbac;
pub mod workload;

use serde::Serialize;

use crate::error::Error;
use crate::Result;

pub use rbac::RbacProfile;

/// Deployment descriptor: the three values every rendered object derives from
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployContext {
    /// Target namespace for namespaced objects
    pub namespace: String,
    /// Application name, used for object names, labels, and the selector
    pub app_name: String,
    /// Pinned controller image reference
    pub image: String,
}

impl DeployContext {
    /// Create and validate a deployment descriptor
    ///
    /// `namespace` and `app_name` must be valid DNS-1123 labels; `image` must
    /// be a tag- or digest-addressed reference. Invalid descriptors are
    /// rejected here, before any object is rendered or applied.
    pub fn new(
        namespace: impl Into<String>,
        app_name: impl Into<String>,
        image: impl Into<String>,
    ) -> Result<Self> {
        let namespace = namespace.into();
        let app_name = app_name.into();
        let image = image.into();

        validate_dns1123_label(&namespace, "namespace")?;
        validate_dns1123_label(&app_name, "app_name")?;
        validate_image_reference(&image)?;

        Ok(Self {
            namespace,
            app_name,
            image,
        })
    }
}

/// Validate a DNS-1123 label: lowercase alphanumeric or '-', must start and
/// end alphanumeric, at most 63 characters
pub fn validate_dns1123_label(value: &str, field: &str) -> Result<()> {
    if value.is_empty() || value.len() > 63 {
        return Err(Error::validation(format!(
            "{} '{}' must be 1-63 characters",
            field, value
        )));
    }
    let valid_chars = value
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    let valid_edges = value.starts_with(|c: char| c.is_ascii_alphanumeric())
        && value.ends_with(|c: char| c.is_ascii_alphanumeric());
    if !valid_chars || !valid_edges {
        return Err(Error::validation(format!(
            "{} '{}' is not a valid DNS-1123 label",
            field, value
        )));
    }
    Ok(())
}

/// Validate that an image reference is tag- or digest-addressed
fn validate_image_reference(image: &str) -> Result<()> {
    if image.is_empty() || image.chars().any(char::is_whitespace) {
        return Err(Error::validation(format!(
            "image reference '{}' must be non-empty and contain no whitespace",
            image
        )));
    }
    // A pullable pin needs either a digest or a tag after the last path segment
    let addressed = image.contains('@')
        || image
            .rsplit('/')
            .next()
            .map(|last| last.contains(':'))
            .unwrap_or(false);
    if !addressed {
        return Err(Error::validation(format!(
            "image reference '{}' must be tag- or digest-addressed",
            image
        )));
    }
    Ok(())
}

/// The full rendered object set, grouped by apply phase
#[derive(Clone, Debug, PartialEq)]
pub struct ManifestSet {
    /// ServiceAccount, operator ClusterRole + binding, aggregated roles
    pub rbac: Vec<serde_json::Value>,
    /// Metacontroller custom resource definitions
    pub crds: Vec<serde_json::Value>,
    /// The controller StatefulSet
    pub controller: Vec<serde_json::Value>,
}

impl ManifestSet {
    /// All objects in apply order
    pub fn all(&self) -> impl Iterator<Item = &serde_json::Value> {
        self.rbac
            .iter()
            .chain(self.crds.iter())
            .chain(self.controller.iter())
    }

    /// Total number of rendered objects
    pub fn len(&self) -> usize {
        self.rbac.len() + self.crds.len() + self.controller.len()
    }

    /// Whether the set is empty (never true for a successful render)
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Serialize the whole set as a multi-document YAML stream
    ///
    /// Object order and key order are fixed, so identical descriptors always
    /// produce byte-identical output.
    pub fn to_yaml(&self) -> Result<String> {
        let mut out = String::new();
        for obj in self.all() {
            out.push_str("---\n");
            let doc = serde_yaml::to_string(obj)
                .map_err(|e| Error::render(format!("failed to serialize manifest: {}", e)))?;
            out.push_str(&doc);
        }
        Ok(out)
    }
}

fn to_object<T: Serialize>(value: &T) -> Result<serde_json::Value> {
    serde_json::to_value(value)
        .map_err(|e| Error::render(format!("failed to serialize manifest object: {}", e)))
}

/// Render the complete manifest set for a deployment descriptor
pub fn render(ctx: &DeployContext, profile: RbacProfile) -> Result<ManifestSet> {
    let rbac = vec![
        to_object(&rbac::service_account(ctx))?,
        to_object(&rbac::operator_cluster_role(ctx, profile))?,
        to_object(&rbac::operator_cluster_role_binding(ctx))?,
        to_object(&rbac::aggregate_edit_cluster_role())?,
        to_object(&rbac::aggregate_view_cluster_role())?,
    ];
    let crds = crds::crd_objects()?;
    let controller = vec![to_object(&workload::metacontroller_statefulset(ctx))?];

    Ok(ManifestSet {
        rbac,
        crds,
        controller,
    })
}
