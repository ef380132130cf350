//! Server-side apply and delete of rendered manifest objects
//!
//! All objects go through Kubernetes server-side apply with a fixed field
//! manager, so re-applying the same rendered set is a no-op: the cluster
//! converges to the same state without duplicating objects, and drift in
//! managed fields is corrected.
//!
//! A 403 from the API server is mapped to [`Error::Forbidden`]: when the
//! charm is deployed without cluster trust it cannot create cluster-scoped
//! RBAC, and the resulting status must point the operator at `--trust`.
//! Every other apply error propagates verbatim; there is no local retry at
//! this layer.

use kube::api::{Api, DynamicObject, Patch, PatchParams};
use kube::discovery::ApiResource;
use kube::Client;
use tracing::{debug, info};

use crate::error::Error;
use crate::Result;

/// Field manager name used for all server-side apply operations
pub const FIELD_MANAGER: &str = "metacontroller-operator";

/// Identity of a rendered object, parsed from its manifest
#[derive(Clone, Debug)]
pub struct ObjectRef {
    /// API resource (group/version/kind)
    pub resource: ApiResource,
    /// Object name
    pub name: String,
    /// Object namespace, if namespaced
    pub namespace: Option<String>,
}

impl ObjectRef {
    /// Parse the identity of a manifest object
    pub fn from_manifest(obj: &serde_json::Value) -> Result<Self> {
        let kind = obj
            .get("kind")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::render("manifest object missing kind".to_string()))?;
        let api_version = obj
            .get("apiVersion")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::render("manifest object missing apiVersion".to_string()))?;
        let name = obj
            .pointer("/metadata/name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::render("manifest object missing metadata.name".to_string()))?;
        let namespace = obj
            .pointer("/metadata/namespace")
            .and_then(|v| v.as_str())
            .map(String::from);

        let (group, version) = match api_version.split_once('/') {
            Some((g, v)) => (g.to_string(), v.to_string()),
            None => (String::new(), api_version.to_string()),
        };
        let gvk = kube::api::GroupVersionKind {
            group,
            version,
            kind: kind.to_string(),
        };

        Ok(Self {
            resource: ApiResource::from_gvk(&gvk),
            name: name.to_string(),
            namespace,
        })
    }

    /// Dynamic API handle scoped to this object
    pub fn api(&self, client: &Client) -> Api<DynamicObject> {
        match &self.namespace {
            Some(ns) => Api::namespaced_with(client.clone(), ns, &self.resource),
            None => Api::all_with(client.clone(), &self.resource),
        }
    }
}

/// Apply a single rendered object via server-side apply
pub async fn apply_object(client: &Client, obj: &serde_json::Value) -> Result<()> {
    let object_ref = ObjectRef::from_manifest(obj)?;
    let api = object_ref.api(client);
    let params = PatchParams::apply(FIELD_MANAGER).force();

    api.patch(&object_ref.name, &params, &Patch::Apply(obj))
        .await
        .map_err(|e| match &e {
            kube::Error::Api(resp) if resp.code == 403 => Error::Forbidden(format!(
                "{} {}: {}",
                object_ref.resource.kind, object_ref.name, resp.message
            )),
            _ => Error::Kube(e),
        })?;

    debug!(
        kind = %object_ref.resource.kind,
        name = %object_ref.name,
        "Applied manifest"
    );
    Ok(())
}

/// Apply a list of rendered objects in order
///
/// Stops at the first failure; objects applied so far stay in the cluster
/// (their lifecycle is owned by the cluster's reconciliation machinery, and
/// a later re-apply converges them).
pub async fn apply_all(client: &Client, objs: &[serde_json::Value]) -> Result<()> {
    for obj in objs {
        apply_object(client, obj).await?;
    }
    Ok(())
}

/// Delete a single rendered object, tolerating objects that are already gone
pub async fn delete_object(client: &Client, obj: &serde_json::Value) -> Result<()> {
    let object_ref = ObjectRef::from_manifest(obj)?;
    let api = object_ref.api(client);

    match api.delete(&object_ref.name, &Default::default()).await {
        Ok(_) => {
            info!(
                kind = %object_ref.resource.kind,
                name = %object_ref.name,
                "Deleted object"
            );
            Ok(())
        }
        Err(kube::Error::Api(resp)) if resp.code == 404 => {
            debug!(
                kind = %object_ref.resource.kind,
                name = %object_ref.name,
                "Object already gone"
            );
            Ok(())
        }
        Err(e) => Err(Error::Kube(e)),
    }
}

/// Delete a list of rendered objects in reverse apply order
pub async fn delete_all(client: &Client, objs: &[serde_json::Value]) -> Result<()> {
    for obj in objs.iter().rev() {
        delete_object(client, obj).await?;
    }
    Ok(())
}

/// Fetch a rendered object's current cluster state, if it exists
pub async fn get_object(
    client: &Client,
    obj: &serde_json::Value,
) -> Result<Option<DynamicObject>> {
    let object_ref = ObjectRef::from_manifest(obj)?;
    let api = object_ref.api(client);

    match api.get(&object_ref.name).await {
        Ok(found) => Ok(Some(found)),
        Err(kube::Error::Api(resp)) if resp.code == 404 => Ok(None),
        Err(e) => Err(Error::Kube(e)),
    }
}
