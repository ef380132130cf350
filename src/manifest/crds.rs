//! Metacontroller CRD manifests
//!
//! The metacontroller custom resource definitions (CompositeController,
//! ControllerRevision, DecoratorController) are consumed by the wrapped
//! binary, not owned by this operator. They carry no template variables, so
//! they ship as a static embedded manifest and are applied as-is, before the
//! workload.

use serde::Deserialize;

use crate::error::Error;
use crate::Result;

/// Embedded upstream CRD manifest (multi-document YAML)
const CRD_MANIFEST: &str = include_str!("../../manifests/metacontroller-crds-v1.yaml");

/// Parse the embedded CRD manifest into JSON objects, in document order
pub fn crd_objects() -> Result<Vec<serde_json::Value>> {
    let mut objects = Vec::new();
    for doc in serde_yaml::Deserializer::from_str(CRD_MANIFEST) {
        let value = serde_json::Value::deserialize(doc)
            .map_err(|e| Error::serialization(format!("invalid embedded CRD manifest: {}", e)))?;
        if !value.is_null() {
            objects.push(value);
        }
    }
    if objects.is_empty() {
        return Err(Error::render("embedded CRD manifest contains no documents"));
    }
    Ok(objects)
}
