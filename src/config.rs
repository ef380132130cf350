//! Charm configuration
//!
//! The charm declares its configurable options in a YAML file of the form:
//!
//! ```yaml
//! options:
//!   metacontroller-image:
//!     type: string
//!     default: "metacontroller/metacontroller:v0.3.0"
//!     description: Container image for the wrapped controller
//!   rbac-profile:
//!     type: string
//!     default: standalone
//! ```
//!
//! Operational metadata (most importantly the pinned controller image) is
//! derived from these declared defaults, never from parsing source text.
//! Precedence when resolving a value: CLI flag > declared default > built-in
//! constant.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::Result;

/// Declared charm configuration: the `options` map from the config YAML
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CharmConfig {
    /// Declared options, keyed by option name
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,
}

/// A single declared option
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct OptionSpec {
    /// Declared type ("string", "int", "boolean")
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<String>,
    /// Declared default value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<serde_yaml::Value>,
    /// Human-readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl CharmConfig {
    /// Parse a charm config from YAML text
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| Error::invalid_config(format!("failed to parse config YAML: {}", e)))
    }

    /// Load a charm config from a file path
    ///
    /// Read failures surface as [`Error::Io`]; malformed YAML as
    /// [`Error::InvalidConfig`].
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = tokio::fs::read_to_string(path.as_ref()).await?;
        Self::from_yaml(&content)
    }

    /// Look up the declared default for an option, rendered as a string
    ///
    /// Non-string scalars (ints, booleans) are stringified; structured
    /// defaults are rejected since no charm option carries one.
    pub fn default_for(&self, name: &str) -> Option<String> {
        let value = self.options.get(name)?.default.as_ref()?;
        match value {
            serde_yaml::Value::String(s) => Some(s.clone()),
            serde_yaml::Value::Number(n) => Some(n.to_string()),
            serde_yaml::Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    /// The pinned controller image declared by this config, if any
    pub fn metacontroller_image(&self) -> Option<String> {
        self.default_for("metacontroller-image")
    }

    /// The declared RBAC profile name, if any
    pub fn rbac_profile(&self) -> Option<String> {
        self.default_for("rbac-profile")
    }
}
