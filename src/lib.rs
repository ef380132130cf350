//! Metacontroller Operator - lifecycle-managed deployment of the Metacontroller
//! cluster controller
//!
//! This crate packages, configures, and deploys the upstream Metacontroller
//! binary into a Kubernetes cluster. The controller itself (its reconciliation
//! loop, webhook dispatch, and CRD processing) is an opaque external
//! collaborator; this crate only renders the manifests that run it, applies
//! them, and verifies the deployment converges.
//!
//! # Architecture
//!
//! Everything flows through a single deterministic pipeline:
//!
//! 1. [`config`] loads the charm configuration (pinned image, RBAC profile)
//! 2. [`manifest`] renders the full object set (RBAC bundle, CRDs, StatefulSet)
//! 3. [`apply`] server-side-applies the objects, so re-runs converge
//! 4. [`check`] polls until every object exists and StatefulSets are ready
//! 5. [`lifecycle`] wires these into the install / update-status / remove flows
//!
//! # Modules
//!
//! - [`config`] - Charm configuration (declared option defaults)
//! - [`manifest`] - Deterministic manifest rendering and validation
//! - [`images`] - Pinned-image extraction for release auditing
//! - [`apply`] - Server-side apply and delete of rendered objects
//! - [`check`] - Deployed-resource readiness checking and unit status
//! - [`lifecycle`] - Install / update-status / remove event flows
//! - [`retry`] - Exponential backoff with jitter
//! - [`error`] - Error types for the operator

#![deny(missing_docs)]

pub mod apply;
pub mod check;
pub mod config;
pub mod error;
pub mod images;
pub mod lifecycle;
pub mod manifest;
pub mod retry;

pub use error::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Configuration Constants
// =============================================================================

/// Default pinned Metacontroller container image
pub const DEFAULT_METACONTROLLER_IMAGE: &str = "metacontroller/metacontroller:v0.3.0";

/// Default application name used for all rendered objects
pub const DEFAULT_APP_NAME: &str = "metacontroller-operator";

/// Port the wrapped binary serves its health endpoints on
pub const HEALTH_PORT: u16 = 8081;

/// Liveness probe path on the wrapped binary
pub const HEALTHZ_PATH: &str = "/healthz";

/// Readiness probe path on the wrapped binary
pub const READYZ_PATH: &str = "/readyz";

/// Port the wrapped binary exposes Prometheus metrics on
pub const METRICS_PORT: u16 = 9999;

/// Metrics scrape path on the wrapped binary
pub const METRICS_PATH: &str = "/metrics";

/// Maximum total time spent waiting for deployed resources to become ready
pub const MAX_TIME_CHECKING_RESOURCES_SECS: u64 = 150;
