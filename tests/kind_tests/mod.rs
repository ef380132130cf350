//! Integration tests for the Metacontroller operator
//!
//! These tests require a Kubernetes cluster (kind) and tell the story of how
//! the charm deploys and manages the wrapped controller in real clusters.
//!
//! # Test Organization
//!
//! - `install_lifecycle`: Stories about installing, re-applying, checking,
//!   and removing the full manifest set
//!
//! - `rbac_aggregation`: Stories about the aggregated ClusterRoles propagating
//!   custom-resource permissions into the cluster's built-in roles
//!
//! # Running These Tests
//!
//! Ignored by default because they mutate a live cluster:
//!
//! ```bash
//! cargo test --test kind -- --ignored
//! ```

mod helpers;
mod install_lifecycle;
mod rbac_aggregation;
