//! Workspace package model
//!
//! This module describes the packages of a workspace: their manifests,
//! discovery and ordering, and the version compatibility rules used to
//! decide whether a sibling can stand in for a declared dependency.

mod discovery;
mod manifest;
mod model;
mod version;

pub use discovery::{filter_packages, find_workspace_packages, topological_order};
pub use manifest::{LinkedManifest, MANIFEST_FILE, Manifest};
pub use model::{DEFAULT_MAIN_ENTRY, EXTERNAL_DEPS_DIR, Package};
pub use version::VersionChecker;
