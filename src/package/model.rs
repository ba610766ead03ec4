use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use super::manifest::{MANIFEST_FILE, Manifest};

/// Directory, under a package root, that holds its installed dependencies.
pub const EXTERNAL_DEPS_DIR: &str = "node_modules";

/// Entry point used when a manifest does not declare `main`.
pub const DEFAULT_MAIN_ENTRY: &str = "index.js";

/// A workspace package as seen by the bootstrap.
///
/// Built once from the package's manifest and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Package {
    pub name: String,
    pub version: String,
    /// Absolute path of the package root.
    pub location: PathBuf,
    /// Absolute path of the directory dependencies are installed into.
    pub external_deps_dir: PathBuf,
    /// Declared range per dependency name (regular, dev and peer combined).
    pub all_dependencies: BTreeMap<String, String>,
    /// Primary importable file, relative to `location`.
    pub main_entry: String,
    /// Additional globs, relative to `location`, exposed to dependents.
    pub extra_linked_files: Vec<String>,
}

impl Package {
    /// Create a package with no dependencies rooted at `location`.
    pub fn new(name: &str, version: &str, location: impl Into<PathBuf>) -> Self {
        let location = location.into();
        Self {
            name: name.to_string(),
            version: version.to_string(),
            external_deps_dir: location.join(EXTERNAL_DEPS_DIR),
            location,
            all_dependencies: BTreeMap::new(),
            main_entry: DEFAULT_MAIN_ENTRY.to_string(),
            extra_linked_files: Vec::new(),
        }
    }

    /// Build a package from its parsed manifest.
    pub fn from_manifest(location: &Path, manifest: &Manifest) -> Self {
        let mut package = Self::new(&manifest.name, &manifest.version, location);
        package.all_dependencies = manifest.all_dependencies();
        if let Some(main) = manifest.main.as_deref().filter(|m| !m.trim().is_empty()) {
            package.main_entry = main.trim_start_matches("./").to_string();
        }
        package.extra_linked_files = manifest.linked_files.clone();
        package
    }

    /// Add a declared dependency.
    pub fn with_dependency(mut self, name: &str, range: &str) -> Self {
        self.all_dependencies
            .insert(name.to_string(), range.to_string());
        self
    }

    pub fn with_main_entry(mut self, main_entry: &str) -> Self {
        self.main_entry = main_entry.to_string();
        self
    }

    pub fn with_linked_files(mut self, patterns: &[&str]) -> Self {
        self.extra_linked_files = patterns.iter().map(|p| p.to_string()).collect();
        self
    }

    /// The range this package declares for `dependency`, if any.
    pub fn dependency_range(&self, dependency: &str) -> Option<&str> {
        self.all_dependencies.get(dependency).map(String::as_str)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.location.join(MANIFEST_FILE)
    }

    /// Where `dependency` lives inside this package's dependency directory.
    pub fn dependency_dir(&self, dependency: &str) -> PathBuf {
        self.external_deps_dir.join(dependency)
    }

    /// Globs to expand when this package is linked into a dependent:
    /// the extra linked files followed by the main entry.
    pub fn link_patterns(&self) -> Vec<&str> {
        self.extra_linked_files
            .iter()
            .map(String::as_str)
            .chain(std::iter::once(self.main_entry.as_str()))
            .collect()
    }
}
