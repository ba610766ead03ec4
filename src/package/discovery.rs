use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use crate::error::{BootstrapError, Result};
use crate::runtime::Runtime;

use super::manifest::{MANIFEST_FILE, Manifest};
use super::model::Package;

/// Find all workspace packages by expanding `patterns` under `root`.
///
/// Every matched directory containing a manifest becomes a package. A
/// manifest that cannot be read is fatal here, as is a name shared by two
/// packages.
#[tracing::instrument(skip(runtime))]
pub async fn find_workspace_packages<R: Runtime>(
    runtime: &R,
    root: &Path,
    patterns: &[String],
) -> Result<Vec<Package>> {
    let mut seen_locations = HashSet::new();
    let mut packages: Vec<Package> = Vec::new();

    for pattern in patterns {
        let matches = runtime.glob(root, pattern).await.map_err(|e| {
            BootstrapError::Discovery(format!("Invalid package pattern '{}': {:#}", pattern, e))
        })?;

        for location in matches {
            if !runtime.is_dir(&location) || !seen_locations.insert(location.clone()) {
                continue;
            }
            let manifest_path = location.join(MANIFEST_FILE);
            if !runtime.exists(&manifest_path) {
                debug!("Skipping {:?}: no {}", location, MANIFEST_FILE);
                continue;
            }

            let manifest = Manifest::load(runtime, &manifest_path).await?;
            if manifest.name.trim().is_empty() {
                return Err(BootstrapError::Discovery(format!(
                    "Package at {:?} has no name",
                    location
                )));
            }
            if let Some(existing) = packages.iter().find(|p| p.name == manifest.name) {
                return Err(BootstrapError::Discovery(format!(
                    "Package name '{}' is used by both {:?} and {:?}",
                    manifest.name, existing.location, location
                )));
            }

            debug!("Found package {}@{} at {:?}", manifest.name, manifest.version, location);
            packages.push(Package::from_manifest(&location, &manifest));
        }
    }

    Ok(packages)
}

/// Drop packages whose name matches the `ignore` glob.
pub fn filter_packages(packages: Vec<Package>, ignore: Option<&str>) -> Result<Vec<Package>> {
    let Some(ignore) = ignore.filter(|i| !i.is_empty()) else {
        return Ok(packages);
    };
    let pattern = glob::Pattern::new(ignore).map_err(|e| {
        BootstrapError::Discovery(format!("Invalid ignore pattern '{}': {}", ignore, e))
    })?;

    Ok(packages
        .into_iter()
        .filter(|p| {
            let ignored = pattern.matches(&p.name);
            if ignored {
                debug!("Ignoring package {}", p.name);
            }
            !ignored
        })
        .collect())
}

/// Order packages so that local dependencies come before their dependents.
///
/// Packages that become ready at the same time are ordered by name. When a
/// dependency cycle remains, its members are appended by name.
pub fn topological_order(packages: Vec<Package>) -> Vec<Package> {
    let names: HashSet<&str> = packages.iter().map(|p| p.name.as_str()).collect();

    let mut pending: BTreeMap<String, BTreeSet<String>> = packages
        .iter()
        .map(|p| {
            let local_deps = p
                .all_dependencies
                .keys()
                .filter(|dep| *dep != &p.name && names.contains(dep.as_str()))
                .cloned()
                .collect();
            (p.name.clone(), local_deps)
        })
        .collect();

    let mut order: Vec<String> = Vec::with_capacity(packages.len());
    loop {
        let ready: Vec<String> = pending
            .iter()
            .filter(|(_, deps)| deps.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        if ready.is_empty() {
            break;
        }
        for name in &ready {
            pending.remove(name);
        }
        for deps in pending.values_mut() {
            for name in &ready {
                deps.remove(name);
            }
        }
        order.extend(ready);
    }

    if !pending.is_empty() {
        warn!(
            "Dependency cycle between packages: {}",
            pending.keys().cloned().collect::<Vec<_>>().join(", ")
        );
        order.extend(pending.into_keys());
    }

    let mut by_name: BTreeMap<String, Package> =
        packages.into_iter().map(|p| (p.name.clone(), p)).collect();
    order
        .into_iter()
        .filter_map(|name| by_name.remove(&name))
        .collect()
}
