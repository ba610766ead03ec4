//! Linking of sibling packages.
//!
//! A dependent resolves a sibling through the sibling's own source tree:
//! native source modules become generated proxy modules, everything else
//! becomes a symlink to the original, and a minimal manifest records the
//! sibling's identity.

mod proxy;

use futures_util::future::{try_join, try_join_all};
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::error::{BootstrapError, Result};
use crate::package::{LinkedManifest, MANIFEST_FILE, Package};
use crate::runtime::{Runtime, is_already_exists};

pub use proxy::{
    NATIVE_MODULE_EXTENSION, is_native_module, proxy_module_content, proxy_module_target,
};

/// One materialized link of a sibling into a dependent.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkRequest {
    /// The sibling being linked.
    pub source: String,
    /// The dependent receiving the link.
    pub destination: String,
    /// `<dependent deps dir>/<sibling name>`
    pub target_dir: PathBuf,
    /// Absolute paths inside the sibling that were exposed.
    pub matched_files: Vec<PathBuf>,
}

/// Materializes siblings inside a dependent's dependency directory.
pub struct DependencyLinker<'a, R: Runtime> {
    runtime: &'a R,
    link_file_prefix: &'a str,
}

impl<'a, R: Runtime> DependencyLinker<'a, R> {
    pub fn new(runtime: &'a R, link_file_prefix: &'a str) -> Self {
        Self {
            runtime,
            link_file_prefix,
        }
    }

    /// Link `sibling` into `dependent`, replacing whatever was there before.
    #[tracing::instrument(skip_all, fields(dependent = %dependent.name, sibling = %sibling.name))]
    pub async fn link(&self, dependent: &Package, sibling: &Package) -> Result<LinkRequest> {
        let target_dir = dependent.dependency_dir(&sibling.name);

        self.runtime
            .remove_all(&target_dir)
            .await
            .map_err(|e| BootstrapError::fs("remove", &target_dir, e))?;
        self.runtime
            .create_dir_all(&target_dir)
            .await
            .map_err(|e| BootstrapError::fs("create directory", &target_dir, e))?;

        let matched_files = self.matched_files(sibling).await?;
        let request = LinkRequest {
            source: sibling.name.clone(),
            destination: dependent.name.clone(),
            target_dir,
            matched_files,
        };

        let entries = self.link_entries(sibling, &request.target_dir, &request.matched_files)?;
        try_join(
            self.write_manifest(sibling, &request.target_dir),
            self.materialize(&entries),
        )
        .await?;

        info!(
            "Linked {}@{} into {} ({} files)",
            sibling.name,
            sibling.version,
            dependent.name,
            request.matched_files.len()
        );
        Ok(request)
    }

    /// Expand the sibling's link patterns. Overlapping patterns may yield the same path twice.
    async fn matched_files(&self, sibling: &Package) -> Result<Vec<PathBuf>> {
        let patterns: Vec<String> = sibling
            .link_patterns()
            .into_iter()
            .flat_map(with_recursive_files)
            .collect();
        let expansions = try_join_all(patterns.iter().map(|pattern| async move {
            self.runtime
                .glob(&sibling.location, pattern)
                .await
                .map_err(|e| {
                    BootstrapError::fs("expand pattern in", sibling.location.join(pattern), e)
                })
        }))
        .await?;
        Ok(expansions.into_iter().flatten().collect())
    }

    async fn write_manifest(&self, sibling: &Package, target_dir: &Path) -> Result<()> {
        let manifest = LinkedManifest {
            name: sibling.name.clone(),
            version: sibling.version.clone(),
        };
        let path = target_dir.join(MANIFEST_FILE);
        let content = manifest
            .to_json()
            .map_err(|e| BootstrapError::fs("serialize", &path, e.into()))?;
        self.runtime
            .write(&path, content.as_bytes())
            .await
            .map_err(|e| BootstrapError::fs("write", &path, e))
    }

    /// Decide, before touching the target, what each matched path becomes.
    ///
    /// Matches are sorted so a directory precedes everything beneath it; once a
    /// directory is linked, later matches under it are already exposed and are
    /// dropped. The sibling's own manifest is never exposed, since the linked
    /// manifest is written at that destination.
    fn link_entries<'p>(
        &self,
        sibling: &Package,
        target_dir: &Path,
        matched_files: &'p [PathBuf],
    ) -> Result<Vec<LinkEntry<'p>>> {
        let mut sources: Vec<&PathBuf> = matched_files.iter().collect();
        sources.sort();
        sources.dedup();

        let mut linked_dirs: Vec<&Path> = Vec::new();
        let mut entries = Vec::new();
        for source in sources {
            let relative = source.strip_prefix(&sibling.location).map_err(|e| {
                BootstrapError::fs(
                    "locate",
                    source,
                    anyhow::anyhow!("{} (outside {:?})", e, sibling.location),
                )
            })?;
            if relative.as_os_str().is_empty() || relative == Path::new(MANIFEST_FILE) {
                debug!("Not exposing {:?}", source);
                continue;
            }
            if linked_dirs.iter().any(|dir| source.starts_with(dir)) {
                debug!("{:?} is already exposed through a linked directory", source);
                continue;
            }

            let is_dir = self.runtime.is_dir(source);
            if is_dir {
                linked_dirs.push(source);
            }
            entries.push(LinkEntry {
                source,
                dest: target_dir.join(relative),
                is_dir,
            });
        }
        Ok(entries)
    }

    /// Materialize every entry concurrently. Entries never nest, so no entry
    /// creates a path another one links.
    async fn materialize(&self, entries: &[LinkEntry<'_>]) -> Result<()> {
        try_join_all(entries.iter().map(|entry| self.materialize_entry(entry))).await?;
        Ok(())
    }

    async fn materialize_entry(&self, entry: &LinkEntry<'_>) -> Result<()> {
        let LinkEntry {
            source,
            dest,
            is_dir,
        } = entry;

        if let Some(parent) = dest.parent() {
            self.runtime
                .create_dir_all(parent)
                .await
                .map_err(|e| BootstrapError::fs("create directory", parent, e))?;
        }

        if !is_dir && is_native_module(source) {
            let content = proxy_module_content(self.link_file_prefix, source);
            self.runtime
                .write(dest, content.as_bytes())
                .await
                .map_err(|e| BootstrapError::fs("write", dest, e))?;
            debug!("Wrote proxy module {:?} -> {:?}", dest, source);
            return Ok(());
        }

        match self.runtime.symlink(source, dest).await {
            Ok(()) => {
                debug!("Linked {:?} -> {:?}", dest, source);
                Ok(())
            }
            Err(e) if is_already_exists(&e) => {
                debug!("{:?} is already linked", dest);
                Ok(())
            }
            Err(e) => Err(BootstrapError::fs("link", dest, e)),
        }
    }
}

/// A matched path of the sibling and where it lands in the dependent.
#[derive(Debug)]
struct LinkEntry<'p> {
    source: &'p Path,
    dest: PathBuf,
    is_dir: bool,
}

/// The glob crate expands a trailing `**` to directories only; pair it with
/// `**/*` so the files below are matched as well.
fn with_recursive_files(pattern: &str) -> Vec<String> {
    let mut patterns = vec![pattern.to_string()];
    if pattern == "**" || pattern.ends_with("/**") {
        patterns.push(format!("{}/*", pattern));
    }
    patterns
}
