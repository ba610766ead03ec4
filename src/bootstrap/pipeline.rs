use futures_util::future::try_join_all;
use log::debug;

use crate::error::{BootstrapError, Result};
use crate::install::{ExternalDependencyInstaller, PackageInstaller};
use crate::link::{DependencyLinker, LinkRequest};
use crate::package::Package;
use crate::runtime::Runtime;

use super::plan::DependencyPlan;
use super::reporter::{MismatchWarning, Reporter};

/// What one package's pipeline did.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageReport {
    pub package: String,
    /// `name@range` specs handed to the external installer.
    pub installed: Vec<String>,
    /// Siblings linked into the package.
    pub linked: Vec<LinkRequest>,
    /// Declared siblings skipped because of their version.
    pub mismatches: Vec<MismatchWarning>,
}

/// Bootstraps a single package: dependency directory, external installs, then sibling links.
pub struct PackageBootstrapPipeline<'a, R: Runtime> {
    runtime: &'a R,
    installer: ExternalDependencyInstaller<'a, R>,
    linker: DependencyLinker<'a, R>,
    reporter: &'a dyn Reporter,
}

impl<'a, R: Runtime> PackageBootstrapPipeline<'a, R> {
    pub fn new(
        runtime: &'a R,
        installer: &'a dyn PackageInstaller,
        reporter: &'a dyn Reporter,
        link_file_prefix: &'a str,
    ) -> Self {
        Self {
            runtime,
            installer: ExternalDependencyInstaller::new(runtime, installer),
            linker: DependencyLinker::new(runtime, link_file_prefix),
            reporter,
        }
    }

    /// Run the pipeline for `package` against the whole workspace `packages`.
    ///
    /// Steps run strictly in order; links to siblings run concurrently once the
    /// external install has finished. The first failure aborts the package.
    #[tracing::instrument(skip_all, fields(package = %package.name))]
    pub async fn run(&self, package: &Package, packages: &[Package]) -> Result<PackageReport> {
        self.runtime
            .create_dir_all(&package.external_deps_dir)
            .await
            .map_err(|e| BootstrapError::fs("create directory", &package.external_deps_dir, e))?;

        let plan = DependencyPlan::resolve(package, packages);
        for warning in &plan.mismatches {
            self.reporter.version_mismatch(warning);
        }

        let installed = self.installer.install(package, &plan.external).await?;

        debug!(
            "{}: linking {} sibling(s)",
            package.name,
            plan.linked.len()
        );
        let linked = try_join_all(
            plan.linked
                .iter()
                .map(|sibling| self.linker.link(package, sibling)),
        )
        .await?;

        Ok(PackageReport {
            package: package.name.clone(),
            installed,
            linked,
            mismatches: plan.mismatches,
        })
    }
}
