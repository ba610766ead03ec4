//! Bootstrap orchestration.
//!
//! Runs one [`PackageBootstrapPipeline`] per workspace package with bounded
//! concurrency. Once a pipeline fails no new pipeline is started; pipelines
//! already running are left to finish and their results are only logged.

mod pipeline;
mod plan;
mod reporter;

use futures_util::stream::{self, StreamExt};
use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BootstrapError, Result};
use crate::install::PackageInstaller;
use crate::package::Package;
use crate::runtime::Runtime;

pub use pipeline::{PackageBootstrapPipeline, PackageReport};
pub use plan::DependencyPlan;
pub use reporter::{
    ConsoleReporter, MismatchWarning, PackageOutcome, RecordingReporter, Reporter,
};

/// Settings the orchestrator runs with.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapOptions {
    /// Maximum number of package pipelines running at once.
    pub concurrency: usize,
    /// Text prepended to every generated proxy module.
    pub link_file_prefix: String,
}

impl Default for BootstrapOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            link_file_prefix: String::new(),
        }
    }
}

/// Result of a fully successful bootstrap.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BootstrapSummary {
    /// One report per package, in completion order.
    pub reports: Vec<PackageReport>,
}

impl BootstrapSummary {
    pub fn linked_count(&self) -> usize {
        self.reports.iter().map(|r| r.linked.len()).sum()
    }

    pub fn warnings(&self) -> impl Iterator<Item = &MismatchWarning> {
        self.reports.iter().flat_map(|r| r.mismatches.iter())
    }
}

/// Bootstraps every package of a workspace.
pub struct BootstrapOrchestrator<'a, R: Runtime> {
    runtime: &'a R,
    installer: &'a dyn PackageInstaller,
    reporter: &'a dyn Reporter,
    options: BootstrapOptions,
}

impl<'a, R: Runtime> BootstrapOrchestrator<'a, R> {
    pub fn new(
        runtime: &'a R,
        installer: &'a dyn PackageInstaller,
        reporter: &'a dyn Reporter,
        options: BootstrapOptions,
    ) -> Self {
        Self {
            runtime,
            installer,
            reporter,
            options,
        }
    }

    pub fn options(&self) -> &BootstrapOptions {
        &self.options
    }

    /// Run the pipeline of every package in `packages`.
    ///
    /// Succeeds only if every pipeline succeeded; otherwise returns the first
    /// failure observed, attributed to its package.
    #[tracing::instrument(skip_all, fields(packages = packages.len()))]
    pub async fn run(&self, packages: &[Package]) -> Result<BootstrapSummary> {
        let pipeline = PackageBootstrapPipeline::new(
            self.runtime,
            self.installer,
            self.reporter,
            &self.options.link_file_prefix,
        );
        let concurrency = self.options.concurrency.max(1);
        let failed = AtomicBool::new(false);

        info!(
            "Bootstrapping {} package(s) with concurrency {}",
            packages.len(),
            concurrency
        );

        let results: Vec<(&Package, Option<Result<PackageReport>>)> = stream::iter(packages)
            .map(|package| {
                let pipeline = &pipeline;
                let failed = &failed;
                async move {
                    if failed.load(Ordering::SeqCst) {
                        return (package, None);
                    }
                    let result = pipeline.run(package, packages).await;
                    let outcome = match &result {
                        Ok(_) => PackageOutcome::Succeeded,
                        Err(_) => {
                            failed.store(true, Ordering::SeqCst);
                            PackageOutcome::Failed
                        }
                    };
                    self.reporter.package_finished(&package.name, outcome);
                    (package, Some(result))
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut summary = BootstrapSummary::default();
        let mut first_error: Option<BootstrapError> = None;
        let mut skipped = Vec::new();

        for (package, result) in results {
            match result {
                Some(Ok(report)) => summary.reports.push(report),
                Some(Err(e)) => {
                    warn!("{} failed: {}", package.name, e.chain_message());
                    if first_error.is_none() {
                        first_error = Some(BootstrapError::Package {
                            package: package.name.clone(),
                            source: Box::new(e),
                        });
                    }
                }
                None => skipped.push(package.name.as_str()),
            }
        }

        match first_error {
            Some(e) => {
                info!(
                    "{} package(s) bootstrapped before the failure",
                    summary.reports.len()
                );
                if !skipped.is_empty() {
                    warn!("Not started after failure: {}", skipped.join(", "));
                }
                Err(e)
            }
            None => {
                info!(
                    "Bootstrapped {} package(s), {} link(s)",
                    summary.reports.len(),
                    summary.linked_count()
                );
                Ok(summary)
            }
        }
    }
}
