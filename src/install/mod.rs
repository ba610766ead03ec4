//! External dependency installation.
//!
//! The actual install is delegated to a [`PackageInstaller`]; the default
//! implementation shells out to an npm-compatible client.

mod external;
mod npm;

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

pub use external::ExternalDependencyInstaller;
pub use npm::NpmInstaller;

/// Installs third-party packages into a package directory.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageInstaller: Send + Sync {
    /// Install every `name@range` spec into the package rooted at `location`.
    ///
    /// Called at most once per package per bootstrap; never retried.
    async fn install_packages(&self, location: &Path, specs: &[String]) -> Result<()>;
}
