use log::{debug, info};

use crate::error::{BootstrapError, Result};
use crate::package::{MANIFEST_FILE, Manifest, Package, VersionChecker};
use crate::runtime::Runtime;

use super::PackageInstaller;

/// Installs the dependencies of a package that no sibling satisfies.
pub struct ExternalDependencyInstaller<'a, R: Runtime> {
    runtime: &'a R,
    installer: &'a dyn PackageInstaller,
}

impl<'a, R: Runtime> ExternalDependencyInstaller<'a, R> {
    pub fn new(runtime: &'a R, installer: &'a dyn PackageInstaller) -> Self {
        Self { runtime, installer }
    }

    /// Whether a copy of `name` already installed under the package satisfies `range`.
    ///
    /// A missing or unreadable installed manifest counts as not installed.
    pub async fn is_installed(&self, package: &Package, name: &str, range: &str) -> bool {
        let manifest_path = package.dependency_dir(name).join(MANIFEST_FILE);
        match Manifest::load_optional(self.runtime, &manifest_path).await {
            Some(installed) => VersionChecker::is_compatible(&installed.version, range),
            None => false,
        }
    }

    /// The `name@range` specs from `candidates` that still need installing.
    pub async fn missing_specs(
        &self,
        package: &Package,
        candidates: &[(String, String)],
    ) -> Vec<String> {
        let mut specs = Vec::new();
        for (name, range) in candidates {
            if self.is_installed(package, name, range).await {
                debug!("{}: {}@{} is already installed", package.name, name, range);
            } else {
                specs.push(format!("{}@{}", name, range));
            }
        }
        specs
    }

    /// Install the missing `candidates` with a single installer invocation.
    ///
    /// Returns the specs that were handed to the installer; empty when nothing
    /// was missing and no installer was run.
    #[tracing::instrument(skip(self, package, candidates), fields(package = %package.name))]
    pub async fn install(
        &self,
        package: &Package,
        candidates: &[(String, String)],
    ) -> Result<Vec<String>> {
        let specs = self.missing_specs(package, candidates).await;
        if specs.is_empty() {
            debug!("{}: no external dependencies to install", package.name);
            return Ok(specs);
        }

        info!("{}: installing {}", package.name, specs.join(", "));
        self.installer
            .install_packages(&package.location, &specs)
            .await
            .map_err(|source| BootstrapError::Installer {
                package: package.name.clone(),
                source,
            })?;
        Ok(specs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::MockPackageInstaller;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    fn candidates(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(n, r)| (n.to_string(), r.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn test_install_nothing_missing_skips_installer() {
        let runtime = MockRuntime::new();
        let mut installer = MockPackageInstaller::new();
        installer.expect_install_packages().never();

        let package = Package::new("a", "1.0.0", "/ws/a");
        let external = ExternalDependencyInstaller::new(&runtime, &installer);

        let specs = external.install(&package, &[]).await.unwrap();
        assert!(specs.is_empty());
    }

    #[tokio::test]
    async fn test_install_batches_missing_specs() {
        let mut runtime = MockRuntime::new();
        let mut installer = MockPackageInstaller::new();

        // lodash is installed at a compatible version, chalk at an old one, left-pad is absent
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/ws/a/node_modules/lodash/package.json")))
            .returning(|_| Ok(r#"{ "name": "lodash", "version": "4.17.21" }"#.into()));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/ws/a/node_modules/chalk/package.json")))
            .returning(|_| Ok(r#"{ "name": "chalk", "version": "4.1.0" }"#.into()));
        runtime
            .expect_read_to_string()
            .with(eq(PathBuf::from("/ws/a/node_modules/left-pad/package.json")))
            .returning(|_| Err(anyhow::anyhow!("Failed to read file to string")));

        installer
            .expect_install_packages()
            .with(
                eq(PathBuf::from("/ws/a")),
                eq(vec!["chalk@^5.0.0".to_string(), "left-pad@^1.3.0".to_string()]),
            )
            .times(1)
            .returning(|_, _| Ok(()));

        let package = Package::new("a", "1.0.0", "/ws/a");
        let external = ExternalDependencyInstaller::new(&runtime, &installer);

        let specs = external
            .install(
                &package,
                &candidates(&[
                    ("chalk", "^5.0.0"),
                    ("left-pad", "^1.3.0"),
                    ("lodash", "^4.17.0"),
                ]),
            )
            .await
            .unwrap();
        assert_eq!(specs, vec!["chalk@^5.0.0", "left-pad@^1.3.0"]);
    }

    #[tokio::test]
    async fn test_install_failure_is_installer_error() {
        let mut runtime = MockRuntime::new();
        let mut installer = MockPackageInstaller::new();

        runtime
            .expect_read_to_string()
            .returning(|_| Err(anyhow::anyhow!("Failed to read file to string")));
        installer
            .expect_install_packages()
            .times(1)
            .returning(|_, _| Err(anyhow::anyhow!("registry unreachable")));

        let package = Package::new("c", "1.0.0", "/ws/c");
        let external = ExternalDependencyInstaller::new(&runtime, &installer);

        let err = external
            .install(&package, &candidates(&[("lodash", "^4.0.0")]))
            .await
            .unwrap_err();
        match err {
            BootstrapError::Installer { package, source } => {
                assert_eq!(package, "c");
                assert_eq!(source.to_string(), "registry unreachable");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
