use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use log::{debug, info};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use super::PackageInstaller;

/// Runs `<client> install [args..] <specs..>` inside the package directory.
#[derive(Debug, Clone)]
pub struct NpmInstaller {
    client: String,
    args: Vec<String>,
}

impl NpmInstaller {
    pub fn new(client: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            client: client.into(),
            args,
        }
    }

    pub fn client(&self) -> &str {
        &self.client
    }
}

impl Default for NpmInstaller {
    fn default() -> Self {
        Self::new("npm", Vec::new())
    }
}

#[async_trait]
impl PackageInstaller for NpmInstaller {
    #[tracing::instrument(skip(self))]
    async fn install_packages(&self, location: &Path, specs: &[String]) -> Result<()> {
        info!(
            "Running {} install {} in {:?}",
            self.client,
            specs.join(" "),
            location
        );

        let output = Command::new(&self.client)
            .arg("install")
            .args(&self.args)
            .args(specs)
            .current_dir(location)
            .stdin(Stdio::null())
            .output()
            .await
            .with_context(|| format!("Failed to run '{}'", self.client))?;

        debug!(
            "{} install stdout: {}",
            self.client,
            String::from_utf8_lossy(&output.stdout).trim()
        );

        if !output.status.success() {
            bail!(
                "'{} install' exited with {}: {}",
                self.client,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}
