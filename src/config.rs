//! Workspace configuration.
//!
//! Settings come from `wsboot.json` at the workspace root; command line
//! flags override individual keys.

use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::bootstrap::BootstrapOptions;
use crate::error::{BootstrapError, Result};
use crate::install::NpmInstaller;
use crate::runtime::Runtime;

/// File name of the workspace configuration.
pub const CONFIG_FILE: &str = "wsboot.json";

const DEFAULT_PACKAGES: &str = "packages/*";
const DEFAULT_NPM_CLIENT: &str = "npm";
const MAX_DEFAULT_CONCURRENCY: usize = 4;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct WorkspaceConfig {
    /// Directory globs, relative to the root, that contain packages.
    pub packages: Vec<String>,
    /// Glob on package names to leave out.
    pub ignore: Option<String>,
    pub link_file_prefix: String,
    pub concurrency: Option<usize>,
    pub npm_client: String,
    pub npm_client_args: Vec<String>,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            packages: vec![DEFAULT_PACKAGES.to_string()],
            ignore: None,
            link_file_prefix: String::new(),
            concurrency: None,
            npm_client: DEFAULT_NPM_CLIENT.to_string(),
            npm_client_args: Vec::new(),
        }
    }
}

/// Values given on the command line, each replacing the configured one when set.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub concurrency: Option<usize>,
    pub ignore: Option<String>,
    pub npm_client: Option<String>,
    pub link_file_prefix: Option<String>,
}

impl WorkspaceConfig {
    /// Load `wsboot.json` from `root`, falling back to defaults when it does not exist.
    #[tracing::instrument(skip(runtime))]
    pub async fn load<R: Runtime>(runtime: &R, root: &Path) -> Result<Self> {
        let path = root.join(CONFIG_FILE);
        if !runtime.exists(&path) {
            debug!("No {} in {:?}, using defaults", CONFIG_FILE, root);
            return Ok(Self::default());
        }

        let content = runtime
            .read_to_string(&path)
            .await
            .map_err(|source| BootstrapError::Config {
                path: path.clone(),
                source,
            })?;
        let config: Self =
            serde_json::from_str(&content).map_err(|e| BootstrapError::Config {
                path: path.clone(),
                source: e.into(),
            })?;
        debug!("Loaded {:?}: {:?}", path, config);
        Ok(config)
    }

    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(concurrency) = overrides.concurrency {
            self.concurrency = Some(concurrency);
        }
        if let Some(ignore) = overrides.ignore {
            self.ignore = Some(ignore);
        }
        if let Some(npm_client) = overrides.npm_client {
            self.npm_client = npm_client;
        }
        if let Some(prefix) = overrides.link_file_prefix {
            self.link_file_prefix = prefix;
        }
        self
    }

    /// Effective concurrency: the configured value, or the CPU count capped at 4. Never below 1.
    pub fn concurrency(&self) -> usize {
        self.concurrency
            .unwrap_or_else(|| {
                std::thread::available_parallelism()
                    .map(|n| n.get())
                    .unwrap_or(1)
                    .min(MAX_DEFAULT_CONCURRENCY)
            })
            .max(1)
    }

    pub fn bootstrap_options(&self) -> BootstrapOptions {
        BootstrapOptions {
            concurrency: self.concurrency(),
            link_file_prefix: self.link_file_prefix.clone(),
        }
    }

    pub fn installer(&self) -> NpmInstaller {
        NpmInstaller::new(self.npm_client.clone(), self.npm_client_args.clone())
    }
}
