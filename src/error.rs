//! Error kinds surfaced by the bootstrap core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced while discovering, installing and linking workspace packages.
///
/// Version mismatches are not errors; they are reported as
/// [`MismatchWarning`](crate::bootstrap::MismatchWarning) values.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// A filesystem operation (remove, create, write, link) failed.
    #[error("failed to {operation} {path:?}")]
    Filesystem {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The external install command failed for a package.
    #[error("failed to install external dependencies of {package}")]
    Installer {
        package: String,
        #[source]
        source: anyhow::Error,
    },

    /// A manifest was missing or could not be parsed.
    #[error("failed to read manifest {path:?}")]
    ManifestRead {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// The workspace configuration file was malformed.
    #[error("invalid workspace configuration {path:?}")]
    Config {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },

    /// Workspace discovery produced an inconsistent package set.
    #[error("{0}")]
    Discovery(String),

    /// A pipeline failure attributed to its package.
    #[error("bootstrap of {package} failed")]
    Package {
        package: String,
        #[source]
        source: Box<BootstrapError>,
    },
}

impl BootstrapError {
    pub(crate) fn fs(
        operation: &'static str,
        path: impl Into<PathBuf>,
        source: anyhow::Error,
    ) -> Self {
        BootstrapError::Filesystem {
            operation,
            path: path.into(),
            source,
        }
    }

    /// Name of the package whose pipeline produced this error, if attributed.
    pub fn package(&self) -> Option<&str> {
        match self {
            BootstrapError::Package { package, .. } | BootstrapError::Installer { package, .. } => {
                Some(package)
            }
            _ => None,
        }
    }

    /// This error followed by all of its causes, separated by `: `.
    pub fn chain_message(&self) -> String {
        let mut message = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            message.push_str(": ");
            message.push_str(&cause.to_string());
            source = cause.source();
        }
        message
    }

    /// Innermost bootstrap error, unwrapping package attribution.
    pub fn root(&self) -> &BootstrapError {
        match self {
            BootstrapError::Package { source, .. } => source.root(),
            other => other,
        }
    }
}

pub type Result<T, E = BootstrapError> = std::result::Result<T, E>;
