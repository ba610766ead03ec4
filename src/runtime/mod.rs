//! Runtime abstraction for filesystem operations.
//!
//! Every disk access made while bootstrapping goes through [`Runtime`], so the
//! pipeline can be exercised against a mock in unit tests and against the real
//! filesystem in integration tests.
//!
//! # Structure
//!
//! - `fs` - File and directory operations (read, write, create, remove)
//! - `symlink` - Symlink operations (create, read, inspect)
//! - `glob` - Pattern expansion rooted at a directory

mod fs;
mod glob;
mod symlink;

use anyhow::Result;
use async_trait::async_trait;
use std::io;
use std::path::{Path, PathBuf};

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Runtime: Send + Sync {
    // File System
    async fn read_to_string(&self, path: &Path) -> Result<String>;
    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()>;
    async fn create_dir_all(&self, path: &Path) -> Result<()>;

    /// Remove whatever lives at `path`: a symlink, a file or a whole directory tree.
    /// A missing path is not an error.
    async fn remove_all(&self, path: &Path) -> Result<()>;

    async fn symlink(&self, original: &Path, link: &Path) -> Result<()>;
    async fn read_link(&self, path: &Path) -> Result<PathBuf>;

    /// Expand `pattern` relative to `root`, returning absolute matches in sorted order.
    async fn glob(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>>;

    fn exists(&self, path: &Path) -> bool;
    fn is_dir(&self, path: &Path) -> bool;
    fn is_symlink(&self, path: &Path) -> bool;
}

pub struct RealRuntime;

#[async_trait]
impl Runtime for RealRuntime {
    async fn read_to_string(&self, path: &Path) -> Result<String> {
        self.read_to_string_impl(path).await
    }

    async fn write(&self, path: &Path, contents: &[u8]) -> Result<()> {
        self.write_impl(path, contents).await
    }

    async fn create_dir_all(&self, path: &Path) -> Result<()> {
        self.create_dir_all_impl(path).await
    }

    async fn remove_all(&self, path: &Path) -> Result<()> {
        self.remove_all_impl(path).await
    }

    async fn symlink(&self, original: &Path, link: &Path) -> Result<()> {
        self.symlink_impl(original, link).await
    }

    async fn read_link(&self, path: &Path) -> Result<PathBuf> {
        self.read_link_impl(path).await
    }

    async fn glob(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        self.glob_impl(root, pattern).await
    }

    fn exists(&self, path: &Path) -> bool {
        self.exists_impl(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.is_dir_impl(path)
    }

    fn is_symlink(&self, path: &Path) -> bool {
        self.is_symlink_impl(path)
    }
}

/// Whether a runtime error was caused by the target path already existing.
///
/// Context layers are looked through, so errors from [`RealRuntime`] and plain
/// `io::Error`s injected by mocks are both recognised.
pub fn is_already_exists(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|cause| cause.downcast_ref::<io::Error>())
        .any(|io_err| io_err.kind() == io::ErrorKind::AlreadyExists)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_is_already_exists_through_context() {
        let err = Err::<(), _>(io::Error::from(io::ErrorKind::AlreadyExists))
            .context("Failed to create symlink")
            .unwrap_err();
        assert!(is_already_exists(&err));
    }

    #[test]
    fn test_is_already_exists_other_kinds() {
        let err = anyhow::Error::new(io::Error::from(io::ErrorKind::PermissionDenied));
        assert!(!is_already_exists(&err));

        let err = anyhow::anyhow!("File exists");
        assert!(!is_already_exists(&err));
    }
}
