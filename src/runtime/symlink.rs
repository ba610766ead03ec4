//! Symlink operations (create, read, inspect, remove).

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn symlink_impl(&self, original: &Path, link: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::symlink(original, link)
                .await
                .context("Failed to create symlink")?;
        }
        #[cfg(windows)]
        {
            use log::trace;

            // `is_dir()` on a relative path is relative to CWD; we want it relative to the link's parent.
            let target_path = if original.is_absolute() {
                original.to_path_buf()
            } else {
                link.parent()
                    .context("Failed to get parent directory for symlink")?
                    .join(original)
            };

            if target_path.is_dir() {
                trace!(
                    "Target path {} is a directory, creating directory symlink",
                    target_path.display()
                );
                fs::symlink_dir(original, link)
                    .await
                    .context("Failed to create directory symlink")?;
            } else {
                fs::symlink_file(original, link)
                    .await
                    .context("Failed to create file symlink")?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn read_link_impl(&self, path: &Path) -> Result<PathBuf> {
        fs::read_link(path).await.context("Failed to read symlink")
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_symlink_impl(&self, path: &Path) -> bool {
        std::fs::symlink_metadata(path)
            .map(|m| m.file_type().is_symlink())
            .unwrap_or(false)
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn remove_symlink_impl(&self, path: &Path) -> Result<()> {
        #[cfg(unix)]
        {
            fs::remove_file(path)
                .await
                .context("Failed to remove symlink")?;
        }
        #[cfg(windows)]
        {
            // Directory symlinks need remove_dir, file symlinks need remove_file.
            if fs::remove_dir(path).await.is_err() {
                fs::remove_file(path)
                    .await
                    .context("Failed to remove symlink")?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime, is_already_exists};
    use tempfile::tempdir;

    #[cfg_attr(
        wsboot_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set WSBOOT_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[tokio::test]
    async fn test_real_runtime_symlink_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        runtime.write(&target, b"content").await.unwrap();

        // Test symlink and is_symlink
        let link = dir.path().join("link.txt");
        runtime.symlink(&target, &link).await.unwrap();
        assert!(runtime.is_symlink(&link));
        assert!(!runtime.is_symlink(&target));

        // Read through symlink
        assert_eq!(runtime.read_to_string(&link).await.unwrap(), "content");

        // Test read_link
        assert_eq!(runtime.read_link(&link).await.unwrap(), target);

        // remove_all removes the link, not the target
        runtime.remove_all(&link).await.unwrap();
        assert!(!runtime.is_symlink(&link));
        assert!(runtime.exists(&target));
    }

    #[cfg_attr(
        wsboot_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set WSBOOT_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[tokio::test]
    async fn test_symlink_onto_existing_link_reports_already_exists() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let target = dir.path().join("target.txt");
        runtime.write(&target, b"content").await.unwrap();

        let link = dir.path().join("link.txt");
        runtime.symlink(&target, &link).await.unwrap();

        let err = runtime.symlink(&target, &link).await.unwrap_err();
        assert!(is_already_exists(&err));
    }

    #[cfg_attr(
        wsboot_skip_cross_windows_tests,
        ignore = "cross windows tests disabled; set WSBOOT_RUN_CROSS_WINDOWS_TESTS=1 to enable"
    )]
    #[tokio::test]
    async fn test_remove_all_dangling_symlink() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let link = dir.path().join("dangling");
        runtime
            .symlink(&dir.path().join("gone"), &link)
            .await
            .unwrap();
        assert!(runtime.is_symlink(&link));
        assert!(!runtime.exists(&link));

        runtime.remove_all(&link).await.unwrap();
        assert!(!runtime.is_symlink(&link));
    }
}
