//! File system operations (read, write, directory).

use anyhow::{Context, Result};
use std::io;
use std::path::Path;
use tokio::fs;

use super::RealRuntime;

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn read_to_string_impl(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path)
            .await
            .context("Failed to read file to string")
    }

    #[tracing::instrument(skip(self, contents))]
    pub(crate) async fn write_impl(&self, path: &Path, contents: &[u8]) -> Result<()> {
        fs::write(path, contents)
            .await
            .context("Failed to write to file")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn create_dir_all_impl(&self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .await
            .context("Failed to create directory")?;
        Ok(())
    }

    #[tracing::instrument(skip(self))]
    pub(crate) async fn remove_all_impl(&self, path: &Path) -> Result<()> {
        let metadata = match fs::symlink_metadata(path).await {
            Ok(metadata) => metadata,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e).context("Failed to inspect path"),
        };

        if metadata.file_type().is_symlink() {
            self.remove_symlink_impl(path).await
        } else if metadata.is_dir() {
            fs::remove_dir_all(path)
                .await
                .context("Failed to remove directory and its contents")
        } else {
            fs::remove_file(path).await.context("Failed to remove file")
        }
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn exists_impl(&self, path: &Path) -> bool {
        path.exists()
    }

    #[tracing::instrument(skip(self))]
    pub(crate) fn is_dir_impl(&self, path: &Path) -> bool {
        path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use crate::runtime::{RealRuntime, Runtime};
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_real_runtime_file_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test.txt");

        // Test write
        runtime.write(&file_path, b"hello").await.unwrap();
        assert!(runtime.exists(&file_path));

        // Test read_to_string
        let content = runtime.read_to_string(&file_path).await.unwrap();
        assert_eq!(content, "hello");

        // Test remove_all on a plain file
        runtime.remove_all(&file_path).await.unwrap();
        assert!(!runtime.exists(&file_path));
    }

    #[tokio::test]
    async fn test_real_runtime_dir_ops() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let sub_dir = dir.path().join("sub/nested");

        // Test create_dir_all, twice to make sure an existing directory is fine
        runtime.create_dir_all(&sub_dir).await.unwrap();
        runtime.create_dir_all(&sub_dir).await.unwrap();
        assert!(runtime.is_dir(&sub_dir));

        runtime
            .write(&sub_dir.join("file.txt"), b"content")
            .await
            .unwrap();

        // Test remove_all on a populated tree
        let parent = dir.path().join("sub");
        runtime.remove_all(&parent).await.unwrap();
        assert!(!runtime.exists(&parent));
    }

    #[tokio::test]
    async fn test_remove_all_missing_path_is_ok() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let result = runtime.remove_all(&dir.path().join("missing")).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_real_runtime_errors() {
        let runtime = RealRuntime;

        let result = runtime
            .read_to_string(std::path::Path::new("/nonexistent/path/file.txt"))
            .await;
        assert!(result.is_err());

        let result = runtime
            .write(std::path::Path::new("/nonexistent/path/file.txt"), b"x")
            .await;
        assert!(result.is_err());
    }
}
