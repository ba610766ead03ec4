//! Glob pattern expansion relative to a directory.

use anyhow::{Context, Result, anyhow};
use std::path::{Path, PathBuf};

use super::RealRuntime;

/// Build an absolute glob pattern rooted at `root`, escaping any glob
/// metacharacters that happen to appear in the root path itself.
pub(crate) fn rooted_pattern(root: &Path, pattern: &str) -> Result<String> {
    let root_str = root
        .to_str()
        .ok_or_else(|| anyhow!("Path {:?} is not valid UTF-8", root))?;
    let escaped = glob::Pattern::escape(root_str);
    let pattern = pattern.trim_start_matches("./");
    Ok(format!("{}/{}", escaped.trim_end_matches('/'), pattern))
}

/// Synchronously expand `pattern` under `root`.
pub(crate) fn expand(root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let full = rooted_pattern(root, pattern)?;
    let mut matches = Vec::new();
    for entry in glob::glob(&full).with_context(|| format!("Invalid glob pattern '{}'", pattern))? {
        let path = entry.with_context(|| format!("Failed to read a match of '{}'", pattern))?;
        matches.push(path);
    }
    matches.sort();
    Ok(matches)
}

impl RealRuntime {
    #[tracing::instrument(skip(self))]
    pub(crate) async fn glob_impl(&self, root: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        let pattern = pattern.to_string();
        tokio::task::spawn_blocking(move || expand(&root, &pattern))
            .await
            .context("Glob expansion task panicked")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::Runtime;
    use tempfile::tempdir;

    #[test]
    fn test_rooted_pattern_escapes_root() {
        let pattern = rooted_pattern(Path::new("/ws/[pkg]"), "lib/*.js").unwrap();
        assert_eq!(pattern, "/ws/[[]pkg[]]/lib/*.js");
    }

    #[test]
    fn test_rooted_pattern_strips_dot_slash() {
        let pattern = rooted_pattern(Path::new("/ws/pkg/"), "./index.js").unwrap();
        assert_eq!(pattern, "/ws/pkg/index.js");
    }

    #[tokio::test]
    async fn test_glob_matches_sorted() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();
        let lib = dir.path().join("lib");
        runtime.create_dir_all(&lib).await.unwrap();
        runtime.write(&lib.join("b.js"), b"").await.unwrap();
        runtime.write(&lib.join("a.js"), b"").await.unwrap();
        runtime.write(&lib.join("c.json"), b"").await.unwrap();

        let matches = runtime.glob(dir.path(), "lib/*.js").await.unwrap();
        assert_eq!(matches, vec![lib.join("a.js"), lib.join("b.js")]);
    }

    #[tokio::test]
    async fn test_glob_literal_missing_file() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let matches = runtime.glob(dir.path(), "index.js").await.unwrap();
        assert!(matches.is_empty());
    }

    #[tokio::test]
    async fn test_glob_invalid_pattern() {
        let runtime = RealRuntime;
        let dir = tempdir().unwrap();

        let result = runtime.glob(dir.path(), "lib/[*.js").await;
        assert!(result.is_err());
    }
}
