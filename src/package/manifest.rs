use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BootstrapError, Result};
use crate::runtime::Runtime;

/// File name of a package manifest.
pub const MANIFEST_FILE: &str = "package.json";

/// The subset of a `package.json` the bootstrap reads.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub name: String,
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dev_dependencies: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub peer_dependencies: BTreeMap<String, String>,
    /// Extra files or directories, as globs relative to the package root,
    /// that dependents should see when this package is linked.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub linked_files: Vec<String>,
}

impl Manifest {
    /// Parse manifest JSON text.
    pub fn parse(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }

    /// Read and parse the manifest at `path`.
    #[tracing::instrument(skip(runtime))]
    pub async fn load<R: Runtime>(runtime: &R, path: &Path) -> Result<Self> {
        let content =
            runtime
                .read_to_string(path)
                .await
                .map_err(|source| BootstrapError::ManifestRead {
                    path: path.to_path_buf(),
                    source,
                })?;
        Self::parse(&content).map_err(|e| BootstrapError::ManifestRead {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Read the manifest at `path`, treating a missing or malformed file as absent.
    pub async fn load_optional<R: Runtime>(runtime: &R, path: &Path) -> Option<Self> {
        match Self::load(runtime, path).await {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                log::debug!("Ignoring unreadable manifest {:?}: {}", path, e);
                None
            }
        }
    }

    /// All declared dependencies: regular declarations win over dev, dev over peer.
    pub fn all_dependencies(&self) -> BTreeMap<String, String> {
        let mut all = self.peer_dependencies.clone();
        all.extend(self.dev_dependencies.clone());
        all.extend(self.dependencies.clone());
        all
    }
}

/// The stand-in manifest written next to a linked sibling.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LinkedManifest {
    pub name: String,
    pub version: String,
}

impl LinkedManifest {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::MockRuntime;
    use mockall::predicate::eq;
    use std::path::PathBuf;

    #[test]
    fn test_parse_full_manifest() {
        let manifest = Manifest::parse(
            r#"{
                "name": "a",
                "version": "1.0.0",
                "main": "lib/index.js",
                "dependencies": { "b": "^1.0.0" },
                "devDependencies": { "c": "~2.0.0" },
                "peerDependencies": { "d": "*" },
                "linkedFiles": ["bin/*"],
                "scripts": { "test": "mocha" }
            }"#,
        )
        .unwrap();

        assert_eq!(manifest.name, "a");
        assert_eq!(manifest.main.as_deref(), Some("lib/index.js"));
        assert_eq!(manifest.linked_files, vec!["bin/*"]);
        assert_eq!(manifest.all_dependencies().len(), 3);
    }

    #[test]
    fn test_parse_minimal_manifest() {
        let manifest = Manifest::parse(r#"{ "name": "a" }"#).unwrap();
        assert_eq!(manifest.version, "");
        assert!(manifest.main.is_none());
        assert!(manifest.all_dependencies().is_empty());
    }

    #[test]
    fn test_all_dependencies_precedence() {
        let manifest = Manifest {
            name: "a".into(),
            dependencies: BTreeMap::from([("x".into(), "^1.0.0".into())]),
            dev_dependencies: BTreeMap::from([
                ("x".into(), "^0.9.0".into()),
                ("y".into(), "^2.0.0".into()),
            ]),
            peer_dependencies: BTreeMap::from([("y".into(), "*".into())]),
            ..Default::default()
        };

        let all = manifest.all_dependencies();
        assert_eq!(all["x"], "^1.0.0");
        assert_eq!(all["y"], "^2.0.0");
    }

    #[test]
    fn test_linked_manifest_only_has_name_and_version() {
        let json = LinkedManifest {
            name: "b".into(),
            version: "1.2.0".into(),
        }
        .to_json()
        .unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value, serde_json::json!({ "name": "b", "version": "1.2.0" }));
    }

    #[tokio::test]
    async fn test_load_optional_malformed_is_none() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/ws/a/node_modules/b/package.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Ok("{ not json".into()));

        assert!(Manifest::load_optional(&runtime, &path).await.is_none());
    }

    #[tokio::test]
    async fn test_load_missing_is_manifest_read_error() {
        let mut runtime = MockRuntime::new();
        let path = PathBuf::from("/ws/a/package.json");

        runtime
            .expect_read_to_string()
            .with(eq(path.clone()))
            .returning(|_| Err(anyhow::anyhow!("Failed to read file to string")));

        let err = Manifest::load(&runtime, &path).await.unwrap_err();
        assert!(matches!(err, BootstrapError::ManifestRead { .. }));
    }
}
