use crate::package::{Package, VersionChecker};

use super::reporter::MismatchWarning;

/// How each declared dependency of one package will be satisfied.
///
/// Compatibility is evaluated exactly once per dependency here, so a
/// dependency is either linked or handed to the external installer, never both.
#[derive(Debug)]
pub struct DependencyPlan<'a> {
    /// Siblings whose version satisfies the declared range.
    pub linked: Vec<&'a Package>,
    /// Siblings that exist but are out of range.
    pub mismatches: Vec<MismatchWarning>,
    /// `(name, range)` pairs left to the external installer, sorted by name.
    pub external: Vec<(String, String)>,
}

impl<'a> DependencyPlan<'a> {
    /// Resolve every dependency `package` declares against the other `packages`.
    pub fn resolve(package: &Package, packages: &'a [Package]) -> Self {
        let mut plan = DependencyPlan {
            linked: Vec::new(),
            mismatches: Vec::new(),
            external: Vec::new(),
        };

        for (name, range) in &package.all_dependencies {
            let sibling = packages
                .iter()
                .find(|p| &p.name == name && p.location != package.location);

            match sibling {
                Some(sibling) if VersionChecker::is_compatible(&sibling.version, range) => {
                    plan.linked.push(sibling);
                }
                Some(sibling) => {
                    plan.mismatches.push(MismatchWarning {
                        package: package.name.clone(),
                        dependency: name.clone(),
                        expected_range: range.clone(),
                        actual_version: sibling.version.clone(),
                    });
                    plan.external.push((name.clone(), range.clone()));
                }
                None => plan.external.push((name.clone(), range.clone())),
            }
        }

        plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn workspace() -> Vec<Package> {
        vec![
            Package::new("a", "1.0.0", "/ws/a")
                .with_dependency("b", "^1.0.0")
                .with_dependency("c", "^2.0.0")
                .with_dependency("lodash", "^4.17.0"),
            Package::new("b", "1.2.0", "/ws/b"),
            Package::new("c", "1.5.0", "/ws/c"),
        ]
    }

    #[test]
    fn test_resolve_partitions_dependencies() {
        let packages = workspace();
        let plan = DependencyPlan::resolve(&packages[0], &packages);

        let linked: Vec<&str> = plan.linked.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(linked, vec!["b"]);

        assert_eq!(
            plan.mismatches,
            vec![MismatchWarning {
                package: "a".into(),
                dependency: "c".into(),
                expected_range: "^2.0.0".into(),
                actual_version: "1.5.0".into(),
            }]
        );

        assert_eq!(
            plan.external,
            vec![
                ("c".to_string(), "^2.0.0".to_string()),
                ("lodash".to_string(), "^4.17.0".to_string()),
            ]
        );
    }

    #[test]
    fn test_resolve_ignores_self_reference() {
        let packages = vec![Package::new("a", "1.0.0", "/ws/a").with_dependency("a", "*")];
        let plan = DependencyPlan::resolve(&packages[0], &packages);

        assert!(plan.linked.is_empty());
        assert!(plan.mismatches.is_empty());
        assert_eq!(plan.external, vec![("a".to_string(), "*".to_string())]);
    }

    #[test]
    fn test_resolve_no_dependencies() {
        let packages = workspace();
        let plan = DependencyPlan::resolve(&packages[1], &packages);

        assert!(plan.linked.is_empty());
        assert!(plan.mismatches.is_empty());
        assert!(plan.external.is_empty());
    }
}
