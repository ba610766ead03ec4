//! Version compatibility checks for declared dependency ranges.
//!
//! Ranges follow the npm dialect: caret, tilde and comparator ranges,
//! x-ranges, hyphen ranges, whitespace-joined comparator sets and `||`
//! unions. Each comparator set is rewritten into the comma-separated form
//! understood by [`semver::VersionReq`], which already implements the
//! pre-release rules of the semantic versioning specification.

use semver::{Version, VersionReq};

/// Version checker - pure functions for range satisfaction.
pub struct VersionChecker;

impl VersionChecker {
    /// Check whether `actual` satisfies `range`.
    ///
    /// Unparsable versions or ranges are never compatible.
    pub fn is_compatible(actual: &str, range: &str) -> bool {
        let Some(version) = Self::parse_version(actual) else {
            return false;
        };

        range.split("||").any(|set| match Self::translate_set(set) {
            Some(req) => VersionReq::parse(&req)
                .map(|req| req.matches(&version))
                .unwrap_or(false),
            None => false,
        })
    }

    /// Parse a concrete version, tolerating a leading `v` or `=`.
    pub fn parse_version(version: &str) -> Option<Version> {
        let trimmed = version.trim();
        let trimmed = trimmed.strip_prefix('=').unwrap_or(trimmed).trim_start();
        let trimmed = trimmed.strip_prefix('v').unwrap_or(trimmed);
        Version::parse(trimmed).ok()
    }

    /// Rewrite one npm comparator set into `VersionReq` syntax.
    fn translate_set(set: &str) -> Option<String> {
        let set = set.trim();
        if set.is_empty() {
            return Some("*".to_string());
        }

        if let Some((low, high)) = set.split_once(" - ") {
            let low = Self::strip_wildcards(low.trim())?;
            let high = Self::strip_wildcards(high.trim())?;
            let mut parts = Vec::new();
            if low != "*" {
                parts.push(format!(">={}", low));
            }
            if high != "*" {
                parts.push(format!("<={}", high));
            }
            if parts.is_empty() {
                return Some("*".to_string());
            }
            return Some(parts.join(", "));
        }

        let mut comparators = Vec::new();
        let mut pending_op: Option<&str> = None;
        for token in set.split_whitespace() {
            if Self::is_operator(token) {
                if pending_op.is_some() {
                    return None;
                }
                pending_op = Some(token);
                continue;
            }
            let (op, version) = match pending_op.take() {
                Some(op) => (op, token),
                None => Self::split_operator(token),
            };
            comparators.push(Self::translate_comparator(op, version)?);
        }
        if pending_op.is_some() {
            return None;
        }

        if comparators.iter().any(|c| c == "*") {
            comparators.retain(|c| c != "*");
            if comparators.is_empty() {
                return Some("*".to_string());
            }
        }
        Some(comparators.join(", "))
    }

    fn translate_comparator(op: &str, version: &str) -> Option<String> {
        // `~>` is an alias of `~`.
        let op = if op == "~>" { "~" } else { op };
        let version = version.strip_prefix('v').unwrap_or(version);
        let version = Self::strip_wildcards(version)?;
        if version == "*" {
            return match op {
                "" | "=" | "^" | "~" | ">=" | "<=" => Some("*".to_string()),
                // `<*` and `>*` can never be satisfied.
                _ => None,
            };
        }
        let op = if op.is_empty() { "=" } else { op };
        Some(format!("{}{}", op, version))
    }

    /// Drop trailing `x`, `X` or `*` components: `1.x` becomes `1`, a bare
    /// wildcard becomes `*`.
    fn strip_wildcards(version: &str) -> Option<String> {
        let mut parts: Vec<&str> = version.split('.').collect();
        while parts
            .last()
            .is_some_and(|p| matches!(*p, "x" | "X" | "*"))
        {
            parts.pop();
        }
        if parts.is_empty() {
            return Some("*".to_string());
        }
        // A wildcard in the middle of a version (`1.x.3`) is not a valid range.
        if parts.iter().any(|p| matches!(*p, "x" | "X" | "*")) {
            return None;
        }
        Some(parts.join("."))
    }

    fn is_operator(token: &str) -> bool {
        matches!(token, "<" | "<=" | ">" | ">=" | "=" | "^" | "~" | "~>")
    }

    fn split_operator(token: &str) -> (&str, &str) {
        for op in ["~>", "<=", ">=", "<", ">", "=", "^", "~"] {
            if let Some(rest) = token.strip_prefix(op) {
                return (op, rest);
            }
        }
        ("", token)
    }
}
