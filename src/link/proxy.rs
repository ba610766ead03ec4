//! Generated proxy modules.
//!
//! A proxy module is a one-line source file that re-exports another file by
//! absolute path, so a dependent can import a sibling's module from its own
//! dependency directory without the source being copied.

use std::path::{Path, PathBuf};

/// Extension of files that are materialized as proxy modules instead of symlinks.
pub const NATIVE_MODULE_EXTENSION: &str = "js";

const REEXPORT_OPEN: &str = "module.exports = require(";
const REEXPORT_CLOSE: &str = ");\n";

/// Whether `path` is a native source module.
pub fn is_native_module(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == NATIVE_MODULE_EXTENSION)
}

/// Content of the proxy module forwarding to `source`.
pub fn proxy_module_content(prefix: &str, source: &Path) -> String {
    let literal = serde_json::Value::String(source.to_string_lossy().into_owned());
    format!("{}{}{}{}", prefix, REEXPORT_OPEN, literal, REEXPORT_CLOSE)
}

/// The path a proxy module re-exports, given the prefix it was written with.
pub fn proxy_module_target(prefix: &str, content: &str) -> Option<PathBuf> {
    let literal = content
        .strip_prefix(prefix)?
        .strip_prefix(REEXPORT_OPEN)?
        .strip_suffix(REEXPORT_CLOSE)?;
    let path: String = serde_json::from_str(literal).ok()?;
    Some(PathBuf::from(path))
}
