// src/api/plugins.rs

use std::fs;
use std::path::Path;

use tracing::debug;

/// Names of the `.jar` files directly inside `dir`, sorted.
///
/// A missing or unreadable directory yields an empty list.
pub fn list_plugins(dir: &Path) -> Vec<String> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "plugin directory not readable");
            return Vec::new();
        }
    };

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().map(|t| !t.is_dir()).unwrap_or(false))
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".jar"))
        .collect();
    names.sort();
    names
}
