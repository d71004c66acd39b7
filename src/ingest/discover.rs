//! Local source discovery.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Find JSONL sources under `path`.
///
/// A file path is returned as-is regardless of extension. A directory is
/// walked recursively for files whose extension matches `extension`
/// (case-insensitive, without the leading dot). Results are sorted by path.
pub fn discover(path: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let meta =
        std::fs::metadata(path).with_context(|| format!("cannot access {}", path.display()))?;
    if meta.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let wanted = extension.trim_start_matches('.');
    let mut found = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                log::warn!("skipping unreadable entry under {}: {e}", path.display());
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(wanted));
        if matches {
            found.push(entry.into_path());
        }
    }
    found.sort();
    Ok(found)
}

/// [`discover`] over several roots, keeping root order and dropping repeats.
pub fn discover_all(roots: &[impl AsRef<Path>], extension: &str) -> Result<Vec<PathBuf>> {
    let mut found: Vec<PathBuf> = Vec::new();
    for root in roots {
        for path in discover(root.as_ref(), extension)? {
            if !found.contains(&path) {
                found.push(path);
            }
        }
    }
    Ok(found)
}
