//! Per-user JSON file store.
//!
//! Category mappings and chart settings live under
//! `<data_dir>/users/<user>/`. The user id is a free-text label; it is only
//! encoded into a safe path component, never authenticated. Distinct ids
//! (after trimming surrounding whitespace) always get distinct directories.
//!
//! Writes go to a temporary file in the target directory and are renamed
//! into place, so a concurrent reader sees either the old or the new file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;

/// Characters that get percent-encoded in a user directory name.
///
/// Upper-case letters and `.` are encoded too, so the mapping stays
/// injective on case-insensitive filesystems and never yields `.` or `..`.
static UNSAFE_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_-]").expect("valid regex"));

/// Errors from the per-user store.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("user id must not be empty")]
    EmptyUserId,
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize {path}: {source}")]
    Serialize {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Which per-user document to address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    CategoryMap,
    ChartSettings,
}

impl Document {
    fn file_name(self) -> &'static str {
        match self {
            Self::CategoryMap => "category_map.json",
            Self::ChartSettings => "chart_settings.json",
        }
    }
}

/// Root of the per-user files.
#[derive(Debug, Clone)]
pub struct UserStore {
    root: PathBuf,
}

impl UserStore {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            root: data_dir.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `doc` for `user`.
    pub fn path(&self, user: &str, doc: Document) -> Result<PathBuf, StoreError> {
        let dir = sanitize_user_id(user).ok_or(StoreError::EmptyUserId)?;
        Ok(self.root.join("users").join(dir).join(doc.file_name()))
    }

    pub fn exists(&self, user: &str, doc: Document) -> bool {
        self.path(user, doc).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Read and parse a document; `Ok(None)` when the file does not exist.
    pub fn read<T: DeserializeOwned>(
        &self,
        user: &str,
        doc: Document,
    ) -> Result<Option<T>, StoreError> {
        let path = self.path(user, doc)?;
        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Read { path, source }),
        };
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|source| StoreError::Parse { path, source })
    }

    /// Replace a document in full.
    pub fn write<T: Serialize>(&self, user: &str, doc: Document, value: &T) -> Result<PathBuf, StoreError> {
        let path = self.path(user, doc)?;
        let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize {
            path: path.clone(),
            source,
        })?;
        write_atomic(&path, json.as_bytes()).map_err(|source| StoreError::Write {
            path: path.clone(),
            source,
        })?;
        Ok(path)
    }
}

/// Map a free-text user id to a directory name.
///
/// Every byte outside `[a-z0-9_-]` becomes `%XX`, `%` included, so two ids
/// share a directory only if they are equal. Returns `None` for ids that
/// are empty after trimming.
pub fn sanitize_user_id(user: &str) -> Option<String> {
    let trimmed = user.trim();
    if trimmed.is_empty() {
        return None;
    }
    let encoded = UNSAFE_CHARS.replace_all(trimmed, |caps: &regex::Captures| {
        caps[0].bytes().map(|b| format!("%{b:02X}")).collect::<String>()
    });
    Some(encoded.into_owned())
}

fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn sanitize_percent_encodes_unsafe_bytes() {
        assert_eq!(sanitize_user_id("alice").as_deref(), Some("alice"));
        assert_eq!(sanitize_user_id("alice_smith").as_deref(), Some("alice_smith"));
        assert_eq!(sanitize_user_id(" Bob Smith ").as_deref(), Some("%42ob%20%53mith"));
        assert_eq!(sanitize_user_id("../etc").as_deref(), Some("%2E%2E%2Fetc"));
        assert_eq!(sanitize_user_id("..").as_deref(), Some("%2E%2E"));
        assert_eq!(sanitize_user_id("50%").as_deref(), Some("50%25"));
        assert_eq!(sanitize_user_id("é").as_deref(), Some("%C3%A9"));
        assert_eq!(sanitize_user_id("   "), None);
    }

    #[test]
    fn distinct_ids_never_share_a_directory() {
        let ids = [
            "alice smith",
            "alice_smith",
            "alice/smith",
            "alice%20smith",
            "Alice_smith",
            "alice.smith",
        ];
        let dirs: std::collections::BTreeSet<String> =
            ids.iter().filter_map(|id| sanitize_user_id(id)).collect();
        assert_eq!(dirs.len(), ids.len());
    }

    #[test]
    fn missing_document_reads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path());
        let value: Option<BTreeMap<String, String>> =
            store.read("alice", Document::CategoryMap).unwrap();
        assert!(value.is_none());
        assert!(!store.exists("alice", Document::CategoryMap));
    }

    #[test]
    fn write_then_read_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path());
        let mut map = BTreeMap::new();
        map.insert("anxiety".to_string(), "Mood".to_string());

        let path = store.write("alice", Document::CategoryMap, &map).unwrap();
        assert!(path.ends_with("users/alice/category_map.json"));

        let back: BTreeMap<String, String> =
            store.read("alice", Document::CategoryMap).unwrap().unwrap();
        assert_eq!(back, map);
    }

    #[test]
    fn corrupt_document_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path());
        let path = store.path("alice", Document::ChartSettings).unwrap();
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let result: Result<Option<BTreeMap<String, String>>, _> =
            store.read("alice", Document::ChartSettings);
        assert!(matches!(result, Err(StoreError::Parse { .. })));
    }

    #[test]
    fn empty_user_is_rejected() {
        let store = UserStore::new("/tmp");
        assert!(matches!(
            store.path("", Document::CategoryMap),
            Err(StoreError::EmptyUserId)
        ));
    }
}
