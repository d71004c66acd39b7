//! Tag frequency aggregation over the entry log.
//!
//! All counts are exact-match: no case folding, no trimming. Rows come back
//! ordered by their grouping key so that identical input always yields
//! identical output.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::categories::CategoryMapping;
use crate::ingest::TaggedEntry;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// Count of one tag, optionally scoped to a single source file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,
    pub count: usize,
}

/// Count of all tags that map to one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub category: String,
    pub count: usize,
}

// ---------------------------------------------------------------------------
// Filters
// ---------------------------------------------------------------------------

/// A single-value filter where `All` means "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Selection {
    #[default]
    All,
    Only(String),
}

impl Selection {
    /// Parse a widget value; `"All"` and the empty string select everything.
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            None | Some("") | Some("All") => Self::All,
            Some(v) => Self::Only(v.to_string()),
        }
    }

    pub fn matches(&self, value: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(wanted) => wanted == value,
        }
    }
}

/// Post-aggregation row filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub tag: Selection,
    pub file: Selection,
}

impl Filter {
    /// Keep the rows matching both selections.
    ///
    /// Rows without a source file only match `file: All`.
    pub fn apply(&self, rows: Vec<TagCount>) -> Vec<TagCount> {
        rows.into_iter()
            .filter(|row| self.tag.matches(&row.tag))
            .filter(|row| match (&self.file, &row.source_file) {
                (Selection::All, _) => true,
                (Selection::Only(wanted), Some(file)) => wanted == file,
                (Selection::Only(_), None) => false,
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Counting
// ---------------------------------------------------------------------------

/// Count occurrences of each tag across all sources.
pub fn count_by_tag(entries: &[TaggedEntry]) -> Vec<TagCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(entry.tag.as_str()).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_string(),
            source_file: None,
            count,
        })
        .collect()
}

/// Count occurrences of each (source file, tag) pair.
pub fn count_by_file_and_tag(entries: &[TaggedEntry]) -> Vec<TagCount> {
    let mut counts: BTreeMap<(&str, &str), usize> = BTreeMap::new();
    for entry in entries {
        *counts
            .entry((entry.source_file.as_str(), entry.tag.as_str()))
            .or_default() += 1;
    }
    counts
        .into_iter()
        .map(|((file, tag), count)| TagCount {
            tag: tag.to_string(),
            source_file: Some(file.to_string()),
            count,
        })
        .collect()
}

/// Count entries per category, resolving each tag through `mapping`.
pub fn count_by_category(entries: &[TaggedEntry], mapping: &CategoryMapping) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for entry in entries {
        *counts.entry(mapping.get(&entry.tag)).or_default() += 1;
    }
    counts
        .into_iter()
        .map(|(category, count)| CategoryCount {
            category: category.to_string(),
            count,
        })
        .collect()
}

/// Restrict the entry log to the given source files before counting.
///
/// An empty selection yields an empty log.
pub fn select_files(entries: &[TaggedEntry], selected: &BTreeSet<String>) -> Vec<TaggedEntry> {
    entries
        .iter()
        .filter(|e| selected.contains(&e.source_file))
        .cloned()
        .collect()
}

/// Sorted distinct tags in the entry log.
pub fn unique_tags(entries: &[TaggedEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.tag.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sorted distinct source files in the entry log.
pub fn unique_files(entries: &[TaggedEntry]) -> Vec<String> {
    entries
        .iter()
        .map(|e| e.source_file.as_str())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Sum of all row counts.
pub fn total(rows: &[TagCount]) -> usize {
    rows.iter().map(|r| r.count).sum()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
