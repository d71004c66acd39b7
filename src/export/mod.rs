//! Displayed tables and their CSV export.

use anyhow::{Context, Result};
use serde::Serialize;

use crate::aggregate::{CategoryCount, TagCount};
use crate::categories::CategoryMapping;
use crate::ingest::TaggedEntry;

/// A table exactly as displayed: column headers plus string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Tag counts, with a leading source file column when `with_file` is set
    /// and a trailing category column when a mapping is given.
    pub fn from_tag_counts(
        rows: &[TagCount],
        with_file: bool,
        mapping: Option<&CategoryMapping>,
    ) -> Self {
        let mut columns = Vec::new();
        if with_file {
            columns.push("File".to_string());
        }
        columns.push("Tag".to_string());
        columns.push("Count".to_string());
        if mapping.is_some() {
            columns.push("Category".to_string());
        }

        let rows = rows
            .iter()
            .map(|r| {
                let mut cells = Vec::with_capacity(columns.len());
                if with_file {
                    cells.push(r.source_file.clone().unwrap_or_default());
                }
                cells.push(r.tag.clone());
                cells.push(r.count.to_string());
                if let Some(mapping) = mapping {
                    cells.push(mapping.get(&r.tag).to_string());
                }
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn from_category_counts(rows: &[CategoryCount]) -> Self {
        Self {
            columns: vec!["Category".to_string(), "Count".to_string()],
            rows: rows
                .iter()
                .map(|r| vec![r.category.clone(), r.count.to_string()])
                .collect(),
        }
    }

    /// The raw entry log: one `(File, Tag)` row per entry.
    pub fn from_entries(entries: &[TaggedEntry]) -> Self {
        Self {
            columns: vec!["File".to_string(), "Tag".to_string()],
            rows: entries
                .iter()
                .map(|e| vec![e.source_file.clone(), e.tag.clone()])
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by header name.
    pub fn column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Encode as UTF-8 CSV with a header row.
    pub fn to_csv(&self) -> Result<Vec<u8>> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record(&self.columns)
            .context("failed to write CSV header")?;
        for row in &self.rows {
            writer.write_record(row).context("failed to write CSV row")?;
        }
        writer
            .into_inner()
            .map_err(|e| anyhow::anyhow!("failed to flush CSV: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tag(tag: &str, file: Option<&str>, count: usize) -> TagCount {
        TagCount {
            tag: tag.to_string(),
            source_file: file.map(str::to_string),
            count,
        }
    }

    #[test]
    fn tag_table_columns_follow_rows() {
        let plain = Table::from_tag_counts(&[tag("a", None, 2)], false, None);
        assert_eq!(plain.columns, vec!["Tag", "Count"]);

        let by_file = Table::from_tag_counts(&[tag("a", Some("x.jsonl"), 2)], true, None);
        assert_eq!(by_file.columns, vec!["File", "Tag", "Count"]);
        assert_eq!(by_file.rows[0], vec!["x.jsonl", "a", "2"]);

        let empty = Table::from_tag_counts(&[], true, None);
        assert_eq!(empty.columns, vec!["File", "Tag", "Count"]);
    }

    #[test]
    fn category_column_uses_mapping() {
        let mut mapping = CategoryMapping::default();
        mapping.set("a", "Mood");
        let table = Table::from_tag_counts(&[tag("a", None, 2), tag("b", None, 1)], false, Some(&mapping));
        assert_eq!(table.columns, vec!["Tag", "Count", "Category"]);
        assert_eq!(table.rows[1], vec!["b", "1", "Other"]);
    }

    #[test]
    fn entry_table_keeps_order_and_duplicates() {
        let entries = [("b.jsonl", "x"), ("a.jsonl", "y"), ("b.jsonl", "x")].map(|(f, t)| {
            TaggedEntry {
                source_file: f.to_string(),
                tag: t.to_string(),
            }
        });
        let table = Table::from_entries(&entries);
        assert_eq!(table.columns, vec!["File", "Tag"]);
        assert_eq!(table.rows.len(), 3);
        assert_eq!(table.rows[2], vec!["b.jsonl", "x"]);
    }

    #[test]
    fn csv_has_header_and_quotes_commas() {
        let table = Table::from_tag_counts(&[tag("x, y", None, 3)], false, None);
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Tag,Count\n\"x, y\",3\n");
    }

    #[test]
    fn empty_table_still_has_header() {
        let table = Table::from_category_counts(&[]);
        let csv = String::from_utf8(table.to_csv().unwrap()).unwrap();
        assert_eq!(csv, "Category,Count\n");
        assert!(table.is_empty());
    }
}
