//! The dashboard pipeline: ingestion result + view request → rendered view.
//!
//! [`run`] is a pure function. Every interaction calls it again from scratch
//! with the current inputs; nothing is cached between calls.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::aggregate::{self, Filter, Selection};
use crate::categories::{CategoryMapping, EditableCategory};
use crate::chart::{ChartData, ChartKind};
use crate::export::Table;
use crate::ingest::{Ingestion, TaggedEntry};
use crate::settings::ChartSettings;

/// How rows are grouped for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Grouping {
    /// One row per tag.
    #[default]
    Tag,
    /// One row per (source file, tag).
    File,
    /// One row per category of the user's mapping.
    Category,
}

impl Grouping {
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "tag" => Some(Self::Tag),
            "file" => Some(Self::File),
            "category" => Some(Self::Category),
            _ => None,
        }
    }
}

/// Everything the user has selected in the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewRequest {
    pub grouping: Grouping,
    pub tag_filter: Selection,
    pub file_filter: Selection,
    /// Restrict counting to these files; `None` means every file.
    pub selected_files: Option<BTreeSet<String>>,
    pub chart_kind: ChartKind,
    /// Add a category column to tag tables.
    pub show_categories: bool,
    /// Window of the entry log to return.
    pub log_page: Page,
}

/// Rows of the entry log returned when no limit is requested.
pub const DEFAULT_PAGE_SIZE: usize = 50;
/// Upper bound on rows per entry log page.
pub const MAX_PAGE_SIZE: usize = 1000;

/// A window into the entry log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// One page of the raw `(File, Tag)` entry log, in ingestion order.
///
/// The log always describes the whole batch; view filters do not apply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntryLog {
    pub offset: usize,
    pub limit: usize,
    /// Entries in the whole log.
    pub total: usize,
    pub table: Table,
}

/// Headline numbers for the current view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    /// Valid entries across all sources.
    pub entries: usize,
    /// Entries counted in the displayed table.
    pub displayed: usize,
    pub dropped_lines: usize,
    pub sources: usize,
}

/// Rendered view: the table, the chart, and the widget option lists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub grouping: Grouping,
    pub table: Table,
    pub chart: ChartData,
    pub totals: Totals,
    pub tag_options: Vec<String>,
    pub file_options: Vec<String>,
    pub categories: Vec<EditableCategory>,
    /// `(label, count)` pairs behind the chart and the spreadsheet mirror.
    pub points: Vec<(String, usize)>,
    pub entry_log: EntryLog,
}

impl Dashboard {
    /// Header of the two-column mirror table for this grouping.
    pub fn mirror_header(&self) -> [&'static str; 2] {
        match self.grouping {
            Grouping::Category => ["Category", "Count"],
            Grouping::Tag | Grouping::File => ["Tag", "Count"],
        }
    }
}

/// Run the full pipeline for one view.
pub fn run(
    ingestion: &Ingestion,
    request: &ViewRequest,
    mapping: &CategoryMapping,
    settings: &ChartSettings,
) -> Dashboard {
    let all = &ingestion.entries;
    let selected: Vec<TaggedEntry>;
    let entries: &[TaggedEntry] = match &request.selected_files {
        Some(files) => {
            selected = aggregate::select_files(all, files);
            &selected
        }
        None => all,
    };

    let filter = Filter {
        tag: request.tag_filter.clone(),
        file: request.file_filter.clone(),
    };

    let (table, points, displayed) = match request.grouping {
        Grouping::Tag | Grouping::File => {
            let by_file = request.grouping == Grouping::File;
            let rows = if by_file {
                filter.apply(aggregate::count_by_file_and_tag(entries))
            } else {
                // Per-tag rows carry no file, so the file filter scopes the
                // entries before counting.
                let scoped: Vec<TaggedEntry> = entries
                    .iter()
                    .filter(|e| filter.file.matches(&e.source_file))
                    .cloned()
                    .collect();
                aggregate::count_by_tag(&scoped)
                    .into_iter()
                    .filter(|r| filter.tag.matches(&r.tag))
                    .collect()
            };
            let displayed = aggregate::total(&rows);
            let table = Table::from_tag_counts(
                &rows,
                by_file,
                request.show_categories.then_some(mapping),
            );
            let points = tag_points(&rows, by_file);
            (table, points, displayed)
        }
        Grouping::Category => {
            let scoped: Vec<TaggedEntry> = entries
                .iter()
                .filter(|e| filter.tag.matches(&e.tag) && filter.file.matches(&e.source_file))
                .cloned()
                .collect();
            let rows = aggregate::count_by_category(&scoped, mapping);
            let displayed = rows.iter().map(|r| r.count).sum();
            let points = rows.iter().map(|r| (r.category.clone(), r.count)).collect();
            (Table::from_category_counts(&rows), points, displayed)
        }
    };

    let chart = ChartData::build(&points, request.chart_kind, settings);
    let tag_options = aggregate::unique_tags(all);
    let categories = mapping.editable(tag_options.iter().map(String::as_str));

    Dashboard {
        grouping: request.grouping,
        table,
        chart,
        totals: Totals {
            entries: all.len(),
            displayed,
            dropped_lines: ingestion.dropped_lines(),
            sources: aggregate::unique_files(all).len(),
        },
        file_options: aggregate::unique_files(all),
        tag_options,
        categories,
        points,
        entry_log: entry_log(ingestion, request.log_page),
    }
}

/// Slice the entry log. The limit is clamped to `1..=MAX_PAGE_SIZE`; an
/// offset past the end yields an empty page.
pub fn entry_log(ingestion: &Ingestion, page: Page) -> EntryLog {
    let limit = page.limit.clamp(1, MAX_PAGE_SIZE);
    let total = ingestion.entries.len();
    let start = page.offset.min(total);
    let end = start.saturating_add(limit).min(total);
    EntryLog {
        offset: page.offset,
        limit,
        total,
        table: Table::from_entries(&ingestion.entries[start..end]),
    }
}

/// Chart points for tag rows; per-file rows are labelled `tag (file)`.
fn tag_points(rows: &[aggregate::TagCount], by_file: bool) -> Vec<(String, usize)> {
    rows.iter()
        .map(|r| {
            let label = match (&r.source_file, by_file) {
                (Some(file), true) => format!("{} ({})", r.tag, file),
                _ => r.tag.clone(),
            };
            (label, r.count)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{Source, ingest};

    fn sample() -> Ingestion {
        ingest(&[
            Source::new(
                "a.jsonl",
                "{\"tag\":\"anxiety\"}\n{\"tag\":\"sleep\"}\n{\"tag\":\"anxiety\"}\nnope",
            ),
            Source::new("b.jsonl", "{\"tag\":\"anxiety\"}\n{\"tag\":\"focus\"}"),
        ])
    }

    #[test]
    fn tag_view_counts_everything() {
        let dash = run(
            &sample(),
            &ViewRequest::default(),
            &CategoryMapping::default(),
            &ChartSettings::default(),
        );
        assert_eq!(
            dash.points,
            vec![
                ("anxiety".to_string(), 3),
                ("focus".to_string(), 1),
                ("sleep".to_string(), 1)
            ]
        );
        assert_eq!(dash.totals.entries, 5);
        assert_eq!(dash.totals.displayed, 5);
        assert_eq!(dash.totals.dropped_lines, 1);
        assert_eq!(dash.totals.sources, 2);
    }

    #[test]
    fn file_filter_on_tag_view_rescopes_counts() {
        let request = ViewRequest {
            file_filter: Selection::Only("b.jsonl".into()),
            ..ViewRequest::default()
        };
        let dash = run(&sample(), &request, &CategoryMapping::default(), &ChartSettings::default());
        assert_eq!(dash.totals.displayed, 2);
        assert_eq!(dash.table.columns, vec!["Tag", "Count"]);
    }

    #[test]
    fn file_view_has_file_column() {
        let request = ViewRequest {
            grouping: Grouping::File,
            tag_filter: Selection::Only("anxiety".into()),
            ..ViewRequest::default()
        };
        let dash = run(&sample(), &request, &CategoryMapping::default(), &ChartSettings::default());
        assert_eq!(dash.table.columns, vec!["File", "Tag", "Count"]);
        assert_eq!(dash.table.rows.len(), 2);
        assert_eq!(dash.points[0], ("anxiety (a.jsonl)".to_string(), 2));
    }

    #[test]
    fn category_view_uses_mapping() {
        let mut mapping = CategoryMapping::default();
        mapping.set("anxiety", "Mood");
        let request = ViewRequest {
            grouping: Grouping::Category,
            ..ViewRequest::default()
        };
        let dash = run(&sample(), &request, &mapping, &ChartSettings::default());
        assert_eq!(
            dash.points,
            vec![("Mood".to_string(), 3), ("Other".to_string(), 2)]
        );
        assert_eq!(dash.mirror_header(), ["Category", "Count"]);
    }

    #[test]
    fn empty_file_selection_is_empty_not_error() {
        let request = ViewRequest {
            selected_files: Some(BTreeSet::new()),
            ..ViewRequest::default()
        };
        let dash = run(&sample(), &request, &CategoryMapping::default(), &ChartSettings::default());
        assert!(dash.table.is_empty());
        assert!(dash.chart.is_empty());
        // Option lists still describe the whole batch.
        assert_eq!(dash.file_options.len(), 2);
    }

    #[test]
    fn rerun_is_deterministic() {
        let request = ViewRequest {
            grouping: Grouping::File,
            chart_kind: ChartKind::Bar,
            ..ViewRequest::default()
        };
        let ingestion = sample();
        let mapping = CategoryMapping::default();
        let settings = ChartSettings::default();
        assert_eq!(
            run(&ingestion, &request, &mapping, &settings),
            run(&ingestion, &request, &mapping, &settings)
        );
    }

    #[test]
    fn entry_log_pages_raw_pairs_in_order() {
        let request = ViewRequest {
            tag_filter: Selection::Only("focus".into()),
            log_page: Page { offset: 1, limit: 2 },
            ..ViewRequest::default()
        };
        let dash = run(&sample(), &request, &CategoryMapping::default(), &ChartSettings::default());
        let log = &dash.entry_log;
        assert_eq!(log.total, 5);
        assert_eq!(log.table.columns, vec!["File", "Tag"]);
        // Filters do not narrow the log.
        assert_eq!(
            log.table.rows,
            vec![
                vec!["a.jsonl".to_string(), "sleep".to_string()],
                vec!["a.jsonl".to_string(), "anxiety".to_string()],
            ]
        );
    }

    #[test]
    fn entry_log_clamps_limits_and_offsets() {
        let ingestion = sample();
        let page = entry_log(&ingestion, Page { offset: 0, limit: 0 });
        assert_eq!(page.limit, 1);
        assert_eq!(page.table.rows.len(), 1);

        let past_end = entry_log(&ingestion, Page { offset: 99, limit: 10 });
        assert_eq!(past_end.total, 5);
        assert!(past_end.table.is_empty());

        let huge = entry_log(&ingestion, Page { offset: 3, limit: usize::MAX });
        assert_eq!(huge.limit, MAX_PAGE_SIZE);
        assert_eq!(huge.table.rows.len(), 2);
    }

    #[test]
    fn editable_categories_cover_observed_tags_only() {
        let mut mapping = CategoryMapping::default();
        mapping.set("unseen", "Legacy");
        let dash = run(&sample(), &ViewRequest::default(), &mapping, &ChartSettings::default());
        let tags: Vec<&str> = dash.categories.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(tags, vec!["anxiety", "focus", "sleep"]);
    }
}
