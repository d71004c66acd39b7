/// End-to-end tests for ingestion, aggregation and the dashboard pipeline.
///
/// Exercises the library the way the CLI and the web server do: named
/// sources in, a rendered `Dashboard` out.
use std::collections::BTreeSet;

use tagboard::aggregate::{self, Filter, Selection, TagCount};
use tagboard::categories::CategoryMapping;
use tagboard::chart::ChartKind;
use tagboard::ingest::{Source, ingest};
use tagboard::pipeline::{self, Grouping, ViewRequest};
use tagboard::settings::ChartSettings;

fn run(sources: &[Source], request: &ViewRequest) -> pipeline::Dashboard {
    pipeline::run(
        &ingest(sources),
        request,
        &CategoryMapping::default(),
        &ChartSettings::default(),
    )
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

#[test]
fn three_anxiety_one_sleep_one_malformed() {
    let source = Source::new(
        "log.jsonl",
        "{\"tag\":\"anxiety\"}\n{\"tag\":\"anxiety\"}\n{\"tag\":\"sleep\"}\n{oops\n{\"tag\":\"anxiety\"}\n",
    );
    let ingestion = ingest(&[source]);
    assert_eq!(ingestion.entries.len(), 4);
    assert_eq!(ingestion.dropped_lines(), 1);

    let counts = aggregate::count_by_tag(&ingestion.entries);
    assert_eq!(
        counts,
        vec![
            TagCount {
                tag: "anxiety".into(),
                source_file: None,
                count: 3
            },
            TagCount {
                tag: "sleep".into(),
                source_file: None,
                count: 1
            },
        ]
    );
}

#[test]
fn only_valid_tagged_lines_produce_entries() {
    let body = [
        r#"{"tag":"a"}"#,
        r#"{"tag":""}"#,
        r#"{"other":"x"}"#,
        r#"["tag","a"]"#,
        r#""tag""#,
        r#"{"tag":null}"#,
        "not json",
        r#"{"tag":"b","extra":1}"#,
    ]
    .join("\n");
    let ingestion = ingest(&[Source::new("mixed.jsonl", body)]);
    let tags: Vec<&str> = ingestion.entries.iter().map(|e| e.tag.as_str()).collect();
    assert_eq!(tags, vec!["a", "b"]);
    assert_eq!(ingestion.malformed_lines, 1);
    assert_eq!(ingestion.untagged_lines, 5);
}

#[test]
fn batches_fold_without_shared_state() {
    let first = ingest(&[Source::new("a.jsonl", "{\"tag\":\"x\"}\n")]);
    let second = ingest(&[Source::new("b.jsonl", "{\"tag\":\"x\"}\nbad\n")]);
    let both = first.clone().merge(second);
    assert_eq!(both.entries.len(), 2);
    assert_eq!(both.dropped_lines(), 1);
    // Inputs are untouched by the fold.
    assert_eq!(first.entries.len(), 1);
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

#[test]
fn counts_sum_to_entries() {
    let ingestion = ingest(&[
        Source::new("a.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"y\"}\n{\"tag\":\"x\"}\n"),
        Source::new("b.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"z\"}\n"),
    ]);
    let by_tag = aggregate::count_by_tag(&ingestion.entries);
    let by_file = aggregate::count_by_file_and_tag(&ingestion.entries);
    assert_eq!(aggregate::total(&by_tag), ingestion.entries.len());
    assert_eq!(aggregate::total(&by_file), ingestion.entries.len());

    let x_in_a = by_file
        .iter()
        .find(|r| r.tag == "x" && r.source_file.as_deref() == Some("a.jsonl"))
        .unwrap();
    assert_eq!(x_in_a.count, 2);
}

#[test]
fn all_filter_is_a_no_op() {
    let ingestion = ingest(&[Source::new("a.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"y\"}\n")]);
    let rows = aggregate::count_by_file_and_tag(&ingestion.entries);
    let filter = Filter {
        tag: Selection::parse(Some("All")),
        file: Selection::parse(Some("All")),
    };
    assert_eq!(filter.apply(rows.clone()), rows);
}

#[test]
fn empty_file_selection_yields_empty_result() {
    let sources = [Source::new("a.jsonl", "{\"tag\":\"x\"}\n")];
    let request = ViewRequest {
        selected_files: Some(BTreeSet::new()),
        ..ViewRequest::default()
    };
    let dash = run(&sources, &request);
    assert!(dash.table.is_empty());
    assert_eq!(dash.totals.displayed, 0);
}

#[test]
fn pipeline_is_deterministic() {
    let sources = [
        Source::new("b.jsonl", "{\"tag\":\"z\"}\n{\"tag\":\"a\"}\n"),
        Source::new("a.jsonl", "{\"tag\":\"a\"}\n"),
    ];
    let request = ViewRequest {
        grouping: Grouping::File,
        chart_kind: ChartKind::Bar,
        ..ViewRequest::default()
    };
    let first = run(&sources, &request);
    let second = run(&sources, &request);
    assert_eq!(first, second);
    // Rows are ordered by file, then tag.
    assert_eq!(first.table.rows[0], vec!["a.jsonl", "a", "1"]);
    assert_eq!(first.table.rows[1], vec!["b.jsonl", "a", "1"]);
}

#[test]
fn csv_export_follows_the_displayed_columns() {
    let sources = [Source::new("a.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"x\"}\n")];
    let mut mapping = CategoryMapping::default();
    mapping.set("x", "Letters");
    let request = ViewRequest {
        show_categories: true,
        ..ViewRequest::default()
    };
    let dash = pipeline::run(&ingest(&sources), &request, &mapping, &ChartSettings::default());
    let csv = String::from_utf8(dash.table.to_csv().unwrap()).unwrap();
    assert_eq!(csv, "Tag,Count,Category\nx,2,Letters\n");
}

#[test]
fn chart_styling_comes_from_settings() {
    let sources = [Source::new("a.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"y\"}\n")];
    let settings = ChartSettings {
        chart_title: "Weekly".into(),
        width: 640,
        ..ChartSettings::default()
    };
    let dash = pipeline::run(
        &ingest(&sources),
        &ViewRequest::default(),
        &CategoryMapping::default(),
        &settings,
    );
    assert_eq!(dash.chart.title, "Weekly");
    assert_eq!(dash.chart.width, 640);
    assert_eq!(dash.chart.slices.len(), 2);
    assert_ne!(dash.chart.slices[0].color, dash.chart.slices[1].color);
}

#[test]
fn entry_log_pages_cover_every_entry_once() {
    let sources = [
        Source::new("a.jsonl", "{\"tag\":\"x\"}\n{\"tag\":\"y\"}\nbad\n{\"tag\":\"x\"}\n"),
        Source::new("b.jsonl", "{\"tag\":\"z\"}\n{\"tag\":\"x\"}\n"),
    ];
    let ingestion = ingest(&sources);

    let mut seen = Vec::new();
    let mut offset = 0;
    loop {
        let page = pipeline::entry_log(&ingestion, pipeline::Page { offset, limit: 2 });
        assert_eq!(page.total, 5);
        if page.table.is_empty() {
            break;
        }
        seen.extend(page.table.rows);
        offset += 2;
    }
    let expected: Vec<Vec<String>> = ingestion
        .entries
        .iter()
        .map(|e| vec![e.source_file.clone(), e.tag.clone()])
        .collect();
    assert_eq!(seen, expected);
}
