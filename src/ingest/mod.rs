//! JSONL ingestion: turns named byte sources into a tagged entry log.
//!
//! Every line is parsed on its own. A line that is not valid JSON, is not an
//! object, or has no usable `tag` is dropped and counted; ingestion never
//! fails because of the content of a source.

pub mod discover;

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Component, Path};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

pub use discover::{discover, discover_all};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A named byte source, e.g. an uploaded file.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Source {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// One valid record: the tag and the source it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaggedEntry {
    pub source_file: String,
    pub tag: String,
}

/// The folded result of ingesting one or more sources.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingestion {
    /// Valid entries in source order, then line order.
    pub entries: Vec<TaggedEntry>,
    /// Lines that were not valid JSON (or not valid UTF-8).
    pub malformed_lines: usize,
    /// Lines that parsed but carried no usable `tag`.
    pub untagged_lines: usize,
}

impl Ingestion {
    /// Total number of non-blank lines that produced no entry.
    pub fn dropped_lines(&self) -> usize {
        self.malformed_lines + self.untagged_lines
    }

    /// Concatenate two ingestion results, keeping `self` first.
    pub fn merge(mut self, other: Ingestion) -> Ingestion {
        self.entries.extend(other.entries);
        self.malformed_lines += other.malformed_lines;
        self.untagged_lines += other.untagged_lines;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Outcome of parsing a single line.
#[derive(Debug, PartialEq, Eq)]
pub enum LineOutcome {
    Tagged(String),
    Untagged,
    Malformed,
    Blank,
}

// ---------------------------------------------------------------------------
// Ingestion
// ---------------------------------------------------------------------------

/// Ingest in-memory sources in order.
pub fn ingest(sources: &[Source]) -> Ingestion {
    sources
        .iter()
        .map(|source| ingest_bytes(&source.name, &source.bytes))
        .fold(Ingestion::default(), Ingestion::merge)
}

/// Ingest a single buffered source.
pub fn ingest_bytes(name: &str, bytes: &[u8]) -> Ingestion {
    let mut acc = Ingestion::default();
    for line in bytes.split(|&b| b == b'\n') {
        record_line(&mut acc, name, line);
    }
    log_dropped(name, &acc);
    acc
}

/// Ingest a source by streaming it line by line.
///
/// Read errors from the underlying reader are propagated; content errors are
/// not.
pub fn ingest_reader<R: BufRead>(name: &str, mut reader: R) -> Result<Ingestion> {
    let mut acc = Ingestion::default();
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .with_context(|| format!("failed to read {name}"))?;
        if read == 0 {
            break;
        }
        let line = buf.strip_suffix(b"\n").unwrap_or(&buf);
        record_line(&mut acc, name, line);
    }
    log_dropped(name, &acc);
    Ok(acc)
}

/// Stream every file in `paths`, naming each source per [`source_names`].
pub fn ingest_paths(paths: &[impl AsRef<Path>]) -> Result<Ingestion> {
    let names = source_names(paths);
    let mut acc = Ingestion::default();
    for (path, name) in paths.iter().zip(&names) {
        let path = path.as_ref();
        let file =
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
        let batch = ingest_reader(name, BufReader::new(file))?;
        acc = acc.merge(batch);
    }
    Ok(acc)
}

/// Display names for on-disk sources, one per path.
///
/// Each source is named by its file name. Paths whose names collide get
/// parent directories prepended (joined with `/`) until they differ, so
/// `a/log.jsonl` and `b/log.jsonl` stay two sources. The same path given
/// twice keeps one name.
pub fn source_names(paths: &[impl AsRef<Path>]) -> Vec<String> {
    // Components of each path, last first.
    let parts: Vec<Vec<String>> = paths
        .iter()
        .map(|p| {
            let mut comps: Vec<String> = p
                .as_ref()
                .components()
                .filter_map(|c| match c {
                    Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                    _ => None,
                })
                .collect();
            if comps.is_empty() {
                comps.push(p.as_ref().display().to_string());
            }
            comps.reverse();
            comps
        })
        .collect();
    let mut depth = vec![1usize; parts.len()];

    let name_at = |i: usize, depth: &[usize]| -> String {
        let mut shown: Vec<&str> = parts[i][..depth[i]].iter().map(String::as_str).collect();
        shown.reverse();
        shown.join("/")
    };

    loop {
        let names: Vec<String> = (0..parts.len()).map(|i| name_at(i, &depth)).collect();
        let mut seen: HashMap<&str, usize> = HashMap::new();
        for name in &names {
            *seen.entry(name.as_str()).or_default() += 1;
        }
        let mut grew = false;
        for i in 0..parts.len() {
            if seen[names[i].as_str()] > 1 && depth[i] < parts[i].len() {
                depth[i] += 1;
                grew = true;
            }
        }
        if !grew {
            return names;
        }
    }
}

fn record_line(acc: &mut Ingestion, name: &str, line: &[u8]) {
    match parse_line(line) {
        LineOutcome::Tagged(tag) => acc.entries.push(TaggedEntry {
            source_file: name.to_string(),
            tag,
        }),
        LineOutcome::Untagged => acc.untagged_lines += 1,
        LineOutcome::Malformed => acc.malformed_lines += 1,
        LineOutcome::Blank => {}
    }
}

fn log_dropped(name: &str, acc: &Ingestion) {
    if acc.dropped_lines() > 0 {
        log::debug!(
            "{name}: skipped {} malformed and {} untagged lines",
            acc.malformed_lines,
            acc.untagged_lines
        );
    }
}

/// Classify one raw line.
pub fn parse_line(line: &[u8]) -> LineOutcome {
    let Ok(text) = std::str::from_utf8(line) else {
        return LineOutcome::Malformed;
    };
    let text = text.trim();
    if text.is_empty() {
        return LineOutcome::Blank;
    }
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        return LineOutcome::Malformed;
    };
    match value.get("tag").and_then(tag_text) {
        Some(tag) => LineOutcome::Tagged(tag),
        None => LineOutcome::Untagged,
    }
}

/// Textual form of a `tag` value, or `None` when it counts as missing.
fn tag_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_and_untagged_lines_are_counted_not_emitted() {
        let data = b"{\"tag\":\"anxiety\"}\nnot json\n{\"other\":1}\n\n{\"tag\":\"sleep\"}\n";
        let result = ingest_bytes("a.jsonl", data);

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.malformed_lines, 1);
        assert_eq!(result.untagged_lines, 1);
        assert_eq!(result.dropped_lines(), 2);
    }

    #[test]
    fn empty_and_null_tags_are_untagged() {
        assert_eq!(parse_line(br#"{"tag":""}"#), LineOutcome::Untagged);
        assert_eq!(parse_line(br#"{"tag":null}"#), LineOutcome::Untagged);
        assert_eq!(parse_line(br#"{"tag":["a"]}"#), LineOutcome::Untagged);
        assert_eq!(parse_line(br#"[1,2,3]"#), LineOutcome::Untagged);
    }

    #[test]
    fn scalar_tags_use_json_text() {
        assert_eq!(parse_line(br#"{"tag":42}"#), LineOutcome::Tagged("42".into()));
        assert_eq!(parse_line(br#"{"tag":true}"#), LineOutcome::Tagged("true".into()));
    }

    #[test]
    fn tags_are_not_normalized() {
        assert_eq!(
            parse_line(br#"{"tag":" Sleep "}"#),
            LineOutcome::Tagged(" Sleep ".into())
        );
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        assert_eq!(parse_line(&[0xff, 0xfe, b'{']), LineOutcome::Malformed);
    }

    #[test]
    fn crlf_lines_parse() {
        let result = ingest_bytes("a.jsonl", b"{\"tag\":\"x\"}\r\n{\"tag\":\"y\"}\r\n");
        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.dropped_lines(), 0);
    }

    #[test]
    fn sources_keep_order_and_names() {
        let sources = vec![
            Source::new("one.jsonl", "{\"tag\":\"b\"}\n{\"tag\":\"a\"}"),
            Source::new("two.jsonl", "{\"tag\":\"c\"}"),
        ];
        let result = ingest(&sources);
        let pairs: Vec<(&str, &str)> = result
            .entries
            .iter()
            .map(|e| (e.source_file.as_str(), e.tag.as_str()))
            .collect();
        assert_eq!(
            pairs,
            vec![("one.jsonl", "b"), ("one.jsonl", "a"), ("two.jsonl", "c")]
        );
    }

    #[test]
    fn reader_matches_buffered_ingestion() {
        let data = "{\"tag\":\"x\"}\nbroken\n{\"tag\":\"y\"}";
        let streamed = ingest_reader("s.jsonl", data.as_bytes()).unwrap();
        let buffered = ingest_bytes("s.jsonl", data.as_bytes());
        assert_eq!(streamed, buffered);
    }

    #[test]
    fn unique_file_names_are_used_bare() {
        let names = source_names(&["/data/a/one.jsonl", "/data/b/two.jsonl"]);
        assert_eq!(names, vec!["one.jsonl", "two.jsonl"]);
    }

    #[test]
    fn colliding_file_names_get_parent_directories() {
        let names = source_names(&[
            "/data/a/log.jsonl",
            "/data/b/log.jsonl",
            "/data/c/x/log.jsonl",
            "/data/d/x/log.jsonl",
            "/data/solo.jsonl",
        ]);
        assert_eq!(
            names,
            vec![
                "a/log.jsonl",
                "b/log.jsonl",
                "c/x/log.jsonl",
                "d/x/log.jsonl",
                "solo.jsonl"
            ]
        );
    }

    #[test]
    fn same_named_files_in_different_directories_stay_separate() {
        let dir = tempfile::tempdir().unwrap();
        for sub in ["a", "b"] {
            std::fs::create_dir(dir.path().join(sub)).unwrap();
            std::fs::write(dir.path().join(sub).join("log.jsonl"), "{\"tag\":\"x\"}\n").unwrap();
        }
        let paths = discover(dir.path(), "jsonl").unwrap();
        assert_eq!(paths.len(), 2);

        let result = ingest_paths(&paths).unwrap();
        let files: Vec<&str> = result.entries.iter().map(|e| e.source_file.as_str()).collect();
        assert_eq!(files, vec!["a/log.jsonl", "b/log.jsonl"]);
        let rows = crate::aggregate::count_by_file_and_tag(&result.entries);
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn merge_preserves_order_and_counts() {
        let a = ingest_bytes("a", b"{\"tag\":\"1\"}\nbad");
        let b = ingest_bytes("b", b"{\"tag\":\"2\"}\n{}");
        let merged = a.merge(b);
        assert_eq!(merged.entries[0].source_file, "a");
        assert_eq!(merged.entries[1].source_file, "b");
        assert_eq!(merged.malformed_lines, 1);
        assert_eq!(merged.untagged_lines, 1);
    }
}
