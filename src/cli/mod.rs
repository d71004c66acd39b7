//! CLI command implementations for tagboard.
//!
//! Provides subcommand handlers for:
//! - `tagboard summary`: counts table (or raw entry log) for local JSONL files
//! - `tagboard chart`: render the chart to a PNG file
//! - `tagboard categories show|set|edit`: per-user category mapping
//! - `tagboard settings show|set`: per-user chart settings
//! - `tagboard mirror`: push the counts to the spreadsheet mirror
//! - `tagboard config show|init|set`: configuration management

use std::collections::BTreeSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;

use crate::aggregate::{self, Selection};
use crate::categories::CategoryMapping;
use crate::chart::{ChartKind, raster};
use crate::config::{self, TagboardConfig};
use crate::export::Table;
use crate::ingest::{self, Ingestion};
use crate::mirror::{self, SheetsClient};
use crate::pipeline::{self, Dashboard, Grouping, Page, ViewRequest};
use crate::settings::{ChartSettings, SettingsState};
use crate::store::UserStore;

/// Output format for listing commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl OutputFormat {
    pub fn from_str_opt(s: Option<&str>) -> Self {
        match s {
            Some("json") => Self::Json,
            Some("csv") => Self::Csv,
            _ => Self::Table,
        }
    }
}

/// View selection flags shared by `summary`, `chart` and `mirror`.
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ViewOptions {
    /// Group rows by: tag (default), file, category
    #[arg(long, default_value = "tag")]
    pub group: String,
    /// Only show this tag
    #[arg(long)]
    pub tag: Option<String>,
    /// Only show this source file
    #[arg(long)]
    pub file: Option<String>,
    /// Count only these source files (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub files: Vec<String>,
    /// Chart type: pie, bar (default from config)
    #[arg(long)]
    pub chart: Option<String>,
    /// Add a category column to tag tables
    #[arg(long)]
    pub categories: bool,
}

impl ViewOptions {
    /// Validate the flags into a pipeline request.
    pub fn to_request(&self, default_kind: ChartKind) -> Result<ViewRequest> {
        let grouping = if self.group.is_empty() {
            Grouping::default()
        } else {
            Grouping::parse(&self.group).with_context(|| {
                format!("unknown grouping '{}' (tag, file, category)", self.group)
            })?
        };
        let chart_kind = match &self.chart {
            Some(kind) => ChartKind::parse(kind)
                .with_context(|| format!("unknown chart type '{kind}' (pie, bar)"))?,
            None => default_kind,
        };
        let selected_files = (!self.files.is_empty())
            .then(|| self.files.iter().cloned().collect::<BTreeSet<_>>());

        Ok(ViewRequest {
            grouping,
            tag_filter: Selection::parse(self.tag.as_deref()),
            file_filter: Selection::parse(self.file.as_deref()),
            selected_files,
            chart_kind,
            show_categories: self.categories,
            log_page: Page::default(),
        })
    }
}

// ---------------------------------------------------------------------------
// Shared session context
// ---------------------------------------------------------------------------

/// Resolved config plus the per-user store for one invocation.
struct Session {
    config: TagboardConfig,
    store: UserStore,
    user: String,
}

impl Session {
    fn open(user: Option<&str>) -> Result<Self> {
        let config = config::load();
        let data_dir = config
            .general
            .data_dir()
            .context("could not determine data directory")?;
        let user = user
            .map(str::to_string)
            .unwrap_or_else(|| config.general.default_user.clone());
        Ok(Self {
            store: UserStore::new(data_dir),
            config,
            user,
        })
    }

    /// Explicit inputs, or the configured `[ingest] path`.
    fn input_roots(&self, inputs: &[PathBuf]) -> Vec<PathBuf> {
        if !inputs.is_empty() {
            inputs.to_vec()
        } else if !self.config.ingest.path.is_empty() {
            vec![PathBuf::from(&self.config.ingest.path)]
        } else {
            Vec::new()
        }
    }

    /// Ingest every discovered source; `None` when no input is configured.
    fn try_ingest(&self, inputs: &[PathBuf]) -> Result<Option<Ingestion>> {
        let roots = self.input_roots(inputs);
        if roots.is_empty() {
            return Ok(None);
        }
        let paths = ingest::discover_all(&roots, &self.config.ingest.extension)?;
        log::debug!("ingesting {} source files", paths.len());
        ingest::ingest_paths(&paths).map(Some)
    }

    fn ingest(&self, inputs: &[PathBuf]) -> Result<Ingestion> {
        self.try_ingest(inputs)?.context(
            "no input files: pass JSONL files or directories, or set [ingest] path in the config",
        )
    }

    fn dashboard(&self, inputs: &[PathBuf], view: &ViewOptions) -> Result<Dashboard> {
        let request = view.to_request(self.config.chart.kind)?;
        let ingestion = self.ingest(inputs)?;
        let mapping = CategoryMapping::load(&self.store, &self.user)?;
        let (settings, _) = ChartSettings::load(&self.store, &self.user);
        Ok(pipeline::run(&ingestion, &request, &mapping, &settings))
    }
}

// ---------------------------------------------------------------------------
// tagboard web
// ---------------------------------------------------------------------------

/// Start the dashboard server, optionally overriding the listen address.
pub fn run_web(addr: Option<&str>, no_open: bool) -> Result<()> {
    let mut config = config::load();
    if let Some(addr) = addr {
        config.web.addr = addr.to_string();
    }
    if no_open {
        config.web.open_browser = false;
    }
    crate::web::serve(config)
}

// ---------------------------------------------------------------------------
// tagboard summary
// ---------------------------------------------------------------------------

/// Print the counts table for the given inputs.
pub fn run_summary(
    inputs: &[PathBuf],
    view: &ViewOptions,
    user: Option<&str>,
    format: OutputFormat,
) -> Result<()> {
    let session = Session::open(user)?;
    let dash = session.dashboard(inputs, view)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&dash)?),
        OutputFormat::Csv => write_stdout(&dash.table.to_csv()?)?,
        OutputFormat::Table => print_dashboard(&dash),
    }
    Ok(())
}

/// Print the raw entry log: one `(File, Tag)` row per valid line.
pub fn run_entries(inputs: &[PathBuf], format: OutputFormat) -> Result<()> {
    let session = Session::open(None)?;
    let ingestion = session.ingest(inputs)?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&ingestion.entries)?),
        OutputFormat::Csv => write_stdout(&Table::from_entries(&ingestion.entries).to_csv()?)?,
        OutputFormat::Table => {
            println!("{}", "Entry Log".bold().cyan());
            println!("{}", "=".repeat(60));
            println!();
            if ingestion.entries.is_empty() {
                println!("{}", "No tagged entries.".yellow());
            } else {
                print_table(&Table::from_entries(&ingestion.entries));
            }
            println!();
            println!(
                "  {} entries, {} skipped lines",
                format_number(ingestion.entries.len()),
                format_number(ingestion.dropped_lines())
            );
        }
    }
    Ok(())
}

fn print_dashboard(dash: &Dashboard) {
    println!("{}", "Tag Counts".bold().cyan());
    println!("{}", "=".repeat(60));
    println!();
    println!(
        "  {} {}",
        "Entries:      ".bold(),
        format_number(dash.totals.entries)
    );
    println!(
        "  {} {}",
        "Displayed:    ".bold(),
        format_number(dash.totals.displayed)
    );
    println!("  {} {}", "Sources:      ".bold(), dash.totals.sources);
    if dash.totals.dropped_lines > 0 {
        println!(
            "  {} {}",
            "Skipped lines:".bold(),
            dash.totals.dropped_lines.to_string().yellow()
        );
    }
    println!();

    if dash.table.is_empty() {
        println!("{}", "No rows match the current selection.".yellow());
        return;
    }
    print_table(&dash.table);
}

/// Print a table with aligned columns; `Count` is right-aligned.
fn print_table(table: &Table) {
    const MAX_WIDTH: usize = 40;
    let count_col = table.column("Count");

    let widths: Vec<usize> = (0..table.columns.len())
        .map(|i| {
            let cells = table.rows.iter().map(|r| r[i].chars().count());
            cells
                .chain(std::iter::once(table.columns[i].chars().count()))
                .max()
                .unwrap_or(0)
                .min(MAX_WIDTH)
        })
        .collect();

    let render = |cells: &[String]| -> String {
        cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let cell = truncate(cell, widths[i]);
                if Some(i) == count_col {
                    format!("{:>w$}", cell, w = widths[i])
                } else {
                    format!("{:<w$}", cell, w = widths[i])
                }
            })
            .collect::<Vec<_>>()
            .join("  ")
    };

    let header = render(&table.columns);
    println!("  {}", header.bold());
    println!("  {}", "-".repeat(header.chars().count()));
    for (i, row) in table.rows.iter().enumerate() {
        let line = render(row);
        if i % 2 == 0 {
            println!("  {line}");
        } else {
            println!("  {}", line.dimmed());
        }
    }
}

fn write_stdout(bytes: &[u8]) -> Result<()> {
    let mut out = std::io::stdout().lock();
    out.write_all(bytes).context("failed to write to stdout")?;
    out.flush().context("failed to flush stdout")
}

// ---------------------------------------------------------------------------
// tagboard chart
// ---------------------------------------------------------------------------

/// Render the chart for the given inputs to a PNG file.
pub fn run_chart(
    inputs: &[PathBuf],
    view: &ViewOptions,
    user: Option<&str>,
    output: &Path,
) -> Result<()> {
    let session = Session::open(user)?;
    let dash = session.dashboard(inputs, view)?;

    let font = raster::load_optional_font(session.config.chart.font_path().as_deref());
    let renderer = raster::Renderer::new(font);
    let png = renderer.png(&dash.chart)?;
    fs::write(output, png).with_context(|| format!("failed to write {}", output.display()))?;

    println!(
        "{} {} chart written to {}",
        "✓".green().bold(),
        dash.chart.kind,
        output.display()
    );
    if !renderer.has_font() {
        println!(
            "  {}",
            "No font configured; labels were omitted. Set [chart] font_path or TAGBOARD_FONT."
                .dimmed()
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// tagboard categories show | set | edit
// ---------------------------------------------------------------------------

/// Show the category mapping.
///
/// With inputs, lists the observed tags and their categories; otherwise
/// lists every saved entry.
pub fn run_categories_show(inputs: &[PathBuf], user: Option<&str>, format: OutputFormat) -> Result<()> {
    let session = Session::open(user)?;
    let mapping = CategoryMapping::load(&session.store, &session.user)?;

    let rows: Vec<Vec<String>> = match session.try_ingest(inputs)? {
        Some(ingestion) => {
            let tags = aggregate::unique_tags(&ingestion.entries);
            mapping
                .editable(tags.iter().map(String::as_str))
                .into_iter()
                .map(|e| vec![e.tag, e.category])
                .collect()
        }
        None => mapping
            .iter()
            .map(|(tag, category)| vec![tag.to_string(), category.to_string()])
            .collect(),
    };
    let table = Table {
        columns: vec!["Tag".to_string(), "Category".to_string()],
        rows,
    };

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&table)?),
        OutputFormat::Csv => write_stdout(&table.to_csv()?)?,
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Categories for".bold().cyan(),
                session.user.bold()
            );
            println!();
            if table.is_empty() {
                println!("{}", "No categories yet.".yellow());
            } else {
                print_table(&table);
            }
        }
    }
    Ok(())
}

/// Assign one tag to a category and save.
pub fn run_categories_set(user: Option<&str>, tag: &str, category: &str) -> Result<()> {
    let session = Session::open(user)?;
    let mut mapping = CategoryMapping::load(&session.store, &session.user)?;
    mapping.set(tag, category);
    mapping.save(&session.store, &session.user)?;
    println!(
        "{} {} → {}",
        "✓".green().bold(),
        tag.bold(),
        category
    );
    Ok(())
}

/// Apply a `Tag,Category` CSV of edits to the tags observed in the inputs.
pub fn run_categories_edit(inputs: &[PathBuf], user: Option<&str>, edits: &Path) -> Result<()> {
    let session = Session::open(user)?;
    let ingestion = session.ingest(inputs)?;
    let tags = aggregate::unique_tags(&ingestion.entries);
    let observed: Vec<&str> = tags.iter().map(String::as_str).collect();

    let rows = read_edits(edits)?;
    let submitted = rows.len();
    let mut mapping = CategoryMapping::load(&session.store, &session.user)?;
    let applied = mapping.apply_edits(rows, &observed);
    mapping.save(&session.store, &session.user)?;

    println!(
        "{} Applied {} of {} edits for {}",
        "✓".green().bold(),
        applied,
        submitted,
        session.user.bold()
    );
    if applied < submitted {
        println!(
            "  {}",
            "Edits for tags not present in the inputs were ignored.".dimmed()
        );
    }
    Ok(())
}

/// Read `(tag, category)` pairs from a CSV with a header row.
fn read_edits(path: &Path) -> Result<Vec<(String, String)>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.with_context(|| format!("invalid CSV in {}", path.display()))?;
        let (Some(tag), Some(category)) = (record.get(0), record.get(1)) else {
            continue;
        };
        // Tags must match ingested tags byte for byte; only categories are trimmed.
        let category = category.trim();
        if !tag.is_empty() && !category.is_empty() {
            rows.push((tag.to_string(), category.to_string()));
        }
    }
    Ok(rows)
}

// ---------------------------------------------------------------------------
// tagboard settings show | set
// ---------------------------------------------------------------------------

/// Show the chart settings for a user.
pub fn run_settings_show(user: Option<&str>, format: OutputFormat) -> Result<()> {
    let session = Session::open(user)?;
    let (settings, state) = ChartSettings::load(&session.store, &session.user);

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&settings)?),
        OutputFormat::Csv => {
            let table = Table {
                columns: vec!["Setting".to_string(), "Value".to_string()],
                rows: settings_rows(&settings),
            };
            write_stdout(&table.to_csv()?)?;
        }
        OutputFormat::Table => {
            println!(
                "{} {}",
                "Chart settings for".bold().cyan(),
                session.user.bold()
            );
            let origin = match state {
                SettingsState::Saved => "saved".green(),
                SettingsState::Default => "defaults".yellow(),
            };
            println!("  {} {}", "Source:".dimmed(), origin);
            println!();
            for row in settings_rows(&settings) {
                println!("  {:<14} {}", row[0].bold(), row[1]);
            }
        }
    }
    Ok(())
}

fn settings_rows(settings: &ChartSettings) -> Vec<Vec<String>> {
    [
        ("chart_title", settings.chart_title.clone()),
        ("width", settings.width.to_string()),
        ("height", settings.height.to_string()),
        ("font_size", settings.font_size.to_string()),
        ("title_align", settings.title_align.to_string()),
        ("style_preset", settings.style_preset.to_string()),
    ]
    .into_iter()
    .map(|(k, v)| vec![k.to_string(), v])
    .collect()
}

/// Update chart settings from `key=value` pairs and save.
pub fn run_settings_set(user: Option<&str>, pairs: &[String]) -> Result<()> {
    let session = Session::open(user)?;
    let (mut settings, _) = ChartSettings::load(&session.store, &session.user);
    for pair in pairs {
        let (key, value) = pair
            .split_once('=')
            .with_context(|| format!("expected key=value, got '{pair}'"))?;
        settings.set_field(key.trim(), value)?;
    }
    settings.save(&session.store, &session.user)?;
    println!(
        "{} Saved chart settings for {}",
        "✓".green().bold(),
        session.user.bold()
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// tagboard mirror
// ---------------------------------------------------------------------------

/// Push the current two-column counts to the spreadsheet mirror.
///
/// Mirror failures are reported as warnings and do not fail the command.
pub fn run_mirror(inputs: &[PathBuf], view: &ViewOptions, user: Option<&str>) -> Result<()> {
    let session = Session::open(user)?;
    let dash = session.dashboard(inputs, view)?;

    let outcome = match SheetsClient::connect(&session.config.mirror) {
        Ok(mut client) => mirror::push(&mut client, dash.mirror_header(), &dash.points),
        Err(e) => mirror::failed(e),
    };

    match outcome.warning {
        Some(warning) => println!("{} {}", "!".yellow().bold(), warning.yellow()),
        None => println!(
            "{} Mirrored {} rows to '{}'",
            "✓".green().bold(),
            outcome.rows,
            session.config.mirror.spreadsheet_title
        ),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// tagboard config show | init | set
// ---------------------------------------------------------------------------

/// Show the effective (merged) configuration as TOML.
pub fn run_config_show() -> Result<()> {
    let toml_str = config::show_effective_config()?;
    println!("{}", "Effective tagboard Configuration".bold().cyan());
    println!("{}", "=".repeat(50));
    println!();
    println!("{toml_str}");

    let global_exists = config::global_config_file().is_some_and(|p| p.exists());
    let project_exists = config::project_config_file().is_some_and(|p| p.exists());
    println!("{}", "Sources (highest priority last):".dimmed());
    println!("  {} built-in defaults", "·".dimmed());
    print_source(global_exists, "~/.tagboard/config.toml");
    print_source(project_exists, ".tagboard.toml");
    println!(
        "  {} {}",
        "·".dimmed(),
        "TAGBOARD_* environment variables".dimmed()
    );
    Ok(())
}

fn print_source(exists: bool, name: &str) {
    if exists {
        println!("  {} {}", "✓".green(), name.dimmed());
    } else {
        println!("  {} {}", "·".dimmed(), format!("{name} (not found)").dimmed());
    }
}

/// Initialize a default config file at `~/.tagboard/config.toml`.
pub fn run_config_init(force: bool) -> Result<()> {
    let path = config::init_config(force)?;
    println!(
        "{} Config written to {}",
        "✓".green().bold(),
        path.display()
    );
    println!("  {}", "Edit the file to customize tagboard.".dimmed());
    Ok(())
}

/// Set a single configuration value in the global config file.
pub fn run_config_set(key: &str, value: &str) -> Result<()> {
    config::set_config_value(key, value)?;
    println!("{} Set {} = {}", "✓".green().bold(), key.bold(), value);
    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting helpers
// ---------------------------------------------------------------------------

/// Format a number with comma separators for readability.
fn format_number(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Truncate a string to `max_len` characters, appending "…" if truncated.
fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(1)).collect();
        format!("{kept}…")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("hello", 10), "hello");
        assert_eq!(truncate("hello world", 5), "hell…");
        assert_eq!(truncate("ümlaut", 3), "üm…");
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!(OutputFormat::from_str_opt(None), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_opt(Some("json")), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_opt(Some("csv")), OutputFormat::Csv);
        assert_eq!(
            OutputFormat::from_str_opt(Some("unknown")),
            OutputFormat::Table
        );
    }

    #[test]
    fn view_options_build_request() {
        let view = ViewOptions {
            group: "category".into(),
            tag: Some("All".into()),
            file: Some("a.jsonl".into()),
            files: vec!["a.jsonl".into(), "b.jsonl".into()],
            chart: Some("bar".into()),
            categories: false,
        };
        let request = view.to_request(ChartKind::Pie).unwrap();
        assert_eq!(request.grouping, Grouping::Category);
        assert_eq!(request.tag_filter, Selection::All);
        assert_eq!(request.file_filter, Selection::Only("a.jsonl".into()));
        assert_eq!(request.selected_files.unwrap().len(), 2);
        assert_eq!(request.chart_kind, ChartKind::Bar);
    }

    #[test]
    fn view_options_default_chart_and_bad_group() {
        let view = ViewOptions {
            group: "tag".into(),
            ..ViewOptions::default()
        };
        assert_eq!(view.to_request(ChartKind::Bar).unwrap().chart_kind, ChartKind::Bar);
        assert!(view.to_request(ChartKind::Pie).unwrap().selected_files.is_none());

        let bad = ViewOptions {
            group: "week".into(),
            ..ViewOptions::default()
        };
        assert!(bad.to_request(ChartKind::Pie).is_err());
    }

    #[test]
    fn edits_csv_skips_blank_cells() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edits.csv");
        fs::write(&path, "Tag,Category\nanxiety,Mood\nsleep,\n, Rest\nfocus, Work \n").unwrap();
        let rows = read_edits(&path).unwrap();
        assert_eq!(
            rows,
            vec![
                ("anxiety".to_string(), "Mood".to_string()),
                ("focus".to_string(), "Work".to_string())
            ]
        );
    }

    #[test]
    fn edits_csv_keeps_tag_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("edits.csv");
        fs::write(&path, "Tag,Category
\" Sleep \", Rest \n").unwrap();
        let rows = read_edits(&path).unwrap();
        assert_eq!(rows, vec![(" Sleep ".to_string(), "Rest".to_string())]);

        let mut mapping = CategoryMapping::default();
        let applied = mapping.apply_edits(rows, &[" Sleep "]);
        assert_eq!(applied, 1);
        assert_eq!(mapping.get(" Sleep "), "Rest");
    }
}
