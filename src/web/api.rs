//! JSON API handlers for the web dashboard.
//!
//! Each handler corresponds to an API endpoint and returns a [`Reply`],
//! which the server turns into a `tiny_http` response.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::aggregate::{self, Selection};
use crate::categories::{CategoryMapping, EditableCategory};
use crate::chart::ChartKind;
use crate::config;
use crate::ingest;
use crate::mirror::{self, MirrorOutcome, SheetsClient};
use crate::pipeline::{self, Dashboard, Grouping, Page, ViewRequest};
use crate::settings::{ChartSettings, SettingsState};
use crate::store::StoreError;

use super::WebState;

// ---------------------------------------------------------------------------
// Reply
// ---------------------------------------------------------------------------

/// A complete HTTP reply before it is handed to the server.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
    /// Download file name, sent as `Content-Disposition: attachment`.
    pub attachment: Option<&'static str>,
}

impl Reply {
    pub fn json<T: Serialize>(data: &T) -> Result<Self> {
        let body = serde_json::to_vec(data).context("failed to serialize JSON response")?;
        Ok(Self {
            status: 200,
            content_type: "application/json; charset=utf-8",
            body,
            attachment: None,
        })
    }

    pub fn html(html: &str) -> Self {
        Self {
            status: 200,
            content_type: "text/html; charset=utf-8",
            body: html.as_bytes().to_vec(),
            attachment: None,
        }
    }

    pub fn error(status: u16, message: &str) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            body: serde_json::json!({ "error": message }).to_string().into_bytes(),
            attachment: None,
        }
    }

    fn download(content_type: &'static str, name: &'static str, body: Vec<u8>) -> Self {
        Self {
            status: 200,
            content_type,
            body,
            attachment: Some(name),
        }
    }
}

/// A request the client got wrong. Answered with HTTP 400.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct BadRequest(pub String);

/// HTTP status for a failed handler: 400 for client mistakes, else 500.
pub fn error_status(err: &anyhow::Error) -> u16 {
    let client = err.downcast_ref::<BadRequest>().is_some()
        || matches!(err.downcast_ref::<StoreError>(), Some(StoreError::EmptyUserId));
    if client { 400 } else { 500 }
}

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

/// Decoded query string pairs, in request order.
#[derive(Debug, Default)]
pub(crate) struct Query {
    pairs: Vec<(String, String)>,
}

impl Query {
    pub(crate) fn from_url(url: &str) -> Self {
        let raw = url.split_once('?').map(|(_, q)| q).unwrap_or("");
        Self {
            pairs: form_urlencoded::parse(raw.as_bytes()).into_owned().collect(),
        }
    }

    /// First non-empty value for `key`.
    fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, v)| k == key && !v.trim().is_empty())
            .map(|(_, v)| v.as_str())
    }

    fn has(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Every value for `key`, with comma-separated lists expanded.
    fn list(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }
}

/// Build the pipeline request from `group`, `tag`, `file`, `files`,
/// `chart`, `categories`, `log_offset` and `log_limit`.
///
/// A `files` key that is present but empty selects no files at all.
fn view_request(query: &Query, default_kind: ChartKind) -> Result<ViewRequest> {
    let grouping = match query.get("group") {
        Some(g) => Grouping::parse(g)
            .ok_or_else(|| BadRequest(format!("unknown grouping '{g}' (tag, file, category)")))?,
        None => Grouping::default(),
    };
    let chart_kind = match query.get("chart") {
        Some(c) => ChartKind::parse(c)
            .ok_or_else(|| BadRequest(format!("unknown chart type '{c}' (pie, bar)")))?,
        None => default_kind,
    };
    let defaults = Page::default();
    let log_page = Page {
        offset: number(query, "log_offset")?.unwrap_or(defaults.offset),
        limit: number(query, "log_limit")?.unwrap_or(defaults.limit),
    };
    let selected_files = query
        .has("files")
        .then(|| query.list("files").into_iter().collect::<BTreeSet<_>>());

    Ok(ViewRequest {
        grouping,
        tag_filter: Selection::parse(query.get("tag")),
        file_filter: Selection::parse(query.get("file")),
        selected_files,
        chart_kind,
        show_categories: query.get("categories").is_some_and(config::is_truthy),
        log_page,
    })
}

fn number(query: &Query, key: &str) -> Result<Option<usize>> {
    query
        .get(key)
        .map(|v| {
            v.trim()
                .parse()
                .map_err(|_| BadRequest(format!("'{key}' must be a non-negative integer, got '{v}'")))
        })
        .transpose()
        .map_err(Into::into)
}

fn user(state: &WebState, query: &Query) -> String {
    query
        .get("user")
        .map(|u| u.trim().to_string())
        .unwrap_or_else(|| state.config.general.default_user.clone())
}

/// Run the pipeline for the request in `query`.
fn build(state: &WebState, query: &Query) -> Result<(String, SettingsState, Dashboard)> {
    let user = user(state, query);
    let request = view_request(query, state.config.chart.kind)?;
    let mapping = CategoryMapping::load(&state.store, &user)?;
    let (settings, settings_state) = ChartSettings::load(&state.store, &user);
    let dash = pipeline::run(&state.ingestion(), &request, &mapping, &settings);
    Ok((user, settings_state, dash))
}

// ---------------------------------------------------------------------------
// JSON response types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct UploadResponse {
    name: String,
    entries: usize,
    dropped_lines: usize,
    sources: Vec<String>,
}

#[derive(Serialize)]
struct DashboardResponse {
    user: String,
    settings_state: SettingsState,
    sources: Vec<String>,
    #[serde(flatten)]
    dashboard: Dashboard,
}

#[derive(Serialize)]
struct SettingsResponse {
    user: String,
    state: SettingsState,
    settings: ChartSettings,
}

#[derive(Serialize)]
struct CategoriesResponse {
    user: String,
    categories: Vec<EditableCategory>,
    /// Saved entries, including tags absent from the current sources.
    saved: usize,
}

/// Category editor submission.
#[derive(Deserialize)]
struct CategoriesUpdate {
    categories: Vec<EditableCategory>,
}

#[derive(Serialize)]
struct CategoriesUpdateResponse {
    user: String,
    applied: usize,
    ignored: usize,
    categories: Vec<EditableCategory>,
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    sources: usize,
    font_loaded: bool,
    mirror_enabled: bool,
}

// ---------------------------------------------------------------------------
// API Handlers
// ---------------------------------------------------------------------------

/// `POST /api/upload?name=F`: add (or replace) a source.
pub fn post_upload(state: &mut WebState, query: &Query, body: &[u8]) -> Result<Reply> {
    let Some(name) = query.get("name") else {
        return Err(BadRequest("upload requires a ?name= parameter".into()).into());
    };
    let preview = ingest::ingest_bytes(name, body);
    state.add_source(ingest::Source::new(name, body));
    log::info!(
        "uploaded {name}: {} entries, {} dropped lines",
        preview.entries.len(),
        preview.dropped_lines()
    );

    Reply::json(&UploadResponse {
        name: name.to_string(),
        entries: preview.entries.len(),
        dropped_lines: preview.dropped_lines(),
        sources: state.source_names(),
    })
}

/// `DELETE /api/upload`: forget every source.
pub fn delete_upload(state: &mut WebState) -> Result<Reply> {
    state.clear_sources();
    Reply::json(&serde_json::json!({ "sources": [] }))
}

/// `GET /api/dashboard?user&group&tag&file&files&chart&categories&log_offset&log_limit`
pub fn get_dashboard(state: &WebState, query: &Query) -> Result<Reply> {
    let (user, settings_state, dashboard) = build(state, query)?;
    Reply::json(&DashboardResponse {
        user,
        settings_state,
        sources: state.source_names(),
        dashboard,
    })
}

/// `GET /api/export.csv?…`: the displayed table as CSV.
pub fn get_export_csv(state: &WebState, query: &Query) -> Result<Reply> {
    let (_, _, dash) = build(state, query)?;
    Ok(Reply::download(
        "text/csv; charset=utf-8",
        "tag_counts.csv",
        dash.table.to_csv()?,
    ))
}

/// `GET /api/export.png?…`: the displayed chart as PNG.
pub fn get_export_png(state: &WebState, query: &Query) -> Result<Reply> {
    let (_, _, dash) = build(state, query)?;
    let png = state.renderer.png(&dash.chart)?;
    Ok(Reply::download("image/png", "tag_chart.png", png))
}

/// `GET /api/settings?user=U`
pub fn get_settings(state: &WebState, query: &Query) -> Result<Reply> {
    let user = user(state, query);
    let (settings, settings_state) = ChartSettings::load(&state.store, &user);
    Reply::json(&SettingsResponse {
        user,
        state: settings_state,
        settings,
    })
}

/// `PUT /api/settings?user=U`: overwrite the user's chart settings.
///
/// Fields missing from the body take their default values.
pub fn put_settings(state: &WebState, query: &Query, body: &[u8]) -> Result<Reply> {
    let user = user(state, query);
    let settings: ChartSettings = serde_json::from_slice(body)
        .map_err(|e| BadRequest(format!("invalid JSON in settings update: {e}")))?;
    settings
        .save(&state.store, &user)
        .context("failed to save chart settings")?;
    Reply::json(&SettingsResponse {
        user,
        state: SettingsState::Saved,
        settings,
    })
}

/// `GET /api/categories?user=U`: editable rows for the current sources.
pub fn get_categories(state: &WebState, query: &Query) -> Result<Reply> {
    let user = user(state, query);
    let mapping = CategoryMapping::load(&state.store, &user)?;
    let tags = aggregate::unique_tags(&state.ingestion().entries);
    Reply::json(&CategoriesResponse {
        categories: mapping.editable(tags.iter().map(String::as_str)),
        saved: mapping.len(),
        user,
    })
}

/// `PUT /api/categories?user=U`: apply editor rows and save.
///
/// Only tags present in the current sources are accepted. Saved entries for
/// other tags are kept.
pub fn put_categories(state: &WebState, query: &Query, body: &[u8]) -> Result<Reply> {
    let user = user(state, query);
    let update: CategoriesUpdate = serde_json::from_slice(body)
        .map_err(|e| BadRequest(format!("invalid JSON in categories update: {e}")))?;

    let tags = aggregate::unique_tags(&state.ingestion().entries);
    let observed: Vec<&str> = tags.iter().map(String::as_str).collect();

    let edits: Vec<(String, String)> = update
        .categories
        .into_iter()
        .map(|e| (e.tag, e.category.trim().to_string()))
        .filter(|(_, category)| !category.is_empty())
        .collect();
    let submitted = edits.len();

    let mut mapping = CategoryMapping::load(&state.store, &user)?;
    let applied = mapping.apply_edits(edits, &observed);
    mapping
        .save(&state.store, &user)
        .context("failed to save category mapping")?;

    Reply::json(&CategoriesUpdateResponse {
        categories: mapping.editable(observed.iter().copied()),
        applied,
        ignored: submitted - applied,
        user,
    })
}

/// `POST /api/mirror?…`: push the current view's counts.
///
/// Mirror failures are reported in the body, never as an HTTP error.
pub fn post_mirror(state: &WebState, query: &Query) -> Result<Reply> {
    let (_, _, dash) = build(state, query)?;
    let outcome: MirrorOutcome = match SheetsClient::connect(&state.config.mirror) {
        Ok(mut client) => mirror::push(&mut client, dash.mirror_header(), &dash.points),
        Err(e) => mirror::failed(e),
    };
    Reply::json(&outcome)
}

/// `GET /api/health`
pub fn get_health(state: &WebState) -> Result<Reply> {
    Reply::json(&HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        sources: state.sources.len(),
        font_loaded: state.renderer.has_font(),
        mirror_enabled: state.config.mirror.enabled,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
