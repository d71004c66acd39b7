//! Embedded web dashboard for tagboard.
//!
//! Provides a lightweight HTTP server (sync, via `tiny_http`) that serves:
//! - A single-page dashboard: uploads, filters, table, chart, settings and
//!   category editors, exports
//! - JSON API endpoints backing that page
//!
//! Launched via `tagboard web` (default: `http://127.0.0.1:9747`).
//!
//! Uploaded sources live in memory for the lifetime of the server. Every
//! request reruns the pipeline from those sources and the per-user files.

mod api;
mod frontend;

use std::fs;
use std::io::{Cursor, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};

use crate::chart::raster::{self, Renderer};
use crate::config::TagboardConfig;
use crate::ingest::{self, Ingestion, Source};
use crate::store::UserStore;

pub use api::Reply;

/// Upload bodies above this size are rejected.
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

/// Everything the dashboard keeps between requests.
pub struct WebState {
    config: TagboardConfig,
    store: UserStore,
    sources: Vec<Source>,
    renderer: Renderer,
}

impl WebState {
    pub fn new(config: TagboardConfig) -> Result<Self> {
        let data_dir = config
            .general
            .data_dir()
            .context("could not determine data directory")?;
        let font = raster::load_optional_font(config.chart.font_path().as_deref());
        Ok(Self {
            store: UserStore::new(data_dir),
            renderer: Renderer::new(font),
            sources: Vec::new(),
            config,
        })
    }

    /// Load the files under `[ingest] path` as initial sources.
    ///
    /// Returns the number of sources added.
    pub fn preload(&mut self) -> Result<usize> {
        if self.config.ingest.path.is_empty() {
            return Ok(0);
        }
        let root = PathBuf::from(&self.config.ingest.path);
        let paths = ingest::discover(&root, &self.config.ingest.extension)?;
        let names = ingest::source_names(&paths);
        for (path, name) in paths.iter().zip(names) {
            let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
            self.add_source(Source::new(name, bytes));
        }
        Ok(paths.len())
    }

    /// Add a source, replacing any earlier source with the same name.
    pub fn add_source(&mut self, source: Source) {
        match self.sources.iter_mut().find(|s| s.name == source.name) {
            Some(existing) => *existing = source,
            None => self.sources.push(source),
        }
    }

    pub fn clear_sources(&mut self) {
        self.sources.clear();
    }

    pub fn source_names(&self) -> Vec<String> {
        self.sources.iter().map(|s| s.name.clone()).collect()
    }

    fn ingestion(&self) -> Ingestion {
        ingest::ingest(&self.sources)
    }
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Start the web dashboard server.
///
/// Blocks the current thread. Handles requests sequentially (sufficient for
/// a local dashboard). Errors are handled per request without stopping the
/// server.
pub fn serve(config: TagboardConfig) -> Result<()> {
    let addr = config.web.addr.clone();
    let server = Server::http(&addr)
        .map_err(|e| anyhow::anyhow!("failed to start HTTP server on {addr}: {e}"))?;

    let mut state = WebState::new(config)?;
    match state.preload() {
        Ok(0) => {}
        Ok(n) => println!("Loaded {n} source files from {}", state.config.ingest.path),
        Err(e) => log::warn!("not preloading sources: {e:#}"),
    }

    println!("tagboard dashboard running at http://{addr}");
    println!("Press Ctrl+C to stop.\n");

    if state.config.web.open_browser {
        let url = format!("http://{addr}");
        if let Err(e) = open_browser(&url) {
            log::debug!("{e:#}");
        }
    }

    handle_requests(&server, &mut state);
    Ok(())
}

/// Serve requests from `server` until it shuts down.
pub fn handle_requests(server: &Server, state: &mut WebState) {
    for mut request in server.incoming_requests() {
        let method = request.method().clone();
        let url = request.url().to_string();

        let reply = match read_body(&mut request) {
            Ok(body) => route(state, &method, &url, &body),
            Err(reply) => reply,
        };
        let status = reply.status;

        if let Err(e) = request.respond(into_response(reply)) {
            log::debug!("failed to send response: {e}");
        }

        // Brief access log
        println!(
            "{} {} {} {}",
            chrono::Local::now().format("%H:%M:%S"),
            method,
            url,
            status
        );
    }
}

/// Read the request body for methods that carry one.
fn read_body(request: &mut Request) -> Result<Vec<u8>, Reply> {
    let method = request.method();
    if !matches!(method, Method::Put | Method::Post) {
        return Ok(Vec::new());
    }
    let mut buf = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| Reply::error(400, &format!("failed to read request body: {e}")))?;
    if buf.len() as u64 > MAX_BODY_BYTES {
        return Err(Reply::error(413, "request body too large"));
    }
    Ok(buf)
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Dispatch a request and turn handler errors into JSON error replies.
fn route(state: &mut WebState, method: &Method, url: &str, body: &[u8]) -> Reply {
    dispatch(state, method, url, body).unwrap_or_else(|e| {
        let status = api::error_status(&e);
        if status >= 500 {
            log::warn!("{method} {url} failed: {e:#}");
        } else {
            log::debug!("{method} {url} rejected: {e:#}");
        }
        Reply::error(status, &format!("{e:#}"))
    })
}

/// Dispatch an incoming request to the appropriate handler.
fn dispatch(state: &mut WebState, method: &Method, url: &str, body: &[u8]) -> Result<Reply> {
    // Strip query string for path matching
    let path = url.split('?').next().unwrap_or(url);
    let query = api::Query::from_url(url);

    match (method, path) {
        // Frontend
        (&Method::Get, "/") | (&Method::Get, "/index.html") => {
            Ok(Reply::html(frontend::INDEX_HTML))
        }

        // API: Sources
        (&Method::Post, "/api/upload") => api::post_upload(state, &query, body),
        (&Method::Delete, "/api/upload") => api::delete_upload(state),

        // API: Views
        (&Method::Get, "/api/dashboard") => api::get_dashboard(state, &query),
        (&Method::Get, "/api/export.csv") => api::get_export_csv(state, &query),
        (&Method::Get, "/api/export.png") => api::get_export_png(state, &query),

        // API: Per-user files
        (&Method::Get, "/api/settings") => api::get_settings(state, &query),
        (&Method::Put, "/api/settings") => api::put_settings(state, &query, body),
        (&Method::Get, "/api/categories") => api::get_categories(state, &query),
        (&Method::Put, "/api/categories") => api::put_categories(state, &query, body),

        // API: Mirror
        (&Method::Post, "/api/mirror") => api::post_mirror(state, &query),

        // API: Health
        (&Method::Get, "/api/health") => api::get_health(state),

        // 404
        _ => Ok(Reply::error(404, "not found")),
    }
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

fn into_response(reply: Reply) -> Response<Cursor<Vec<u8>>> {
    let mut response =
        Response::from_data(reply.body).with_status_code(StatusCode(reply.status));
    if let Some(h) = header("Content-Type", reply.content_type) {
        response = response.with_header(h);
    }
    if let Some(name) = reply.attachment
        && let Some(h) = header(
            "Content-Disposition",
            &format!("attachment; filename=\"{name}\""),
        )
    {
        response = response.with_header(h);
    }
    response
}

fn header(name: &str, value: &str) -> Option<Header> {
    Header::from_bytes(name.as_bytes(), value.as_bytes()).ok()
}

/// Attempt to open a URL in the system default browser.
fn open_browser(url: &str) -> Result<()> {
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("cmd")
            .args(["/C", "start", url])
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(url)
            .spawn()
            .context("failed to open browser")?;
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
