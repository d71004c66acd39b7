/// Configuration schema and defaults for tagboard.
///
/// Defines the TOML-serializable configuration structure with the sections
/// `[general]`, `[ingest]`, `[web]`, `[chart]` and `[mirror]`.
///
/// Every field has a built-in default. Users only need to set the values
/// they want to override.
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::chart::ChartKind;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level tagboard configuration.
///
/// Maps directly to `~/.tagboard/config.toml` and `.tagboard.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TagboardConfig {
    pub general: GeneralConfig,
    pub ingest: IngestConfig,
    pub web: WebConfig,
    pub chart: ChartConfig,
    pub mirror: MirrorConfig,
}

// ---------------------------------------------------------------------------
// [general]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Directory holding the per-user category maps and chart settings.
    /// Empty means `~/.tagboard`.
    pub data_dir: String,
    /// User id used when none is given on the command line or in the UI.
    pub default_user: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            default_user: "default".to_string(),
        }
    }
}

impl GeneralConfig {
    /// Resolved data directory.
    pub fn data_dir(&self) -> Option<PathBuf> {
        if self.data_dir.is_empty() {
            dirs::home_dir().map(|home| home.join(".tagboard"))
        } else {
            Some(PathBuf::from(&self.data_dir))
        }
    }
}

// ---------------------------------------------------------------------------
// [ingest]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Local file or directory scanned for sources. Empty disables discovery.
    pub path: String,
    /// File extension picked up when scanning a directory.
    pub extension: String,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            extension: "jsonl".to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// [web]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Listen address for `tagboard web`.
    pub addr: String,
    /// Open the dashboard in the default browser on start.
    pub open_browser: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: "127.0.0.1:9747".to_string(),
            open_browser: true,
        }
    }
}

// ---------------------------------------------------------------------------
// [chart]
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Chart type selected when none is requested.
    pub kind: ChartKind,
    /// TrueType/OpenType font used for PNG labels. Empty renders without text.
    pub font_path: String,
}

impl ChartConfig {
    pub fn font_path(&self) -> Option<PathBuf> {
        (!self.font_path.is_empty()).then(|| PathBuf::from(&self.font_path))
    }
}

// ---------------------------------------------------------------------------
// [mirror]
// ---------------------------------------------------------------------------

/// Spreadsheet mirror settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MirrorConfig {
    /// Whether the mirror is available (default: false, opt-in).
    pub enabled: bool,
    /// Name of the spreadsheet that is opened or created.
    pub spreadsheet_title: String,
    /// Worksheet (tab) that is cleared and rewritten.
    pub worksheet: String,
    /// Credential file holding an OAuth access token.
    pub credentials_path: String,
    /// Per-request timeout (milliseconds).
    pub timeout_ms: u64,
    /// Sheets API base URL.
    pub sheets_url: String,
    /// Drive API base URL, used to find the spreadsheet by name.
    pub drive_url: String,
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            spreadsheet_title: "Tag Counts".to_string(),
            worksheet: "Sheet1".to_string(),
            credentials_path: String::new(),
            timeout_ms: 10_000,
            sheets_url: "https://sheets.googleapis.com".to_string(),
            drive_url: "https://www.googleapis.com".to_string(),
        }
    }
}

impl MirrorConfig {
    /// Credential file path; empty means `~/.tagboard/sheets-token.json`.
    pub fn credentials_path(&self) -> Option<PathBuf> {
        if self.credentials_path.is_empty() {
            dirs::home_dir().map(|home| home.join(".tagboard").join("sheets-token.json"))
        } else {
            Some(PathBuf::from(&self.credentials_path))
        }
    }
}

// ---------------------------------------------------------------------------
// Annotated default
// ---------------------------------------------------------------------------

impl TagboardConfig {
    /// The annotated default config written by `tagboard config init`.
    pub fn default_toml() -> String {
        r#"# tagboard Configuration
#
# Configuration hierarchy (highest precedence wins):
#   1. Environment variables (TAGBOARD_*)
#   2. Project config (.tagboard.toml in current directory)
#   3. User global config (~/.tagboard/config.toml)
#   4. Built-in defaults

[general]
data_dir = ""              # Per-user files live here; empty = ~/.tagboard
default_user = "default"

[ingest]
path = ""                  # File or directory to load on start
extension = "jsonl"

[web]
addr = "127.0.0.1:9747"
open_browser = true

[chart]
kind = "pie"               # pie | bar
font_path = ""             # TTF/OTF for PNG labels; empty = no labels

[mirror]
enabled = false            # Opt-in: set true or TAGBOARD_MIRROR=1
spreadsheet_title = "Tag Counts"
worksheet = "Sheet1"
credentials_path = ""      # Empty = ~/.tagboard/sheets-token.json
timeout_ms = 10000
sheets_url = "https://sheets.googleapis.com"
drive_url = "https://www.googleapis.com"
"#
        .to_string()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
