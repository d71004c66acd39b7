/// Configuration system for tagboard.
///
/// Provides a layered configuration hierarchy:
///
/// 1. **Built-in defaults**: hardcoded in [`schema::TagboardConfig::default()`]
/// 2. **User global config**: `~/.tagboard/config.toml`
/// 3. **Project local config**: `.tagboard.toml` in the current working directory
/// 4. **Environment variables**: `TAGBOARD_*` overrides (highest precedence)
///
/// File layers are merged key by key: a file only overrides the keys it
/// actually sets.
///
/// # Usage
///
/// ```rust,ignore
/// use tagboard::config;
///
/// let cfg = config::load();
/// if cfg.mirror.enabled {
///     // ...
/// }
/// ```
pub mod schema;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub use schema::TagboardConfig;

use crate::chart::ChartKind;

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Load the fully resolved tagboard configuration.
///
/// Merges all layers in order: defaults → global TOML → project TOML → env
/// vars. Malformed files are skipped with a warning.
pub fn load() -> TagboardConfig {
    let layers = [global_config_path(), project_config_path()];
    let mut config = load_layers(layers.iter().flatten().map(PathBuf::as_path));
    apply_env_overrides(&mut config);
    config
}

/// Merge TOML files over the built-in defaults, later files winning.
fn load_layers<'a>(paths: impl Iterator<Item = &'a Path>) -> TagboardConfig {
    let mut merged = match toml::Value::try_from(TagboardConfig::default()) {
        Ok(v) => v,
        Err(_) => return TagboardConfig::default(),
    };

    for path in paths {
        if let Some(layer) = load_toml_value(path) {
            merge_values(&mut merged, layer);
        }
    }

    merged.try_into().unwrap_or_else(|e| {
        log::warn!("ignoring config files with invalid values: {e}");
        TagboardConfig::default()
    })
}

/// Read a TOML file as an untyped value.
///
/// Returns `None` if the file doesn't exist or is malformed.
fn load_toml_value(path: &Path) -> Option<toml::Value> {
    let content = fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            log::warn!("ignoring malformed config {}: {e}", path.display());
            None
        }
    }
}

/// Recursively overlay `overlay` onto `base`; tables merge, everything else
/// is replaced.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base), toml::Value::Table(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

// ---------------------------------------------------------------------------
// File paths
// ---------------------------------------------------------------------------

/// Path to the user global config: `~/.tagboard/config.toml`.
fn global_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".tagboard").join("config.toml"))
}

/// Path to the project local config: `.tagboard.toml` in the current directory.
fn project_config_path() -> Option<PathBuf> {
    std::env::current_dir()
        .ok()
        .map(|cwd| cwd.join(".tagboard.toml"))
}

/// Return the path to the global config file for display/init purposes.
pub fn global_config_file() -> Option<PathBuf> {
    global_config_path()
}

/// Return the path to the project config file for display purposes.
pub fn project_config_file() -> Option<PathBuf> {
    project_config_path()
}

// ---------------------------------------------------------------------------
// Environment variable overrides
// ---------------------------------------------------------------------------

/// Apply environment variable overrides (highest precedence layer).
///
/// Supported variables:
/// - `TAGBOARD_DATA_DIR`: per-user file directory
/// - `TAGBOARD_USER`: default user id
/// - `TAGBOARD_INGEST_PATH`: file or directory loaded on start
/// - `TAGBOARD_WEB_ADDR`: dashboard listen address
/// - `TAGBOARD_CHART`: default chart kind (`pie`, `bar`)
/// - `TAGBOARD_FONT`: font file for PNG labels
/// - `TAGBOARD_MIRROR`: spreadsheet mirror enabled (`1`/`true`)
/// - `TAGBOARD_MIRROR_CREDENTIALS`: credential file for the mirror
fn apply_env_overrides(config: &mut TagboardConfig) {
    if let Ok(val) = std::env::var("TAGBOARD_DATA_DIR")
        && !val.is_empty()
    {
        config.general.data_dir = val;
    }
    if let Ok(val) = std::env::var("TAGBOARD_USER")
        && !val.trim().is_empty()
    {
        config.general.default_user = val;
    }
    if let Ok(val) = std::env::var("TAGBOARD_INGEST_PATH") {
        config.ingest.path = val;
    }
    if let Ok(val) = std::env::var("TAGBOARD_WEB_ADDR")
        && !val.is_empty()
    {
        config.web.addr = val;
    }
    if let Ok(val) = std::env::var("TAGBOARD_CHART")
        && let Some(kind) = ChartKind::parse(&val)
    {
        config.chart.kind = kind;
    }
    if let Ok(val) = std::env::var("TAGBOARD_FONT") {
        config.chart.font_path = val;
    }
    if let Ok(val) = std::env::var("TAGBOARD_MIRROR") {
        config.mirror.enabled = is_truthy(&val);
    }
    if let Ok(val) = std::env::var("TAGBOARD_MIRROR_CREDENTIALS")
        && !val.is_empty()
    {
        config.mirror.credentials_path = val;
    }
}

/// Check if a string value represents a truthy boolean.
pub(crate) fn is_truthy(val: &str) -> bool {
    matches!(
        val.to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

// ---------------------------------------------------------------------------
// Config init / set / show
// ---------------------------------------------------------------------------

/// Write the default annotated config to `~/.tagboard/config.toml`.
///
/// Returns an error if the file already exists (use `force = true` to
/// overwrite).
pub fn init_config(force: bool) -> Result<PathBuf> {
    let path = global_config_path().context("could not determine home directory")?;

    if path.exists() && !force {
        anyhow::bail!(
            "config file already exists at {}. Use --force to overwrite.",
            path.display()
        );
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create ~/.tagboard/ directory")?;
    }

    fs::write(&path, TagboardConfig::default_toml()).context("failed to write config file")?;

    Ok(path)
}

/// Set a single config key to a value in the global config file.
///
/// Supports dotted keys like `mirror.enabled`. The value is parsed according
/// to the type of the key in the default config.
pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let path = global_config_path().context("could not determine home directory")?;

    let mut root: toml::Value = if path.exists() {
        let content = fs::read_to_string(&path).context("failed to read config file")?;
        toml::from_str(&content).context("failed to parse config as TOML value")?
    } else {
        toml::Value::try_from(TagboardConfig::default())
            .context("failed to serialize default config")?
    };

    let defaults = toml::Value::try_from(TagboardConfig::default())
        .context("failed to serialize default config")?;
    set_toml_value(&mut root, &defaults, key, value)?;

    // Reject values that would make the whole file unloadable.
    let _: TagboardConfig = root
        .clone()
        .try_into()
        .with_context(|| format!("invalid value '{value}' for '{key}'"))?;

    let output = toml::to_string_pretty(&root).context("failed to serialize updated config")?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("failed to create config directory")?;
    }
    fs::write(&path, output).context("failed to write config file")?;

    Ok(())
}

/// Set a value in a TOML tree using a dotted key path.
///
/// `defaults` decides which keys exist and what type a raw value parses to.
fn set_toml_value(
    root: &mut toml::Value,
    defaults: &toml::Value,
    key: &str,
    raw_value: &str,
) -> Result<()> {
    let Some((section, leaf)) = key.split_once('.') else {
        anyhow::bail!("config key must look like 'section.key', got '{key}'");
    };

    let template = defaults
        .get(section)
        .and_then(|s| s.get(leaf))
        .with_context(|| format!("unknown config key '{key}'"))?;

    let new_value = match template {
        toml::Value::Boolean(_) => toml::Value::Boolean(is_truthy(raw_value)),
        toml::Value::Integer(_) => {
            let n: i64 = raw_value
                .parse()
                .with_context(|| format!("expected integer for '{key}', got '{raw_value}'"))?;
            toml::Value::Integer(n)
        }
        _ => toml::Value::String(raw_value.to_string()),
    };

    let table = root
        .as_table_mut()
        .context("config root is not a table")?
        .entry(section.to_string())
        .or_insert_with(|| toml::Value::Table(toml::map::Map::new()))
        .as_table_mut()
        .with_context(|| format!("expected table at '{section}'"))?;
    table.insert(leaf.to_string(), new_value);
    Ok(())
}

/// Show the effective (fully resolved) config as TOML.
pub fn show_effective_config() -> Result<String> {
    let config = load();
    toml::to_string_pretty(&config).context("failed to serialize effective config")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn defaults() -> toml::Value {
        toml::Value::try_from(TagboardConfig::default()).unwrap()
    }

    #[test]
    fn is_truthy_accepts_variants() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(is_truthy("on"));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("off"));
        assert!(!is_truthy(""));
    }

    #[test]
    fn layers_merge_key_by_key() {
        let dir = tempfile::tempdir().unwrap();
        let global = dir.path().join("global.toml");
        let project = dir.path().join("project.toml");
        fs::write(&global, "[web]\naddr = \"0.0.0.0:1\"\n[chart]\nkind = \"bar\"\n").unwrap();
        fs::write(&project, "[web]\nopen_browser = false\n").unwrap();

        let config = load_layers([global.as_path(), project.as_path()].into_iter());
        assert_eq!(config.web.addr, "0.0.0.0:1");
        assert!(!config.web.open_browser);
        assert_eq!(config.chart.kind, ChartKind::Bar);
        assert_eq!(config.ingest.extension, "jsonl");
    }

    #[test]
    fn malformed_layer_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let bad = dir.path().join("bad.toml");
        fs::write(&bad, "[web\naddr = ").unwrap();
        let config = load_layers(std::iter::once(bad.as_path()));
        assert_eq!(config.web.addr, "127.0.0.1:9747");
    }

    #[test]
    fn set_toml_value_updates_string() {
        let mut root: toml::Value = toml::from_str("[web]\naddr = \"a\"\n").unwrap();
        set_toml_value(&mut root, &defaults(), "web.addr", "127.0.0.1:1").unwrap();
        assert_eq!(root["web"]["addr"].as_str(), Some("127.0.0.1:1"));
    }

    #[test]
    fn set_toml_value_updates_bool_and_integer() {
        let mut root: toml::Value = toml::from_str("").unwrap();
        set_toml_value(&mut root, &defaults(), "mirror.enabled", "yes").unwrap();
        set_toml_value(&mut root, &defaults(), "mirror.timeout_ms", "2500").unwrap();
        assert_eq!(root["mirror"]["enabled"].as_bool(), Some(true));
        assert_eq!(root["mirror"]["timeout_ms"].as_integer(), Some(2500));
    }

    #[test]
    fn set_toml_value_rejects_unknown_or_bad_keys() {
        let mut root: toml::Value = toml::from_str("").unwrap();
        assert!(set_toml_value(&mut root, &defaults(), "nonexistent.key", "v").is_err());
        assert!(set_toml_value(&mut root, &defaults(), "nodot", "v").is_err());
        assert!(set_toml_value(&mut root, &defaults(), "mirror.timeout_ms", "soon").is_err());
    }
}
