//! Per-user chart styling preferences.
//!
//! A user is either in the `Default` state (no saved file) or `Saved`.
//! Saving always replaces the whole file; there is no way back to
//! `Default`.

use std::fmt;

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};

use crate::store::{Document, StoreError, UserStore};

/// Smallest and largest accepted chart dimension, in pixels.
pub const MIN_DIMENSION: u32 = 100;
pub const MAX_DIMENSION: u32 = 4000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleAlign {
    #[default]
    Center,
    Left,
    Right,
}

impl TitleAlign {
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "center" | "centre" => Some(Self::Center),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }
}

impl fmt::Display for TitleAlign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Center => write!(f, "center"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

/// Named chart color palette.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StylePreset {
    #[default]
    Pastel,
    Bold,
    Professional,
}

impl StylePreset {
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "pastel" => Some(Self::Pastel),
            "bold" => Some(Self::Bold),
            "professional" => Some(Self::Professional),
            _ => None,
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pastel => write!(f, "Pastel"),
            Self::Bold => write!(f, "Bold"),
            Self::Professional => write!(f, "Professional"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub chart_title: String,
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub title_align: TitleAlign,
    pub style_preset: StylePreset,
}

impl Default for ChartSettings {
    fn default() -> Self {
        Self {
            chart_title: "Tag Distribution".to_string(),
            width: 800,
            height: 500,
            font_size: 16,
            title_align: TitleAlign::default(),
            style_preset: StylePreset::default(),
        }
    }
}

/// Whether a user has saved settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SettingsState {
    Default,
    Saved,
}

impl ChartSettings {
    /// Load settings for `user`.
    ///
    /// A missing file yields defaults. An unreadable or corrupt file also
    /// yields defaults, with a warning, since the chart must still render.
    pub fn load(store: &UserStore, user: &str) -> (Self, SettingsState) {
        match store.read::<ChartSettings>(user, Document::ChartSettings) {
            Ok(Some(settings)) => (settings, SettingsState::Saved),
            Ok(None) => (Self::default(), SettingsState::Default),
            Err(e) => {
                log::warn!("using default chart settings: {e}");
                (Self::default(), SettingsState::Default)
            }
        }
    }

    /// The state [`ChartSettings::load`] would report, without the warning.
    /// An unreadable file counts as `Default`.
    pub fn state(store: &UserStore, user: &str) -> SettingsState {
        match store.read::<ChartSettings>(user, Document::ChartSettings) {
            Ok(Some(_)) => SettingsState::Saved,
            _ => SettingsState::Default,
        }
    }

    /// Replace the saved settings for `user`.
    pub fn save(&self, store: &UserStore, user: &str) -> Result<(), StoreError> {
        store.write(user, Document::ChartSettings, self)?;
        Ok(())
    }

    /// Clamp dimensions into the renderable range.
    pub fn clamped(mut self) -> Self {
        self.width = self.width.clamp(MIN_DIMENSION, MAX_DIMENSION);
        self.height = self.height.clamp(MIN_DIMENSION, MAX_DIMENSION);
        self.font_size = self.font_size.clamp(6, 96);
        self
    }

    /// Update one field by its file-format key.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "chart_title" => self.chart_title = value.to_string(),
            "width" => self.width = parse_u32(key, value)?,
            "height" => self.height = parse_u32(key, value)?,
            "font_size" => self.font_size = parse_u32(key, value)?,
            "title_align" => {
                self.title_align = TitleAlign::parse(value)
                    .with_context(|| format!("title_align must be center, left or right, got '{value}'"))?;
            }
            "style_preset" => {
                self.style_preset = StylePreset::parse(value).with_context(|| {
                    format!("style_preset must be Pastel, Bold or Professional, got '{value}'")
                })?;
            }
            _ => bail!("unknown chart setting '{key}'"),
        }
        Ok(())
    }
}

fn parse_u32(key: &str, value: &str) -> Result<u32> {
    value
        .trim()
        .parse()
        .with_context(|| format!("expected a positive integer for '{key}', got '{value}'"))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_format_uses_snake_case_fields() {
        let json = serde_json::to_value(ChartSettings::default()).unwrap();
        assert_eq!(json["chart_title"], "Tag Distribution");
        assert_eq!(json["title_align"], "center");
        assert_eq!(json["style_preset"], "Pastel");
        assert_eq!(json["font_size"], 16);
    }

    #[test]
    fn partial_file_falls_back_per_field() {
        let settings: ChartSettings =
            serde_json::from_str(r#"{"chart_title":"Mine","style_preset":"Bold"}"#).unwrap();
        assert_eq!(settings.chart_title, "Mine");
        assert_eq!(settings.style_preset, StylePreset::Bold);
        assert_eq!(settings.width, 800);
    }

    #[test]
    fn set_field_parses_values() {
        let mut settings = ChartSettings::default();
        settings.set_field("width", "1024").unwrap();
        settings.set_field("title_align", "Left").unwrap();
        settings.set_field("style_preset", "professional").unwrap();
        assert_eq!(settings.width, 1024);
        assert_eq!(settings.title_align, TitleAlign::Left);
        assert_eq!(settings.style_preset, StylePreset::Professional);
    }

    #[test]
    fn set_field_rejects_bad_input() {
        let mut settings = ChartSettings::default();
        assert!(settings.set_field("width", "wide").is_err());
        assert!(settings.set_field("title_align", "top").is_err());
        assert!(settings.set_field("colour", "red").is_err());
    }

    #[test]
    fn clamped_bounds_dimensions() {
        let settings = ChartSettings {
            width: 10,
            height: 100_000,
            font_size: 1,
            ..ChartSettings::default()
        }
        .clamped();
        assert_eq!(settings.width, MIN_DIMENSION);
        assert_eq!(settings.height, MAX_DIMENSION);
        assert_eq!(settings.font_size, 6);
    }

    #[test]
    fn state_moves_from_default_to_saved() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path());
        assert_eq!(ChartSettings::state(&store, "alice"), SettingsState::Default);

        let (settings, state) = ChartSettings::load(&store, "alice");
        assert_eq!(state, SettingsState::Default);
        assert_eq!(settings, ChartSettings::default());
        // Loading has no side effects.
        assert_eq!(ChartSettings::state(&store, "alice"), SettingsState::Default);

        let custom = ChartSettings {
            chart_title: "Weekly".into(),
            ..ChartSettings::default()
        };
        custom.save(&store, "alice").unwrap();
        let (loaded, state) = ChartSettings::load(&store, "alice");
        assert_eq!(state, SettingsState::Saved);
        assert_eq!(loaded, custom);
    }

    #[test]
    fn corrupt_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::new(dir.path());
        let path = store.path("alice", Document::ChartSettings).unwrap();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "[]").unwrap();
        let (settings, state) = ChartSettings::load(&store, "alice");
        assert_eq!(settings, ChartSettings::default());
        assert_eq!(state, SettingsState::Default);
    }
}
