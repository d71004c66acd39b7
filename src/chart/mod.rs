//! Chart model: turns counted rows plus user styling into a drawable chart.
//!
//! The same [`ChartData`] feeds the web frontend (as JSON) and the PNG
//! rasterizer in [`raster`].

pub mod raster;

use std::f64::consts::TAU;
use std::fmt;

use serde::{Deserialize, Serialize, Serializer};

use crate::settings::{ChartSettings, StylePreset, TitleAlign};

// ---------------------------------------------------------------------------
// Chart kind
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Pie,
    Bar,
}

impl ChartKind {
    pub fn parse(val: &str) -> Option<Self> {
        match val.to_ascii_lowercase().as_str() {
            "pie" => Some(Self::Pie),
            "bar" => Some(Self::Bar),
            _ => None,
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pie => write!(f, "pie"),
            Self::Bar => write!(f, "bar"),
        }
    }
}

// ---------------------------------------------------------------------------
// Colors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    pub fn hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl Serialize for Rgb {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.hex())
    }
}

const PASTEL: [Rgb; 12] = [
    Rgb(0x66, 0xc5, 0xcc),
    Rgb(0xf6, 0xcf, 0x71),
    Rgb(0xf8, 0x9c, 0x74),
    Rgb(0xdc, 0xb0, 0xf2),
    Rgb(0x87, 0xc5, 0x5f),
    Rgb(0x9e, 0xb9, 0xf3),
    Rgb(0xfe, 0x88, 0xb1),
    Rgb(0xc9, 0xdb, 0x74),
    Rgb(0x8b, 0xe0, 0xa4),
    Rgb(0xb4, 0x97, 0xe7),
    Rgb(0xd3, 0xb4, 0x84),
    Rgb(0xb3, 0xb3, 0xb3),
];

const BOLD: [Rgb; 12] = [
    Rgb(0x7f, 0x3c, 0x8d),
    Rgb(0x11, 0xa5, 0x79),
    Rgb(0x39, 0x69, 0xac),
    Rgb(0xf2, 0xb7, 0x01),
    Rgb(0xe7, 0x3f, 0x74),
    Rgb(0x80, 0xba, 0x5a),
    Rgb(0xe6, 0x83, 0x10),
    Rgb(0x00, 0x86, 0x95),
    Rgb(0xcf, 0x1c, 0x90),
    Rgb(0xf9, 0x7b, 0x72),
    Rgb(0x4b, 0x4b, 0x8f),
    Rgb(0xa5, 0xaa, 0x99),
];

const PROFESSIONAL: [Rgb; 12] = [
    Rgb(0x88, 0xcc, 0xee),
    Rgb(0xcc, 0x66, 0x77),
    Rgb(0xdd, 0xcc, 0x77),
    Rgb(0x11, 0x77, 0x33),
    Rgb(0x33, 0x22, 0x88),
    Rgb(0xaa, 0x44, 0x99),
    Rgb(0x44, 0xaa, 0x99),
    Rgb(0x99, 0x99, 0x33),
    Rgb(0x88, 0x22, 0x55),
    Rgb(0x66, 0x11, 0x00),
    Rgb(0x66, 0x99, 0xcc),
    Rgb(0x88, 0x88, 0x88),
];

/// Color cycle for a style preset.
pub fn palette(preset: StylePreset) -> &'static [Rgb] {
    match preset {
        StylePreset::Pastel => &PASTEL,
        StylePreset::Bold => &BOLD,
        StylePreset::Professional => &PROFESSIONAL,
    }
}

// ---------------------------------------------------------------------------
// Chart data
// ---------------------------------------------------------------------------

/// One labelled value (a pie wedge or a bar).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slice {
    pub label: String,
    pub value: usize,
    /// Share of the chart total, 0.0–1.0.
    pub fraction: f64,
    pub color: Rgb,
}

/// A fully styled chart, ready to draw.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartData {
    pub kind: ChartKind,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub font_size: u32,
    pub title_align: TitleAlign,
    pub slices: Vec<Slice>,
}

impl ChartData {
    /// Build a chart from `(label, count)` points, in the given order.
    ///
    /// Styling is copied from `settings` as-is, apart from clamping the
    /// dimensions into the renderable range.
    pub fn build(points: &[(String, usize)], kind: ChartKind, settings: &ChartSettings) -> Self {
        let settings = settings.clone().clamped();
        let colors = palette(settings.style_preset);
        let total: usize = points.iter().map(|(_, n)| n).sum();

        let slices = points
            .iter()
            .enumerate()
            .map(|(i, (label, value))| Slice {
                label: label.clone(),
                value: *value,
                fraction: if total == 0 {
                    0.0
                } else {
                    *value as f64 / total as f64
                },
                color: colors[i % colors.len()],
            })
            .collect();

        Self {
            kind,
            title: settings.chart_title,
            width: settings.width,
            height: settings.height,
            font_size: settings.font_size,
            title_align: settings.title_align,
            slices,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slices.iter().all(|s| s.value == 0)
    }

    pub fn max_value(&self) -> usize {
        self.slices.iter().map(|s| s.value).max().unwrap_or(0)
    }

    /// Start and end angle (radians, clockwise from 12 o'clock) of each wedge.
    pub fn wedges(&self) -> Vec<(f64, f64)> {
        let mut start = 0.0;
        self.slices
            .iter()
            .map(|s| {
                let end = start + s.fraction * TAU;
                let wedge = (start, end);
                start = end;
                wedge
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
