//! PNG rendering of a [`ChartData`].
//!
//! Shapes are drawn straight into an RGBA buffer. Text needs a font file;
//! without one the chart is still rendered, just without title and labels.

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use fontdue::{Font, FontSettings};
use image::{ImageFormat, Rgba, RgbaImage};

use super::{ChartData, ChartKind, Rgb};
use crate::settings::TitleAlign;

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const INK: Rgb = Rgb(0x33, 0x33, 0x33);
const AXIS: Rgb = Rgb(0xbb, 0xbb, 0xbb);
const MARGIN: i32 = 24;

/// Load a TrueType/OpenType font for chart labels.
pub fn load_font(path: &Path) -> Result<Font> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read font {}", path.display()))?;
    Font::from_bytes(bytes, FontSettings::default())
        .map_err(|e| anyhow::anyhow!("invalid font {}: {e}", path.display()))
}

/// Load the font at `path` if one is configured, warning when it is unusable.
pub fn load_optional_font(path: Option<&Path>) -> Option<Font> {
    let path = path?;
    match load_font(path) {
        Ok(font) => Some(font),
        Err(e) => {
            log::warn!("rendering charts without labels: {e:#}");
            None
        }
    }
}

pub struct Renderer {
    font: Option<Font>,
}

impl Renderer {
    pub fn new(font: Option<Font>) -> Self {
        Self { font }
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Render and encode as PNG.
    pub fn png(&self, chart: &ChartData) -> Result<Vec<u8>> {
        let image = self.render(chart);
        let mut bytes = Vec::new();
        image
            .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .context("failed to encode chart as PNG")?;
        Ok(bytes)
    }

    pub fn render(&self, chart: &ChartData) -> RgbaImage {
        let mut image = RgbaImage::from_pixel(chart.width, chart.height, BACKGROUND);
        let size = chart.font_size as f32;

        let mut top = MARGIN;
        if !chart.title.is_empty() && self.font.is_some() {
            let title_size = size * 1.25;
            let width = self.measure(&chart.title, title_size);
            let x = match chart.title_align {
                TitleAlign::Left => MARGIN as f32,
                TitleAlign::Center => (chart.width as f32 - width) / 2.0,
                TitleAlign::Right => chart.width as f32 - MARGIN as f32 - width,
            };
            top += title_size as i32;
            self.text(&mut image, &chart.title, title_size, x, top as f32, INK);
            top += MARGIN;
        }

        if chart.is_empty() {
            if self.font.is_some() {
                let msg = "No data";
                let x = (chart.width as f32 - self.measure(msg, size)) / 2.0;
                self.text(&mut image, msg, size, x, chart.height as f32 / 2.0, AXIS);
            }
            return image;
        }

        let area = Area {
            left: MARGIN,
            top,
            right: chart.width as i32 - MARGIN,
            bottom: chart.height as i32 - MARGIN,
        };
        match chart.kind {
            ChartKind::Pie => self.draw_pie(&mut image, chart, area),
            ChartKind::Bar => self.draw_bars(&mut image, chart, area),
        }
        image
    }

    fn draw_pie(&self, image: &mut RgbaImage, chart: &ChartData, area: Area) {
        let size = chart.font_size as f32;
        // Legend takes the right third when labels can be drawn.
        let legend_left = if self.font.is_some() {
            area.right - area.width() / 3
        } else {
            area.right
        };
        let pie_area = Area {
            right: legend_left - MARGIN,
            ..area
        };
        let radius = (pie_area.width().min(pie_area.height()) / 2).max(1) as f64;
        let cx = (pie_area.left + pie_area.right) as f64 / 2.0;
        let cy = (pie_area.top + pie_area.bottom) as f64 / 2.0;

        let wedges = chart.wedges();
        for y in (cy - radius) as i32..=(cy + radius) as i32 {
            for x in (cx - radius) as i32..=(cx + radius) as i32 {
                let dx = x as f64 + 0.5 - cx;
                let dy = y as f64 + 0.5 - cy;
                if dx * dx + dy * dy > radius * radius {
                    continue;
                }
                let angle = wedge_angle(dx, dy);
                let hit = wedges.iter().position(|&(start, end)| angle >= start && angle < end);
                let idx = hit.unwrap_or(wedges.len() - 1);
                put(image, x, y, chart.slices[idx].color);
            }
        }

        if self.font.is_none() {
            return;
        }
        let swatch = size as i32;
        let mut y = area.top;
        for slice in &chart.slices {
            if y + swatch > area.bottom {
                break;
            }
            fill_rect(image, legend_left, y, legend_left + swatch, y + swatch, slice.color);
            let label = format!("{} ({:.1}%)", slice.label, slice.fraction * 100.0);
            self.text(
                image,
                &label,
                size,
                (legend_left + swatch + 8) as f32,
                (y + swatch) as f32 - size * 0.2,
                INK,
            );
            y += swatch + 8;
        }
    }

    fn draw_bars(&self, image: &mut RgbaImage, chart: &ChartData, area: Area) {
        let size = chart.font_size as f32;
        let label_band = if self.font.is_some() { (size * 1.6) as i32 } else { 0 };
        let plot = Area {
            bottom: area.bottom - label_band,
            top: area.top + label_band,
            ..area
        };
        fill_rect(image, plot.left, plot.bottom, plot.right, plot.bottom + 1, AXIS);

        let n = chart.slices.len() as i32;
        let slot = (plot.width() / n).max(1);
        let bar_width = (slot * 7 / 10).max(1);
        let max = chart.max_value().max(1) as f64;

        for (i, slice) in chart.slices.iter().enumerate() {
            let left = plot.left + slot * i as i32 + (slot - bar_width) / 2;
            let height = (slice.value as f64 / max * plot.height() as f64).round() as i32;
            fill_rect(image, left, plot.bottom - height, left + bar_width, plot.bottom, slice.color);

            if self.font.is_some() {
                let value = slice.value.to_string();
                let vx = left as f32 + (bar_width as f32 - self.measure(&value, size)) / 2.0;
                self.text(image, &value, size, vx, (plot.bottom - height) as f32 - 4.0, INK);

                let label = self.fit(&slice.label, size, slot as f32);
                let lx = left as f32 + (bar_width as f32 - self.measure(&label, size)) / 2.0;
                self.text(image, &label, size, lx, plot.bottom as f32 + size * 1.2, INK);
            }
        }
    }

    // -----------------------------------------------------------------------
    // Text
    // -----------------------------------------------------------------------

    fn measure(&self, text: &str, size: f32) -> f32 {
        let Some(font) = &self.font else {
            return 0.0;
        };
        text.chars().map(|c| font.metrics(c, size).advance_width).sum()
    }

    /// Shorten `text` with an ellipsis until it fits in `max_width`.
    fn fit(&self, text: &str, size: f32, max_width: f32) -> String {
        if self.measure(text, size) <= max_width {
            return text.to_string();
        }
        let mut chars: Vec<char> = text.chars().collect();
        while !chars.is_empty() {
            chars.pop();
            let candidate: String = chars.iter().chain(std::iter::once(&'…')).collect();
            if self.measure(&candidate, size) <= max_width {
                return candidate;
            }
        }
        String::new()
    }

    /// Draw `text` with its baseline at `baseline`.
    fn text(&self, image: &mut RgbaImage, text: &str, size: f32, x: f32, baseline: f32, color: Rgb) {
        let Some(font) = &self.font else {
            return;
        };
        let mut pen = x;
        for c in text.chars() {
            let (metrics, bitmap) = font.rasterize(c, size);
            let gx = (pen + metrics.xmin as f32).round() as i32;
            let gy = (baseline - metrics.height as f32 - metrics.ymin as f32).round() as i32;
            for row in 0..metrics.height {
                for col in 0..metrics.width {
                    let alpha = bitmap[row * metrics.width + col];
                    if alpha > 0 {
                        blend(image, gx + col as i32, gy + row as i32, color, alpha);
                    }
                }
            }
            pen += metrics.advance_width;
        }
    }
}

// ---------------------------------------------------------------------------
// Pixel helpers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Area {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl Area {
    fn width(&self) -> i32 {
        (self.right - self.left).max(0)
    }

    fn height(&self) -> i32 {
        (self.bottom - self.top).max(0)
    }
}

/// Angle of `(dx, dy)` clockwise from 12 o'clock, in `[0, TAU)`.
fn wedge_angle(dx: f64, dy: f64) -> f64 {
    let angle = dx.atan2(-dy);
    if angle < 0.0 {
        angle + std::f64::consts::TAU
    } else {
        angle
    }
}

fn put(image: &mut RgbaImage, x: i32, y: i32, color: Rgb) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    image.put_pixel(x as u32, y as u32, Rgba([color.0, color.1, color.2, 255]));
}

fn fill_rect(image: &mut RgbaImage, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgb) {
    for y in y0..y1 {
        for x in x0..x1 {
            put(image, x, y, color);
        }
    }
}

fn blend(image: &mut RgbaImage, x: i32, y: i32, color: Rgb, alpha: u8) {
    if x < 0 || y < 0 || x >= image.width() as i32 || y >= image.height() as i32 {
        return;
    }
    let dst = image.get_pixel(x as u32, y as u32).0;
    let a = alpha as u32;
    let mix = |src: u8, dst: u8| ((src as u32 * a + dst as u32 * (255 - a)) / 255) as u8;
    image.put_pixel(
        x as u32,
        y as u32,
        Rgba([mix(color.0, dst[0]), mix(color.1, dst[1]), mix(color.2, dst[2]), 255]),
    );
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
