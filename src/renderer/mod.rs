//! Pixel renderer for the wallpaper.
//!
//! Every drawing stage writes into an owned RGBA pixel buffer (`Canvas`).
//! The finished canvas is exported as PNG at the end of a generation.

pub mod layout;
pub mod pipeline;
pub mod text;

use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use image::{ImageFormat, RgbaImage};

use crate::color::{lerp_color, Color, GradientDirection};

/// How source pixels combine with what is already on the canvas.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum BlendMode {
    #[default]
    SourceOver,
    /// `1 - (1 - dst)(1 - src)`: lightens, black source is a no-op.
    Screen,
}

/// Mutable drawing state. Reinitialized at the start of every render.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DrawState {
    pub blend: BlendMode,
}

/// Rounded rectangle used as a clip mask.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoundedRect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub radius: f32,
}

impl RoundedRect {
    /// Fraction of the unit pixel at (px, py) covered by the shape, sampled
    /// on a 4x4 grid so the corners are anti-aliased.
    pub fn coverage(&self, px: usize, py: usize) -> f32 {
        const GRID: usize = 4;
        let (x0, y0) = (px as f32, py as f32);
        let (x1, y1) = (x0 + 1.0, y0 + 1.0);
        let (right, bottom) = (self.x + self.width, self.y + self.height);
        if x1 <= self.x || y1 <= self.y || x0 >= right || y0 >= bottom {
            return 0.0;
        }
        let r = self.corner_radius();
        let within_x = x0 >= self.x && x1 <= right;
        let within_y = y0 >= self.y && y1 <= bottom;
        let clear_of_corners_x = x0 >= self.x + r && x1 <= right - r;
        let clear_of_corners_y = y0 >= self.y + r && y1 <= bottom - r;
        if (within_x && clear_of_corners_y) || (within_y && clear_of_corners_x) {
            return 1.0;
        }

        let mut hits = 0;
        for sy in 0..GRID {
            for sx in 0..GRID {
                let x = px as f32 + (sx as f32 + 0.5) / GRID as f32;
                let y = py as f32 + (sy as f32 + 0.5) / GRID as f32;
                if self.contains(x, y) {
                    hits += 1;
                }
            }
        }
        hits as f32 / (GRID * GRID) as f32
    }

    fn corner_radius(&self) -> f32 {
        self.radius.min(self.width / 2.0).min(self.height / 2.0).max(0.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        if x < self.x || y < self.y || x > self.x + self.width || y > self.y + self.height {
            return false;
        }
        let r = self.corner_radius();
        // Distance to the nearest corner center, only relevant inside a corner square.
        let cx = x.clamp(self.x + r, self.x + self.width - r);
        let cy = y.clamp(self.y + r, self.y + self.height - r);
        let (dx, dy) = (x - cx, y - cy);
        dx * dx + dy * dy <= r * r
    }
}

/// Owned RGBA pixel buffer.
///
/// Internal format is 4 bytes per pixel in straight (non pre-multiplied)
/// **RGBA** order, so it maps directly onto an `image::RgbaImage`.
pub struct Canvas {
    pub data: Vec<u8>,
    pub width: usize,
    pub height: usize,
    pub state: DrawState,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            data: vec![0u8; width * height * 4],
            width,
            height,
            state: DrawState::default(),
        }
    }

    /// Return blend mode and any other drawing state to defaults.
    pub fn reset_state(&mut self) {
        self.state = DrawState::default();
    }

    /// Clear the canvas to fully transparent black.
    #[inline]
    pub fn clear(&mut self) {
        let len = self.width * self.height * 4;
        self.data[..len].fill(0);
    }

    /// Overwrite every pixel with an opaque color, ignoring the blend mode.
    pub fn fill(&mut self, color: Color) {
        let [r, g, b] = color.channels();
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&[r, g, b, 255]);
        }
    }

    /// Read the RGBA values at (x, y).
    #[inline]
    pub fn get_pixel(&self, x: usize, y: usize) -> (u8, u8, u8, u8) {
        let idx = (y * self.width + x) * 4;
        if idx + 3 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2], self.data[idx + 3])
        } else {
            (0, 0, 0, 0)
        }
    }

    /// Composite a color at (x, y) with the given opacity, using the current
    /// blend mode. Out-of-bounds writes are ignored.
    #[inline]
    pub fn blend_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8, opacity: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let sa = opacity.clamp(0.0, 1.0);
        if sa <= 0.0 {
            return;
        }
        let idx = (y * self.width + x) * 4;
        let da = self.data[idx + 3] as f32 / 255.0;
        let src = [r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0];

        let out_a = sa + da * (1.0 - sa);
        for c in 0..3 {
            let dc = self.data[idx + c] as f32 / 255.0;
            let sc = match self.state.blend {
                BlendMode::SourceOver => src[c],
                // Blend against the backdrop, weighted by how much backdrop exists.
                BlendMode::Screen => {
                    let screened = dc + src[c] - dc * src[c];
                    (1.0 - da) * src[c] + da * screened
                }
            };
            let out = (sc * sa + dc * da * (1.0 - sa)) / out_a;
            self.data[idx + c] = (out * 255.0).round().clamp(0.0, 255.0) as u8;
        }
        self.data[idx + 3] = (out_a * 255.0).round() as u8;
    }

    /// Fill an axis-aligned rectangle. Coordinates are clipped to the canvas.
    pub fn fill_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Color, opacity: f32) {
        let [r, g, b] = color.channels();
        let x0 = x.max(0) as usize;
        let y0 = y.max(0) as usize;
        let x1 = (x + w).clamp(0, self.width as i64) as usize;
        let y1 = (y + h).clamp(0, self.height as i64) as usize;
        for py in y0..y1 {
            for px in x0..x1 {
                self.blend_pixel(px, py, r, g, b, opacity);
            }
        }
    }

    /// 1px outline along the inside edge of the rectangle.
    pub fn stroke_rect(&mut self, x: i64, y: i64, w: i64, h: i64, color: Color, opacity: f32) {
        if w <= 0 || h <= 0 {
            return;
        }
        self.fill_rect(x, y, w, 1, color, opacity);
        if h > 1 {
            self.fill_rect(x, y + h - 1, w, 1, color, opacity);
        }
        if h > 2 {
            self.fill_rect(x, y + 1, 1, h - 2, color, opacity);
            if w > 1 {
                self.fill_rect(x + w - 1, y + 1, 1, h - 2, color, opacity);
            }
        }
    }

    /// Two-stop linear gradient across the whole canvas.
    pub fn fill_linear_gradient(&mut self, direction: GradientDirection, start: Color, end: Color) {
        let (span, horizontal) = match direction {
            GradientDirection::Vertical => (self.height, false),
            GradientDirection::Horizontal => (self.width, true),
        };
        let stops: Vec<Color> = (0..span)
            .map(|i| lerp_color(start, end, (i as f32 + 0.5) / span as f32))
            .collect();

        for py in 0..self.height {
            for px in 0..self.width {
                let c = stops[if horizontal { px } else { py }];
                self.blend_pixel(px, py, c.r(), c.g(), c.b(), 1.0);
            }
        }
    }

    /// Radial fade from transparent at (cx, cy) to `color` at `max_opacity`
    /// on and beyond `radius`.
    pub fn fill_radial_fade(&mut self, cx: f32, cy: f32, radius: f32, color: Color, max_opacity: f32) {
        if radius <= 0.0 {
            return;
        }
        let [r, g, b] = color.channels();
        for py in 0..self.height {
            for px in 0..self.width {
                let dx = px as f32 + 0.5 - cx;
                let dy = py as f32 + 0.5 - cy;
                let t = ((dx * dx + dy * dy).sqrt() / radius).min(1.0);
                self.blend_pixel(px, py, r, g, b, t * max_opacity);
            }
        }
    }

    /// Draw `image` with its top-left corner at (x, y), optionally masked.
    /// The image is drawn at its own size; scale it beforehand.
    pub fn draw_image(&mut self, image: &RgbaImage, x: i64, y: i64, mask: Option<&RoundedRect>) {
        for (ix, iy, px) in image.enumerate_pixels() {
            let cx = x + ix as i64;
            let cy = y + iy as i64;
            if cx < 0 || cy < 0 {
                continue;
            }
            let (cx, cy) = (cx as usize, cy as usize);
            let coverage = match mask {
                Some(m) => m.coverage(cx, cy),
                None => 1.0,
            };
            if coverage <= 0.0 {
                continue;
            }
            let [r, g, b, a] = px.0;
            self.blend_pixel(cx, cy, r, g, b, coverage * a as f32 / 255.0);
        }
    }

    /// Copy the pixels into an `image::RgbaImage`.
    pub fn to_image(&self) -> Option<RgbaImage> {
        RgbaImage::from_raw(self.width as u32, self.height as u32, self.data.clone())
    }

    /// Encode the canvas as a PNG byte stream.
    pub fn encode_png(&self) -> Result<Vec<u8>> {
        let image = self.to_image().context("canvas buffer does not match its dimensions")?;
        let mut bytes = Cursor::new(Vec::new());
        image
            .write_to(&mut bytes, ImageFormat::Png)
            .context("failed to encode PNG")?;
        Ok(bytes.into_inner())
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        let bytes = self.encode_png()?;
        std::fs::write(path, bytes).with_context(|| format!("failed to write {}", path.display()))
    }
}
