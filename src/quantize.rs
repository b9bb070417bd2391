//! Palette extraction from cover art.
//!
//! Median-cut quantization over the sampled pixel population. Boxes are
//! split on their widest channel at the median value; the first phase favors
//! crowded boxes, the second favors crowded and large ones, so small but
//! distinct color regions still get a swatch.

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::color::Color;
use crate::error::RenderError;
use crate::renderer::layout::MAX_SWATCHES;

/// Pixels at or below this alpha are ignored.
const MIN_ALPHA: u8 = 125;
/// Share of the target box count reached by population-only splitting.
const POPULATION_PHASE: f32 = 0.75;

/// Palette extraction tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PaletteOptions {
    /// Sample every n-th pixel (1 = every pixel)
    pub quality: usize,
    /// Number of swatches to produce, capped at 5
    pub max_colors: usize,
}

impl Default for PaletteOptions {
    fn default() -> Self {
        Self {
            quality: 10,
            max_colors: MAX_SWATCHES,
        }
    }
}

/// Colors derived from one bitmap.
#[derive(Debug, Clone, PartialEq)]
pub struct PaletteResult {
    pub dominant: Color,
    /// Ordered by prominence, at most 5 entries
    pub swatches: Vec<Color>,
}

struct ColorBox {
    pixels: Vec<[u8; 3]>,
}

impl ColorBox {
    fn range(&self, channel: usize) -> u8 {
        let (min, max) = self
            .pixels
            .iter()
            .fold((u8::MAX, u8::MIN), |(lo, hi), p| (lo.min(p[channel]), hi.max(p[channel])));
        max.saturating_sub(min)
    }

    fn widest_channel(&self) -> (usize, u8) {
        (0..3)
            .map(|c| (c, self.range(c)))
            .fold((0, 0), |best, cur| if cur.1 > best.1 { cur } else { best })
    }

    fn splittable(&self) -> bool {
        self.pixels.len() > 1 && self.widest_channel().1 > 0
    }

    fn volume(&self) -> u64 {
        (0..3).map(|c| self.range(c) as u64 + 1).product()
    }

    fn population(&self) -> u64 {
        self.pixels.len() as u64
    }

    fn average(&self) -> Color {
        let n = self.pixels.len().max(1) as u64;
        let mut sum = [0u64; 3];
        for p in &self.pixels {
            for c in 0..3 {
                sum[c] += p[c] as u64;
            }
        }
        let avg = |s: u64| ((s + n / 2) / n) as u8;
        Color::rgb(avg(sum[0]), avg(sum[1]), avg(sum[2]))
    }

    /// Split at the median of the widest channel. Both halves are non-empty.
    fn split(mut self) -> (ColorBox, ColorBox) {
        let (channel, _) = self.widest_channel();
        self.pixels.sort_unstable_by_key(|p| (p[channel], p[0], p[1], p[2]));
        let median = self.pixels[self.pixels.len() / 2][channel];
        let mut at = self.pixels.partition_point(|p| p[channel] <= median);
        if at == self.pixels.len() {
            at = self.pixels.partition_point(|p| p[channel] < median);
        }
        let upper = self.pixels.split_off(at);
        (self, ColorBox { pixels: upper })
    }
}

/// Repeatedly split the box with the highest `priority` until `target`
/// boxes exist or nothing can be split further.
fn split_until<F>(boxes: &mut Vec<ColorBox>, target: usize, priority: F)
where
    F: Fn(&ColorBox) -> u64,
{
    while boxes.len() < target {
        let candidate = boxes
            .iter()
            .enumerate()
            .filter(|(_, b)| b.splittable())
            .max_by(|(ia, a), (ib, b)| priority(a).cmp(&priority(b)).then(ib.cmp(ia)))
            .map(|(i, _)| i);
        let Some(index) = candidate else {
            break;
        };
        let (lower, upper) = boxes.swap_remove(index).split();
        boxes.push(lower);
        boxes.push(upper);
    }
}

fn sample_pixels(bitmap: &RgbaImage, quality: usize) -> Vec<[u8; 3]> {
    bitmap
        .pixels()
        .step_by(quality.max(1))
        .filter(|p| p.0[3] > MIN_ALPHA)
        .map(|p| [p.0[0], p.0[1], p.0[2]])
        .collect()
}

/// Compute the dominant color and up to five representative swatches.
pub fn extract_palette(bitmap: &RgbaImage, options: &PaletteOptions) -> Result<PaletteResult, RenderError> {
    let (w, h) = bitmap.dimensions();
    if w == 0 || h == 0 {
        return Err(RenderError::ImageDecode("bitmap has zero dimensions".into()));
    }

    let mut pixels = sample_pixels(bitmap, options.quality);
    if pixels.is_empty() {
        // Sparse sampling can miss a small opaque region; retry densely.
        pixels = sample_pixels(bitmap, 1);
    }
    if pixels.is_empty() {
        return Err(RenderError::ImageDecode("bitmap has no opaque pixels".into()));
    }

    let target = options.max_colors.clamp(1, MAX_SWATCHES);
    let mut boxes = vec![ColorBox { pixels }];
    let first_phase = ((target as f32) * POPULATION_PHASE).ceil() as usize;
    split_until(&mut boxes, first_phase, ColorBox::population);
    split_until(&mut boxes, target, |b| b.population() * b.volume());

    let dominant = boxes
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| a.population().cmp(&b.population()).then(ib.cmp(ia)))
        .map(|(_, b)| b.average())
        .unwrap_or(Color::BLACK);

    boxes.sort_by(|a, b| {
        (b.population() * b.volume())
            .cmp(&(a.population() * a.volume()))
            .then(b.population().cmp(&a.population()))
    });
    let mut swatches: Vec<Color> = boxes.iter().map(ColorBox::average).collect();
    swatches.truncate(MAX_SWATCHES);

    debug!(dominant = %dominant, swatches = swatches.len(), "extracted palette");
    Ok(PaletteResult { dominant, swatches })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn solid(size: u32, rgb: [u8; 3]) -> RgbaImage {
        RgbaImage::from_pixel(size, size, Rgba([rgb[0], rgb[1], rgb[2], 255]))
    }

    #[test]
    fn solid_bitmap_yields_its_color() {
        let bitmap = solid(16, [0x1d, 0xb9, 0x54]);
        let result = extract_palette(&bitmap, &PaletteOptions::default()).unwrap();
        assert_eq!(result.dominant, Color::rgb(0x1d, 0xb9, 0x54));
        assert!(!result.swatches.is_empty());
        assert_eq!(result.swatches[0], result.dominant);
    }

    #[test]
    fn zero_dimension_bitmap_fails() {
        let bitmap = RgbaImage::new(0, 0);
        let err = extract_palette(&bitmap, &PaletteOptions::default()).unwrap_err();
        assert!(matches!(err, RenderError::ImageDecode(_)));
    }

    #[test]
    fn fully_transparent_bitmap_fails() {
        let bitmap = RgbaImage::from_pixel(4, 4, Rgba([255, 0, 0, 0]));
        assert!(matches!(
            extract_palette(&bitmap, &PaletteOptions::default()),
            Err(RenderError::ImageDecode(_))
        ));
    }

    #[test]
    fn never_more_than_five_swatches() {
        let mut bitmap = RgbaImage::new(64, 64);
        for (x, y, px) in bitmap.enumerate_pixels_mut() {
            *px = Rgba([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8, 255]);
        }
        let options = PaletteOptions { quality: 1, max_colors: 12 };
        let result = extract_palette(&bitmap, &options).unwrap();
        assert_eq!(result.swatches.len(), 5);
    }

    #[test]
    fn two_color_bitmap_finds_both_and_majority_dominates() {
        let mut bitmap = RgbaImage::new(10, 10);
        for (x, _, px) in bitmap.enumerate_pixels_mut() {
            *px = if x < 7 { Rgba([200, 10, 10, 255]) } else { Rgba([10, 10, 200, 255]) };
        }
        let options = PaletteOptions { quality: 1, max_colors: 5 };
        let result = extract_palette(&bitmap, &options).unwrap();
        assert_eq!(result.dominant, Color::rgb(200, 10, 10));
        assert_eq!(result.swatches.len(), 2);
        assert!(result.swatches.contains(&Color::rgb(10, 10, 200)));
    }

    #[test]
    fn extraction_is_deterministic() {
        let mut bitmap = RgbaImage::new(32, 32);
        for (x, y, px) in bitmap.enumerate_pixels_mut() {
            *px = Rgba([(x * 8) as u8, (y * 8) as u8, 90, 255]);
        }
        let options = PaletteOptions::default();
        assert_eq!(
            extract_palette(&bitmap, &options).unwrap(),
            extract_palette(&bitmap, &options).unwrap()
        );
    }
}
