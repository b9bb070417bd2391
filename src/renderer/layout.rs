//! Fixed wallpaper geometry and the positions derived from it.

use super::text::BitmapFont;
use super::RoundedRect;

/// Most swatches the palette row ever shows.
pub const MAX_SWATCHES: usize = 5;

/// Static canvas geometry. The canvas size never depends on content.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutConfig {
    pub width: usize,
    pub height: usize,
    pub margin_side: usize,
    pub margin_top: usize,

    pub palette_x: usize,
    pub palette_y: usize,
    pub swatch_width: usize,
    pub swatch_height: usize,
    pub swatch_gap: usize,

    pub cover_size: usize,
    pub cover_radius: usize,
    pub cover_y: usize,

    pub code_width: usize,
    pub code_height: usize,
    pub code_y_offset: usize,

    /// Gap between the palette row and the first title line
    pub title_offset: usize,
    pub title_line_height: usize,
    /// Gap between the last title line and the subtitle
    pub title_gap: usize,
    pub subtitle_line_height: usize,

    pub title_font: BitmapFont,
    pub subtitle_font: BitmapFont,
    pub duration_font: BitmapFont,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            width: 1080,
            height: 1920,
            margin_side: 120,
            margin_top: 120,
            palette_x: 120,
            palette_y: 120,
            swatch_width: 56,
            swatch_height: 20,
            swatch_gap: 8,
            cover_size: 840,
            cover_radius: 8,
            cover_y: 460,
            code_width: 800,
            code_height: 190,
            code_y_offset: 64,
            title_offset: 60,
            title_line_height: 55,
            title_gap: 10,
            subtitle_line_height: 32,
            title_font: BitmapFont::new(6, true),
            subtitle_font: BitmapFont::new(3, false),
            duration_font: BitmapFont::new(3, true),
        }
    }
}

impl LayoutConfig {
    /// Left edge of swatch `index`.
    pub fn swatch_x(&self, index: usize) -> usize {
        self.palette_x + index * (self.swatch_width + self.swatch_gap)
    }

    /// Vertical center of the palette row, where the duration is anchored.
    pub fn palette_center_y(&self) -> usize {
        self.palette_y + self.swatch_height / 2
    }

    /// Right edge the duration text is aligned to.
    pub fn duration_right_x(&self) -> usize {
        self.width - self.margin_side
    }

    /// Width available to wrapped text.
    pub fn content_width(&self) -> usize {
        self.width.saturating_sub(self.margin_side * 2)
    }

    /// Top of the first title line.
    pub fn title_y(&self) -> usize {
        self.palette_y + self.swatch_height + self.title_offset
    }

    /// Top of the subtitle given the number of title lines drawn.
    pub fn subtitle_y(&self, title_lines: usize) -> usize {
        self.title_y() + self.title_line_height * title_lines + self.title_gap
    }

    pub fn cover_x(&self) -> usize {
        (self.width - self.cover_size) / 2
    }

    pub fn cover_rect(&self) -> RoundedRect {
        RoundedRect {
            x: self.cover_x() as f32,
            y: self.cover_y as f32,
            width: self.cover_size as f32,
            height: self.cover_size as f32,
            radius: self.cover_radius as f32,
        }
    }

    pub fn code_x(&self) -> usize {
        (self.width - self.code_width) / 2
    }

    pub fn code_y(&self) -> usize {
        self.cover_y + self.cover_size + self.code_y_offset
    }

    /// Vignette reaches full strength at this distance from the center.
    pub fn vignette_radius(&self) -> f32 {
        self.width as f32 * 0.8
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_positions_match_fixed_geometry() {
        let layout = LayoutConfig::default();
        assert_eq!(layout.swatch_x(0), 120);
        assert_eq!(layout.swatch_x(4), 120 + 4 * 64);
        assert_eq!(layout.palette_center_y(), 130);
        assert_eq!(layout.title_y(), 200);
        assert_eq!(layout.subtitle_y(2), 200 + 110 + 10);
        assert_eq!(layout.cover_x(), 120);
        assert_eq!(layout.code_x(), 140);
        assert_eq!(layout.code_y(), 460 + 840 + 64);
        assert_eq!(layout.content_width(), 840);
        assert_eq!(layout.duration_right_x(), 960);
    }

    #[test]
    fn code_image_fits_on_canvas() {
        let layout = LayoutConfig::default();
        assert!(layout.code_y() + layout.code_height <= layout.height);
    }
}
