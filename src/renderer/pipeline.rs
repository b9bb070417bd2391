//! Wallpaper composition.
//!
//! A render runs a fixed sequence of stages over the canvas:
//!
//! clear → background → vignette → palette → duration → title → subtitle →
//! cover → code
//!
//! Every stage is a function of the descriptor, the customization and the
//! loaded bitmaps, and the first stage wipes the canvas, so rendering the same
//! arguments twice yields identical pixels. Only the cover and code stages
//! suspend (on the image loader), one after the other. A cover failure aborts
//! the render and leaves what was already painted; a code failure is logged
//! and skipped.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use tracing::{debug, info, warn};

use super::layout::{LayoutConfig, MAX_SWATCHES};
use super::text::{wrap_text, BitmapFont, TextAlign, TextBaseline};
use super::{BlendMode, Canvas};
use crate::color::{lerp_color, resolve_accent, Color};
use crate::config::{clamp_unit, CustomizationConfig};
use crate::descriptor::RenderDescriptor;
use crate::error::RenderError;
use crate::loader::ImageLoader;

/// Swatch outline: white at low opacity so swatches stand out from similar
/// backgrounds.
const SWATCH_STROKE: Color = Color::WHITE;
const SWATCH_STROKE_OPACITY: f32 = 0.25;

/// Progress of one render call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Clearing,
    BackgroundPainted,
    VignettePainted,
    PaletteDrawn,
    DurationDrawn,
    TitleDrawn,
    SubtitleDrawn,
    CoverDrawn,
    CodeDrawn,
    Done,
}

/// Owns the drawing surface. Customization is passed per call and never
/// stored, and `&mut self` keeps two renders from interleaving.
pub struct WallpaperRenderer {
    canvas: Canvas,
    layout: LayoutConfig,
    stage: Stage,
}

impl Default for WallpaperRenderer {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl WallpaperRenderer {
    pub fn new(layout: LayoutConfig) -> Self {
        Self {
            canvas: Canvas::new(layout.width, layout.height),
            layout,
            stage: Stage::Idle,
        }
    }

    pub fn canvas(&self) -> &Canvas {
        &self.canvas
    }

    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Last stage the most recent render reached.
    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Wipe the surface and drawing state without painting anything.
    pub fn reset(&mut self) {
        self.canvas.reset_state();
        self.canvas.clear();
        self.stage = Stage::Idle;
    }

    fn advance(&mut self, stage: Stage) {
        debug!(?stage, "render stage");
        self.stage = stage;
    }

    /// Paint the full wallpaper for `descriptor` with `config`.
    pub async fn render_wallpaper<L: ImageLoader>(
        &mut self,
        loader: &L,
        descriptor: &RenderDescriptor,
        config: &CustomizationConfig,
    ) -> Result<(), RenderError> {
        info!("Rendering wallpaper for \"{}\"", descriptor.title);
        for font in [self.layout.title_font, self.layout.subtitle_font, self.layout.duration_font] {
            font.validate()?;
        }

        self.clear(config);
        self.paint_background(descriptor, config);
        self.paint_vignette(config);
        if config.show_palette {
            self.paint_palette(&descriptor.swatches);
        }
        if let Some(text) = descriptor.duration.drawable() {
            self.paint_duration(text, config.text_color.color());
        }
        let subtitle_y = self.paint_title(&descriptor.title, config.text_color.color());
        self.paint_subtitle(&descriptor.subtitle, subtitle_y, config.text_color.color());

        let cover = loader.load(&descriptor.cover_image_url).await?;
        self.paint_cover(&cover);

        match self.load_code(loader, &descriptor.code_image_url).await {
            Ok(code) => self.paint_code(&code),
            Err(e) => warn!("Skipping scannable code: {}", e),
        }

        self.advance(Stage::Done);
        info!("Wallpaper rendered");
        Ok(())
    }

    async fn load_code<L: ImageLoader>(&self, loader: &L, url: &str) -> Result<RgbaImage, RenderError> {
        if url.trim().is_empty() {
            return Err(RenderError::image_load(url, "no code image URL"));
        }
        loader.load(url).await
    }

    fn clear(&mut self, config: &CustomizationConfig) {
        self.advance(Stage::Clearing);
        self.canvas.reset_state();
        self.canvas.clear();
        self.canvas.fill(config.background_color);
    }

    fn paint_background(&mut self, descriptor: &RenderDescriptor, config: &CustomizationConfig) {
        let (accent, source) = resolve_accent(config.accent_color, Some(descriptor.dominant));
        let end = lerp_color(config.background_color, accent, clamp_unit(config.gradient_strength));
        debug!(accent = %accent, ?source, end = %end, "background gradient");
        self.canvas
            .fill_linear_gradient(config.gradient_direction, config.background_color, end);
        self.advance(Stage::BackgroundPainted);
    }

    fn paint_vignette(&mut self, config: &CustomizationConfig) {
        if config.vignette_enabled {
            let cx = self.layout.width as f32 / 2.0;
            let cy = self.layout.height as f32 / 2.0;
            let radius = self.layout.vignette_radius();
            self.canvas
                .fill_radial_fade(cx, cy, radius, Color::BLACK, clamp_unit(config.vignette_intensity));
        }
        self.advance(Stage::VignettePainted);
    }

    fn paint_palette(&mut self, swatches: &[Color]) {
        let l = &self.layout;
        let (y, w, h) = (l.palette_y as i64, l.swatch_width as i64, l.swatch_height as i64);
        for (i, color) in swatches.iter().take(MAX_SWATCHES).enumerate() {
            let x = self.layout.swatch_x(i) as i64;
            self.canvas.fill_rect(x, y, w, h, *color, 1.0);
            self.canvas.stroke_rect(x, y, w, h, SWATCH_STROKE, SWATCH_STROKE_OPACITY);
        }
        self.advance(Stage::PaletteDrawn);
    }

    fn paint_duration(&mut self, text: &str, color: Color) {
        let x = self.layout.duration_right_x() as i64;
        let y = self.layout.palette_center_y() as i64;
        self.layout
            .duration_font
            .draw(&mut self.canvas, text, x, y, TextAlign::Right, TextBaseline::Middle, color);
        self.advance(Stage::DurationDrawn);
    }

    /// Draw wrapped lines top-down from `y`, returning how many were drawn.
    fn paint_lines(&mut self, font: BitmapFont, text: &str, y: usize, step: usize, color: Color) -> usize {
        let x = self.layout.margin_side as i64;
        let lines = wrap_text(|s| font.measure(s), text, self.layout.content_width() as f32);
        for (i, line) in lines.iter().enumerate() {
            let line_y = (y + i * step) as i64;
            font.draw(&mut self.canvas, line, x, line_y, TextAlign::Left, TextBaseline::Top, color);
        }
        lines.len()
    }

    /// Returns the y coordinate where the subtitle starts.
    fn paint_title(&mut self, title: &str, color: Color) -> usize {
        let font = self.layout.title_font;
        let y = self.layout.title_y();
        let step = self.layout.title_line_height;
        let count = self.paint_lines(font, &title.to_uppercase(), y, step, color);
        self.advance(Stage::TitleDrawn);
        self.layout.subtitle_y(count)
    }

    fn paint_subtitle(&mut self, subtitle: &str, y: usize, color: Color) {
        let font = self.layout.subtitle_font;
        let step = self.layout.subtitle_line_height;
        self.paint_lines(font, &subtitle.to_uppercase(), y, step, color);
        self.advance(Stage::SubtitleDrawn);
    }

    fn paint_cover(&mut self, cover: &RgbaImage) {
        let size = self.layout.cover_size as u32;
        let scaled = fit(cover, size, size);
        let rect = self.layout.cover_rect();
        self.canvas
            .draw_image(&scaled, rect.x as i64, rect.y as i64, Some(&rect));
        self.advance(Stage::CoverDrawn);
    }

    fn paint_code(&mut self, code: &RgbaImage) {
        let scaled = fit(code, self.layout.code_width as u32, self.layout.code_height as u32);
        let (x, y) = (self.layout.code_x() as i64, self.layout.code_y() as i64);
        self.canvas.state.blend = BlendMode::Screen;
        self.canvas.draw_image(&scaled, x, y, None);
        self.canvas.state.blend = BlendMode::SourceOver;
        self.advance(Stage::CodeDrawn);
    }
}

/// Stretch `image` to exactly `width` x `height`.
fn fit(image: &RgbaImage, width: u32, height: u32) -> RgbaImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }
    imageops::resize(image, width, height, FilterType::Lanczos3)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::TextColor;
    use crate::loader::MemoryImageLoader;
    use image::Rgba;
    use std::ops::Range;

    const COVER: &str = "mem://cover";
    const CODE: &str = "mem://code";

    fn descriptor() -> RenderDescriptor {
        RenderDescriptor::builder()
            .title("Midnight City")
            .subtitle("M83")
            .duration_ms(Some(244_000))
            .cover_image_url(COVER)
            .code_image_url(CODE)
            .dominant(Color::rgb(0x1d, 0xb9, 0x54))
            .swatches(vec![
                Color::rgb(0x1d, 0xb9, 0x54),
                Color::BLACK,
                Color::WHITE,
                Color::rgb(0xab, 0xcd, 0xef),
                Color::rgb(0x12, 0x34, 0x56),
            ])
            .build()
            .unwrap()
    }

    fn loader() -> MemoryImageLoader {
        MemoryImageLoader::new()
            .with_image(COVER, RgbaImage::from_pixel(840, 840, Rgba([200, 40, 40, 255])))
            .with_image(CODE, RgbaImage::from_pixel(40, 10, Rgba([255, 255, 255, 255])))
    }

    fn pixel(r: &WallpaperRenderer, x: usize, y: usize) -> (u8, u8, u8, u8) {
        r.canvas().get_pixel(x, y)
    }

    fn titled(title: &str) -> RenderDescriptor {
        RenderDescriptor { title: title.to_string(), ..descriptor() }
    }

    /// Flat background with nothing but text, cover and code on top.
    fn flat(background: Color, text_color: TextColor) -> CustomizationConfig {
        CustomizationConfig {
            background_color: background,
            gradient_strength: 0.0,
            vignette_enabled: false,
            show_palette: false,
            text_color,
            ..Default::default()
        }
    }

    /// Number of pixels exactly `color` inside the given box.
    fn count(r: &WallpaperRenderer, xs: Range<usize>, ys: Range<usize>, color: Color) -> usize {
        let target = (color.r(), color.g(), color.b(), 255);
        ys.flat_map(|y| xs.clone().map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(r, x, y) == target)
            .count()
    }

    #[tokio::test]
    async fn reaches_done_and_paints_swatches_in_order() {
        let mut r = WallpaperRenderer::default();
        let d = descriptor();
        r.render_wallpaper(&loader(), &d, &CustomizationConfig::default()).await.unwrap();
        assert_eq!(r.stage(), Stage::Done);

        let l = r.layout().clone();
        let cy = l.palette_y + l.swatch_height / 2;
        for (i, c) in d.swatches.iter().enumerate() {
            let cx = l.swatch_x(i) + l.swatch_width / 2;
            assert_eq!(pixel(&r, cx, cy), (c.r(), c.g(), c.b(), 255), "swatch {}", i);
        }
    }

    #[tokio::test]
    async fn hidden_palette_leaves_background() {
        let mut r = WallpaperRenderer::default();
        let config = CustomizationConfig {
            show_palette: false,
            vignette_enabled: false,
            ..Default::default()
        };
        r.render_wallpaper(&loader(), &descriptor(), &config).await.unwrap();
        let l = r.layout().clone();
        let (x, y) = (l.swatch_x(2) + 10, l.palette_y + 10);
        assert_ne!(pixel(&r, x, y), (255, 255, 255, 255));
    }

    #[tokio::test]
    async fn zero_strength_gradient_is_flat_background() {
        let mut r = WallpaperRenderer::default();
        let config = CustomizationConfig {
            background_color: Color::rgb(10, 20, 30),
            gradient_strength: 0.0,
            vignette_enabled: false,
            show_palette: false,
            ..Default::default()
        };
        r.render_wallpaper(&loader(), &descriptor(), &config).await.unwrap();
        assert_eq!(pixel(&r, 5, 5), (10, 20, 30, 255));
        assert_eq!(pixel(&r, 5, 1915), (10, 20, 30, 255));
    }

    #[tokio::test]
    async fn cover_failure_aborts_after_text() {
        let mut r = WallpaperRenderer::default();
        let loader = MemoryImageLoader::new();
        let err = r
            .render_wallpaper(&loader, &descriptor(), &CustomizationConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, RenderError::ImageLoad { .. }));
        assert_eq!(r.stage(), Stage::SubtitleDrawn);

        // Everything painted before the cover stays on the canvas.
        let l = r.layout().clone();
        let d = descriptor();
        let cy = l.palette_y + l.swatch_height / 2;
        for (i, c) in d.swatches.iter().enumerate() {
            let cx = l.swatch_x(i) + l.swatch_width / 2;
            assert_eq!(pixel(&r, cx, cy), (c.r(), c.g(), c.b(), 255), "swatch {}", i);
        }
        let title_box = l.title_y()..l.title_y() + l.title_font.glyph_size();
        assert!(count(&r, l.margin_side..l.width - l.margin_side, title_box, Color::WHITE) > 0);
        let (top, bottom) = (pixel(&r, 5, 5), pixel(&r, 5, l.height - 5));
        assert_ne!(top, bottom, "background gradient should remain");

        let cover_center = (l.cover_x() + l.cover_size / 2, l.cover_y + l.cover_size / 2);
        assert_ne!(pixel(&r, cover_center.0, cover_center.1), (200, 40, 40, 255));
        let code_rows = l.code_y()..l.code_y() + 4;
        assert_eq!(count(&r, l.code_x()..l.code_x() + l.code_width, code_rows, Color::WHITE), 0);
    }

    #[tokio::test]
    async fn code_failure_is_not_fatal() {
        let mut r = WallpaperRenderer::default();
        let loader = MemoryImageLoader::new()
            .with_image(COVER, RgbaImage::from_pixel(8, 8, Rgba([200, 40, 40, 255])));
        r.render_wallpaper(&loader, &descriptor(), &CustomizationConfig::default())
            .await
            .unwrap();
        assert_eq!(r.stage(), Stage::Done);
    }

    #[tokio::test]
    async fn cover_is_clipped_to_rounded_corners() {
        let mut r = WallpaperRenderer::default();
        let config = CustomizationConfig { vignette_enabled: false, ..Default::default() };
        r.render_wallpaper(&loader(), &descriptor(), &config).await.unwrap();
        let l = r.layout().clone();
        let (x0, y0) = (l.cover_x(), l.cover_y);
        assert_ne!(pixel(&r, x0, y0), (200, 40, 40, 255));
        assert_eq!(pixel(&r, x0 + l.cover_size / 2, y0 + l.cover_size / 2), (200, 40, 40, 255));
    }

    #[tokio::test]
    async fn reset_clears_everything() {
        let mut r = WallpaperRenderer::default();
        r.render_wallpaper(&loader(), &descriptor(), &CustomizationConfig::default())
            .await
            .unwrap();
        r.reset();
        assert_eq!(r.stage(), Stage::Idle);
        assert!(r.canvas().data.iter().all(|&b| b == 0));
        assert_eq!(r.canvas().state.blend, BlendMode::SourceOver);
    }

    #[tokio::test]
    async fn title_and_subtitle_use_the_text_color() {
        let mut r = WallpaperRenderer::default();
        r.render_wallpaper(&loader(), &descriptor(), &flat(Color::BLACK, TextColor::Light))
            .await
            .unwrap();
        let l = r.layout().clone();
        let xs = l.margin_side..l.width - l.margin_side;
        let title_box = l.title_y()..l.title_y() + l.title_font.glyph_size();
        let sub_y = l.subtitle_y(1);
        let subtitle_box = sub_y..sub_y + l.subtitle_font.glyph_size();
        assert!(count(&r, xs.clone(), title_box.clone(), Color::WHITE) > 0);
        assert!(count(&r, xs.clone(), subtitle_box.clone(), Color::WHITE) > 0);

        r.render_wallpaper(&loader(), &descriptor(), &flat(Color::WHITE, TextColor::Dark))
            .await
            .unwrap();
        assert!(count(&r, xs.clone(), title_box, Color::BLACK) > 0);
        assert!(count(&r, xs, subtitle_box, Color::BLACK) > 0);
    }

    #[tokio::test]
    async fn duration_ends_at_right_margin_on_palette_row() {
        let mut r = WallpaperRenderer::default();
        r.render_wallpaper(&loader(), &descriptor(), &flat(Color::BLACK, TextColor::Light))
            .await
            .unwrap();
        let l = r.layout().clone();
        let right = l.duration_right_x();
        let center = l.palette_center_y();
        let half = l.duration_font.glyph_size() / 2;
        let band = center - half..center + half;

        let width = l.duration_font.measure("4 MIN 04 S") as usize;
        assert!(count(&r, right - 30..right, band.clone(), Color::WHITE) > 0);
        assert!(count(&r, right - width..right - width + 30, band.clone(), Color::WHITE) > 0);
        assert_eq!(count(&r, right..l.width, 0..l.title_y(), Color::WHITE), 0);
        assert_eq!(count(&r, right - width..right, 0..center - half, Color::WHITE), 0);
        assert_eq!(count(&r, right - width..right, center + half..l.title_y(), Color::WHITE), 0);
        assert!(count(&r, right - width..right, center - half..center, Color::WHITE) > 0);
        assert!(count(&r, right - width..right, center..center + half, Color::WHITE) > 0);
    }

    #[tokio::test]
    async fn two_line_title_moves_the_subtitle_down() {
        let mut r = WallpaperRenderer::default();
        let d = titled("Midnight City Forever");
        r.render_wallpaper(&loader(), &d, &flat(Color::BLACK, TextColor::Light))
            .await
            .unwrap();
        let l = r.layout().clone();
        let xs = l.margin_side..l.width - l.margin_side;

        let second_line = l.title_y() + l.title_line_height;
        let second_box = second_line..second_line + l.title_font.glyph_size();
        assert!(count(&r, xs.clone(), second_box, Color::WHITE) > 0);

        let sub_y = l.subtitle_y(2);
        let gap = second_line + l.title_font.glyph_size()..sub_y;
        assert_eq!(count(&r, xs.clone(), gap, Color::WHITE), 0);
        assert!(count(&r, xs, sub_y..sub_y + l.subtitle_font.glyph_size(), Color::WHITE) > 0);
    }

    #[tokio::test]
    async fn accented_title_renders_like_its_base_letters() {
        let config = flat(Color::BLACK, TextColor::Light);
        let mut accented = WallpaperRenderer::default();
        accented.render_wallpaper(&loader(), &titled("Sigur Rós"), &config).await.unwrap();
        let mut plain = WallpaperRenderer::default();
        plain.render_wallpaper(&loader(), &titled("Sigur Ros"), &config).await.unwrap();
        assert_eq!(accented.canvas().data, plain.canvas().data);
    }

    #[tokio::test]
    async fn code_image_is_screen_blended() {
        let l = LayoutConfig::default();
        let (w, h) = (l.code_width as u32, l.code_height as u32);
        let gray = RgbaImage::from_pixel(w, h, Rgba([128, 128, 128, 255]));
        let loader = MemoryImageLoader::new()
            .with_image(COVER, RgbaImage::from_pixel(840, 840, Rgba([200, 40, 40, 255])))
            .with_image(CODE, gray);
        let mut r = WallpaperRenderer::default();
        r.render_wallpaper(&loader, &descriptor(), &flat(Color::rgb(100, 0, 0), TextColor::Light))
            .await
            .unwrap();
        assert_eq!(r.stage(), Stage::Done);

        // screen: 1 - (1 - 100/255)(1 - 128/255) = 178/255 on red, 128 elsewhere
        let (x, y) = (l.code_x() + l.code_width / 2, l.code_y() + l.code_height / 2);
        assert_eq!(pixel(&r, x, y), (178, 128, 128, 255));
        assert_eq!(pixel(&r, l.code_x() - 1, y), (100, 0, 0, 255));
        assert_eq!(r.canvas().state.blend, BlendMode::SourceOver);
    }

    #[tokio::test]
    async fn white_code_image_lights_its_area() {
        let mut r = WallpaperRenderer::default();
        r.render_wallpaper(&loader(), &descriptor(), &flat(Color::BLACK, TextColor::Light))
            .await
            .unwrap();
        let l = r.layout().clone();
        let (x, y) = (l.code_x() + l.code_width / 2, l.code_y() + l.code_height / 2);
        let (cr, cg, cb, _) = pixel(&r, x, y);
        assert!(cr >= 250 && cg >= 250 && cb >= 250, "code area stayed dark: {:?}", (cr, cg, cb));
        assert_eq!(pixel(&r, x, l.code_y() + l.code_height + 5), (0, 0, 0, 255));
    }
}
