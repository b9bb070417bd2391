//! The render descriptor: everything the composition pipeline paints from.

use crate::color::{Color, BUILTIN_ACCENT};
use crate::error::DescriptorError;
use crate::metadata::TrackDescriptor;
use crate::quantize::PaletteResult;
use crate::renderer::layout::MAX_SWATCHES;

/// Placeholder shown when a duration is not known.
pub const UNKNOWN_DURATION: &str = "—";

/// Format milliseconds as `"<minutes> MIN <SS> S"`. Minutes are unbounded.
pub fn format_duration(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!("{} MIN {:02} S", total_seconds / 60, total_seconds % 60)
}

/// Display form of a track or album length.
#[derive(Debug, Clone, PartialEq)]
pub enum DurationText {
    /// The metadata source did not report a length
    Unknown,
    Known { ms: u64, text: String },
}

impl DurationText {
    pub fn from_ms(ms: Option<u64>) -> Self {
        match ms {
            Some(ms) => DurationText::Known { ms, text: format_duration(ms) },
            None => DurationText::Unknown,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DurationText::Unknown => UNKNOWN_DURATION,
            DurationText::Known { text, .. } => text,
        }
    }

    /// Text to paint on the wallpaper, if any. Unknown and zero-length
    /// durations are left off the canvas.
    pub fn drawable(&self) -> Option<&str> {
        match self {
            DurationText::Known { ms, text } if *ms >= 1000 => Some(text),
            _ => None,
        }
    }
}

/// Sole input of the composition pipeline. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderDescriptor {
    pub title: String,
    pub subtitle: String,
    pub duration: DurationText,
    pub cover_image_url: String,
    pub code_image_url: String,
    pub dominant: Color,
    pub swatches: Vec<Color>,
}

impl RenderDescriptor {
    pub fn builder() -> RenderDescriptorBuilder {
        RenderDescriptorBuilder::default()
    }

    /// Combine resolved metadata with the cover's palette.
    pub fn assemble(
        track: &TrackDescriptor,
        palette: &PaletteResult,
        code_image_url: impl Into<String>,
    ) -> Result<Self, DescriptorError> {
        RenderDescriptor::builder()
            .title(&track.title)
            .subtitle(&track.subtitle)
            .duration_ms(track.duration_ms)
            .cover_image_url(&track.cover_image_url)
            .code_image_url(code_image_url)
            .dominant(palette.dominant)
            .swatches(palette.swatches.clone())
            .build()
    }
}

/// Validating builder for [`RenderDescriptor`].
#[derive(Debug, Default, Clone)]
pub struct RenderDescriptorBuilder {
    title: Option<String>,
    subtitle: Option<String>,
    duration_ms: Option<u64>,
    cover_image_url: Option<String>,
    code_image_url: Option<String>,
    dominant: Option<Color>,
    swatches: Vec<Color>,
}

impl RenderDescriptorBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = Some(subtitle.into());
        self
    }

    pub fn duration_ms(mut self, ms: Option<u64>) -> Self {
        self.duration_ms = ms;
        self
    }

    pub fn cover_image_url(mut self, url: impl Into<String>) -> Self {
        self.cover_image_url = Some(url.into());
        self
    }

    pub fn code_image_url(mut self, url: impl Into<String>) -> Self {
        self.code_image_url = Some(url.into());
        self
    }

    pub fn dominant(mut self, color: Color) -> Self {
        self.dominant = Some(color);
        self
    }

    pub fn swatches(mut self, swatches: Vec<Color>) -> Self {
        self.swatches = swatches;
        self
    }

    /// Title and cover are required. A missing subtitle becomes empty, a
    /// missing code URL disables the code image, a missing dominant color
    /// falls back to the built-in accent and swatches are capped at five.
    pub fn build(self) -> Result<RenderDescriptor, DescriptorError> {
        let title = self.title.ok_or(DescriptorError::MissingField("title"))?;
        let cover_image_url = self
            .cover_image_url
            .filter(|u| !u.trim().is_empty())
            .ok_or(DescriptorError::MissingField("cover_image_url"))?;

        let mut swatches = self.swatches;
        swatches.truncate(MAX_SWATCHES);

        Ok(RenderDescriptor {
            title,
            subtitle: self.subtitle.unwrap_or_default(),
            duration: DurationText::from_ms(self.duration_ms),
            cover_image_url,
            code_image_url: self.code_image_url.unwrap_or_default(),
            dominant: self.dominant.unwrap_or(BUILTIN_ACCENT),
            swatches,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{MusicKind, TrackDescriptor};

    #[test]
    fn formats_minutes_and_padded_seconds() {
        assert_eq!(format_duration(0), "0 MIN 00 S");
        assert_eq!(format_duration(65_000), "1 MIN 05 S");
        assert_eq!(format_duration(244_000), "4 MIN 04 S");
        assert_eq!(format_duration(59_999), "0 MIN 59 S");
        assert_eq!(format_duration(3_725_000), "62 MIN 05 S");
    }

    #[test]
    fn formatted_duration_shape_holds() {
        for ms in [0u64, 1, 999, 1000, 61_001, 600_000, 86_400_000, u64::MAX / 2] {
            let text = format_duration(ms);
            let parts: Vec<&str> = text.split(' ').collect();
            assert_eq!(parts.len(), 4, "{}", text);
            assert!(parts[0].chars().all(|c| c.is_ascii_digit()));
            assert_eq!(parts[1], "MIN");
            assert_eq!(parts[2].len(), 2);
            assert!(parts[2].chars().all(|c| c.is_ascii_digit()));
            assert_eq!(parts[3], "S");
        }
    }

    #[test]
    fn unknown_and_zero_durations_are_not_drawn() {
        assert_eq!(DurationText::from_ms(None).as_str(), "—");
        assert_eq!(DurationText::from_ms(None).drawable(), None);
        assert_eq!(DurationText::from_ms(Some(0)).as_str(), "0 MIN 00 S");
        assert_eq!(DurationText::from_ms(Some(0)).drawable(), None);
        assert_eq!(DurationText::from_ms(Some(244_000)).drawable(), Some("4 MIN 04 S"));
    }

    #[test]
    fn builder_requires_title_and_cover() {
        let err = RenderDescriptor::builder().cover_image_url("c").build().unwrap_err();
        assert_eq!(err, DescriptorError::MissingField("title"));
        let err = RenderDescriptor::builder().title("t").cover_image_url("  ").build().unwrap_err();
        assert_eq!(err, DescriptorError::MissingField("cover_image_url"));
    }

    #[test]
    fn builder_defaults_optional_fields() {
        let d = RenderDescriptor::builder()
            .title("t")
            .cover_image_url("c")
            .swatches(vec![Color::BLACK; 7])
            .build()
            .unwrap();
        assert_eq!(d.subtitle, "");
        assert_eq!(d.code_image_url, "");
        assert_eq!(d.dominant, BUILTIN_ACCENT);
        assert_eq!(d.duration, DurationText::Unknown);
        assert_eq!(d.swatches.len(), 5);
    }

    #[test]
    fn assemble_merges_track_and_palette() {
        let track = TrackDescriptor {
            kind: MusicKind::Track,
            id: "abc".into(),
            title: "Midnight City".into(),
            subtitle: "M83".into(),
            duration_ms: Some(244_000),
            cover_image_url: "https://i.scdn.co/image/cover".into(),
            canonical_url: "https://open.spotify.com/track/abc".into(),
        };
        let palette = PaletteResult {
            dominant: Color::rgb(0x1d, 0xb9, 0x54),
            swatches: vec![Color::WHITE],
        };
        let d = RenderDescriptor::assemble(&track, &palette, "https://code").unwrap();
        assert_eq!(d.title, "Midnight City");
        assert_eq!(d.duration.as_str(), "4 MIN 04 S");
        assert_eq!(d.code_image_url, "https://code");
        assert_eq!(d.dominant.to_hex(), "#1db954");
        assert_eq!(d.swatches, vec![Color::WHITE]);
    }
}
