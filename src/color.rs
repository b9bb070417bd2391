use clap::ValueEnum;
use palette::Srgb;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fallback accent when neither the user nor the cover art provides one.
pub const BUILTIN_ACCENT: Color = Color::rgb(0x1d, 0xb9, 0x54);

/// An opaque 8-bit sRGB color. Displays as lowercase `#rrggbb`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color(Srgb<u8>);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Color(Srgb::new(r, g, b))
    }

    pub fn r(&self) -> u8 {
        self.0.red
    }

    pub fn g(&self) -> u8 {
        self.0.green
    }

    pub fn b(&self) -> u8 {
        self.0.blue
    }

    pub fn channels(&self) -> [u8; 3] {
        [self.0.red, self.0.green, self.0.blue]
    }

    /// Parse from hex string like "#1db954", "1DB954" or "#fff"
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.trim();
        let digits = hex.trim_start_matches('#');
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        Srgb::<u8>::from_str(digits).ok().map(Color)
    }

    pub fn to_hex(&self) -> String {
        format!("#{:x}", self.0)
    }
}

impl From<[u8; 3]> for Color {
    fn from(c: [u8; 3]) -> Self {
        Color::rgb(c[0], c[1], c[2])
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Color::from_hex(s).ok_or_else(|| format!("Invalid color '{}': expected #rrggbb", s))
    }
}

impl Serialize for Color {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Color::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Axis of the two-stop background gradient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum GradientDirection {
    /// Top to bottom
    #[default]
    Vertical,
    /// Left to right
    Horizontal,
}

/// Foreground tone used for the title, subtitle and duration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, ValueEnum, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum TextColor {
    #[default]
    Light,
    Dark,
}

impl TextColor {
    pub fn color(&self) -> Color {
        match self {
            TextColor::Light => Color::WHITE,
            TextColor::Dark => Color::BLACK,
        }
    }
}

/// Where the effective accent color came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccentSource {
    User,
    Dominant,
    Builtin,
}

/// Resolve the gradient accent: explicit choice, then the cover's dominant
/// color, then [`BUILTIN_ACCENT`].
pub fn resolve_accent(user: Option<Color>, dominant: Option<Color>) -> (Color, AccentSource) {
    if let Some(c) = user {
        return (c, AccentSource::User);
    }
    if let Some(c) = dominant {
        return (c, AccentSource::Dominant);
    }
    (BUILTIN_ACCENT, AccentSource::Builtin)
}

/// Interpolate between two colors, rounding each channel to nearest.
pub fn lerp_color(a: Color, b: Color, t: f32) -> Color {
    let t = t.clamp(0.0, 1.0);
    let mix = |x: u8, y: u8| (x as f32 + (y as f32 - x as f32) * t).round() as u8;
    Color::rgb(mix(a.r(), b.r()), mix(a.g(), b.g()), mix(a.b(), b.b()))
}
