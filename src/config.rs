use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::cli::GenerateArgs;
use crate::color::{Color, GradientDirection, TextColor};
use crate::loader::LoaderConfig;
use crate::metadata::SpotifyConfig;
use crate::quantize::PaletteOptions;

/// Environment variable that overrides `[spotify].access_token`.
pub const TOKEN_ENV: &str = "SPOTIFY_ACCESS_TOKEN";

/// Per-render look of the wallpaper. Passed whole to every render call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomizationConfig {
    pub background_color: Color,
    /// None = use the cover's dominant color
    pub accent_color: Option<Color>,
    pub gradient_strength: f32,
    pub gradient_direction: GradientDirection,
    pub text_color: TextColor,
    pub vignette_enabled: bool,
    pub vignette_intensity: f32,
    pub show_palette: bool,
}

impl Default for CustomizationConfig {
    fn default() -> Self {
        Self {
            background_color: Color::BLACK,
            accent_color: None,
            gradient_strength: 1.0,
            gradient_direction: GradientDirection::Vertical,
            text_color: TextColor::Light,
            vignette_enabled: true,
            vignette_intensity: 0.4,
            show_palette: true,
        }
    }
}

impl CustomizationConfig {
    /// Clamp the fractional settings into [0, 1].
    pub fn clamped(mut self) -> Self {
        self.gradient_strength = clamp_unit(self.gradient_strength);
        self.vignette_intensity = clamp_unit(self.vignette_intensity);
        self
    }
}

/// Clamp to [0, 1]; NaN becomes 0.
pub fn clamp_unit(v: f32) -> f32 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory for generated wallpapers (None = current directory)
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub customization: CustomizationConfig,
    pub spotify: SpotifyConfig,
    pub loader: LoaderConfig,
    pub palette: PaletteOptions,
    pub output: OutputConfig,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        Ok(config)
    }

    /// Get the default XDG config path (~/.config/coverwall/config.toml)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("coverwall").join("config.toml"))
    }

    /// Load config from the default XDG path if it exists
    /// Returns None if file doesn't exist, logs warning on parse errors
    pub fn load_from_default_path() -> Option<Self> {
        let path = Self::default_path()?;
        if path.exists() {
            match Self::load(&path) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("{:#}. Using defaults.", e);
                    None
                }
            }
        } else {
            None
        }
    }

    /// Initialize default config file at XDG path, returns the path
    pub fn init_default_config() -> Result<PathBuf> {
        let path = Self::default_path()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(&path, Self::generate_config_template())?;

        Ok(path)
    }

    /// Generate a commented TOML config template
    pub fn generate_config_template() -> String {
        r##"# Coverwall Configuration
# This file is auto-generated. Edit as needed.

[customization]
# Base background color
background_color = "#000000"
# Gradient end color (omit to use the cover's dominant color)
# accent_color = "#1db954"
# How far the gradient moves toward the accent (0.0-1.0)
gradient_strength = 1.0
# Gradient direction: "vertical" or "horizontal"
gradient_direction = "vertical"
# Text color: "light" or "dark"
text_color = "light"
# Darken the edges
vignette_enabled = true
# Vignette strength at the edges (0.0-1.0)
vignette_intensity = 0.4
# Draw the palette swatches
show_palette = true

[spotify]
# Access token for the Web API. Without one, metadata comes from oEmbed and
# the duration is not shown. SPOTIFY_ACCESS_TOKEN overrides this value.
# access_token = ""
# market = "US"
api_base = "https://api.spotify.com/v1"
oembed_url = "https://open.spotify.com/oembed"

[loader]
# User-Agent for metadata and image requests (defaults to coverwall/<version>)
# user_agent = "coverwall"
# Request timeout in seconds (omit to wait indefinitely)
# timeout_secs = 30

[palette]
# Sample every n-th pixel of the cover
quality = 10
# Number of swatches (at most 5)
max_colors = 5

[output]
# Directory for generated wallpapers (omit for the current directory)
# directory = "~/Pictures/wallpapers"
"##
        .to_string()
    }

    /// Apply `SPOTIFY_ACCESS_TOKEN` if set
    pub fn apply_env(&mut self) {
        self.apply_token(std::env::var(TOKEN_ENV).ok());
    }

    fn apply_token(&mut self, token: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.spotify.access_token = Some(token);
        }
    }

    /// Merge CLI arguments into config (CLI takes priority)
    pub fn merge_args(&mut self, args: &GenerateArgs) {
        let c = &mut self.customization;
        if let Some(bg) = args.bg {
            c.background_color = bg;
        }
        if let Some(accent) = args.accent {
            c.accent_color = Some(accent);
        }
        if let Some(strength) = args.gradient_strength {
            c.gradient_strength = strength;
        }
        if let Some(direction) = args.gradient_direction {
            c.gradient_direction = direction;
        }
        if let Some(text) = args.text_color {
            c.text_color = text;
        }
        if args.no_vignette {
            c.vignette_enabled = false;
        }
        if let Some(intensity) = args.vignette_intensity {
            c.vignette_intensity = intensity;
        }
        if args.hide_palette {
            c.show_palette = false;
        }
        self.customization = self.customization.clone().clamped();

        if let Some(ref token) = args.token {
            self.spotify.access_token = Some(token.clone());
        }
        if let Some(quality) = args.quality {
            self.palette.quality = quality.max(1);
        }
    }
}
