//! End-to-end wallpaper generation: link → metadata → palette → render → PNG.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use crate::color::Color;
use crate::config::{Config, CustomizationConfig};
use crate::descriptor::RenderDescriptor;
use crate::error::MetadataError;
use crate::loader::{build_client, CachingImageLoader, HttpImageLoader, ImageLoader};
use crate::metadata::{code_image_url, parse_link, MetadataSource, Resolver, TrackDescriptor};
use crate::quantize::{extract_palette, PaletteOptions};
use crate::renderer::pipeline::WallpaperRenderer;
use crate::renderer::Canvas;

/// What was generated, for the final console summary.
#[derive(Debug, Clone)]
pub struct Summary {
    pub title: String,
    pub artist: String,
    pub duration: String,
    pub dominant: Color,
    pub path: PathBuf,
}

/// A renderer bound to one loaded descriptor. The descriptor can be rendered
/// again with different customization without refetching anything.
pub struct Session<L> {
    loader: L,
    renderer: WallpaperRenderer,
    descriptor: Option<RenderDescriptor>,
}

impl<L: ImageLoader> Session<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            renderer: WallpaperRenderer::default(),
            descriptor: None,
        }
    }

    /// Load the cover, extract its palette and build the render descriptor.
    pub async fn prepare(
        &mut self,
        track: &TrackDescriptor,
        code_url: impl Into<String>,
        palette: &PaletteOptions,
    ) -> Result<&RenderDescriptor> {
        let cover = self.loader.load(&track.cover_image_url).await?;
        let palette = extract_palette(&cover, palette)?;
        info!(
            "Palette: dominant {} and {} swatches",
            palette.dominant,
            palette.swatches.len()
        );
        let descriptor = RenderDescriptor::assemble(track, &palette, code_url)?;
        Ok(self.descriptor.insert(descriptor))
    }

    pub fn descriptor(&self) -> Option<&RenderDescriptor> {
        self.descriptor.as_ref()
    }

    /// Render the prepared descriptor onto a freshly reset surface.
    pub async fn render(&mut self, customization: &CustomizationConfig) -> Result<&Canvas> {
        let descriptor = self
            .descriptor
            .as_ref()
            .context("nothing to render, prepare a descriptor first")?;
        self.renderer.reset();
        self.renderer
            .render_wallpaper(&self.loader, descriptor, customization)
            .await?;
        Ok(self.renderer.canvas())
    }
}

/// Resolve `link`, render it with `config` and write the PNG.
pub async fn generate(link: &str, config: &Config, output: Option<&Path>) -> Result<Summary> {
    let parsed = parse_link(link).ok_or_else(|| MetadataError::InvalidLink(link.to_string()))?;
    let client = build_client(&config.loader).context("failed to build HTTP client")?;

    let resolver = Resolver::new(client.clone(), &config.spotify);
    let track = resolver.fetch_track_descriptor(&parsed).await?;

    let mut session = Session::new(CachingImageLoader::new(HttpImageLoader::new(client)));
    let descriptor = session
        .prepare(&track, code_image_url(&parsed), &config.palette)
        .await?
        .clone();

    let path = match output {
        Some(path) => path.to_path_buf(),
        None => default_output_path(config.output.directory.as_deref(), &descriptor.title),
    };

    let canvas = session.render(&config.customization).await?;
    canvas.save_png(&path)?;
    info!("Saved {}", path.display());

    Ok(Summary {
        title: descriptor.title,
        artist: descriptor.subtitle,
        duration: descriptor.duration.as_str().to_string(),
        dominant: descriptor.dominant,
        path,
    })
}

/// `spotify-wallpaper-<title>.png` with every non-alphanumeric character of
/// the title replaced by `-`.
pub fn default_output_path(directory: Option<&Path>, title: &str) -> PathBuf {
    let slug: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    let name = format!("spotify-wallpaper-{}.png", slug);
    match directory {
        Some(dir) => dir.join(name),
        None => PathBuf::from(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_is_sanitized() {
        assert_eq!(
            default_output_path(None, "Midnight City"),
            PathBuf::from("spotify-wallpaper-Midnight-City.png")
        );
        assert_eq!(
            default_output_path(Some(Path::new("/tmp/walls")), "AC/DC: Live!"),
            PathBuf::from("/tmp/walls/spotify-wallpaper-AC-DC--Live-.png")
        );
    }

    #[tokio::test]
    async fn invalid_link_is_rejected_before_any_request() {
        let err = generate("https://example.com/track/abc", &Config::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::InvalidLink(_))
        ));
    }
}
