//! Track and album metadata resolution.
//!
//! Two sources exist: the authenticated Web API, which knows durations, and
//! the anonymous oEmbed endpoint, which does not. [`Resolver`] picks one
//! based on whether an access token is configured.

pub mod link;
pub mod oembed;
pub mod spotify;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::MetadataError;

pub use link::{code_image_url, parse_link, MusicLink};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MusicKind {
    Track,
    Album,
}

impl MusicKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MusicKind::Track => "track",
            MusicKind::Album => "album",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "track" => Some(MusicKind::Track),
            "album" => Some(MusicKind::Album),
            _ => None,
        }
    }
}

/// Resolved metadata for one track or album.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackDescriptor {
    pub kind: MusicKind,
    pub id: String,
    pub title: String,
    /// Artist names, comma separated
    pub subtitle: String,
    /// `None` when the source cannot report a length
    pub duration_ms: Option<u64>,
    pub cover_image_url: String,
    pub canonical_url: String,
}

/// Anything that can turn a link into a [`TrackDescriptor`].
#[allow(async_fn_in_trait)]
pub trait MetadataSource {
    async fn fetch_track_descriptor(&self, link: &MusicLink) -> Result<TrackDescriptor, MetadataError>;
}

/// Web API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SpotifyConfig {
    /// Bearer token; `SPOTIFY_ACCESS_TOKEN` takes priority
    pub access_token: Option<String>,
    pub market: Option<String>,
    pub api_base: String,
    pub oembed_url: String,
}

impl Default for SpotifyConfig {
    fn default() -> Self {
        Self {
            access_token: None,
            market: None,
            api_base: spotify::API_BASE.to_string(),
            oembed_url: oembed::OEMBED_URL.to_string(),
        }
    }
}

impl SpotifyConfig {
    pub fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Chooses the API when authenticated, oEmbed otherwise.
pub enum Resolver {
    Api(spotify::SpotifyApi),
    OEmbed(oembed::OEmbed),
}

impl Resolver {
    pub fn new(client: Client, config: &SpotifyConfig) -> Self {
        match config.access_token() {
            Some(token) => {
                debug!("Using authenticated metadata source");
                Resolver::Api(spotify::SpotifyApi::new(
                    client,
                    &config.api_base,
                    token,
                    config.market.clone(),
                ))
            }
            None => {
                debug!("No access token, using oEmbed metadata");
                Resolver::OEmbed(oembed::OEmbed::new(client, &config.oembed_url))
            }
        }
    }
}

impl MetadataSource for Resolver {
    async fn fetch_track_descriptor(&self, link: &MusicLink) -> Result<TrackDescriptor, MetadataError> {
        let track = match self {
            Resolver::Api(api) => api.fetch_track_descriptor(link).await?,
            Resolver::OEmbed(oembed) => oembed.fetch_track_descriptor(link).await?,
        };
        if track.cover_image_url.trim().is_empty() {
            return Err(MetadataError::MissingCover);
        }
        info!("Resolved {} \"{}\" by {}", track.kind.as_str(), track.title, track.subtitle);
        Ok(track)
    }
}
