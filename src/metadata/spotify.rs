//! Authenticated Web API lookups.

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use super::{MetadataSource, MusicKind, MusicLink, TrackDescriptor};
use crate::error::MetadataError;

pub const API_BASE: &str = "https://api.spotify.com/v1";

#[derive(Deserialize)]
struct Artist {
    name: String,
}

#[derive(Deserialize)]
struct Image {
    url: String,
}

#[derive(Deserialize, Default)]
struct ExternalUrls {
    spotify: Option<String>,
}

#[derive(Deserialize)]
struct AlbumRef {
    #[serde(default)]
    images: Vec<Image>,
}

#[derive(Deserialize)]
struct TrackResponse {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    duration_ms: u64,
    album: AlbumRef,
    #[serde(default)]
    external_urls: ExternalUrls,
}

#[derive(Deserialize)]
struct TrackItem {
    duration_ms: u64,
}

#[derive(Deserialize)]
struct TrackPage {
    #[serde(default)]
    items: Vec<TrackItem>,
    next: Option<String>,
}

#[derive(Deserialize)]
struct AlbumResponse {
    id: String,
    name: String,
    #[serde(default)]
    artists: Vec<Artist>,
    #[serde(default)]
    images: Vec<Image>,
    tracks: TrackPage,
    #[serde(default)]
    external_urls: ExternalUrls,
}

fn join_artists(artists: &[Artist]) -> String {
    artists.iter().map(|a| a.name.as_str()).collect::<Vec<_>>().join(", ")
}

fn page_duration(page: &TrackPage) -> u64 {
    page.items.iter().map(|t| t.duration_ms).sum()
}

/// Bearer-token client for `/tracks` and `/albums`.
pub struct SpotifyApi {
    client: Client,
    base: String,
    token: String,
    market: Option<String>,
}

impl SpotifyApi {
    pub fn new(client: Client, base: &str, token: &str, market: Option<String>) -> Self {
        Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            token: token.to_string(),
            market,
        }
    }

    /// Authorized GET. `market` is only added to the first request of a
    /// lookup; pagination URLs already carry their own query.
    fn request(&self, url: &str, first_page: bool) -> RequestBuilder {
        let request = self.client.get(url).bearer_auth(&self.token);
        match &self.market {
            Some(market) if first_page => request.query(&[("market", market)]),
            _ => request,
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str, first_page: bool) -> Result<T, MetadataError> {
        let response = self.request(url, first_page).send().await?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(MetadataError::Unauthorized),
            s if !s.is_success() => return Err(MetadataError::Status(s.as_u16())),
            _ => {}
        }

        response
            .json::<T>()
            .await
            .map_err(|e| MetadataError::Decode(e.to_string()))
    }

    pub async fn get_track(&self, id: &str) -> Result<TrackDescriptor, MetadataError> {
        let data: TrackResponse = self.get_json(&format!("{}/tracks/{}", self.base, id), true).await?;
        let canonical_url = data
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/track/{}", data.id));

        Ok(TrackDescriptor {
            kind: MusicKind::Track,
            subtitle: join_artists(&data.artists),
            duration_ms: Some(data.duration_ms),
            cover_image_url: data.album.images.into_iter().next().map(|i| i.url).unwrap_or_default(),
            id: data.id,
            title: data.name,
            canonical_url,
        })
    }

    /// Album length is the sum over every track, following pagination.
    pub async fn get_album(&self, id: &str) -> Result<TrackDescriptor, MetadataError> {
        let data: AlbumResponse = self.get_json(&format!("{}/albums/{}", self.base, id), true).await?;

        let mut total_ms = page_duration(&data.tracks);
        let mut next = data.tracks.next.clone();
        while let Some(url) = next {
            debug!("Fetching next album track page: {}", url);
            let page: TrackPage = self.get_json(&url, false).await?;
            total_ms += page_duration(&page);
            next = page.next;
        }

        let canonical_url = data
            .external_urls
            .spotify
            .unwrap_or_else(|| format!("https://open.spotify.com/album/{}", data.id));

        Ok(TrackDescriptor {
            kind: MusicKind::Album,
            subtitle: join_artists(&data.artists),
            duration_ms: Some(total_ms),
            cover_image_url: data.images.into_iter().next().map(|i| i.url).unwrap_or_default(),
            id: data.id,
            title: data.name,
            canonical_url,
        })
    }
}

impl MetadataSource for SpotifyApi {
    async fn fetch_track_descriptor(&self, link: &MusicLink) -> Result<TrackDescriptor, MetadataError> {
        match link.kind {
            MusicKind::Track => self.get_track(&link.id).await,
            MusicKind::Album => self.get_album(&link.id).await,
        }
    }
}
