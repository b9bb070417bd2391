//! Anonymous lookups through the public oEmbed endpoint.

use reqwest::Client;
use serde::Deserialize;

use super::{MetadataSource, MusicLink, TrackDescriptor};
use crate::error::MetadataError;

pub const OEMBED_URL: &str = "https://open.spotify.com/oembed";

const UNKNOWN_TITLE: &str = "Unknown Title";
const UNKNOWN_ARTIST: &str = "Unknown Artist";

#[derive(Debug, Deserialize, Default)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
}

/// Strip a leading "by" (any case) followed by whitespace from an oEmbed
/// author line.
fn clean_author(author: &str) -> &str {
    let trimmed = author.trim_start();
    match (trimmed.get(..2), trimmed.get(2..)) {
        (Some(prefix), Some(rest))
            if prefix.eq_ignore_ascii_case("by") && rest.starts_with(char::is_whitespace) =>
        {
            rest.trim_start()
        }
        _ => trimmed,
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn into_descriptor(link: &MusicLink, data: OEmbedResponse) -> TrackDescriptor {
    let author = non_empty(data.author_name);
    TrackDescriptor {
        kind: link.kind,
        id: link.id.clone(),
        title: non_empty(data.title).unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
        subtitle: clean_author(author.as_deref().unwrap_or(UNKNOWN_ARTIST)).to_string(),
        // oEmbed carries no length
        duration_ms: None,
        cover_image_url: data.thumbnail_url.unwrap_or_default(),
        canonical_url: link.canonical_url(),
    }
}

pub struct OEmbed {
    client: Client,
    endpoint: String,
}

impl OEmbed {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

impl MetadataSource for OEmbed {
    async fn fetch_track_descriptor(&self, link: &MusicLink) -> Result<TrackDescriptor, MetadataError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("url", link.canonical_url())])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(MetadataError::Status(response.status().as_u16()));
        }
        let data: OEmbedResponse = response
            .json()
            .await
            .map_err(|e| MetadataError::Decode(e.to_string()))?;
        Ok(into_descriptor(link, data))
    }
}
