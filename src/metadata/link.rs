use super::MusicKind;

const OPEN_HOST: &str = "open.spotify.com/";
const CODE_BASE: &str = "https://scannables.scdn.co/uri/plain/png";

/// A parsed track or album reference.
#[derive(Debug, Clone, PartialEq)]
pub struct MusicLink {
    pub kind: MusicKind,
    pub id: String,
}

impl MusicLink {
    /// `spotify:{kind}:{id}`
    pub fn uri(&self) -> String {
        format!("spotify:{}:{}", self.kind.as_str(), self.id)
    }

    pub fn canonical_url(&self) -> String {
        format!("https://{}{}/{}", OPEN_HOST, self.kind.as_str(), self.id)
    }
}

fn valid_id(id: &str) -> bool {
    !id.is_empty() && id.chars().all(|c| c.is_ascii_alphanumeric())
}

/// Parse an `open.spotify.com` URL or a `spotify:` URI.
///
/// Query strings and locale path segments (`/intl-pt/`) are tolerated.
pub fn parse_link(input: &str) -> Option<MusicLink> {
    let input = input.trim();

    if let Some(rest) = input.strip_prefix("spotify:") {
        let mut parts = rest.split(':');
        let kind = MusicKind::parse(parts.next()?)?;
        let id = parts.next()?;
        if parts.next().is_some() || !valid_id(id) {
            return None;
        }
        return Some(MusicLink { kind, id: id.to_string() });
    }

    let start = input.find(OPEN_HOST)? + OPEN_HOST.len();
    let path = input[start..].split(['?', '#']).next()?;
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    segments.windows(2).find_map(|pair| {
        let kind = MusicKind::parse(pair[0])?;
        // The id runs until the first non-alphanumeric character.
        let id: String = pair[1].chars().take_while(|c| c.is_ascii_alphanumeric()).collect();
        valid_id(&id).then_some(MusicLink { kind, id })
    })
}

/// URL of the scannable code image: white bars on black, 640px wide.
pub fn code_image_url(link: &MusicLink) -> String {
    format!(
        "{}/000000/white/640/{}",
        CODE_BASE,
        urlencoding::encode(&link.uri())
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_track_and_album_urls() {
        let link = parse_link("https://open.spotify.com/track/1eyzqe2QqGZUmfcPZtrIyt?si=abc").unwrap();
        assert_eq!(link.kind, MusicKind::Track);
        assert_eq!(link.id, "1eyzqe2QqGZUmfcPZtrIyt");

        let link = parse_link("https://open.spotify.com/intl-pt/album/3JfSxDfmwS5OeHPwLSkrfr").unwrap();
        assert_eq!(link.kind, MusicKind::Album);
        assert_eq!(link.canonical_url(), "https://open.spotify.com/album/3JfSxDfmwS5OeHPwLSkrfr");
    }

    #[test]
    fn parses_uris() {
        let link = parse_link("spotify:album:3JfSxDfmwS5OeHPwLSkrfr").unwrap();
        assert_eq!(link.uri(), "spotify:album:3JfSxDfmwS5OeHPwLSkrfr");
        assert!(parse_link("spotify:artist:abc").is_none());
        assert!(parse_link("spotify:track:").is_none());
        assert!(parse_link("spotify:track:a:b").is_none());
    }

    #[test]
    fn rejects_other_links() {
        assert!(parse_link("").is_none());
        assert!(parse_link("https://example.com/track/abc").is_none());
        assert!(parse_link("https://open.spotify.com/playlist/abc").is_none());
        assert!(parse_link("https://open.spotify.com/track/").is_none());
    }

    #[test]
    fn code_url_encodes_the_uri() {
        let link = MusicLink { kind: MusicKind::Track, id: "abc123".into() };
        assert_eq!(
            code_image_url(&link),
            "https://scannables.scdn.co/uri/plain/png/000000/white/640/spotify%3Atrack%3Aabc123"
        );
    }
}
