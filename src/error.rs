use thiserror::Error;

/// Failures surfaced by the composition pipeline and its leaf components.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Pixel data could not be sampled for palette extraction.
    #[error("could not sample image pixels: {0}")]
    ImageDecode(String),

    /// A remote or local image could not be fetched or decoded.
    #[error("could not load image {url}: {reason}")]
    ImageLoad { url: String, reason: String },

    /// The drawing surface cannot measure text. Not expected at runtime.
    #[error("text measurement unavailable: {0}")]
    Measurement(String),
}

impl RenderError {
    pub fn image_load(url: impl Into<String>, reason: impl ToString) -> Self {
        RenderError::ImageLoad {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

/// Failures of the metadata collaborator.
#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("not a track or album link: {0}")]
    InvalidLink(String),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API returned status {0}")]
    Status(u16),

    #[error("access token rejected or expired, log in again")]
    Unauthorized,

    #[error("album cover not found")]
    MissingCover,

    #[error("unexpected response: {0}")]
    Decode(String),
}

/// Rejected `RenderDescriptor` construction.
#[derive(Debug, Error, PartialEq)]
pub enum DescriptorError {
    #[error("missing required field `{0}`")]
    MissingField(&'static str),
}
