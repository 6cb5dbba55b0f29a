use thiserror::Error;
use url::Url;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum MediaError {
    #[error("media URL cannot be empty")]
    EmptyUrl,

    #[error("media URL is not a valid URL: {0}")]
    InvalidUrl(String),
}

//
// ─── MEDIA REFERENCE ───────────────────────────────────────────────────────────
//

/// An optional illustration attached to a question or content step.
///
/// The core never fetches or inspects the referenced resource; the URL is
/// validated for shape at construction and then carried around as opaque data
/// for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRef {
    Image(Url),
    Video(Url),
}

impl MediaRef {
    /// Builds an image reference from a URL string.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if the string is empty or not a parseable URL.
    pub fn image(url: impl AsRef<str>) -> Result<Self, MediaError> {
        Ok(Self::Image(parse_url(url.as_ref())?))
    }

    /// Builds a video reference from a URL string.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if the string is empty or not a parseable URL.
    pub fn video(url: impl AsRef<str>) -> Result<Self, MediaError> {
        Ok(Self::Video(parse_url(url.as_ref())?))
    }

    /// Returns the underlying URL regardless of kind.
    #[must_use]
    pub fn url(&self) -> &Url {
        match self {
            MediaRef::Image(u) | MediaRef::Video(u) => u,
        }
    }

    #[must_use]
    pub fn is_image(&self) -> bool {
        matches!(self, MediaRef::Image(_))
    }

    #[must_use]
    pub fn is_video(&self) -> bool {
        matches!(self, MediaRef::Video(_))
    }
}

fn parse_url(raw: &str) -> Result<Url, MediaError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(MediaError::EmptyUrl);
    }
    Url::parse(trimmed).map_err(|_| MediaError::InvalidUrl(trimmed.to_owned()))
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_accepts_valid_url() {
        let media = MediaRef::image("https://example.org/aedes.jpeg").unwrap();
        assert!(media.is_image());
        assert_eq!(media.url().as_str(), "https://example.org/aedes.jpeg");
    }

    #[test]
    fn video_rejects_empty_url() {
        let err = MediaRef::video("   ").unwrap_err();
        assert_eq!(err, MediaError::EmptyUrl);
    }

    #[test]
    fn rejects_garbage_url() {
        let err = MediaRef::image("not a url").unwrap_err();
        assert!(matches!(err, MediaError::InvalidUrl(_)));
    }
}
