use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use thiserror::Error;
use tracing::warn;

/// File extensions accepted as directly addressable media without a URL scheme
const MEDIA_EXTENSIONS: &[&str] = &["mp4", "webm", "ogg", "ogv", "mov", "m4v", "mkv", "m3u8"];

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SourceParseError {
    #[error("Empty media URL")]
    Empty,
    #[error("Unrecognized media URL: {0}")]
    Unrecognized(String),
}

/// Where a video is played from
///
/// Decided once per content item from its URL. Embedded streams are driven
/// through the streaming platform's player API, direct files through a native
/// media element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaybackSource {
    EmbeddedStream { video_id: String },
    DirectFile { url: String },
}

fn embedded_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"(?:youtube\.com/(?:[^/\s]+/\S+/|(?:v|e(?:mbed)?)/|\S*?[?&]v=)|youtu\.be/)([a-zA-Z0-9_-]{11})",
        )
        .expect("embedded stream pattern is valid")
    })
}

impl PlaybackSource {
    /// Classify a media URL
    pub fn parse(url: &str) -> Result<Self, SourceParseError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(SourceParseError::Empty);
        }

        if let Some(captures) = embedded_pattern().captures(url) {
            return Ok(PlaybackSource::EmbeddedStream {
                video_id: captures[1].to_string(),
            });
        }

        if is_direct_file(url) {
            return Ok(PlaybackSource::DirectFile {
                url: url.to_string(),
            });
        }

        Err(SourceParseError::Unrecognized(url.to_string()))
    }

    /// Classify a media URL, treating anything unrecognized as a direct file
    pub fn detect(url: &str) -> Self {
        match Self::parse(url) {
            Ok(source) => source,
            Err(e) => {
                warn!("{}, falling back to direct file playback", e);
                PlaybackSource::DirectFile {
                    url: url.trim().to_string(),
                }
            }
        }
    }

    pub fn is_embedded(&self) -> bool {
        matches!(self, PlaybackSource::EmbeddedStream { .. })
    }
}

fn is_direct_file(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("file://")
    {
        return true;
    }

    // Relative or rooted paths need a recognizable media extension
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    match path.rsplit_once('.') {
        Some((_, ext)) => MEDIA_EXTENSIONS.contains(&ext),
        None => false,
    }
}
