//! YouTube video references.
//!
//! Validates user input and extracts the 11-character video ID from the URL
//! shapes YouTube hands out.

use crate::error::{Result, TubechatError};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use url::Url;

static VIDEO_URL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^
        (?:https?://)?
        (?:www\.|m\.)?
        (?:
            youtube\.com/(?:watch\?(?:[^\#]*&)?v=|embed/|v/|shorts/)
            |
            youtu\.be/
        )
        ([a-zA-Z0-9_-]{11})
        (?:[^a-zA-Z0-9_-]|$)
    ",
    )
    .expect("Invalid regex")
});

static VIDEO_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9_-]{11}$").expect("Invalid regex"));

/// A validated YouTube video.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoRef {
    /// The 11-character video ID.
    pub id: String,
}

impl VideoRef {
    /// Parse a YouTube URL or bare video ID.
    pub fn parse(input: &str) -> Result<Self> {
        extract_video_id(input)
            .map(|id| Self { id })
            .ok_or_else(|| {
                TubechatError::InvalidInput("Invalid YouTube URL or video ID format".to_string())
            })
    }

    /// Canonical watch URL.
    pub fn watch_url(&self) -> String {
        format!("https://www.youtube.com/watch?v={}", self.id)
    }

    /// Watch URL that starts playback at the given offset.
    pub fn url_at(&self, seconds: f64) -> String {
        let offset = format!("{}s", seconds.max(0.0) as u32);
        Url::parse_with_params(
            "https://www.youtube.com/watch",
            &[("v", self.id.as_str()), ("t", offset.as_str())],
        )
        .map(|u| u.to_string())
        .unwrap_or_else(|_| self.watch_url())
    }
}

impl std::fmt::Display for VideoRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Check whether the input looks like a YouTube URL or video ID.
pub fn validate_youtube_url(input: &str) -> bool {
    extract_video_id(input).is_some()
}

/// Extract the video ID from a YouTube URL or bare ID.
pub fn extract_video_id(input: &str) -> Option<String> {
    let input = input.trim();

    if VIDEO_ID_REGEX.is_match(input) {
        return Some(input.to_string());
    }

    VIDEO_URL_REGEX
        .captures(input)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
