//! Transcript retrieval for YouTube videos.
//!
//! Provides a trait-based interface over the transcript service so the
//! pipeline can run against canned transcripts in tests.

mod youtube;

pub use youtube::YoutubeTranscriptSource;

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One caption line with its timing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptSegment {
    /// Caption text.
    pub text: String,
    /// Start time in seconds.
    pub start_seconds: f64,
    /// Display duration in seconds.
    pub duration_seconds: f64,
}

impl TranscriptSegment {
    pub fn new(start_seconds: f64, duration_seconds: f64, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            start_seconds,
            duration_seconds,
        }
    }
}

/// A complete transcript for one video.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(from = "TranscriptRecord")]
pub struct Transcript {
    /// Video ID this transcript belongs to.
    pub video_id: String,
    /// Human-readable language name (e.g. "English (auto-generated)").
    pub language: String,
    /// Language code (e.g. "en").
    pub language_code: String,
    /// Whether the captions were generated automatically.
    pub is_generated: bool,
    /// Individual caption segments.
    pub segments: Vec<TranscriptSegment>,
    /// Segment texts joined with single spaces.
    pub text: String,
    /// Byte offset in `text` at which each segment starts.
    #[serde(skip)]
    segment_offsets: Vec<usize>,
}

impl Transcript {
    /// Create a transcript from caption segments.
    pub fn new(
        video_id: impl Into<String>,
        language: impl Into<String>,
        language_code: impl Into<String>,
        is_generated: bool,
        segments: Vec<TranscriptSegment>,
    ) -> Self {
        let mut text = String::new();
        let mut segment_offsets = Vec::with_capacity(segments.len());

        for segment in &segments {
            if !text.is_empty() {
                text.push(' ');
            }
            segment_offsets.push(text.len());
            text.push_str(&segment.text);
        }

        Self {
            video_id: video_id.into(),
            language: language.into(),
            language_code: language_code.into(),
            is_generated,
            segments,
            text,
            segment_offsets,
        }
    }

    /// Whether the flattened text is blank.
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Total duration in seconds.
    pub fn duration_seconds(&self) -> f64 {
        self.segments
            .last()
            .map(|s| s.start_seconds + s.duration_seconds)
            .unwrap_or(0.0)
    }

    /// Video time at which the given byte offset of `text` is spoken.
    pub fn seconds_at_offset(&self, offset: usize) -> f64 {
        let idx = self.segment_offsets.partition_point(|&start| start <= offset);
        if idx == 0 {
            return self.segments.first().map(|s| s.start_seconds).unwrap_or(0.0);
        }
        self.segments[idx - 1].start_seconds
    }
}

/// Serialized form; the flattened text and offsets are rebuilt from segments.
#[derive(Deserialize)]
struct TranscriptRecord {
    video_id: String,
    language: String,
    language_code: String,
    is_generated: bool,
    segments: Vec<TranscriptSegment>,
}

impl From<TranscriptRecord> for Transcript {
    fn from(record: TranscriptRecord) -> Self {
        Transcript::new(
            record.video_id,
            record.language,
            record.language_code,
            record.is_generated,
            record.segments,
        )
    }
}

/// Trait for transcript providers.
#[async_trait]
pub trait TranscriptSource: Send + Sync {
    /// Fetch the transcript of a video, trying `languages` in order.
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript>;
}
