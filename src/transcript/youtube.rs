//! YouTube transcript source backed by `yt-transcript-rs`.

use super::{Transcript, TranscriptSegment, TranscriptSource};
use crate::error::{Result, TubechatError};
use async_trait::async_trait;
use tracing::{debug, instrument};
use yt_transcript_rs::api::YouTubeTranscriptApi;
use yt_transcript_rs::errors::{CouldNotRetrieveTranscript, CouldNotRetrieveTranscriptReason};

/// Fetches captions from YouTube.
pub struct YoutubeTranscriptSource {
    api: YouTubeTranscriptApi,
    preserve_formatting: bool,
}

impl YoutubeTranscriptSource {
    /// Create a new source without proxy or cookie authentication.
    pub fn new(preserve_formatting: bool) -> Result<Self> {
        let api = YouTubeTranscriptApi::new(None, None, None).map_err(|e| {
            TubechatError::Transcript(format!("Failed to initialize transcript client: {}", e))
        })?;

        Ok(Self {
            api,
            preserve_formatting,
        })
    }
}

#[async_trait]
impl TranscriptSource for YoutubeTranscriptSource {
    #[instrument(skip(self))]
    async fn fetch(&self, video_id: &str, languages: &[String]) -> Result<Transcript> {
        let langs: Vec<&str> = languages.iter().map(String::as_str).collect();

        let fetched = self
            .api
            .fetch_transcript(video_id, &langs, self.preserve_formatting)
            .await
            .map_err(|e| classify_error(video_id, languages, e))?;

        debug!(
            "Fetched {} snippets ({}, generated: {})",
            fetched.snippets.len(),
            fetched.language_code,
            fetched.is_generated
        );

        let segments = fetched
            .snippets
            .iter()
            .map(|s| TranscriptSegment::new(s.start, s.duration, s.text.trim()))
            .filter(|s| !s.text.is_empty())
            .collect();

        let transcript = Transcript::new(
            video_id,
            fetched.language.clone(),
            fetched.language_code.clone(),
            fetched.is_generated,
            segments,
        );

        if transcript.is_blank() {
            return Err(TubechatError::Transcript(
                "Empty transcript retrieved".to_string(),
            ));
        }

        Ok(transcript)
    }
}

/// Why captions could not be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FetchFailure {
    CaptionsDisabled,
    LanguageUnavailable,
    Other,
}

fn failure_kind(err: &CouldNotRetrieveTranscript) -> FetchFailure {
    match &err.reason {
        Some(CouldNotRetrieveTranscriptReason::TranscriptsDisabled) => FetchFailure::CaptionsDisabled,
        Some(CouldNotRetrieveTranscriptReason::NoTranscriptFound { .. }) => {
            FetchFailure::LanguageUnavailable
        }
        _ => FetchFailure::Other,
    }
}

fn failure_error(
    kind: FetchFailure,
    video_id: &str,
    languages: &[String],
    detail: &dyn std::fmt::Display,
) -> TubechatError {
    match kind {
        FetchFailure::CaptionsDisabled => TubechatError::TranscriptsDisabled(video_id.to_string()),
        FetchFailure::LanguageUnavailable => TubechatError::NoTranscriptFound(languages.join(", ")),
        FetchFailure::Other => {
            TubechatError::Transcript(format!("Error retrieving transcript: {}", detail))
        }
    }
}

fn classify_error(
    video_id: &str,
    languages: &[String],
    err: CouldNotRetrieveTranscript,
) -> TubechatError {
    failure_error(failure_kind(&err), video_id, languages, &err)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn langs() -> Vec<String> {
        vec!["de".to_string(), "en".to_string()]
    }

    #[test]
    fn test_disabled_captions() {
        let err = CouldNotRetrieveTranscript {
            video_id: "dQw4w9WgXcQ".to_string(),
            reason: Some(CouldNotRetrieveTranscriptReason::TranscriptsDisabled),
        };
        assert_eq!(failure_kind(&err), FetchFailure::CaptionsDisabled);
        assert!(matches!(
            classify_error("dQw4w9WgXcQ", &langs(), err),
            TubechatError::TranscriptsDisabled(ref id) if id == "dQw4w9WgXcQ"
        ));
    }

    #[test]
    fn test_unknown_reason() {
        let err = CouldNotRetrieveTranscript {
            video_id: "dQw4w9WgXcQ".to_string(),
            reason: None,
        };
        assert_eq!(failure_kind(&err), FetchFailure::Other);
        assert!(matches!(
            classify_error("dQw4w9WgXcQ", &langs(), err),
            TubechatError::Transcript(_)
        ));
    }

    #[test]
    fn test_missing_language_lists_requested() {
        let err = failure_error(FetchFailure::LanguageUnavailable, "dQw4w9WgXcQ", &langs(), &"none");
        assert!(matches!(err, TubechatError::NoTranscriptFound(ref l) if l == "de, en"));
        assert!(err.to_string().contains("de, en"));
    }
}
