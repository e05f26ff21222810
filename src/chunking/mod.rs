//! Transcript chunking.
//!
//! Splits the flattened transcript into fixed-size, overlapping windows
//! that break on the most meaningful boundary available (sentence, word,
//! then character).

use crate::config::ChunkingSettings;
use crate::error::{Result, TubechatError};
use crate::transcript::Transcript;
use serde::{Deserialize, Serialize};
use text_splitter::{ChunkConfig, TextSplitter};

/// A chunk of transcript text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Text content of this chunk.
    pub content: String,
    /// Byte offset of the chunk in the flattened transcript.
    pub start_offset: usize,
    /// Video time at which the chunk begins.
    pub start_seconds: f64,
    /// Order of this chunk in the transcript.
    pub order: usize,
}

impl Chunk {
    /// Format the start time for display.
    pub fn format_timestamp(&self) -> String {
        format_timestamp(self.start_seconds)
    }
}

/// Format seconds as MM:SS or HH:MM:SS.
pub fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0) as u32;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// Character-window chunker.
pub struct TextChunker {
    splitter: TextSplitter<text_splitter::Characters>,
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextChunker {
    /// Create a chunker producing chunks of at most `chunk_size` characters,
    /// with `chunk_overlap` characters shared between neighbours.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(TubechatError::Config(
                "chunk_size must be greater than zero".to_string(),
            ));
        }
        if chunk_overlap >= chunk_size {
            return Err(TubechatError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                chunk_overlap, chunk_size
            )));
        }

        let config = ChunkConfig::new(chunk_size)
            .with_overlap(chunk_overlap)
            .map_err(|e| TubechatError::Config(e.to_string()))?;

        Ok(Self {
            splitter: TextSplitter::new(config),
            chunk_size,
            chunk_overlap,
        })
    }

    /// Create a chunker from settings.
    pub fn from_settings(settings: &ChunkingSettings) -> Result<Self> {
        Self::new(settings.chunk_size, settings.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split a transcript into chunks.
    pub fn chunk(&self, transcript: &Transcript) -> Vec<Chunk> {
        self.splitter
            .chunk_indices(&transcript.text)
            .enumerate()
            .map(|(order, (offset, text))| Chunk {
                content: text.to_string(),
                start_offset: offset,
                start_seconds: transcript.seconds_at_offset(offset),
                order,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::TranscriptSegment;

    fn transcript_of(lines: &[&str]) -> Transcript {
        let segments = lines
            .iter()
            .enumerate()
            .map(|(i, l)| TranscriptSegment::new(i as f64 * 4.0, 4.0, *l))
            .collect();
        Transcript::new("dQw4w9WgXcQ", "English", "en", false, segments)
    }

    #[test]
    fn test_rejects_bad_config() {
        assert!(matches!(
            TextChunker::new(0, 0),
            Err(TubechatError::Config(_))
        ));
        assert!(matches!(
            TextChunker::new(100, 100),
            Err(TubechatError::Config(_))
        ));
        assert!(TextChunker::new(100, 20).is_ok());
    }

    #[test]
    fn test_chunks_respect_size() {
        let lines: Vec<String> = (0..60)
            .map(|i| format!("This is caption line number {} of the talk.", i))
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let transcript = transcript_of(&refs);

        let chunker = TextChunker::new(200, 40).unwrap();
        let chunks = chunker.chunk(&transcript);

        assert!(chunks.len() > 1);
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.order, i);
            assert!(chunk.content.chars().count() <= 200);
            assert_eq!(
                &transcript.text[chunk.start_offset..chunk.start_offset + chunk.content.len()],
                chunk.content
            );
        }
        // Start offsets strictly increase and times never go backwards
        for pair in chunks.windows(2) {
            assert!(pair[1].start_offset > pair[0].start_offset);
            assert!(pair[1].start_seconds >= pair[0].start_seconds);
        }
    }

    #[test]
    fn test_consecutive_chunks_overlap() {
        let lines: Vec<String> = (0..40).map(|i| format!("word{}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let transcript = transcript_of(&refs);

        let chunker = TextChunker::new(50, 20).unwrap();
        let chunks = chunker.chunk(&transcript);

        assert!(chunks.len() > 1);
        let overlapping = chunks.windows(2).any(|pair| {
            let end_of_first = pair[0].start_offset + pair[0].content.len();
            pair[1].start_offset < end_of_first
        });
        assert!(overlapping);
    }

    #[test]
    fn test_short_transcript_single_chunk() {
        let transcript = transcript_of(&["hello there", "general kenobi"]);
        let chunker = TextChunker::new(1000, 200).unwrap();
        let chunks = chunker.chunk(&transcript);

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "hello there general kenobi");
        assert_eq!(chunks[0].start_seconds, 0.0);
    }

    #[test]
    fn test_empty_transcript_no_chunks() {
        let transcript = transcript_of(&[]);
        let chunker = TextChunker::new(1000, 200).unwrap();
        assert!(chunker.chunk(&transcript).is_empty());
    }

    #[test]
    fn test_format_timestamp() {
        assert_eq!(format_timestamp(125.0), "02:05");
        assert_eq!(format_timestamp(3725.0), "01:02:05");
    }
}
