//! Video processing pipeline.
//!
//! Coordinates the steps from a user-supplied URL to a searchable index:
//! parse, fetch transcript, chunk, embed, index.

use crate::chunking::TextChunker;
use crate::config::{Prompts, Settings};
use crate::embedding::{Embedder, OpenAIEmbedder};
use crate::error::{Result, TubechatError};
use crate::rag::{ContextBuilder, Generator, OpenAIGenerator, RagEngine};
use crate::transcript::{Transcript, TranscriptSource, YoutubeTranscriptSource};
use crate::video::VideoRef;
use crate::vector_store::{Document, MemoryVectorStore, VectorStore};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument};

/// The main pipeline for Tubechat.
#[derive(Clone)]
pub struct Pipeline {
    settings: Settings,
    prompts: Prompts,
    transcript_source: Arc<dyn TranscriptSource>,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    chunker: Arc<TextChunker>,
}

impl Pipeline {
    /// Create a pipeline backed by YouTube and OpenAI.
    ///
    /// `api_key` overrides the key from settings.
    pub fn new(settings: Settings, api_key: Option<&str>) -> Result<Self> {
        let transcript_source = Arc::new(YoutubeTranscriptSource::new(
            settings.transcript.preserve_formatting,
        )?);
        let embedder = Arc::new(OpenAIEmbedder::from_settings(
            &settings.openai,
            &settings.embedding,
            api_key,
        )?);
        let generator = Arc::new(OpenAIGenerator::from_settings(
            &settings.openai,
            &settings.rag,
            api_key,
        )?);

        Self::with_components(settings, transcript_source, embedder, generator)
    }

    /// Create a pipeline with custom components.
    pub fn with_components(
        settings: Settings,
        transcript_source: Arc<dyn TranscriptSource>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self> {
        let prompts = Prompts::load(
            settings.prompts.custom_dir.as_deref(),
            Some(&settings.prompts.variables),
        )?;
        let chunker = Arc::new(TextChunker::from_settings(&settings.chunking)?);

        Ok(Self {
            settings,
            prompts,
            transcript_source,
            embedder,
            generator,
            chunker,
        })
    }

    /// Get the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Fetch the transcript for a URL or video ID.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn fetch_transcript(&self, input: &str) -> Result<(VideoRef, Transcript)> {
        let video = VideoRef::parse(input)?;

        info!("Fetching transcript for {}", video.id);
        let transcript = self
            .transcript_source
            .fetch(&video.id, &self.settings.transcript.languages)
            .await?;

        if transcript.is_blank() {
            return Err(TubechatError::Transcript(
                "Could not retrieve transcript for this video".to_string(),
            ));
        }

        Ok((video, transcript))
    }

    /// Process a video: fetch transcript, chunk, embed, and build a fresh index.
    #[instrument(skip(self), fields(input = %input))]
    pub async fn process_video(&self, input: &str) -> Result<ProcessedVideo> {
        let (video, transcript) = self.fetch_transcript(input).await?;
        info!(
            "Transcript has {} segments ({} characters, {})",
            transcript.segments.len(),
            transcript.text.len(),
            transcript.language_code
        );

        let chunks = self.chunker.chunk(&transcript);
        if chunks.is_empty() {
            return Err(TubechatError::Chunking(
                "Failed to split transcript into chunks".to_string(),
            ));
        }
        info!("Created {} chunks", chunks.len());

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;
        if embeddings.len() != chunks.len() {
            return Err(TubechatError::Embedding(format!(
                "Expected {} embeddings, got {}",
                chunks.len(),
                embeddings.len()
            )));
        }

        let documents: Vec<Document> = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| Document::from_chunk(&video.id, chunk, embedding))
            .collect();

        let store = Arc::new(MemoryVectorStore::new());
        let chunk_count = store.upsert_batch(&documents).await?;
        info!("Indexed {} chunks for {}", chunk_count, video.id);

        Ok(ProcessedVideo {
            video,
            transcript,
            chunk_count,
            store,
            processed_at: Utc::now(),
        })
    }

    /// Build a question-answering engine over a processed video.
    pub fn engine_for(&self, processed: &ProcessedVideo) -> RagEngine {
        let builder = ContextBuilder::new(processed.store.clone(), self.embedder.clone())
            .with_max_chunks(self.settings.retrieval.k)
            .with_min_score(self.settings.retrieval.min_score);

        RagEngine::new(builder, self.generator.clone()).with_prompts(self.prompts.clone())
    }
}

/// Result of processing a video.
#[derive(Clone)]
pub struct ProcessedVideo {
    /// The processed video.
    pub video: VideoRef,
    /// Its transcript.
    pub transcript: Transcript,
    /// Number of chunks indexed.
    pub chunk_count: usize,
    /// Index holding this video's chunks only.
    pub store: Arc<MemoryVectorStore>,
    /// When processing finished.
    pub processed_at: DateTime<Utc>,
}

impl std::fmt::Debug for ProcessedVideo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessedVideo")
            .field("video", &self.video)
            .field("chunk_count", &self.chunk_count)
            .field("processed_at", &self.processed_at)
            .finish()
    }
}
