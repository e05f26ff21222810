//! Per-user chat sessions.
//!
//! A session remembers the most recently processed video and the engine
//! that answers questions about it. Nothing about earlier questions is kept.

use crate::config::Settings;
use crate::error::{Result, TubechatError};
use crate::pipeline::{Pipeline, ProcessedVideo};
use crate::rag::{RagEngine, RagResponse};
use crate::video::VideoRef;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, instrument};
use uuid::Uuid;

/// Summary of the video loaded in a session.
#[derive(Debug, Clone, Serialize)]
pub struct VideoSummary {
    pub video_id: String,
    pub watch_url: String,
    pub chunk_count: usize,
    pub language: String,
    pub language_code: String,
    pub is_generated: bool,
    pub duration_seconds: f64,
    pub processed_at: DateTime<Utc>,
}

impl From<&ProcessedVideo> for VideoSummary {
    fn from(p: &ProcessedVideo) -> Self {
        Self {
            video_id: p.video.id.clone(),
            watch_url: p.video.watch_url(),
            chunk_count: p.chunk_count,
            language: p.transcript.language.clone(),
            language_code: p.transcript.language_code.clone(),
            is_generated: p.transcript.is_generated,
            duration_seconds: p.transcript.duration_seconds(),
            processed_at: p.processed_at,
        }
    }
}

/// What happened when a video was submitted.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ProcessOutcome {
    /// The video was fetched and indexed.
    Processed(VideoSummary),
    /// The video was already loaded; nothing was done.
    AlreadyProcessed(VideoSummary),
}

impl ProcessOutcome {
    pub fn summary(&self) -> &VideoSummary {
        match self {
            ProcessOutcome::Processed(s) | ProcessOutcome::AlreadyProcessed(s) => s,
        }
    }
}

struct LoadedVideo {
    processed: ProcessedVideo,
    engine: RagEngine,
}

/// One user's state.
pub struct ChatSession {
    pipeline: Pipeline,
    loaded: Option<LoadedVideo>,
    api_key: Option<String>,
}

impl ChatSession {
    /// Create an empty session.
    pub fn new(pipeline: Pipeline) -> Self {
        Self {
            pipeline,
            loaded: None,
            api_key: None,
        }
    }

    /// Process a video, unless it is the one already loaded.
    ///
    /// The previous video stays loaded if processing fails.
    #[instrument(skip(self))]
    pub async fn process(&mut self, input: &str) -> Result<ProcessOutcome> {
        let video = VideoRef::parse(input)?;

        if let Some(loaded) = &self.loaded {
            if loaded.processed.video == video {
                debug!("Video {} already processed", video.id);
                return Ok(ProcessOutcome::AlreadyProcessed(VideoSummary::from(
                    &loaded.processed,
                )));
            }
        }

        let processed = self.pipeline.process_video(&video.id).await?;
        let engine = self.pipeline.engine_for(&processed);
        let summary = VideoSummary::from(&processed);

        info!("Loaded video {} ({} chunks)", video.id, processed.chunk_count);
        self.loaded = Some(LoadedVideo { processed, engine });

        Ok(ProcessOutcome::Processed(summary))
    }

    /// Ask a question about the loaded video.
    pub async fn ask(&mut self, question: &str) -> Result<RagResponse> {
        let loaded = self.loaded.as_ref().ok_or(TubechatError::NoVideoProcessed)?;
        loaded.engine.ask(question).await
    }

    /// The loaded video, if any.
    pub fn current_video(&self) -> Option<VideoSummary> {
        self.loaded.as_ref().map(|l| VideoSummary::from(&l.processed))
    }

    /// Swap in a pipeline, rebinding the loaded video to it.
    pub fn replace_pipeline(&mut self, pipeline: Pipeline) {
        if let Some(loaded) = &mut self.loaded {
            loaded.engine = pipeline.engine_for(&loaded.processed);
        }
        self.pipeline = pipeline;
    }

    /// Drop the loaded video.
    pub fn reset(&mut self) {
        self.loaded = None;
    }

}

/// Builds a pipeline, optionally with a per-session API key.
pub type PipelineFactory = Arc<dyn Fn(Option<&str>) -> Result<Pipeline> + Send + Sync>;

/// Sessions of the web UI, keyed by session ID.
pub struct SessionRegistry {
    factory: PipelineFactory,
    sessions: RwLock<HashMap<Uuid, SessionEntry>>,
    max_sessions: usize,
}

struct SessionEntry {
    session: Arc<Mutex<ChatSession>>,
    /// Unix millis of the last lookup.
    last_used: AtomicI64,
}

impl SessionEntry {
    fn new(session: Arc<Mutex<ChatSession>>) -> Self {
        Self {
            session,
            last_used: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    fn touch(&self) -> Arc<Mutex<ChatSession>> {
        self.last_used
            .store(Utc::now().timestamp_millis(), Ordering::Relaxed);
        self.session.clone()
    }

    fn is_busy(&self) -> bool {
        self.session.try_lock().is_err()
    }
}

impl SessionRegistry {
    /// Registry whose sessions use YouTube and OpenAI.
    pub fn from_settings(settings: Settings) -> Self {
        let max_sessions = settings.server.max_sessions;
        let factory: PipelineFactory =
            Arc::new(move |api_key: Option<&str>| Pipeline::new(settings.clone(), api_key));
        Self::new(factory, max_sessions)
    }

    pub fn new(factory: PipelineFactory, max_sessions: usize) -> Self {
        Self {
            factory,
            sessions: RwLock::new(HashMap::new()),
            max_sessions: max_sessions.max(1),
        }
    }

    /// Look up a session, creating it if needed.
    ///
    /// A non-empty `api_key` different from the session's current one
    /// rebuilds the session's pipeline with that key.
    pub async fn get_or_create(
        &self,
        id: Option<Uuid>,
        api_key: Option<&str>,
    ) -> Result<(Uuid, Arc<Mutex<ChatSession>>)> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());

        if let Some(id) = id {
            let existing = self.sessions.read().await.get(&id).map(SessionEntry::touch);
            if let Some(session) = existing {
                {
                    let mut guard = session.lock().await;
                    if api_key.is_some() && api_key != guard.api_key.as_deref() {
                        let pipeline = (self.factory)(api_key)?;
                        guard.replace_pipeline(pipeline);
                        guard.api_key = api_key.map(str::to_string);
                    }
                }
                return Ok((id, session));
            }
        }

        let mut session = ChatSession::new((self.factory)(api_key)?);
        session.api_key = api_key.map(str::to_string);
        let session = Arc::new(Mutex::new(session));
        let id = id.unwrap_or_else(Uuid::new_v4);

        let mut sessions = self.sessions.write().await;
        if sessions.len() >= self.max_sessions && !sessions.contains_key(&id) {
            evict_oldest(&mut sessions);
        }
        let session = sessions
            .entry(id)
            .or_insert_with(|| SessionEntry::new(session))
            .touch();
        debug!("Session {} ready ({} active)", id, sessions.len());

        Ok((id, session))
    }

    /// Look up an existing session.
    pub async fn get(&self, id: Uuid) -> Result<Arc<Mutex<ChatSession>>> {
        self.sessions
            .read()
            .await
            .get(&id)
            .map(SessionEntry::touch)
            .ok_or_else(|| TubechatError::SessionNotFound(id.to_string()))
    }

    /// Remove a session. Returns whether it existed.
    pub async fn remove(&self, id: Uuid) -> bool {
        self.sessions.write().await.remove(&id).is_some()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn evict_oldest(sessions: &mut HashMap<Uuid, SessionEntry>) {
    // Idle sessions go first; a busy one is only dropped when all are busy,
    // and its in-flight request keeps its own handle.
    let oldest = sessions
        .iter()
        .min_by_key(|(_, entry)| (entry.is_busy(), entry.last_used.load(Ordering::Relaxed)))
        .map(|(id, _)| *id);

    if let Some(id) = oldest {
        debug!("Evicting session {}", id);
        sessions.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn test_ask_before_process() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        let err = session.ask("anything?").await.unwrap_err();
        assert!(matches!(err, TubechatError::NoVideoProcessed));
        assert!(session.current_video().is_none());
    }

    #[tokio::test]
    async fn test_process_then_ask() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        let outcome = session.process("https://youtu.be/aaaaaaaaaaa").await.unwrap();
        assert!(matches!(outcome, ProcessOutcome::Processed(_)));
        assert_eq!(outcome.summary().video_id, "aaaaaaaaaaa");
        assert!(outcome.summary().chunk_count > 0);

        let response = session.ask("What about rust?").await.unwrap();
        assert!(!response.sources.is_empty());
    }

    #[tokio::test]
    async fn test_same_video_not_reprocessed() {
        let (pipeline, transcripts, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        session.process("aaaaaaaaaaa").await.unwrap();
        let outcome = session
            .process("https://www.youtube.com/watch?v=aaaaaaaaaaa&t=3s")
            .await
            .unwrap();

        assert!(matches!(outcome, ProcessOutcome::AlreadyProcessed(_)));
        assert_eq!(transcripts.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_new_video_replaces_index() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        session.process("aaaaaaaaaaa").await.unwrap();
        session.process("bbbbbbbbbbb").await.unwrap();

        let current = session.current_video().unwrap();
        assert_eq!(current.video_id, "bbbbbbbbbbb");

        let response = session.ask("python?").await.unwrap();
        assert!(response.sources.iter().all(|s| s.video_id == "bbbbbbbbbbb"));
    }

    #[tokio::test]
    async fn test_failed_process_keeps_previous_video() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        session.process("aaaaaaaaaaa").await.unwrap();
        let err = session.process("ccccccccccc").await.unwrap_err();
        assert!(matches!(err, TubechatError::TranscriptsDisabled(_)));

        assert_eq!(session.current_video().unwrap().video_id, "aaaaaaaaaaa");
        assert!(session.ask("rust?").await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_reports_error() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);

        let err = session.process("not a url").await.unwrap_err();
        assert!(matches!(err, TubechatError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_reset() {
        let (pipeline, _, _) = fake_pipeline(small_chunk_settings());
        let mut session = ChatSession::new(pipeline);
        session.process("aaaaaaaaaaa").await.unwrap();

        session.reset();
        assert!(session.current_video().is_none());
        assert!(matches!(
            session.ask("rust?").await,
            Err(TubechatError::NoVideoProcessed)
        ));
    }

    fn counting_factory() -> (PipelineFactory, Arc<AtomicUsize>) {
        let built = Arc::new(AtomicUsize::new(0));
        let counter = built.clone();
        let factory: PipelineFactory = Arc::new(move |_key: Option<&str>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(fake_pipeline(small_chunk_settings()).0)
        });
        (factory, built)
    }

    #[tokio::test]
    async fn test_registry_creates_and_reuses() {
        let (factory, built) = counting_factory();
        let registry = SessionRegistry::new(factory, 10);

        let (id, session) = registry.get_or_create(None, None).await.unwrap();
        session.lock().await.process("aaaaaaaaaaa").await.unwrap();

        let (same_id, again) = registry.get_or_create(Some(id), None).await.unwrap();
        assert_eq!(same_id, id);
        assert!(again.lock().await.current_video().is_some());
        assert_eq!(built.load(Ordering::SeqCst), 1);

        assert!(registry.get(id).await.is_ok());
        assert!(matches!(
            registry.get(Uuid::new_v4()).await,
            Err(TubechatError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_registry_rebuilds_on_new_key() {
        let (factory, built) = counting_factory();
        let registry = SessionRegistry::new(factory, 10);

        let (id, session) = registry.get_or_create(None, Some("sk-one")).await.unwrap();
        session.lock().await.process("aaaaaaaaaaa").await.unwrap();

        registry.get_or_create(Some(id), Some("sk-one")).await.unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 1);

        let (_, session) = registry.get_or_create(Some(id), Some("sk-two")).await.unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);

        // Loaded video survives the key change
        assert!(session.lock().await.ask("rust?").await.is_ok());
    }

    #[tokio::test]
    async fn test_registry_evicts_when_full() {
        let (factory, _) = counting_factory();
        let registry = SessionRegistry::new(factory, 2);

        let (first, _) = registry.get_or_create(None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (second, _) = registry.get_or_create(None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (third, _) = registry.get_or_create(None, None).await.unwrap();

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(first).await.is_err());
        assert!(registry.get(second).await.is_ok());
        assert!(registry.get(third).await.is_ok());

        assert!(registry.remove(third).await);
        assert!(!registry.remove(third).await);
    }

    #[tokio::test]
    async fn test_registry_prefers_idle_sessions_for_eviction() {
        let (factory, _) = counting_factory();
        let registry = SessionRegistry::new(factory, 2);

        let (busy, busy_session) = registry.get_or_create(None, None).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (idle, _) = registry.get_or_create(None, None).await.unwrap();

        let _guard = busy_session.lock().await;
        registry.get_or_create(None, None).await.unwrap();

        assert_eq!(registry.len().await, 2);
        assert!(registry.get(busy).await.is_ok());
        assert!(registry.get(idle).await.is_err());
    }

    #[tokio::test]
    async fn test_registry_cap_holds_when_all_busy() {
        let (factory, _) = counting_factory();
        let registry = SessionRegistry::new(factory, 1);

        let (first, first_session) = registry.get_or_create(None, None).await.unwrap();
        let guard = first_session.lock().await;

        let (second, _) = registry.get_or_create(None, None).await.unwrap();
        assert_eq!(registry.len().await, 1);
        assert!(registry.get(first).await.is_err());
        assert!(registry.get(second).await.is_ok());

        // The evicted session still serves its in-flight request
        assert!(guard.current_video().is_none());
    }
}
