//! Web UI server.
//!
//! Serves a single-page form plus the JSON endpoints it drives.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::error::TubechatError;
use crate::rag::RagResponse;
use crate::session::{ProcessOutcome, SessionRegistry, VideoSummary};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../../assets/index.html");

/// Shared application state.
pub struct AppState {
    registry: SessionRegistry,
    settings: Settings,
}

impl AppState {
    pub fn new(registry: SessionRegistry, settings: Settings) -> Self {
        Self { registry, settings }
    }
}

/// Run the web UI server.
pub async fn run_serve(host: Option<String>, port: Option<u16>, settings: Settings) -> anyhow::Result<()> {
    preflight::check(Operation::Serve, &settings)?;

    let host = host.unwrap_or_else(|| settings.server.host.clone());
    let port = port.unwrap_or(settings.server.port);
    let has_key = preflight::has_api_key(&settings);

    let registry = SessionRegistry::from_settings(settings.clone());
    let app = router(Arc::new(AppState::new(registry, settings)));

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    Output::header("Tubechat");
    println!();
    Output::success(&format!("Open http://{} in your browser", addr));
    if !has_key {
        Output::warning("No OPENAI_API_KEY configured; users must enter a key in the page.");
    }
    Output::info("Press Ctrl+C to stop the server.");
    info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Output::info("Server stopped.");
    Ok(())
}

/// Build the router.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/config", get(client_config))
        .route("/api/process", post(process))
        .route("/api/ask", post(ask))
        .route("/api/session/{id}", get(get_session).delete(delete_session))
        .layer(cors)
        .with_state(state)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

// === Request/Response Types ===

#[derive(Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    session_id: Option<Uuid>,
    #[serde(default)]
    url: String,
    /// Overrides the server's key for this session.
    #[serde(default)]
    api_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    session_id: Uuid,
    #[serde(flatten)]
    outcome: ProcessOutcome,
}

#[derive(Deserialize)]
pub struct AskRequest {
    session_id: Uuid,
    #[serde(default)]
    question: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    session_id: Uuid,
    video: Option<VideoSummary>,
}

#[derive(Debug, Serialize)]
pub struct ClientConfig {
    has_server_key: bool,
    model: String,
    embedding_model: String,
}

/// An error rendered as JSON with a status derived from its kind.
#[derive(Debug)]
pub struct ApiError(TubechatError);

impl From<TubechatError> for ApiError {
    fn from(e: TubechatError) -> Self {
        ApiError(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            TubechatError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            TubechatError::Authentication(_) => StatusCode::UNAUTHORIZED,
            TubechatError::TranscriptsDisabled(_)
            | TubechatError::NoTranscriptFound(_)
            | TubechatError::SessionNotFound(_) => StatusCode::NOT_FOUND,
            TubechatError::NoVideoProcessed => StatusCode::CONFLICT,
            TubechatError::RateLimited(_) => StatusCode::TOO_MANY_REQUESTS,
            TubechatError::Transcript(_)
            | TubechatError::Embedding(_)
            | TubechatError::OpenAI(_)
            | TubechatError::Http(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            warn!("Request failed: {}", self.0);
        }
        let body = serde_json::json!({
            "error": self.0.user_message(),
            "kind": self.0.kind(),
            "detail": self.0.to_string(),
        });
        (status, Json(body)).into_response()
    }
}

type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

// === Handlers ===

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn client_config(State(state): State<Arc<AppState>>) -> Json<ClientConfig> {
    Json(ClientConfig {
        has_server_key: preflight::has_api_key(&state.settings),
        model: state.settings.rag.model.clone(),
        embedding_model: state.settings.embedding.model.clone(),
    })
}

async fn process(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ProcessRequest>,
) -> ApiResult<ProcessResponse> {
    let url = req.url.trim();
    if url.is_empty() {
        return Err(TubechatError::InvalidInput("Please enter a YouTube video URL".to_string()).into());
    }

    let api_key = req.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty());
    if api_key.is_none() && !preflight::has_api_key(&state.settings) {
        return Err(TubechatError::InvalidInput(
            "Please enter your OpenAI API key".to_string(),
        )
        .into());
    }

    let (session_id, session) = state.registry.get_or_create(req.session_id, api_key).await?;
    let outcome = session.lock().await.process(url).await?;

    Ok(Json(ProcessResponse { session_id, outcome }))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> ApiResult<RagResponse> {
    let session = state.registry.get(req.session_id).await?;
    let response = session.lock().await.ask(&req.question).await?;
    Ok(Json(response))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> ApiResult<SessionResponse> {
    let session = state.registry.get(id).await?;
    let video = session.lock().await.current_video();
    Ok(Json(SessionResponse { session_id: id, video }))
}

async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> StatusCode {
    if state.registry.remove(id).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::testing::{fake_pipeline, small_chunk_settings};
    use crate::session::PipelineFactory;

    fn test_state(server_key: bool) -> Arc<AppState> {
        let mut settings = small_chunk_settings();
        if server_key {
            settings.openai.api_key = Some("sk-server".to_string());
        }
        let factory: PipelineFactory =
            Arc::new(|_key: Option<&str>| Ok(fake_pipeline(small_chunk_settings()).0));
        Arc::new(AppState::new(SessionRegistry::new(factory, 8), settings))
    }

    fn process_req(session_id: Option<Uuid>, url: &str, api_key: Option<&str>) -> Json<ProcessRequest> {
        Json(ProcessRequest {
            session_id,
            url: url.to_string(),
            api_key: api_key.map(str::to_string),
        })
    }

    #[tokio::test]
    async fn test_process_and_ask_flow() {
        let state = test_state(true);

        let Json(processed) = process(State(state.clone()), process_req(None, "https://youtu.be/aaaaaaaaaaa", None))
            .await
            .unwrap();
        assert!(matches!(processed.outcome, ProcessOutcome::Processed(_)));

        let Json(again) = process(
            State(state.clone()),
            process_req(Some(processed.session_id), "aaaaaaaaaaa", None),
        )
        .await
        .unwrap();
        assert!(matches!(again.outcome, ProcessOutcome::AlreadyProcessed(_)));

        let Json(answer) = ask(
            State(state.clone()),
            Json(AskRequest {
                session_id: processed.session_id,
                question: "What is borrowing?".to_string(),
            }),
        )
        .await
        .unwrap();
        assert!(!answer.answer.is_empty());
        assert!(!answer.sources.is_empty());

        let Json(current) = get_session(State(state), Path(processed.session_id)).await.unwrap();
        assert_eq!(current.video.unwrap().video_id, "aaaaaaaaaaa");
    }

    #[tokio::test]
    async fn test_process_validation() {
        let state = test_state(false);

        let err = process(State(state.clone()), process_req(None, "  ", Some("sk-user")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = process(State(state.clone()), process_req(None, "aaaaaaaaaaa", None))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert!(err.0.user_message().contains("API key"));

        let err = process(State(state.clone()), process_req(None, "not a video", Some("sk-user")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = process(State(state), process_req(None, "ccccccccccc", Some("sk-user")))
            .await
            .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_ask_errors() {
        let state = test_state(true);

        let err = ask(
            State(state.clone()),
            Json(AskRequest {
                session_id: Uuid::new_v4(),
                question: "hi".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);

        let (id, _) = state.registry.get_or_create(None, None).await.unwrap();
        let err = ask(
            State(state.clone()),
            Json(AskRequest {
                session_id: id,
                question: "hi".to_string(),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status(), StatusCode::CONFLICT);

        assert_eq!(delete_session(State(state.clone()), Path(id)).await, StatusCode::NO_CONTENT);
        assert_eq!(delete_session(State(state), Path(id)).await, StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (TubechatError::Authentication("x".into()), StatusCode::UNAUTHORIZED),
            (TubechatError::RateLimited("x".into()), StatusCode::TOO_MANY_REQUESTS),
            (TubechatError::NoTranscriptFound("en".into()), StatusCode::NOT_FOUND),
            (TubechatError::OpenAI("x".into()), StatusCode::BAD_GATEWAY),
            (TubechatError::Config("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError::from(err).status(), status);
        }
    }

    #[test]
    fn test_index_page_has_form() {
        assert!(INDEX_HTML.contains("id=\"video-url\""));
        assert!(INDEX_HTML.contains("/api/process"));
        assert!(INDEX_HTML.contains("/api/ask"));
    }
}
