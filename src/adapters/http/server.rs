//! Songsmith HTTP Server.
//!
//! Exposes each pipeline stage as its own endpoint so a front end can gate
//! on the template before spending calls on the writer/reviewer loop, plus
//! checkpointed sessions for the human-in-the-loop flow.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::error;
use uuid::Uuid;

use crate::domain::errors::DomainError;
use crate::domain::models::{
    HitlResponse, ServerConfig, WorkflowInputs, WorkflowOutputs, WorkflowState,
};
use crate::domain::ports::{CheckpointStore, IdeaSource};
use crate::services::hitl::{HitlPipeline, SessionView};
use crate::services::workflow::LyricWorkflow;

/// Configuration for the songsmith HTTP server.
#[derive(Debug, Clone)]
pub struct SongsmithHttpConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to listen on.
    pub port: u16,
    /// Whether to enable CORS.
    pub enable_cors: bool,
}

impl Default for SongsmithHttpConfig {
    fn default() -> Self {
        Self::from(&ServerConfig::default())
    }
}

impl From<&ServerConfig> for SongsmithHttpConfig {
    fn from(config: &ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            enable_cors: config.enable_cors,
        }
    }
}

/// Body accepted by the generation endpoints.
///
/// `lyrics` is the pasted reference for the template and lyric stages, and
/// the finalized lyrics for the production stage.
#[derive(Debug, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(flatten)]
    pub inputs: WorkflowInputs,
    #[serde(default)]
    pub template: String,
    #[serde(default)]
    pub include_producer: bool,
}

/// Answer to a paused session's pending request.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    pub request_id: Uuid,
    pub response: HitlResponse,
}

/// Error response.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(
    status: StatusCode,
    error: impl Into<String>,
    code: &str,
    details: Option<serde_json::Value>,
) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
            code: code.to_string(),
            details,
        }),
    )
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        let (status, code) = match &err {
            DomainError::ValidationFailed(_) | DomainError::ResponseTypeMismatch { .. } => {
                (StatusCode::BAD_REQUEST, "VALIDATION_ERROR")
            }
            DomainError::Configuration(_) => (StatusCode::BAD_REQUEST, "CONFIG_ERROR"),
            DomainError::CheckpointNotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            DomainError::CheckpointBusy(_) => (StatusCode::CONFLICT, "CHECKPOINT_BUSY"),
            DomainError::UnknownRequest { .. } => (StatusCode::CONFLICT, "STALE_REQUEST"),
            _ => {
                error!(error = %err, "request failed");
                return api_error(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error",
                    "INTERNAL_ERROR",
                    Some(json!(err.to_string())),
                );
            }
        };
        api_error(status, err.to_string(), code, None)
    }
}

/// Pipeline services, or the configuration problems that prevented building them.
enum Pipeline {
    Ready {
        workflow: Arc<LyricWorkflow>,
        sessions: HitlPipeline,
    },
    Misconfigured(Vec<String>),
}

/// Shared state for the HTTP server.
struct AppState {
    pipeline: Pipeline,
    ideas: Arc<dyn IdeaSource>,
}

impl AppState {
    fn ready(&self) -> Result<(&LyricWorkflow, &HitlPipeline), ApiError> {
        match &self.pipeline {
            Pipeline::Ready { workflow, sessions } => Ok((workflow.as_ref(), sessions)),
            Pipeline::Misconfigured(problems) => Err(api_error(
                StatusCode::BAD_REQUEST,
                "Invalid configuration",
                "CONFIG_ERROR",
                Some(json!(problems)),
            )),
        }
    }
}

/// Songsmith HTTP Server.
pub struct SongsmithHttpServer {
    config: SongsmithHttpConfig,
    state: Arc<AppState>,
}

impl SongsmithHttpServer {
    pub fn new(
        config: SongsmithHttpConfig,
        workflow: Arc<LyricWorkflow>,
        store: Arc<dyn CheckpointStore>,
        ideas: Arc<dyn IdeaSource>,
    ) -> Self {
        let sessions = HitlPipeline::new(Arc::clone(&workflow), store);
        Self {
            config,
            state: Arc::new(AppState {
                pipeline: Pipeline::Ready { workflow, sessions },
                ideas,
            }),
        }
    }

    /// Server whose pipeline endpoints answer 400 with `problems`.
    ///
    /// Health and idea endpoints keep working so the front end can still load.
    pub fn misconfigured(
        config: SongsmithHttpConfig,
        problems: Vec<String>,
        ideas: Arc<dyn IdeaSource>,
    ) -> Self {
        Self {
            config,
            state: Arc::new(AppState {
                pipeline: Pipeline::Misconfigured(problems),
                ideas,
            }),
        }
    }

    /// Build the router.
    pub fn build_router(&self) -> Router {
        let app = Router::new()
            // Pipeline stages
            .route("/api/generate-template", post(generate_template))
            .route("/api/generate-lyrics", post(generate_lyrics))
            .route("/api/generate-production", post(generate_production))
            .route("/api/generate-prompt", post(generate_prompt))
            .route("/api/random-idea", get(random_idea))
            // Human-in-the-loop sessions
            .route("/api/sessions", post(start_session))
            .route("/api/sessions/{checkpoint_id}", get(get_session))
            .route("/api/sessions/{checkpoint_id}/respond", post(respond_session))
            // Health check
            .route("/health", get(health_check))
            .with_state(Arc::clone(&self.state));

        if self.config.enable_cors {
            app.layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
                .layer(TraceLayer::new_for_http())
        } else {
            app.layer(TraceLayer::new_for_http())
        }
    }

    /// Start the server with a shutdown signal.
    pub async fn serve_with_shutdown<F>(
        self,
        shutdown: F,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port).parse()?;
        let router = self.build_router();

        tracing::info!("Songsmith HTTP server listening on {}", addr);

        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await?;
        Ok(())
    }
}

/// 200 with the state, or 400 when the state ended in error.
fn state_response(state: WorkflowState) -> (StatusCode, Json<WorkflowState>) {
    let status = if state.error().is_some() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(state))
}

fn require_references(inputs: &WorkflowInputs) -> Result<(), ApiError> {
    if inputs.reference.is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing required inputs",
            "VALIDATION_ERROR",
            Some(json!("Provide at least one of artists, songs, lyrics, or guidance.")),
        ));
    }
    Ok(())
}

fn require_idea(inputs: &WorkflowInputs) -> Result<(), ApiError> {
    if !inputs.has_idea() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing idea/title",
            "VALIDATION_ERROR",
            Some(json!("Provide a song idea or title.")),
        ));
    }
    Ok(())
}

// Handler functions

async fn health_check() -> &'static str {
    "OK"
}

async fn generate_template(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<WorkflowState>), ApiError> {
    let (workflow, _) = state.ready()?;
    require_references(&req.inputs)?;

    let inputs = WorkflowInputs::new(req.inputs.reference);
    Ok(state_response(workflow.generate_template(inputs).await))
}

async fn generate_lyrics(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<WorkflowState>), ApiError> {
    let (workflow, _) = state.ready()?;
    if req.template.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing template",
            "VALIDATION_ERROR",
            Some(json!("Generate a template first.")),
        ));
    }
    require_idea(&req.inputs)?;

    Ok(state_response(
        workflow.generate_lyrics(req.inputs, &req.template).await,
    ))
}

async fn generate_production(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<WorkflowState>), ApiError> {
    let (workflow, _) = state.ready()?;
    let lyrics = req.inputs.reference.reference_lyrics.clone();
    if lyrics.trim().is_empty() {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "Missing lyrics",
            "VALIDATION_ERROR",
            Some(json!("Generate lyrics before running the producer.")),
        ));
    }

    let outputs = WorkflowOutputs {
        template: Some(req.template).filter(|template| !template.trim().is_empty()),
        idea: Some(req.inputs.idea.clone()),
        lyrics: Some(lyrics),
        ..WorkflowOutputs::default()
    };
    let completed = WorkflowState::completed(req.inputs, outputs);
    Ok(state_response(workflow.run_producer(completed).await))
}

async fn generate_prompt(
    State(state): State<Arc<AppState>>,
    Json(req): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<WorkflowState>), ApiError> {
    let (workflow, _) = state.ready()?;
    require_references(&req.inputs)?;
    require_idea(&req.inputs)?;

    let mut result = workflow.run(req.inputs).await;
    if req.include_producer && result.is_complete() {
        result = workflow.run_producer(result).await;
    }
    Ok(state_response(result))
}

async fn random_idea(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let idea = state.ideas.pick_random()?;
    Ok(Json(json!({ "idea": idea })))
}

async fn start_session(
    State(state): State<Arc<AppState>>,
    Json(inputs): Json<WorkflowInputs>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let (_, sessions) = state.ready()?;
    require_references(&inputs)?;

    let view = sessions.start(inputs).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(checkpoint_id): Path<Uuid>,
) -> Result<Json<SessionView>, ApiError> {
    let (_, sessions) = state.ready()?;
    Ok(Json(sessions.show(checkpoint_id).await?))
}

async fn respond_session(
    State(state): State<Arc<AppState>>,
    Path(checkpoint_id): Path<Uuid>,
    Json(req): Json<RespondRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let (_, sessions) = state.ready()?;
    let view = sessions
        .respond(checkpoint_id, req.request_id, req.response)
        .await?;
    Ok(Json(view))
}
