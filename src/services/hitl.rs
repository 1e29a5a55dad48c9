//! Human-in-the-loop runner.
//!
//! Drives the same stages as [`LyricWorkflow`] across a request/response
//! boundary. The run pauses twice, after the template stage (waiting for a
//! song idea) and after the writer/reviewer loop (waiting for approval), and
//! each pause is persisted as a [`Checkpoint`]. Resuming claims the
//! checkpoint, applies the response, and parks it at the next pause.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    Checkpoint, FeedbackEntry, HitlResponse, PauseMarker, PendingRequest, PipelineOutput,
    WorkflowInputs, WorkflowOutputs, WorkflowState, WorkflowStatus, NEEDS_LYRICS_HINT,
};
use crate::domain::ports::CheckpointStore;
use crate::services::lyric_loop::RevisionSeed;
use crate::services::workflow::{LyricWorkflow, MISSING_IDEA_ERROR};

/// Client-facing view of a checkpoint.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub checkpoint_id: Uuid,
    #[serde(flatten)]
    pub marker: PauseMarker,
    pub template: Option<String>,
    pub feedback_history: Vec<FeedbackEntry>,
    pub regenerations: u32,
}

impl SessionView {
    pub fn pending(&self) -> Option<&PendingRequest> {
        match &self.marker {
            PauseMarker::Awaiting { request } => Some(request),
            PauseMarker::Completed { .. } | PauseMarker::Halted { .. } => None,
        }
    }

    pub fn output(&self) -> Option<&PipelineOutput> {
        match &self.marker {
            PauseMarker::Completed { output } => Some(output),
            PauseMarker::Awaiting { .. } | PauseMarker::Halted { .. } => None,
        }
    }
}

impl From<&Checkpoint> for SessionView {
    fn from(checkpoint: &Checkpoint) -> Self {
        Self {
            checkpoint_id: checkpoint.id,
            marker: checkpoint.marker.clone(),
            template: checkpoint.template.clone(),
            feedback_history: checkpoint.feedback_history.clone(),
            regenerations: checkpoint.regenerations,
        }
    }
}

/// Checkpointed pipeline runner.
pub struct HitlPipeline {
    workflow: Arc<LyricWorkflow>,
    store: Arc<dyn CheckpointStore>,
}

impl HitlPipeline {
    pub fn new(workflow: Arc<LyricWorkflow>, store: Arc<dyn CheckpointStore>) -> Self {
        Self { workflow, store }
    }

    /// Run the template stage and park at the song-idea pause.
    #[instrument(skip_all)]
    pub async fn start(&self, inputs: WorkflowInputs) -> DomainResult<SessionView> {
        let state = self.workflow.generate_template(inputs.clone()).await;

        let marker = if state.is_complete() {
            let suggested = inputs.has_idea().then(|| inputs.idea.clone());
            PauseMarker::Awaiting {
                request: PendingRequest::song_idea(
                    state.outputs.template.clone().unwrap_or_default(),
                    suggested,
                ),
            }
        } else {
            halted(&state)
        };

        let mut checkpoint = Checkpoint::new(inputs, marker);
        checkpoint.template = state.outputs.template.clone();
        self.store.save(&checkpoint).await?;
        info!(checkpoint_id = %checkpoint.id, status = %state.status(), "session started");
        Ok(SessionView::from(&checkpoint))
    }

    /// Answer the pending request of a checkpoint and run to the next pause.
    ///
    /// The checkpoint is claimed for the duration of the call; a concurrent
    /// resume of the same id fails with `CheckpointBusy`. If the returned
    /// future is dropped mid-resume, the lease is still released and the
    /// checkpoint keeps its last saved pause.
    #[instrument(skip_all, fields(%checkpoint_id, %request_id))]
    pub async fn respond(
        &self,
        checkpoint_id: Uuid,
        request_id: Uuid,
        response: HitlResponse,
    ) -> DomainResult<SessionView> {
        let mut checkpoint = self.store.claim(checkpoint_id).await?;
        let lease = Lease::new(Arc::clone(&self.store), checkpoint_id);

        let resumed = self.resume(&mut checkpoint, request_id, response).await;
        let saved = match resumed {
            Ok(()) => self.store.save(&checkpoint).await,
            Err(err) => Err(err),
        };
        let released = lease.release().await;

        saved?;
        released?;
        Ok(SessionView::from(&checkpoint))
    }

    pub async fn show(&self, checkpoint_id: Uuid) -> DomainResult<SessionView> {
        self.store
            .load(checkpoint_id)
            .await?
            .map(|checkpoint| SessionView::from(&checkpoint))
            .ok_or(DomainError::CheckpointNotFound(checkpoint_id))
    }

    async fn resume(
        &self,
        checkpoint: &mut Checkpoint,
        request_id: Uuid,
        response: HitlResponse,
    ) -> DomainResult<()> {
        let pending = checkpoint
            .pending()
            .filter(|pending| pending.request_id() == request_id)
            .cloned()
            .ok_or(DomainError::UnknownRequest {
                checkpoint_id: checkpoint.id,
                request_id,
            })?;

        match (pending, response) {
            (PendingRequest::SongIdea { suggested_idea, .. }, HitlResponse::Idea(idea)) => {
                let idea = Some(idea.trim().to_string())
                    .filter(|idea| !idea.is_empty())
                    .or(suggested_idea)
                    .ok_or_else(|| DomainError::ValidationFailed(MISSING_IDEA_ERROR.to_string()))?;
                checkpoint.inputs.idea = idea;
                self.write_lyrics(checkpoint, None).await;
            }
            (PendingRequest::LyricApproval { .. }, HitlResponse::Approval(true)) => {
                self.produce(checkpoint, true).await;
            }
            (PendingRequest::LyricApproval { lyrics, .. }, HitlResponse::Approval(false)) => {
                if checkpoint.regenerations >= self.workflow.max_regenerations() {
                    warn!(
                        regenerations = checkpoint.regenerations,
                        "regeneration limit reached; forwarding current lyrics"
                    );
                    self.produce(checkpoint, false).await;
                } else {
                    checkpoint.regenerations += 1;
                    info!(regenerations = checkpoint.regenerations, "regenerating lyrics");
                    self.write_lyrics(checkpoint, Some(RevisionSeed::rejected(lyrics)))
                        .await;
                }
            }
            (pending, _) => {
                return Err(DomainError::ResponseTypeMismatch {
                    expected: pending.expected_response(),
                });
            }
        }
        Ok(())
    }

    /// Run the loop and park at the approval pause, or halt on failure.
    async fn write_lyrics(&self, checkpoint: &mut Checkpoint, seed: Option<RevisionSeed>) {
        let template = checkpoint.template.clone().unwrap_or_default();
        let state = self
            .workflow
            .generate_lyrics_seeded(checkpoint.inputs.clone(), &template, seed)
            .await;

        if state.is_complete() {
            checkpoint.feedback_history = state.outputs.feedback_history;
            let lyrics = state.outputs.lyrics.unwrap_or_default();
            let iterations = u32::try_from(checkpoint.feedback_history.len()).unwrap_or(u32::MAX);
            checkpoint.park(PauseMarker::Awaiting {
                request: PendingRequest::lyric_approval(lyrics, iterations),
            });
        } else {
            checkpoint.park(halted(&state));
        }
    }

    async fn produce(&self, checkpoint: &mut Checkpoint, user_approved: bool) {
        let lyrics = checkpoint.current_lyrics().unwrap_or_default().to_string();
        let outputs = WorkflowOutputs {
            template: checkpoint.template.clone(),
            idea: Some(checkpoint.inputs.idea.clone()),
            lyrics: Some(lyrics.clone()),
            feedback_history: checkpoint.feedback_history.clone(),
            production: None,
        };
        let state = self
            .workflow
            .run_producer(WorkflowState::completed(checkpoint.inputs.clone(), outputs))
            .await;

        match state.outputs.production {
            Some(production) if state.is_complete() => {
                checkpoint.park(PauseMarker::Completed {
                    output: Box::new(PipelineOutput {
                        style_prompt: production.style_prompt,
                        style_extended: production.style_extended,
                        lyric_sheet: production.lyric_sheet,
                        template: checkpoint.template.clone().unwrap_or_default(),
                        original_lyrics: lyrics,
                        feedback_history: checkpoint.feedback_history.clone(),
                        user_approved,
                    }),
                });
            }
            _ => checkpoint.park(halted(&state)),
        }
    }
}

/// Resume lease on one checkpoint.
///
/// Released explicitly on the normal path. Dropping it while still held
/// (the resuming future was cancelled) hands the release to the runtime.
struct Lease {
    store: Arc<dyn CheckpointStore>,
    checkpoint_id: Uuid,
    held: bool,
}

impl Lease {
    fn new(store: Arc<dyn CheckpointStore>, checkpoint_id: Uuid) -> Self {
        Self {
            store,
            checkpoint_id,
            held: true,
        }
    }

    async fn release(mut self) -> DomainResult<()> {
        self.held = false;
        self.store.release(self.checkpoint_id).await
    }
}

impl Drop for Lease {
    fn drop(&mut self) {
        if !self.held {
            return;
        }
        let store = Arc::clone(&self.store);
        let checkpoint_id = self.checkpoint_id;
        warn!(%checkpoint_id, "resume abandoned; releasing checkpoint lease");
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = store.release(checkpoint_id).await {
                        error!(%checkpoint_id, error = %err, "failed to release abandoned lease");
                    }
                });
            }
            Err(_) => error!(%checkpoint_id, "no runtime to release abandoned lease"),
        }
    }
}

fn halted(state: &WorkflowState) -> PauseMarker {
    let needs_lyrics = state.status() == &WorkflowStatus::NeedsLyrics;
    let message = match state.error() {
        Some(message) => message.to_string(),
        None if needs_lyrics => NEEDS_LYRICS_HINT.to_string(),
        None => format!("Pipeline stopped with status {}", state.status()),
    };
    PauseMarker::Halted {
        needs_lyrics,
        message,
    }
}
