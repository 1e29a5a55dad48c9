//! Integration tests for checkpointed human-in-the-loop sessions.

mod common;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::{blueprint, numbered_writer, offline_config, producer_reply, verdict, ScriptedAgents};
use songsmith::adapters::agents::{MockAgent, MockReply};
use songsmith::adapters::checkpoint::{FileCheckpointStore, InMemoryCheckpointStore};
use songsmith::domain::errors::{AgentInvocationError, DomainError};
use songsmith::domain::models::{
    AgentRole, ConversationHandle, HitlResponse, PauseMarker, PendingRequest, ReferenceInput, WorkflowInputs,
};
use songsmith::domain::ports::{Agent, CheckpointStore};
use songsmith::services::lyric_loop::REGENERATE_INSTRUCTION;
use songsmith::services::{HitlPipeline, LyricWorkflow, SessionView};
use uuid::Uuid;

fn inputs() -> WorkflowInputs {
    WorkflowInputs::new(ReferenceInput::new("", "", "upbeat breakup song", ""))
}

fn happy_agents(drafts: usize) -> ScriptedAgents {
    ScriptedAgents::new()
        .with_template(MockAgent::scripted(
            AgentRole::Template,
            [MockReply::text(blueprint(200))],
        ))
        .with_writer(numbered_writer(drafts))
        .with_reviewer(MockAgent::new(AgentRole::Reviewer).with_fallback(verdict(true, "")))
        .with_producer(MockAgent::scripted(AgentRole::Producer, [producer_reply()]))
}

fn pipeline(agents: &ScriptedAgents, store: Arc<dyn CheckpointStore>) -> HitlPipeline {
    HitlPipeline::new(Arc::new(agents.workflow()), store)
}

fn pending_id(view: &SessionView) -> Uuid {
    view.pending().expect("session should be awaiting a response").request_id()
}

#[tokio::test]
async fn test_idea_then_approval_completes() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs()).await.unwrap();
    match view.pending() {
        Some(PendingRequest::SongIdea { template, suggested_idea, .. }) => {
            assert_eq!(template, &blueprint(200));
            assert_eq!(suggested_idea, &None);
        }
        other => panic!("expected song idea request, got {other:?}"),
    }

    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    match view.pending() {
        Some(PendingRequest::LyricApproval { lyrics, iterations_used, .. }) => {
            assert_eq!(lyrics, "draft 1");
            assert_eq!(*iterations_used, 1);
        }
        other => panic!("expected lyric approval request, got {other:?}"),
    }
    assert!(agents.writer.prompts().await[0].contains("Song Idea/Title: Moving On"));

    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Approval(true))
        .await
        .unwrap();
    let output = view.output().expect("session should be complete");
    assert!(output.user_approved);
    assert_eq!(output.original_lyrics, "draft 1");
    assert_eq!(output.style_prompt, "Synth Pop, bright analog pads");
    assert_eq!(output.template, blueprint(200));
    assert_eq!(output.feedback_history.len(), 1);
}

#[tokio::test]
async fn test_blank_idea_falls_back_to_suggested_idea() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs().with_idea("Paper Boats")).await.unwrap();
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("  ".into()))
        .await
        .unwrap();

    assert!(matches!(view.pending(), Some(PendingRequest::LyricApproval { .. })));
    assert!(agents.writer.prompts().await[0].contains("Song Idea/Title: Paper Boats"));
}

#[tokio::test]
async fn test_blank_idea_without_suggestion_is_rejected() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs()).await.unwrap();
    let err = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea(String::new()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ValidationFailed(_)));

    // The lease is released after a failed resume.
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    assert!(matches!(view.pending(), Some(PendingRequest::LyricApproval { .. })));
}

#[tokio::test]
async fn test_regenerate_reruns_loop_with_rejected_draft() {
    let agents = happy_agents(2);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs()).await.unwrap();
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Approval(false))
        .await
        .unwrap();

    assert_eq!(view.regenerations, 1);
    match view.pending() {
        Some(PendingRequest::LyricApproval { lyrics, .. }) => assert_eq!(lyrics, "draft 2"),
        other => panic!("expected lyric approval request, got {other:?}"),
    }
    let prompts = agents.writer.prompts().await;
    assert!(prompts[1].contains("Previous draft:\ndraft 1\n"));
    assert!(prompts[1].contains(REGENERATE_INSTRUCTION));
}

#[tokio::test]
async fn test_regeneration_cap_forwards_current_lyrics() {
    let agents = happy_agents(1);
    let mut config = offline_config();
    config.workflow.max_regenerations = 0;
    let hitl = HitlPipeline::new(
        Arc::new(agents.workflow_with(&config)),
        Arc::new(InMemoryCheckpointStore::new()),
    );

    let view = hitl.start(inputs()).await.unwrap();
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    let view = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Approval(false))
        .await
        .unwrap();

    let output = view.output().expect("cap should force completion");
    assert!(!output.user_approved);
    assert_eq!(output.original_lyrics, "draft 1");
    assert_eq!(agents.writer.call_count(), 1);
    assert_eq!(agents.producer.call_count(), 1);
}

#[tokio::test]
async fn test_response_type_mismatch() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs()).await.unwrap();
    let err = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Approval(true))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::ResponseTypeMismatch { expected: "string" }));
    assert_eq!(agents.writer.call_count(), 0);
}

#[tokio::test]
async fn test_stale_request_id_is_rejected() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl.start(inputs()).await.unwrap();
    let stale = pending_id(&view);
    let view = hitl
        .respond(view.checkpoint_id, stale, HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();

    let err = hitl
        .respond(view.checkpoint_id, stale, HitlResponse::Approval(true))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::UnknownRequest { request_id, .. } if request_id == stale));
}

#[tokio::test]
async fn test_claimed_checkpoint_is_busy() {
    let agents = happy_agents(1);
    let store = Arc::new(InMemoryCheckpointStore::new());
    let hitl = pipeline(&agents, Arc::clone(&store) as Arc<dyn CheckpointStore>);

    let view = hitl.start(inputs()).await.unwrap();
    store.claim(view.checkpoint_id).await.unwrap();

    let err = hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap_err();
    assert!(matches!(err, DomainError::CheckpointBusy(id) if id == view.checkpoint_id));

    store.release(view.checkpoint_id).await.unwrap();
    assert!(hitl
        .respond(view.checkpoint_id, pending_id(&view), HitlResponse::Idea("Moving On".into()))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unknown_checkpoint() {
    let agents = happy_agents(1);
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));
    let missing = Uuid::new_v4();

    assert!(matches!(
        hitl.show(missing).await.unwrap_err(),
        DomainError::CheckpointNotFound(id) if id == missing
    ));
    assert!(matches!(
        hitl.respond(missing, Uuid::new_v4(), HitlResponse::Approval(true))
            .await
            .unwrap_err(),
        DomainError::CheckpointNotFound(_)
    ));
}

#[tokio::test]
async fn test_weak_template_halts_session() {
    let agents = ScriptedAgents::new().with_template(MockAgent::scripted(
        AgentRole::Template,
        [MockReply::text(blueprint(50))],
    ));
    let hitl = pipeline(&agents, Arc::new(InMemoryCheckpointStore::new()));

    let view = hitl
        .start(WorkflowInputs::new(ReferenceInput::new("", "Hello", "", "")))
        .await
        .unwrap();
    assert!(matches!(
        view.marker,
        PauseMarker::Halted { needs_lyrics: true, .. }
    ));
    assert!(view.pending().is_none());
}

#[tokio::test]
async fn test_file_store_resumes_across_pipelines() {
    let dir = tempfile::tempdir().unwrap();
    let agents = happy_agents(1);

    let first = pipeline(&agents, Arc::new(FileCheckpointStore::new(dir.path())));
    let view = first.start(inputs()).await.unwrap();
    let checkpoint_id = view.checkpoint_id;
    let request_id = pending_id(&view);
    drop(first);

    let second = pipeline(&agents, Arc::new(FileCheckpointStore::new(dir.path())));
    let shown = second.show(checkpoint_id).await.unwrap();
    assert_eq!(pending_id(&shown), request_id);

    let view = second
        .respond(checkpoint_id, request_id, HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    assert!(matches!(view.pending(), Some(PendingRequest::LyricApproval { .. })));
}

/// Writer whose first call never returns.
struct StallingWriter {
    stalled: AtomicBool,
}

#[async_trait]
impl Agent for StallingWriter {
    fn role(&self) -> AgentRole {
        AgentRole::Writer
    }

    fn name(&self) -> &'static str {
        "stalling"
    }

    async fn run(
        &self,
        _prompt: &str,
        _thread: ConversationHandle,
    ) -> Result<String, AgentInvocationError> {
        if !self.stalled.swap(true, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        Ok("draft after retry".to_string())
    }
}

async fn abandoned_resume_can_be_retried(store: Arc<dyn CheckpointStore>) {
    let agents = happy_agents(0);
    let writer = Arc::new(StallingWriter {
        stalled: AtomicBool::new(false),
    });
    let registry = agents
        .registry()
        .with_agent(AgentRole::Writer, writer as Arc<dyn Agent>);
    let workflow = LyricWorkflow::new(&registry, &offline_config()).unwrap();
    let hitl = HitlPipeline::new(Arc::new(workflow), store);

    let view = hitl.start(inputs()).await.unwrap();
    let request_id = pending_id(&view);
    let cancelled = tokio::time::timeout(
        Duration::from_millis(50),
        hitl.respond(view.checkpoint_id, request_id, HitlResponse::Idea("Moving On".into())),
    )
    .await;
    assert!(cancelled.is_err());
    tokio::time::sleep(Duration::from_millis(20)).await;

    let view = hitl
        .respond(view.checkpoint_id, request_id, HitlResponse::Idea("Moving On".into()))
        .await
        .unwrap();
    match view.pending() {
        Some(PendingRequest::LyricApproval { lyrics, .. }) => {
            assert_eq!(lyrics, "draft after retry");
        }
        other => panic!("expected lyric approval request, got {other:?}"),
    }
}

#[tokio::test]
async fn test_dropped_respond_releases_memory_lease() {
    abandoned_resume_can_be_retried(Arc::new(InMemoryCheckpointStore::new())).await;
}

#[tokio::test]
async fn test_dropped_respond_releases_file_lease() {
    let dir = tempfile::tempdir().unwrap();
    abandoned_resume_can_be_retried(Arc::new(FileCheckpointStore::new(dir.path()))).await;
}
