//! Workflow orchestrator composing the template, lyric and producer stages.
//!
//! ```text
//! generate_template: Idle → Running → Complete | NeedsLyrics | Error
//! generate_lyrics:   Idle → Running → Complete | Error
//! run_producer:      Complete → Complete | Error
//! ```
//!
//! Every entry point returns a [`WorkflowState`]; validation and agent
//! failures are reported through its status rather than as `Err`.

use std::sync::Arc;

use tracing::{debug, error, info, instrument};

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    AgentRole, Config, HeuristicsConfig, ReferenceInput, WorkflowConfig, WorkflowInputs,
    WorkflowState, WorkflowStatus,
};
use crate::domain::ports::AgentFactory;
use crate::services::forbidden_phrases::ForbiddenPhrases;
use crate::services::lyric_loop::{LoopOutcome, LoopRequest, RevisionSeed, WriterReviewerLoop};
use crate::services::producer_stage::ProducerStage;
use crate::services::template_stage::{HeuristicScorer, TemplateScorer, TemplateStage};

pub const MISSING_TEMPLATE_ERROR: &str = "Template is required before generating lyrics.";
pub const MISSING_IDEA_ERROR: &str = "Add a song idea or title before generating lyrics.";
pub const LYRIC_LOOP_FAILED: &str = "Lyric writer or reviewer failed. Try again.";

/// The lyric pipeline: one instance serves many independent runs.
pub struct LyricWorkflow {
    template_stage: TemplateStage,
    lyric_loop: WriterReviewerLoop,
    producer_stage: ProducerStage,
    workflow: WorkflowConfig,
    heuristics: HeuristicsConfig,
}

impl LyricWorkflow {
    /// Build all four agents up front so a misconfigured role fails before any stage runs.
    pub fn new(factory: &dyn AgentFactory, config: &Config) -> DomainResult<Self> {
        let template = factory.create(AgentRole::Template)?;
        let writer = factory.create(AgentRole::Writer)?;
        let reviewer = factory.create(AgentRole::Reviewer)?;
        let producer = factory.create(AgentRole::Producer)?;

        let scorer: Arc<dyn TemplateScorer> =
            Arc::new(HeuristicScorer::new(config.heuristics.clone()));
        info!(
            max_iterations = config.workflow.max_iterations,
            "lyric workflow initialized with all agents"
        );

        Ok(Self {
            template_stage: TemplateStage::new(template, scorer),
            lyric_loop: WriterReviewerLoop::new(writer, reviewer),
            producer_stage: ProducerStage::new(producer),
            workflow: config.workflow.clone(),
            heuristics: config.heuristics.clone(),
        })
    }

    /// Replace the template scorer.
    #[must_use]
    pub fn with_scorer(mut self, scorer: Arc<dyn TemplateScorer>) -> Self {
        self.template_stage = self.template_stage.with_scorer(scorer);
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.workflow.max_iterations.max(1)
    }

    pub fn max_regenerations(&self) -> u32 {
        self.workflow.max_regenerations
    }

    /// Forbidden phrases for one loop run over `reference`.
    pub fn forbidden_phrases(&self, reference: &ReferenceInput) -> ForbiddenPhrases {
        ForbiddenPhrases::from_reference(reference, self.heuristics.max_forbidden_ngrams)
    }

    /// Run only the template stage so the caller can gate on reference quality.
    #[instrument(skip_all)]
    pub async fn generate_template(&self, inputs: WorkflowInputs) -> WorkflowState {
        let state = self.template_stage.run(inputs).await;
        info!(status = %state.status(), "template stage finished");
        state
    }

    /// Run the writer/reviewer loop against an existing template.
    pub async fn generate_lyrics(&self, inputs: WorkflowInputs, template: &str) -> WorkflowState {
        self.generate_lyrics_seeded(inputs, template, None).await
    }

    /// [`generate_lyrics`](Self::generate_lyrics) with an optional first-prompt revision seed.
    #[instrument(skip_all, fields(seeded = seed.is_some()))]
    pub async fn generate_lyrics_seeded(
        &self,
        inputs: WorkflowInputs,
        template: &str,
        seed: Option<RevisionSeed>,
    ) -> WorkflowState {
        let mut state = WorkflowState::new(inputs);
        state.settle(WorkflowStatus::Running);
        state.outputs.template = Some(template.to_string());
        state.outputs.idea = Some(state.inputs.idea.clone());

        if template.trim().is_empty() {
            state.fail(MISSING_TEMPLATE_ERROR);
            return state;
        }
        if !state.inputs.has_idea() {
            state.fail(MISSING_IDEA_ERROR);
            return state;
        }

        let forbidden = self.forbidden_phrases(&state.inputs.reference);
        debug!(count = forbidden.len(), phrases = ?forbidden.as_slice(), "forbidden phrases");

        let request = LoopRequest {
            template,
            idea: &state.inputs.idea,
            forbidden: &forbidden,
            max_iterations: self.max_iterations(),
            seed,
        };
        match self.lyric_loop.run(request).await {
            Ok(outcome) => {
                info!(
                    iterations = outcome.iterations(),
                    satisfied = outcome.satisfied(),
                    "lyric loop finished"
                );
                let LoopOutcome { lyrics, history } = outcome;
                state.outputs.lyrics = Some(lyrics);
                state.outputs.feedback_history = history;
                state.settle(WorkflowStatus::Complete);
            }
            Err(err) => {
                error!(error = %err, "lyric generation failed");
                state.fail(LYRIC_LOOP_FAILED);
            }
        }
        state
    }

    /// Run the producer stage on a completed state.
    #[instrument(skip_all)]
    pub async fn run_producer(&self, state: WorkflowState) -> WorkflowState {
        self.producer_stage.run(state).await
    }

    /// Template then lyrics; stops at the template stage unless it completed.
    pub async fn run(&self, inputs: WorkflowInputs) -> WorkflowState {
        let template_state = self.generate_template(inputs.clone()).await;
        if !template_state.is_complete() {
            return template_state;
        }
        let template = template_state.outputs.template.unwrap_or_default();
        self.generate_lyrics(inputs, &template).await
    }
}
