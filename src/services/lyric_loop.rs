//! Writer/reviewer iteration loop.
//!
//! Each iteration drafts lyrics with the writer agent, critiques them with the
//! reviewer agent, and records a [`FeedbackEntry`]. The loop stops as soon as
//! the reviewer is satisfied or the iteration budget runs out. There is no
//! guarantee that later drafts improve on earlier ones; the result is the last
//! draft produced.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentRole, FeedbackEntry};
use crate::domain::ports::Agent;
use crate::services::agent_call::{preview, run_agent, PROMPT_LOG_CHARS};
use crate::services::forbidden_phrases::ForbiddenPhrases;
use crate::services::json_recovery::parse_review_verdict;

const WRITER_NO_PHRASES: &str =
    "None explicitly provided; still avoid lifting hooks or album titles from the template.";
const REVIEWER_NO_PHRASES: &str = "Reference song/album titles and hooks implied by the template.";
const MISSING_HISTORY_SUGGESTION: &str =
    "Rewrite with fresh imagery; avoid any repeated hooks/titles.";

/// Revision instruction used when a reviewed draft is sent back by the user.
pub const REGENERATE_INSTRUCTION: &str = "The previous draft was rejected. Take a clearly \
different direction: new imagery, a new central hook, and a different narrative angle, \
while still matching the style template.";

/// Draft and feedback that seed the first writer prompt of a regenerated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionSeed {
    pub previous_draft: String,
    pub suggestions: String,
}

impl RevisionSeed {
    /// Seed for regenerating after the user rejected `draft`.
    pub fn rejected(draft: impl Into<String>) -> Self {
        Self {
            previous_draft: draft.into(),
            suggestions: REGENERATE_INSTRUCTION.to_string(),
        }
    }
}

/// Everything one loop run needs besides the agents.
#[derive(Debug, Clone)]
pub struct LoopRequest<'a> {
    pub template: &'a str,
    pub idea: &'a str,
    /// Computed once per run and reused verbatim in every prompt
    pub forbidden: &'a ForbiddenPhrases,
    pub max_iterations: u32,
    pub seed: Option<RevisionSeed>,
}

/// Final draft plus the complete ordered history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub lyrics: String,
    pub history: Vec<FeedbackEntry>,
}

impl LoopOutcome {
    pub fn satisfied(&self) -> bool {
        self.history.last().is_some_and(|entry| entry.feedback.satisfied)
    }

    pub fn iterations(&self) -> u32 {
        self.history.last().map_or(0, |entry| entry.iteration)
    }
}

/// Writer prompt. `revision` carries the previous draft and the suggestions to apply.
pub fn writer_prompt(
    template: &str,
    idea: &str,
    forbidden: &ForbiddenPhrases,
    revision: Option<(&str, &str)>,
) -> String {
    let header = format!(
        "Style Template (analysis only; do NOT reuse exact titles/phrases):\n{template}\n\n\
         Song Idea/Title: {idea}\n\
         Forbidden titles/phrases to avoid entirely (do not paraphrase): {}\n\n",
        forbidden.prompt_list(WRITER_NO_PHRASES)
    );
    match revision {
        None => format!("{header}Generate complete lyrics matching this template with fresh wording."),
        Some((previous, suggestions)) => {
            let previous = if previous.trim().is_empty() { "N/A" } else { previous };
            format!(
                "{header}Previous draft:\n{previous}\n\n\
                 Revision Feedback:\n{suggestions}\n\n\
                 Generate revised lyrics incorporating the feedback above without reusing any reference hooks."
            )
        }
    }
}

pub fn reviewer_prompt(template: &str, idea: &str, lyrics: &str, forbidden: &ForbiddenPhrases) -> String {
    format!(
        "Style Template:\n{template}\n\n\
         Song Idea/Title: {idea}\n\n\
         Generated Lyrics:\n{lyrics}\n\n\
         Forbidden titles/phrases that must NOT appear (if present, set satisfied=false and flag plagiarism): {}\n\n\
         Provide feedback in JSON format.",
        forbidden.prompt_list(REVIEWER_NO_PHRASES)
    )
}

/// Alternates writer drafting and reviewer critique.
pub struct WriterReviewerLoop {
    writer: Arc<dyn Agent>,
    reviewer: Arc<dyn Agent>,
}

impl WriterReviewerLoop {
    pub fn new(writer: Arc<dyn Agent>, reviewer: Arc<dyn Agent>) -> Self {
        Self { writer, reviewer }
    }

    /// Run until satisfied or `max_iterations` drafts have been reviewed.
    ///
    /// Agent failures abort the run; unparseable reviews do not.
    pub async fn run(&self, request: LoopRequest<'_>) -> DomainResult<LoopOutcome> {
        let max_iterations = request.max_iterations.max(1);
        let mut history: Vec<FeedbackEntry> = Vec::new();

        for iteration in 1..=max_iterations {
            info!(iteration, max_iterations, "writer/reviewer iteration");

            let prompt = match (iteration, &request.seed, history.last()) {
                (1, None, _) => writer_prompt(request.template, request.idea, request.forbidden, None),
                (1, Some(seed), _) => writer_prompt(
                    request.template,
                    request.idea,
                    request.forbidden,
                    Some((seed.previous_draft.as_str(), seed.suggestions.as_str())),
                ),
                (_, _, Some(last)) => writer_prompt(
                    request.template,
                    request.idea,
                    request.forbidden,
                    Some((last.lyrics.as_str(), last.feedback.revision_suggestions.as_str())),
                ),
                (_, _, None) => {
                    warn!("no prior feedback available for revision; using generic rewrite instruction");
                    writer_prompt(
                        request.template,
                        request.idea,
                        request.forbidden,
                        Some(("", MISSING_HISTORY_SUGGESTION)),
                    )
                }
            };

            debug!(
                len = prompt.len(),
                prompt = %preview(&prompt, PROMPT_LOG_CHARS),
                "writer prompt"
            );
            let draft = run_agent(self.writer.as_ref(), &prompt)
                .await
                .map_err(|err| DomainError::agent(AgentRole::Writer, err))?;
            info!(chars = draft.len(), "generated lyrics");

            let review = reviewer_prompt(request.template, request.idea, &draft, request.forbidden);
            debug!(
                len = review.len(),
                prompt = %preview(&review, PROMPT_LOG_CHARS),
                "reviewer prompt"
            );
            let raw_feedback = run_agent(self.reviewer.as_ref(), &review)
                .await
                .map_err(|err| DomainError::agent(AgentRole::Reviewer, err))?;
            let feedback = parse_review_verdict(&raw_feedback);

            let satisfied = feedback.satisfied;
            info!(iteration, satisfied, "reviewer verdict");
            history.push(FeedbackEntry {
                iteration,
                lyrics: draft,
                feedback,
            });

            if satisfied {
                break;
            }
        }

        let lyrics = history
            .last()
            .map(|entry| entry.lyrics.clone())
            .unwrap_or_default();
        Ok(LoopOutcome { lyrics, history })
    }
}
