//! Template stage: derive a lyric blueprint from references.
//!
//! The template agent will happily invent a plausible analysis for a song it
//! does not know. A [`TemplateScorer`] looks at the answer and decides whether
//! it is usable, missing, or too vague to trust without pasted lyrics.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::models::{
    HeuristicsConfig, ReferenceInput, WorkflowInputs, WorkflowState, WorkflowStatus,
};
use crate::domain::ports::Agent;
use crate::services::agent_call::{run_agent, NO_OUTPUT_GENERATED};

pub const EMPTY_REFERENCE_ERROR: &str =
    "Please provide at least one of: Artist(s), Song(s), lyrics, or other guidance.";
pub const TEMPLATE_AGENT_FAILED: &str = "Template agent failed. Try again with lyrics pasted.";
pub const TEMPLATE_EMPTY_ERROR: &str = "Template agent returned an empty response.";

/// Why a template was judged unreliable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insufficiency {
    /// The model admitted it could not find the song
    FailureMarker(String),
    /// Too much generic hedging vocabulary
    Hedging { hits: usize },
    /// Only names were given and the answer is short
    TooShort { chars: usize },
}

/// Outcome of scoring one template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateAssessment {
    Usable,
    Missing,
    Insufficient(Insufficiency),
}

/// Confidence check over template agent output.
pub trait TemplateScorer: Send + Sync {
    fn assess(&self, template: &str, reference: &ReferenceInput) -> TemplateAssessment;
}

/// Marker-list and threshold scorer driven by [`HeuristicsConfig`].
#[derive(Debug, Clone, Default)]
pub struct HeuristicScorer {
    config: HeuristicsConfig,
}

impl HeuristicScorer {
    pub fn new(config: HeuristicsConfig) -> Self {
        Self { config }
    }

    /// Blank, the no-output placeholder, or shorter than the minimum.
    pub fn is_missing(&self, template: &str) -> bool {
        let cleaned = template.trim();
        cleaned.is_empty()
            || cleaned.eq_ignore_ascii_case(NO_OUTPUT_GENERATED)
            || cleaned.chars().count() < self.config.min_template_chars
    }

    /// Only consulted when no reference lyrics were pasted.
    pub fn insufficiency(&self, template: &str, reference: &ReferenceInput) -> Option<Insufficiency> {
        if reference.has_reference_lyrics() {
            return None;
        }
        let lowered = template.to_lowercase();

        if let Some(marker) = self
            .config
            .failure_markers
            .iter()
            .find(|marker| lowered.contains(marker.as_str()))
        {
            return Some(Insufficiency::FailureMarker(marker.clone()));
        }

        let hits: usize = self
            .config
            .hedging_words
            .iter()
            .filter(|word| !word.is_empty())
            .map(|word| lowered.matches(word.as_str()).count())
            .sum();
        if hits >= self.config.hedge_threshold {
            return Some(Insufficiency::Hedging { hits });
        }

        let chars = template.trim().chars().count();
        if reference.is_names_only() && chars < self.config.names_only_min_chars {
            return Some(Insufficiency::TooShort { chars });
        }
        None
    }
}

impl TemplateScorer for HeuristicScorer {
    fn assess(&self, template: &str, reference: &ReferenceInput) -> TemplateAssessment {
        if self.is_missing(template) {
            return TemplateAssessment::Missing;
        }
        match self.insufficiency(template, reference) {
            Some(reason) => TemplateAssessment::Insufficient(reason),
            None => TemplateAssessment::Usable,
        }
    }
}

/// Combined reference text handed to the template agent.
pub fn build_reference(reference: &ReferenceInput) -> String {
    let mut parts = Vec::new();
    let artists = reference.artists.trim();
    if !artists.is_empty() {
        parts.push(format!("Artist(s): {artists}"));
    }
    let songs = reference.songs.trim();
    if !songs.is_empty() {
        parts.push(format!("Song(s): {songs}"));
    }
    let guidance = reference.guidance.trim();
    if !guidance.is_empty() {
        parts.push(format!("Additional guidance: {guidance}"));
    }
    let lyrics = reference.reference_lyrics.trim();
    if !lyrics.is_empty() {
        parts.push(
            "Provided Lyrics (authoritative reference for analysis only; do NOT reuse exact phrases):"
                .to_string(),
        );
        parts.push(lyrics.to_string());
    }
    parts.join("\n")
}

/// The em-dash in the instructions is part of the prompt text sent to the model.
pub fn template_prompt(reference: &str) -> String {
    format!(
        "Analyze the following references and return a concise, factual lyric blueprint.\n\
         - Summarize structure, perspective, tone, and key motifs.\n\
         - Do NOT include sample lyric lines or invented examples\u{2014}only describe patterns.\n\
         - Keep it short and declarative so the writer does not copy phrasing.\n\n\
         {reference}"
    )
}

/// Drives the template agent and gates on the scorer's verdict.
pub struct TemplateStage {
    agent: Arc<dyn Agent>,
    scorer: Arc<dyn TemplateScorer>,
}

impl TemplateStage {
    pub fn new(agent: Arc<dyn Agent>, scorer: Arc<dyn TemplateScorer>) -> Self {
        Self { agent, scorer }
    }

    pub fn with_scorer(mut self, scorer: Arc<dyn TemplateScorer>) -> Self {
        self.scorer = scorer;
        self
    }

    /// Settles in `Complete`, `NeedsLyrics` or `Error`.
    pub async fn run(&self, inputs: WorkflowInputs) -> WorkflowState {
        let mut state = WorkflowState::new(inputs);
        state.settle(WorkflowStatus::Running);

        let reference = build_reference(&state.inputs.reference);
        if reference.trim().is_empty() {
            state.fail(EMPTY_REFERENCE_ERROR);
            return state;
        }

        info!("generating style template from references");
        let template = match run_agent(self.agent.as_ref(), &template_prompt(&reference)).await {
            Ok(template) => template,
            Err(err) => {
                error!(error = %err, "template generation failed");
                state.fail(TEMPLATE_AGENT_FAILED);
                return state;
            }
        };

        state.outputs.template = Some(template.clone());
        if state.inputs.has_idea() {
            state.outputs.idea = Some(state.inputs.idea.clone());
        }

        let assessment = self.scorer.assess(&template, &state.inputs.reference);
        match assessment {
            TemplateAssessment::Usable => {
                info!(chars = template.len(), "template accepted");
                state.settle(WorkflowStatus::Complete);
            }
            TemplateAssessment::Missing | TemplateAssessment::Insufficient(_) => {
                warn!(?assessment, "template rejected");
                if state.inputs.reference.has_reference_lyrics() {
                    state.fail(TEMPLATE_EMPTY_ERROR);
                } else {
                    state.settle(WorkflowStatus::NeedsLyrics);
                }
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> HeuristicScorer {
        HeuristicScorer::default()
    }

    #[test]
    fn test_template_prompt_wording() {
        let prompt = template_prompt("Guidance: moody");
        assert!(prompt.contains("invented examples\u{2014}only describe patterns."));
        assert!(prompt.ends_with("\n\nGuidance: moody"));
    }

    #[test]
    fn test_missing_detection() {
        let s = scorer();
        assert!(s.is_missing("   "));
        assert!(s.is_missing("No output generated"));
        assert!(s.is_missing("too short"));
        assert!(!s.is_missing(&"x".repeat(40)));
    }

    #[test]
    fn test_failure_marker() {
        let reference = ReferenceInput::new("Someone", "", "moody", "");
        let template = "I could not find this song, but here is a generic structure for it.";
        assert_eq!(
            scorer().insufficiency(template, &reference),
            Some(Insufficiency::FailureMarker("could not find".to_string()))
        );
    }

    #[test]
    fn test_hedge_threshold_counts_occurrences() {
        let reference = ReferenceInput::new("", "", "moody", "");
        let one = "Verses are typically four lines with a tight rhyme scheme and a spoken bridge.";
        assert_eq!(scorer().insufficiency(one, &reference), None);
        let two = "Verses are typically four lines; choruses usually repeat a short hook twice.";
        assert_eq!(
            scorer().insufficiency(two, &reference),
            Some(Insufficiency::Hedging { hits: 2 })
        );
    }

    #[test]
    fn test_names_only_short_output() {
        let reference = ReferenceInput::new("", "Some Song", "", "");
        let template = "x".repeat(50);
        assert_eq!(
            scorer().assess(&template, &reference),
            TemplateAssessment::Insufficient(Insufficiency::TooShort { chars: 50 })
        );
        let with_lyrics = ReferenceInput::new("", "Some Song", "", "la la la");
        assert_eq!(scorer().assess(&template, &with_lyrics), TemplateAssessment::Usable);
    }

    #[test]
    fn test_thresholds_are_tunable() {
        let config = HeuristicsConfig {
            names_only_min_chars: 10,
            hedge_threshold: 5,
            ..HeuristicsConfig::default()
        };
        let scorer = HeuristicScorer::new(config);
        let reference = ReferenceInput::new("", "Some Song", "", "");
        let template = "Verses typically rhyme and usually land on a plain spoken hook.";
        assert_eq!(scorer.assess(template, &reference), TemplateAssessment::Usable);
    }

    #[test]
    fn test_build_reference_sections() {
        let reference = ReferenceInput::new(" A ", "", "slow", "line one\n");
        assert_eq!(
            build_reference(&reference),
            "Artist(s): A\nAdditional guidance: slow\n\
             Provided Lyrics (authoritative reference for analysis only; do NOT reuse exact phrases):\n\
             line one"
        );
        assert!(build_reference(&ReferenceInput::default()).is_empty());
    }
}
