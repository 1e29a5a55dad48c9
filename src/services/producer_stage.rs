//! Producer stage: approved lyrics to style prompt and tagged lyric sheet.

use std::sync::Arc;

use tracing::{error, info};

use crate::domain::models::{WorkflowState, WorkflowStatus};
use crate::domain::ports::Agent;
use crate::services::agent_call::run_agent;
use crate::services::json_recovery::parse_producer_output;

pub const NOT_FINALIZED_ERROR: &str = "Cannot run producer: lyrics must be finalized first";
pub const NO_LYRICS_ERROR: &str = "Cannot run producer: no lyrics available";

pub fn producer_prompt(lyrics: &str, template: Option<&str>, guidance: &str) -> String {
    let mut parts = vec![
        "Finalized Lyrics:",
        lyrics,
        "",
        "Style Template:",
        template.unwrap_or("No template provided"),
    ];
    let guidance = guidance.trim();
    if !guidance.is_empty() {
        parts.extend(["", "Production Guidance:", guidance]);
    }
    parts.join("\n")
}

pub struct ProducerStage {
    agent: Arc<dyn Agent>,
}

impl ProducerStage {
    pub fn new(agent: Arc<dyn Agent>) -> Self {
        Self { agent }
    }

    /// Requires a `Complete` state with lyrics; the agent is not called otherwise.
    pub async fn run(&self, mut state: WorkflowState) -> WorkflowState {
        if state.status() != &WorkflowStatus::Complete {
            error!(status = %state.status(), "{NOT_FINALIZED_ERROR}");
            state.fail(NOT_FINALIZED_ERROR);
            return state;
        }
        let Some(lyrics) = state
            .outputs
            .lyrics
            .clone()
            .filter(|lyrics| !lyrics.trim().is_empty())
        else {
            error!("{NO_LYRICS_ERROR}");
            state.fail(NO_LYRICS_ERROR);
            return state;
        };

        info!("running producer agent");
        let prompt = producer_prompt(
            &lyrics,
            state.outputs.template.as_deref(),
            &state.inputs.producer_guidance,
        );
        match run_agent(self.agent.as_ref(), &prompt).await {
            Ok(raw) => {
                state.outputs.production = Some(parse_producer_output(&raw));
                state.settle(WorkflowStatus::Complete);
                info!("producer agent completed");
            }
            Err(err) => {
                error!(error = %err, "producer error");
                state.fail(format!("Producer error: {err}"));
            }
        }
        state
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_without_guidance() {
        assert_eq!(
            producer_prompt("la la", None, "  "),
            "Finalized Lyrics:\nla la\n\nStyle Template:\nNo template provided"
        );
    }

    #[test]
    fn test_prompt_with_guidance() {
        let prompt = producer_prompt("la la", Some("T"), " lofi, 80 bpm ");
        assert!(prompt.ends_with("Style Template:\nT\n\nProduction Guidance:\nlofi, 80 bpm"));
    }
}
