//! Single agent round-trip shared by every stage.

use tracing::{debug, error};

use crate::domain::errors::AgentInvocationError;
use crate::domain::models::ConversationHandle;
use crate::domain::ports::Agent;

/// Substituted when an agent answers with nothing but whitespace.
pub const NO_OUTPUT_GENERATED: &str = "No output generated";

/// Prompt bodies are cut to this many chars in debug logs.
pub const PROMPT_LOG_CHARS: usize = 600;

/// Run `prompt` on a fresh conversation and return the agent's text.
pub async fn run_agent(agent: &dyn Agent, prompt: &str) -> Result<String, AgentInvocationError> {
    let role = agent.role();
    let thread = ConversationHandle::new(role);
    debug!(
        %role,
        thread = %thread.id(),
        prompt_len = prompt.len(),
        prompt = %preview(prompt, PROMPT_LOG_CHARS),
        "running agent"
    );

    match agent.run(prompt, thread).await {
        Ok(output) => {
            debug!(%role, chars = output.len(), "agent output");
            if output.trim().is_empty() {
                Ok(NO_OUTPUT_GENERATED.to_string())
            } else {
                Ok(output)
            }
        }
        Err(err) => {
            error!(%role, backend = agent.name(), error = %err, "error running agent");
            Err(err)
        }
    }
}

/// First `max_chars` characters of `text`.
pub fn preview(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_respects_char_boundaries() {
        assert_eq!(preview("héllo", 2), "hé");
        assert_eq!(preview("hi", 10), "hi");
    }
}
