//! Mock agent for testing and offline runs.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::errors::AgentInvocationError;
use crate::domain::models::{AgentRole, ConversationHandle};
use crate::domain::ports::Agent;

/// One scripted reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Text(String),
    Fail(String),
}

impl MockReply {
    pub fn text(output: impl Into<String>) -> Self {
        Self::Text(output.into())
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self::Fail(error.into())
    }
}

const OFFLINE_TEMPLATE: &str = "## Blueprint Summary\n\
Structure: Verse 1, Pre-chorus, Chorus, Verse 2, Pre-chorus, Chorus, Bridge, Final Chorus.\n\
Verses run eight lines in ABAB rhyme; the chorus is four short lines in AABB with the title \
landing on the last line. First-person voice, present tense, plain conversational diction \
built on concrete domestic objects and small physical actions.";

const OFFLINE_LYRICS: &str = "[VERSE 1]\n\
Left the porch light on for no one\n\
Kettle clicking on the stove\n\
Counting tiles across the kitchen\n\
Every road I never chose\n\n\
[CHORUS]\n\
So I'm packing up the morning\n\
Folding Sunday into three\n\
Leave the key beneath the planter\n\
I am moving on for me";

const OFFLINE_VERDICT: &str = r#"{"satisfied": true, "style_feedback": "Sections and rhyme follow the blueprint.", "language_quality": "Concrete household imagery throughout.", "plagiarism_concerns": "", "revision_suggestions": ""}"#;

const OFFLINE_PRODUCTION: &str = r#"{"style_prompt": "Indie Folk + Bedroom Pop, fingerpicked nylon guitar with soft brushed drums and warm upright bass, close-miked female vocals with a dry conversational delivery opening into airy double-tracked harmonies on the chorus, intimate lo-fi mix with gentle tape saturation, hopeful morning atmosphere, 92 BPM relaxed shuffle", "lyric_sheet": "[Intro | mood: quiet]\n\n[Verse 1 | vocals: intimate]\nLeft the porch light on for no one\n\n[Chorus | vocals: harmonized]\nSo I'm packing up the morning"}"#;

/// Canned answer for each role, used by the `mock` provider.
pub fn offline_reply(role: AgentRole) -> &'static str {
    match role {
        AgentRole::Template => OFFLINE_TEMPLATE,
        AgentRole::Writer => OFFLINE_LYRICS,
        AgentRole::Reviewer => OFFLINE_VERDICT,
        AgentRole::Producer => OFFLINE_PRODUCTION,
    }
}

/// Agent that replays scripted replies and records every prompt it sees.
pub struct MockAgent {
    role: AgentRole,
    script: Mutex<VecDeque<MockReply>>,
    fallback: Option<MockReply>,
    prompts: Mutex<Vec<String>>,
    calls: AtomicUsize,
}

impl MockAgent {
    /// Agent with an empty script and no fallback; every call fails.
    pub fn new(role: AgentRole) -> Self {
        Self {
            role,
            script: Mutex::new(VecDeque::new()),
            fallback: None,
            prompts: Mutex::new(Vec::new()),
            calls: AtomicUsize::new(0),
        }
    }

    /// Agent answering with the role's canned offline reply.
    pub fn offline(role: AgentRole) -> Self {
        Self::new(role).with_fallback(MockReply::text(offline_reply(role)))
    }

    /// Agent that replays `replies` in order, then fails.
    pub fn scripted<I>(role: AgentRole, replies: I) -> Self
    where
        I: IntoIterator<Item = MockReply>,
    {
        Self {
            script: Mutex::new(replies.into_iter().collect()),
            ..Self::new(role)
        }
    }

    /// Reply used once the script is exhausted.
    #[must_use]
    pub fn with_fallback(mut self, reply: MockReply) -> Self {
        self.fallback = Some(reply);
        self
    }

    pub async fn push(&self, reply: MockReply) {
        self.script.lock().await.push_back(reply);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every prompt received, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn name(&self) -> &'static str {
        "mock"
    }

    async fn run(
        &self,
        prompt: &str,
        _thread: ConversationHandle,
    ) -> Result<String, AgentInvocationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().await.push(prompt.to_string());

        let next = self.script.lock().await.pop_front();
        match next.or_else(|| self.fallback.clone()) {
            Some(MockReply::Text(output)) => Ok(output),
            Some(MockReply::Fail(error)) => Err(AgentInvocationError::Other(error)),
            None => Err(AgentInvocationError::ScriptExhausted(
                self.role.agent_name().to_string(),
            )),
        }
    }
}
