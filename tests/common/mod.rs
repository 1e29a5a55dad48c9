//! Common test utilities for integration tests
//!
//! Provides scripted agents wired into a real [`LyricWorkflow`] so tests can
//! drive the pipeline without a backend and assert on every prompt sent.

#![allow(dead_code)]

use std::sync::Arc;

use songsmith::adapters::agents::{AgentRegistry, MockAgent, MockReply};
use songsmith::domain::models::{AgentRole, Config, ProviderKind};
use songsmith::domain::ports::Agent;
use songsmith::services::LyricWorkflow;

const BLUEPRINT_SENTENCE: &str =
    "Structure: verse, chorus, verse, chorus, bridge, final chorus with the title last. ";

/// One scripted agent per role.
pub struct ScriptedAgents {
    pub template: Arc<MockAgent>,
    pub writer: Arc<MockAgent>,
    pub reviewer: Arc<MockAgent>,
    pub producer: Arc<MockAgent>,
}

impl ScriptedAgents {
    /// Agents with empty scripts; any unscripted call fails.
    pub fn new() -> Self {
        Self {
            template: Arc::new(MockAgent::new(AgentRole::Template)),
            writer: Arc::new(MockAgent::new(AgentRole::Writer)),
            reviewer: Arc::new(MockAgent::new(AgentRole::Reviewer)),
            producer: Arc::new(MockAgent::new(AgentRole::Producer)),
        }
    }

    pub fn with_template(mut self, agent: MockAgent) -> Self {
        self.template = Arc::new(agent);
        self
    }

    pub fn with_writer(mut self, agent: MockAgent) -> Self {
        self.writer = Arc::new(agent);
        self
    }

    pub fn with_reviewer(mut self, agent: MockAgent) -> Self {
        self.reviewer = Arc::new(agent);
        self
    }

    pub fn with_producer(mut self, agent: MockAgent) -> Self {
        self.producer = Arc::new(agent);
        self
    }

    pub fn registry(&self) -> AgentRegistry {
        AgentRegistry::new(offline_config())
            .with_agent(AgentRole::Template, Arc::clone(&self.template) as Arc<dyn Agent>)
            .with_agent(AgentRole::Writer, Arc::clone(&self.writer) as Arc<dyn Agent>)
            .with_agent(AgentRole::Reviewer, Arc::clone(&self.reviewer) as Arc<dyn Agent>)
            .with_agent(AgentRole::Producer, Arc::clone(&self.producer) as Arc<dyn Agent>)
    }

    pub fn workflow(&self) -> LyricWorkflow {
        self.workflow_with(&offline_config())
    }

    pub fn workflow_with(&self, config: &Config) -> LyricWorkflow {
        LyricWorkflow::new(&self.registry(), config).expect("scripted agents always resolve")
    }
}

/// Config whose every role is served by the offline mock provider.
pub fn offline_config() -> Config {
    let mut config = Config::default();
    config.llm.provider = ProviderKind::Mock;
    config
}

/// A non-hedging blueprint of exactly `chars` characters.
pub fn blueprint(chars: usize) -> String {
    let mut text: String = BLUEPRINT_SENTENCE.chars().cycle().take(chars).collect();
    if text.ends_with(' ') {
        text.pop();
        text.push('.');
    }
    text
}

/// Reviewer JSON verdict.
pub fn verdict(satisfied: bool, suggestions: &str) -> MockReply {
    MockReply::text(
        serde_json::json!({
            "satisfied": satisfied,
            "style_feedback": if satisfied { "Matches the blueprint." } else { "Needs work." },
            "plagiarism_concerns": "",
            "revision_suggestions": suggestions,
        })
        .to_string(),
    )
}

/// Writer agent replying "draft 1", "draft 2", ... for `n` calls.
pub fn numbered_writer(n: usize) -> MockAgent {
    MockAgent::scripted(
        AgentRole::Writer,
        (1..=n).map(|i| MockReply::text(format!("draft {i}"))),
    )
}

/// Producer agent replying with a well-formed production JSON.
pub fn producer_reply() -> MockReply {
    MockReply::text(
        r#"{"style_prompt": "Synth Pop, bright analog pads", "lyric_sheet": "[Verse 1]\nline"}"#,
    )
}

/// The forbidden-phrase list text embedded in a writer or reviewer prompt.
pub fn forbidden_list(prompt: &str) -> Option<String> {
    prompt
        .lines()
        .find(|line| line.starts_with("Forbidden titles/phrases"))
        .and_then(|line| line.rsplit_once("): "))
        .map(|(_, list)| list.to_string())
}
