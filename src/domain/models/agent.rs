//! Agent roles and conversation handles.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Logical role of one of the four pipeline agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRole {
    /// Derives the structural/stylistic blueprint from references
    Template,
    /// Drafts and revises lyrics
    Writer,
    /// Critiques drafts and returns a JSON verdict
    Reviewer,
    /// Turns approved lyrics into a style prompt and tagged lyric sheet
    Producer,
}

impl AgentRole {
    pub const ALL: [Self; 4] = [Self::Template, Self::Writer, Self::Reviewer, Self::Producer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Template => "template",
            Self::Writer => "writer",
            Self::Reviewer => "reviewer",
            Self::Producer => "producer",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "template" | "lyric_template" => Some(Self::Template),
            "writer" | "lyric_writer" => Some(Self::Writer),
            "reviewer" | "lyric_reviewer" => Some(Self::Reviewer),
            "producer" | "suno_producer" => Some(Self::Producer),
            _ => None,
        }
    }

    /// Prefix used by the per-role environment overrides (`WRITER_CHAT_MODEL_ID`, ...).
    pub fn env_prefix(&self) -> &'static str {
        match self {
            Self::Template => "TEMPLATE",
            Self::Writer => "WRITER",
            Self::Reviewer => "REVIEWER",
            Self::Producer => "PRODUCER",
        }
    }

    /// Display name used in logs and backend requests.
    pub fn agent_name(&self) -> &'static str {
        match self {
            Self::Template => "LyricTemplateAgent",
            Self::Writer => "LyricWriterAgent",
            Self::Reviewer => "LyricReviewerAgent",
            Self::Producer => "ProducerAgent",
        }
    }
}

impl fmt::Display for AgentRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Opaque conversation scope for a single agent call.
///
/// Handles are created fresh for every stage invocation and consumed by the
/// call, so the backend only ever sees the role's system prompt plus the
/// prompt built for that call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationHandle {
    id: Uuid,
    role: AgentRole,
}

impl ConversationHandle {
    pub fn new(role: AgentRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> AgentRole {
        self.role
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip_names() {
        for role in AgentRole::ALL {
            assert_eq!(AgentRole::from_str(role.as_str()), Some(role));
        }
        assert_eq!(AgentRole::from_str("suno_producer"), Some(AgentRole::Producer));
        assert_eq!(AgentRole::from_str("drummer"), None);
    }

    #[test]
    fn test_handles_are_unique() {
        let a = ConversationHandle::new(AgentRole::Writer);
        let b = ConversationHandle::new(AgentRole::Writer);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.role(), AgentRole::Writer);
    }
}
