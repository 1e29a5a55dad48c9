//! Pause-point records for the human-in-the-loop pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{FeedbackEntry, WorkflowInputs};

/// Question the paused pipeline is waiting on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PendingRequest {
    /// Collect a song idea after the blueprint exists. Expects a string.
    SongIdea {
        request_id: Uuid,
        template: String,
        /// Idea already present in the inputs, offered as a default
        #[serde(default, skip_serializing_if = "Option::is_none")]
        suggested_idea: Option<String>,
        prompt: String,
    },
    /// Accept or regenerate the reviewed lyrics. Expects a bool.
    LyricApproval {
        request_id: Uuid,
        lyrics: String,
        iterations_used: u32,
        prompt: String,
    },
}

impl PendingRequest {
    pub fn song_idea(template: impl Into<String>, suggested_idea: Option<String>) -> Self {
        Self::SongIdea {
            request_id: Uuid::new_v4(),
            template: template.into(),
            suggested_idea,
            prompt: "Please provide a song idea or title:".to_string(),
        }
    }

    pub fn lyric_approval(lyrics: impl Into<String>, iterations_used: u32) -> Self {
        Self::LyricApproval {
            request_id: Uuid::new_v4(),
            lyrics: lyrics.into(),
            iterations_used,
            prompt: "Review the generated lyrics:".to_string(),
        }
    }

    pub fn request_id(&self) -> Uuid {
        match self {
            Self::SongIdea { request_id, .. } | Self::LyricApproval { request_id, .. } => {
                *request_id
            }
        }
    }

    /// Name of the response type the request expects.
    pub fn expected_response(&self) -> &'static str {
        match self {
            Self::SongIdea { .. } => "string",
            Self::LyricApproval { .. } => "bool",
        }
    }
}

/// Caller's answer to a [`PendingRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HitlResponse {
    Approval(bool),
    Idea(String),
}

/// Final record yielded when the pipeline runs to completion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineOutput {
    pub style_prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_extended: Option<String>,
    pub lyric_sheet: String,
    pub template: String,
    pub original_lyrics: String,
    pub feedback_history: Vec<FeedbackEntry>,
    pub user_approved: bool,
}

/// Which stage a checkpoint is parked at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum PauseMarker {
    Awaiting { request: PendingRequest },
    Completed { output: Box<PipelineOutput> },
    Halted { needs_lyrics: bool, message: String },
}

/// Serialized state sufficient to resume a paused pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Checkpoint {
    pub id: Uuid,
    pub inputs: WorkflowInputs,
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub feedback_history: Vec<FeedbackEntry>,
    /// Number of times the reviewed lyrics were sent back for regeneration
    #[serde(default)]
    pub regenerations: u32,
    pub marker: PauseMarker,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Checkpoint {
    pub fn new(inputs: WorkflowInputs, marker: PauseMarker) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            inputs,
            template: None,
            feedback_history: Vec::new(),
            regenerations: 0,
            marker,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pending(&self) -> Option<&PendingRequest> {
        match &self.marker {
            PauseMarker::Awaiting { request } => Some(request),
            PauseMarker::Completed { .. } | PauseMarker::Halted { .. } => None,
        }
    }

    /// Lyrics of the latest reviewed draft.
    pub fn current_lyrics(&self) -> Option<&str> {
        self.feedback_history.last().map(|entry| entry.lyrics.as_str())
    }

    pub fn park(&mut self, marker: PauseMarker) {
        self.marker = marker;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_response_parsing() {
        let idea: HitlResponse = serde_json::from_str(r#""Moving On""#).unwrap();
        assert_eq!(idea, HitlResponse::Idea("Moving On".to_string()));
        let approval: HitlResponse = serde_json::from_str("false").unwrap();
        assert_eq!(approval, HitlResponse::Approval(false));
    }

    #[test]
    fn test_checkpoint_serializes_marker() {
        let checkpoint = Checkpoint::new(
            WorkflowInputs::default(),
            PauseMarker::Awaiting {
                request: PendingRequest::song_idea("blueprint", None),
            },
        );
        let json = serde_json::to_value(&checkpoint).unwrap();
        assert_eq!(json["marker"]["stage"], "awaiting");
        assert_eq!(json["marker"]["request"]["kind"], "song_idea");
        let back: Checkpoint = serde_json::from_value(json).unwrap();
        assert_eq!(back, checkpoint);
    }
}
