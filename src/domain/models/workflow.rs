//! Workflow state machine types.
//!
//! ```text
//! Idle → Running → Complete | NeedsLyrics | Error      (generate_template)
//! Idle → Running → Complete | Error                    (generate_lyrics)
//! Complete → Complete | Error                          (run_producer)
//! ```
//!
//! Any state may move to `Error`; `NeedsLyrics` and `Error` are otherwise terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::{FeedbackEntry, ProducerOutput, WorkflowInputs};
use crate::domain::errors::{DomainError, DomainResult};

/// Hint shown to the caller when the template stage asks for pasted lyrics.
pub const NEEDS_LYRICS_HINT: &str =
    "Could not build a template from that artist/song combo. Paste exact lyrics to continue.";

/// Externally observable progress of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkflowStatus {
    Idle,
    Running,
    /// Recoverable: re-run the template stage with reference lyrics.
    NeedsLyrics,
    Complete,
    Error(String),
}

impl WorkflowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::NeedsLyrics => "needs_lyrics",
            Self::Complete => "complete",
            Self::Error(_) => "error",
        }
    }

    pub fn is_terminal(&self) -> bool {
        match self {
            Self::NeedsLyrics | Self::Complete | Self::Error(_) => true,
            Self::Idle | Self::Running => false,
        }
    }

    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: &Self) -> bool {
        match (self, next) {
            (_, Self::Error(_)) => true,
            (Self::Idle, Self::Running) => true,
            (Self::Running, Self::Complete | Self::NeedsLyrics) => true,
            (Self::Complete, Self::Complete) => true,
            (Self::Idle, _)
            | (Self::Running, _)
            | (Self::Complete, _)
            | (Self::NeedsLyrics, _)
            | (Self::Error(_), _) => false,
        }
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything the pipeline has produced so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowOutputs {
    #[serde(default)]
    pub template: Option<String>,
    #[serde(default)]
    pub idea: Option<String>,
    /// Final lyrics; equals the last history entry's draft when history is non-empty
    #[serde(default)]
    pub lyrics: Option<String>,
    #[serde(default)]
    pub feedback_history: Vec<FeedbackEntry>,
    #[serde(default, rename = "suno_output")]
    pub production: Option<ProducerOutput>,
}

/// State of one pipeline run, owned by the orchestrator and passed through stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "WorkflowStateRecord", from = "WorkflowStateRecord")]
pub struct WorkflowState {
    pub inputs: WorkflowInputs,
    pub outputs: WorkflowOutputs,
    status: WorkflowStatus,
}

impl WorkflowState {
    pub fn new(inputs: WorkflowInputs) -> Self {
        Self {
            inputs,
            outputs: WorkflowOutputs::default(),
            status: WorkflowStatus::Idle,
        }
    }

    /// A fresh state already moved to `Running`.
    pub fn running(inputs: WorkflowInputs) -> Self {
        Self {
            inputs,
            outputs: WorkflowOutputs::default(),
            status: WorkflowStatus::Running,
        }
    }

    /// State for callers that already hold finalized lyrics (e.g. the production endpoint).
    pub fn completed(inputs: WorkflowInputs, outputs: WorkflowOutputs) -> Self {
        Self {
            inputs,
            outputs,
            status: WorkflowStatus::Complete,
        }
    }

    pub fn status(&self) -> &WorkflowStatus {
        &self.status
    }

    /// Error message; `Some` exactly when the status is `Error`.
    pub fn error(&self) -> Option<&str> {
        match &self.status {
            WorkflowStatus::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == WorkflowStatus::Complete
    }

    /// Move to `next`, rejecting transitions the state machine does not allow.
    pub fn transition(&mut self, next: WorkflowStatus) -> DomainResult<()> {
        if !self.status.can_transition_to(&next) {
            return Err(DomainError::InvalidStateTransition {
                from: self.status.to_string(),
                to: next.to_string(),
            });
        }
        self.status = next;
        Ok(())
    }

    /// Like [`transition`](Self::transition), but an illegal move is recorded as an error state.
    pub fn settle(&mut self, next: WorkflowStatus) {
        if let Err(err) = self.transition(next) {
            tracing::warn!(error = %err, "rejected workflow transition");
            self.status = WorkflowStatus::Error(err.to_string());
        }
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = WorkflowStatus::Error(message.into());
    }

    fn hint(&self) -> Option<&'static str> {
        match self.status {
            WorkflowStatus::NeedsLyrics => Some(NEEDS_LYRICS_HINT),
            _ => None,
        }
    }
}

/// Wire shape: `{status, error, hint, inputs, outputs}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkflowStateRecord {
    status: String,
    #[serde(default)]
    error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    hint: Option<String>,
    #[serde(default)]
    inputs: WorkflowInputs,
    #[serde(default)]
    outputs: WorkflowOutputs,
}

impl From<WorkflowState> for WorkflowStateRecord {
    fn from(state: WorkflowState) -> Self {
        Self {
            status: state.status.as_str().to_string(),
            error: state.error().map(str::to_string),
            hint: state.hint().map(str::to_string),
            inputs: state.inputs,
            outputs: state.outputs,
        }
    }
}

impl From<WorkflowStateRecord> for WorkflowState {
    fn from(record: WorkflowStateRecord) -> Self {
        let status = match record.status.as_str() {
            "idle" => WorkflowStatus::Idle,
            "running" => WorkflowStatus::Running,
            "needs_lyrics" => WorkflowStatus::NeedsLyrics,
            "complete" => WorkflowStatus::Complete,
            "error" => WorkflowStatus::Error(record.error.unwrap_or_default()),
            other => WorkflowStatus::Error(format!("Unknown workflow status: {other}")),
        };
        Self {
            inputs: record.inputs,
            outputs: record.outputs,
            status,
        }
    }
}
