//! Domain errors for the songsmith pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::AgentRole;

/// Failure of a single round-trip to a text-generation backend.
///
/// Every agent call either yields text or one of these; an empty completion
/// is reported as [`AgentInvocationError::EmptyResponse`], never as `Ok("")`.
#[derive(Debug, Error)]
pub enum AgentInvocationError {
    #[error("Backend request failed: {0}")]
    Transport(String),

    #[error("Backend returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed backend response: {0}")]
    MalformedResponse(String),

    #[error("Backend returned no completion")]
    EmptyResponse,

    #[error("Tool loop exceeded {0} rounds without a final answer")]
    ToolLoopExhausted(u32),

    #[error("Agent '{0}' has no scripted responses left")]
    ScriptExhausted(String),

    #[error("{0}")]
    Other(String),
}

impl From<reqwest::Error> for AgentInvocationError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::MalformedResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Domain-level errors that can occur in the songsmith system.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("{role} agent failed: {source}")]
    AgentInvocation {
        role: AgentRole,
        #[source]
        source: AgentInvocationError,
    },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Checkpoint not found: {0}")]
    CheckpointNotFound(Uuid),

    #[error("Checkpoint {0} is already being resumed")]
    CheckpointBusy(Uuid),

    #[error("Checkpoint {checkpoint_id} has no pending request {request_id}")]
    UnknownRequest { checkpoint_id: Uuid, request_id: Uuid },

    #[error("Response type mismatch: expected {expected}")]
    ResponseTypeMismatch { expected: &'static str },

    #[error("Idea source is empty")]
    NoIdeas,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Wrap an agent failure with the role that raised it.
    pub fn agent(role: AgentRole, source: AgentInvocationError) -> Self {
        Self::AgentInvocation { role, source }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::SerializationError(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
