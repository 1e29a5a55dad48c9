//! Domain models for the songsmith pipeline.

pub mod agent;
pub mod checkpoint;
pub mod config;
pub mod feedback;
mod lenient;
pub mod production;
pub mod reference;
pub mod workflow;

pub use agent::{AgentRole, ConversationHandle};
pub use checkpoint::{Checkpoint, HitlResponse, PauseMarker, PendingRequest, PipelineOutput};
pub use config::{
    AgentOverride, AgentOverrides, AzureConfig, CheckpointBackend, CheckpointConfig, Config,
    HeuristicsConfig, LlmConfig, LogFormat, LoggingConfig, OpenAiConfig, ProviderKind,
    ResolvedLlm, ServerConfig, WorkflowConfig,
};
pub use feedback::{FeedbackEntry, ReviewVerdict, FALLBACK_REVISION_SUGGESTION};
pub use production::{ProducerOutput, STYLE_PROMPT_PARSE_ERROR};
pub use reference::{ReferenceInput, WorkflowInputs};
pub use workflow::{WorkflowOutputs, WorkflowState, WorkflowStatus, NEEDS_LYRICS_HINT};
