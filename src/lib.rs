//! Songsmith - reference-driven lyric writing pipeline
//!
//! Songsmith turns musical references (artists, songs, guidance, pasted lyrics)
//! into original lyrics through a chain of role-specialised LLM agents:
//!
//! ```text
//! Template agent → Writer ⇄ Reviewer (bounded loop) → Producer
//! ```
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): models, errors and port traits
//! - **Service Layer** (`services`): pipeline stages and orchestration
//! - **Adapters** (`adapters`): agent backends, checkpoint stores, idea source, HTTP API
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```ignore
//! use songsmith::adapters::agents::AgentRegistry;
//! use songsmith::domain::models::{ReferenceInput, WorkflowInputs};
//! use songsmith::LyricWorkflow;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = songsmith::ConfigLoader::load()?;
//!     let workflow = LyricWorkflow::new(&AgentRegistry::new(config.clone()), &config)?;
//!     let inputs = WorkflowInputs::new(ReferenceInput::new("", "", "upbeat breakup song", ""))
//!         .with_idea("Moving On");
//!     let state = workflow.run(inputs).await;
//!     println!("{}", serde_json::to_string_pretty(&state)?);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{AgentInvocationError, DomainError, DomainResult};
pub use domain::models::{
    AgentRole, Config, FeedbackEntry, ProducerOutput, ReferenceInput, ReviewVerdict,
    WorkflowInputs, WorkflowState, WorkflowStatus,
};
pub use domain::ports::{Agent, AgentFactory, CheckpointStore, IdeaSource};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{HitlPipeline, LyricWorkflow};
