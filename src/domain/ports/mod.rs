//! Port trait definitions (Hexagonal Architecture)
//!
//! - Agent / AgentFactory: text-generation backends, one per role
//! - CheckpointStore: persistence for paused human-in-the-loop sessions
//! - IdeaSource: starter song ideas

pub mod agent;
pub mod checkpoint_store;
pub mod idea_source;

pub use agent::{Agent, AgentFactory};
pub use checkpoint_store::CheckpointStore;
pub use idea_source::IdeaSource;
