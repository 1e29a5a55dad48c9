//! Agent adapter implementations.

pub mod mock;
pub mod openai;
pub mod prompts;
pub mod registry;

pub use mock::{MockAgent, MockReply};
pub use openai::{OpenAiAgentConfig, OpenAiCompatibleAgent};
pub use registry::AgentRegistry;
