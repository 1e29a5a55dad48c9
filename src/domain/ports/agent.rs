//! Agent port - interface for text-generation backends.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::errors::{AgentInvocationError, DomainResult};
use crate::domain::models::{AgentRole, ConversationHandle};

/// A role-specialised text-generation agent.
///
/// Implementations carry the role's fixed system prompt. Each call is a full
/// round-trip to the backend; no retry happens here.
#[async_trait]
pub trait Agent: Send + Sync {
    /// Role this agent was built for.
    fn role(&self) -> AgentRole;

    /// Backend name for logs.
    fn name(&self) -> &'static str;

    /// Run one prompt inside the given conversation scope.
    ///
    /// The handle is consumed so a scope cannot be reused by a later call.
    async fn run(
        &self,
        prompt: &str,
        thread: ConversationHandle,
    ) -> Result<String, AgentInvocationError>;
}

/// Factory for creating role agents.
pub trait AgentFactory: Send + Sync {
    /// Build (or hand out) the agent serving `role`.
    ///
    /// Fails with a configuration error when the role cannot be served.
    fn create(&self, role: AgentRole) -> DomainResult<Arc<dyn Agent>>;
}
