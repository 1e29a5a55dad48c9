//! Agent registry and factory.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentRole, Config, ProviderKind};
use crate::domain::ports::{Agent, AgentFactory};

use super::mock::MockAgent;
use super::openai::{OpenAiAgentConfig, OpenAiCompatibleAgent};

/// Builds role agents from configuration, with optional pre-built overrides.
pub struct AgentRegistry {
    config: Config,
    overrides: HashMap<AgentRole, Arc<dyn Agent>>,
}

impl AgentRegistry {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            overrides: HashMap::new(),
        }
    }

    /// Serve `role` with a pre-built agent instead of the configured backend.
    #[must_use]
    pub fn with_agent(mut self, role: AgentRole, agent: Arc<dyn Agent>) -> Self {
        self.overrides.insert(role, agent);
        self
    }

    /// Registry whose every role answers with canned offline replies.
    pub fn offline() -> Self {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::Mock;
        Self::new(config)
    }

    /// Problems that stop `role` from being served, empty when it is fine.
    pub fn problems(&self, role: AgentRole) -> Vec<String> {
        if self.overrides.contains_key(&role) {
            return Vec::new();
        }
        self.config.resolve_agent(role).problems(role)
    }

    fn create_by_role(&self, role: AgentRole) -> DomainResult<Arc<dyn Agent>> {
        let resolved = self.config.resolve_agent(role);
        let problems = resolved.problems(role);
        if !problems.is_empty() {
            return Err(DomainError::Configuration(problems.join("; ")));
        }

        debug!(%role, provider = resolved.provider.as_str(), model = ?resolved.model, "creating agent");
        match resolved.provider {
            ProviderKind::Mock => Ok(Arc::new(MockAgent::offline(role))),
            ProviderKind::OpenAi | ProviderKind::Azure => {
                let config = OpenAiAgentConfig::from_resolved(&resolved, &self.config.llm)?;
                Ok(Arc::new(OpenAiCompatibleAgent::new(role, config)?))
            }
        }
    }
}

impl AgentFactory for AgentRegistry {
    fn create(&self, role: AgentRole) -> DomainResult<Arc<dyn Agent>> {
        match self.overrides.get(&role) {
            Some(agent) => Ok(Arc::clone(agent)),
            None => self.create_by_role(role),
        }
    }
}
