//! Shared setup for commands: configuration, agents and idea source.

use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::adapters::agents::AgentRegistry;
use crate::adapters::ideas::StaticIdeaSource;
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::LyricWorkflow;

/// Load configuration from `path` when given, else from the layered defaults.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Build the workflow with all four agents, failing before any stage runs when a role
/// cannot be served.
pub fn build_workflow(config: &Config) -> Result<LyricWorkflow> {
    let problems = ConfigLoader::validation_errors(config);
    if !problems.is_empty() {
        bail!(
            "Invalid configuration:\n  - {}\nRun 'songsmith config check' for details.",
            problems.join("\n  - ")
        );
    }

    let registry = AgentRegistry::new(config.clone());
    LyricWorkflow::new(&registry, config).context("Failed to create agents")
}

/// Starter ideas from `ideas_file` when configured, else the bundled list.
pub fn idea_source(config: &Config) -> Result<StaticIdeaSource> {
    match config.ideas_file.as_deref() {
        Some(path) => {
            debug!(path = %path.display(), "loading starter ideas");
            StaticIdeaSource::from_file(path)
        }
        None => Ok(StaticIdeaSource::bundled()),
    }
}
