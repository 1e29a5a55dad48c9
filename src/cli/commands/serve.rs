//! HTTP API command.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use tracing::{info, warn};

use crate::adapters::agents::AgentRegistry;
use crate::adapters::checkpoint;
use crate::adapters::http::{SongsmithHttpConfig, SongsmithHttpServer};
use crate::cli::commands::context::idea_source;
use crate::domain::models::Config;
use crate::domain::ports::IdeaSource;
use crate::infrastructure::config::ConfigLoader;
use crate::services::LyricWorkflow;

pub async fn execute(host: Option<String>, port: Option<u16>, config: &Config) -> Result<()> {
    let mut http_config = SongsmithHttpConfig::from(&config.server);
    if let Some(host) = host {
        http_config.host = host;
    }
    if let Some(port) = port {
        http_config.port = port;
    }

    let ideas: Arc<dyn IdeaSource> = Arc::new(idea_source(config)?);
    let problems = ConfigLoader::validation_errors(config);
    let server = if problems.is_empty() {
        let registry = AgentRegistry::new(config.clone());
        let workflow = Arc::new(LyricWorkflow::new(&registry, config)?);
        let store = checkpoint::from_config(&config.checkpoints);
        info!(backend = ?config.checkpoints.backend, "checkpoint store ready");
        SongsmithHttpServer::new(http_config, workflow, store, ideas)
    } else {
        warn!(
            problems = ?problems,
            "configuration incomplete; pipeline endpoints will answer 400"
        );
        SongsmithHttpServer::misconfigured(http_config, problems, ideas)
    };

    server
        .serve_with_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("shutdown signal received");
            }
        })
        .await
        .map_err(|e| anyhow!(e))
}
