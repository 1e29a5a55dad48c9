use anyhow::{Context, Result};
use figment::Figment;
use figment::providers::{Env, Format, Serialized, Yaml};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::warn;

use crate::domain::models::config::{Config, ProviderKind};
use crate::domain::models::AgentRole;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid max_iterations: {0}. Must be between 1 and 10")]
    InvalidMaxIterations(u32),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid timeout_secs: {0}. Must be at least 1")]
    InvalidTimeout(u64),

    #[error("Checkpoint directory cannot be empty")]
    EmptyCheckpointDir,

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Project config file, relative to the working directory
pub const PROJECT_CONFIG_FILE: &str = "songsmith.yaml";

/// Local overrides, kept out of version control
pub const LOCAL_CONFIG_FILE: &str = ".songsmith/local.yaml";

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. Legacy environment variables (`OPENAI_API_KEY`, `WRITER_CHAT_MODEL_ID`, ...)
    /// 3. songsmith.yaml (project config)
    /// 4. .songsmith/local.yaml (local overrides, optional)
    /// 5. Environment variables (SONGSMITH_* prefix, highest priority)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Serialized::defaults(legacy_env_layer()))
            .merge(Yaml::file(PROJECT_CONFIG_FILE))
            .merge(Yaml::file(LOCAL_CONFIG_FILE))
            .merge(Env::prefixed("SONGSMITH_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    ///
    /// The file replaces the project and local files; environment layers still apply.
    pub fn load_from_file(path: impl AsRef<std::path::Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Serialized::defaults(legacy_env_layer()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("SONGSMITH_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if !(1..=10).contains(&config.workflow.max_iterations) {
            return Err(ConfigError::InvalidMaxIterations(
                config.workflow.max_iterations,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        if config.llm.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout(config.llm.timeout_secs));
        }

        if config.checkpoints.dir.as_os_str().is_empty() {
            return Err(ConfigError::EmptyCheckpointDir);
        }

        if config.heuristics.hedge_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "heuristics.hedge_threshold must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Credential problems for every agent role, empty when all four can be built.
    pub fn validation_errors(config: &Config) -> Vec<String> {
        let mut errors: Vec<String> = Vec::new();
        for role in AgentRole::ALL {
            for problem in config.resolve_agent(role).problems(role) {
                if !errors.contains(&problem) {
                    errors.push(problem);
                }
            }
        }
        errors
    }
}

/// Non-blank value of an environment variable.
fn env_value(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn provider_value(name: &str) -> Option<Value> {
    let raw = env_value(name)?;
    if let Some(provider) = ProviderKind::from_str(&raw) {
        Some(Value::String(provider.as_str().to_string()))
    } else {
        warn!(variable = name, value = %raw, "ignoring unknown LLM provider");
        None
    }
}

fn insert_path(root: &mut Map<String, Value>, path: &[&str], value: Value) {
    let Some((last, parents)) = path.split_last() else {
        return;
    };
    let mut node = root;
    for key in parents {
        let entry = node
            .entry((*key).to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(child) = entry else {
            return;
        };
        node = child;
    }
    node.insert((*last).to_string(), value);
}

/// Config tree built from the plain environment variables older deployments used.
///
/// Only variables that are set appear in the tree, so merging it never masks a default.
pub fn legacy_env_layer() -> Value {
    let mut root = Map::new();

    if let Some(provider) = provider_value("LLM_PROVIDER") {
        insert_path(&mut root, &["llm", "provider"], provider);
    }

    let plain = [
        ("OPENAI_API_KEY", ["llm", "openai", "api_key"]),
        ("OPENAI_BASE_URL", ["llm", "openai", "base_url"]),
        ("OPENAI_CHAT_MODEL_ID", ["llm", "openai", "model"]),
        ("AZURE_OPENAI_API_KEY", ["llm", "azure", "api_key"]),
        ("AZURE_OPENAI_ENDPOINT", ["llm", "azure", "endpoint"]),
        ("AZURE_OPENAI_DEPLOYMENT_NAME", ["llm", "azure", "deployment"]),
        ("AZURE_OPENAI_API_VERSION", ["llm", "azure", "api_version"]),
        ("AZURE_OPENAI_MODEL_ID", ["llm", "azure", "model"]),
    ];
    for (name, path) in plain {
        if let Some(value) = env_value(name) {
            insert_path(&mut root, &path, Value::String(value));
        }
    }

    if let Some(level) = env_value("LOG_LEVEL") {
        insert_path(&mut root, &["logging", "level"], Value::String(level.to_lowercase()));
    }
    if let Some(port) = env_value("PORT").and_then(|port| port.parse::<u16>().ok()) {
        insert_path(&mut root, &["server", "port"], Value::from(port));
    }

    for role in AgentRole::ALL {
        let prefix = role.env_prefix();
        let section = role.as_str();
        if let Some(provider) = provider_value(&format!("{prefix}_LLM_PROVIDER")) {
            insert_path(&mut root, &["agents", section, "provider"], provider);
        }
        if let Some(model) = env_value(&format!("{prefix}_CHAT_MODEL_ID")) {
            insert_path(&mut root, &["agents", section, "model"], Value::String(model));
        }
        if let Some(deployment) = env_value(&format!("{prefix}_AZURE_DEPLOYMENT_NAME")) {
            insert_path(
                &mut root,
                &["agents", section, "deployment"],
                Value::String(deployment),
            );
        }
    }

    Value::Object(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{CheckpointBackend, LogFormat};
    use std::io::Write;
    use std::path::PathBuf;

    const LEGACY_VARS: [&str; 10] = [
        "LLM_PROVIDER",
        "OPENAI_API_KEY",
        "OPENAI_BASE_URL",
        "OPENAI_CHAT_MODEL_ID",
        "AZURE_OPENAI_API_KEY",
        "AZURE_OPENAI_ENDPOINT",
        "AZURE_OPENAI_DEPLOYMENT_NAME",
        "WRITER_CHAT_MODEL_ID",
        "LOG_LEVEL",
        "PORT",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        LEGACY_VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.workflow.max_iterations, 3);
        assert_eq!(config.heuristics.min_template_chars, 40);
        assert_eq!(config.heuristics.names_only_min_chars, 120);
        assert_eq!(config.heuristics.hedge_threshold, 2);
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.checkpoints.backend, CheckpointBackend::Memory);
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
llm:
  provider: azure
  azure:
    endpoint: https://example.openai.azure.com
    api_key: key
    deployment: lyrics
workflow:
  max_iterations: 5
logging:
  level: debug
  format: json
checkpoints:
  backend: file
  dir: /tmp/songsmith
  lock_ttl_secs: 60
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.llm.provider, ProviderKind::Azure);
        assert_eq!(config.llm.azure.api_version, "2024-06-01");
        assert_eq!(config.workflow.max_iterations, 5);
        assert_eq!(config.workflow.max_regenerations, 2);
        assert_eq!(config.logging.format, LogFormat::Json);
        assert_eq!(config.checkpoints.dir, PathBuf::from("/tmp/songsmith"));
        assert_eq!(config.checkpoints.lock_ttl(), std::time::Duration::from_secs(60));

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
        assert!(ConfigLoader::validation_errors(&config).is_empty());
    }

    #[test]
    fn test_validate_iterations_range() {
        for bad in [0, 11] {
            let mut config = Config::default();
            config.workflow.max_iterations = bad;
            assert!(matches!(
                ConfigLoader::validate(&config),
                Err(ConfigError::InvalidMaxIterations(n)) if n == bad
            ));
        }
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogLevel(_))
        ));
    }

    #[test]
    fn test_validation_errors_deduplicated() {
        let errors = ConfigLoader::validation_errors(&Config::default());
        let shared = errors
            .iter()
            .filter(|e| e.contains("OPENAI_BASE_URL should be configured"))
            .count();
        assert_eq!(shared, 1);
        assert!(errors.iter().any(|e| e.contains("TEMPLATE_CHAT_MODEL_ID")));
        assert!(errors.iter().any(|e| e.contains("PRODUCER_CHAT_MODEL_ID")));
    }

    #[test]
    fn test_legacy_env_fallbacks() {
        let mut vars = cleared();
        vars.retain(|(name, _)| {
            !matches!(*name, "OPENAI_API_KEY" | "OPENAI_CHAT_MODEL_ID" | "WRITER_CHAT_MODEL_ID")
        });
        vars.push(("OPENAI_API_KEY", Some("sk-legacy")));
        vars.push(("OPENAI_CHAT_MODEL_ID", Some("gpt-4o-mini")));
        vars.push(("WRITER_CHAT_MODEL_ID", Some("gpt-4o")));

        temp_env::with_vars(vars, || {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "workflow:\n  max_iterations: 3").unwrap();
            file.flush().unwrap();

            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.llm.openai.api_key.as_deref(), Some("sk-legacy"));
            assert_eq!(
                config.resolve_agent(AgentRole::Writer).model.as_deref(),
                Some("gpt-4o")
            );
            assert_eq!(
                config.resolve_agent(AgentRole::Reviewer).model.as_deref(),
                Some("gpt-4o-mini")
            );
            assert!(ConfigLoader::validation_errors(&config).is_empty());
        });
    }

    #[test]
    fn test_yaml_beats_legacy_env() {
        let mut vars = cleared();
        vars.retain(|(name, _)| *name != "OPENAI_CHAT_MODEL_ID");
        vars.push(("OPENAI_CHAT_MODEL_ID", Some("from-env")));

        temp_env::with_vars(vars, || {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "llm:\n  openai:\n    model: from-yaml").unwrap();
            file.flush().unwrap();

            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.llm.openai.model.as_deref(), Some("from-yaml"));
        });
    }

    #[test]
    fn test_prefixed_env_override() {
        let mut vars: Vec<(&str, Option<&str>)> = cleared();
        vars.push(("SONGSMITH_WORKFLOW__MAX_ITERATIONS", Some("5")));
        vars.push(("SONGSMITH_LLM__PROVIDER", Some("mock")));

        temp_env::with_vars(vars, || {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "workflow:\n  max_iterations: 2").unwrap();
            file.flush().unwrap();

            let config = ConfigLoader::load_from_file(file.path()).unwrap();
            assert_eq!(config.workflow.max_iterations, 5);
            assert_eq!(config.llm.provider, ProviderKind::Mock);
        });
    }

    #[test]
    fn test_unknown_legacy_provider_ignored() {
        let mut vars = cleared();
        vars.retain(|(name, _)| *name != "LLM_PROVIDER");
        vars.push(("LLM_PROVIDER", Some("carrier-pigeon")));

        temp_env::with_vars(vars, || {
            let layer = legacy_env_layer();
            assert!(layer.get("llm").is_none());
        });
    }

    #[test]
    fn test_hierarchical_merging() {
        let mut base_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            base_file,
            "workflow:\n  max_iterations: 4\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();
        base_file.flush().unwrap();

        let mut override_file = tempfile::NamedTempFile::new().unwrap();
        writeln!(override_file, "workflow:\n  max_iterations: 6\nlogging:\n  level: debug").unwrap();
        override_file.flush().unwrap();

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(base_file.path()))
            .merge(Yaml::file(override_file.path()))
            .extract()
            .unwrap();

        assert_eq!(config.workflow.max_iterations, 6, "Override should win");
        assert_eq!(
            config.logging.level, "debug",
            "Override should win for nested fields"
        );
        assert_eq!(
            config.logging.format,
            LogFormat::Json,
            "Base value should persist when not overridden"
        );
    }
}
