use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::AgentRole;

/// Main configuration structure for songsmith
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Text-generation backend configuration
    #[serde(default)]
    pub llm: LlmConfig,

    /// Per-role backend overrides
    #[serde(default)]
    pub agents: AgentOverrides,

    /// Writer/reviewer loop settings
    #[serde(default)]
    pub workflow: WorkflowConfig,

    /// Template quality heuristics and forbidden-phrase mining limits
    #[serde(default)]
    pub heuristics: HeuristicsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// HTTP API configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Checkpoint storage for paused sessions
    #[serde(default)]
    pub checkpoints: CheckpointConfig,

    /// Optional file with one starter idea per line
    #[serde(default)]
    pub ideas_file: Option<PathBuf>,
}

impl Config {
    /// Resolve the backend settings for one agent role.
    pub fn resolve_agent(&self, role: AgentRole) -> ResolvedLlm {
        self.llm.resolve(self.agents.for_role(role))
    }
}

/// Backend provider family.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// Any OpenAI-compatible chat completions endpoint (OpenAI, Ollama, LM Studio, ...)
    #[default]
    OpenAi,
    /// Azure OpenAI deployment
    Azure,
    /// Canned offline responses
    Mock,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Azure => "azure",
            Self::Mock => "mock",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "openai" | "open_ai" => Some(Self::OpenAi),
            "azure" | "azure_openai" => Some(Self::Azure),
            "mock" => Some(Self::Mock),
            _ => None,
        }
    }
}

/// Text-generation backend configuration shared by all roles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    /// Default provider for every role
    #[serde(default)]
    pub provider: ProviderKind,

    #[serde(default)]
    pub openai: OpenAiConfig,

    #[serde(default)]
    pub azure: AzureConfig,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Completion token cap (backend default when unset)
    #[serde(default)]
    pub max_tokens: Option<u32>,

    /// Sampling temperature (backend default when unset)
    #[serde(default)]
    pub temperature: Option<f32>,
}

const fn default_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: ProviderKind::default(),
            openai: OpenAiConfig::default(),
            azure: AzureConfig::default(),
            timeout_secs: default_timeout_secs(),
            max_tokens: None,
            temperature: None,
        }
    }
}

impl LlmConfig {
    /// Merge a role override over the shared settings.
    pub fn resolve(&self, role_override: &AgentOverride) -> ResolvedLlm {
        let provider = role_override.provider.unwrap_or(self.provider);
        match provider {
            ProviderKind::Azure => ResolvedLlm {
                provider,
                model: role_override.model.clone().or_else(|| self.azure.model.clone()),
                api_key: self.azure.api_key.clone(),
                base_url: None,
                endpoint: self.azure.endpoint.clone(),
                deployment: role_override
                    .deployment
                    .clone()
                    .or_else(|| self.azure.deployment.clone()),
                api_version: self.azure.api_version.clone(),
            },
            ProviderKind::OpenAi | ProviderKind::Mock => ResolvedLlm {
                provider,
                model: role_override.model.clone().or_else(|| self.openai.model.clone()),
                api_key: self.openai.api_key.clone(),
                base_url: self.openai.base_url.clone(),
                endpoint: None,
                deployment: None,
                api_version: self.azure.api_version.clone(),
            },
        }
    }
}

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OpenAiConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    /// Custom base URL (e.g. `http://localhost:11434/v1` for Ollama)
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
}

/// Azure OpenAI settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AzureConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
    #[serde(default = "default_azure_api_version")]
    pub api_version: String,
    #[serde(default)]
    pub model: Option<String>,
}

fn default_azure_api_version() -> String {
    "2024-06-01".to_string()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: None,
            deployment: None,
            api_version: default_azure_api_version(),
            model: None,
        }
    }
}

/// Per-role override of provider, model, or Azure deployment
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentOverride {
    #[serde(default)]
    pub provider: Option<ProviderKind>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub deployment: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AgentOverrides {
    #[serde(default)]
    pub template: AgentOverride,
    #[serde(default)]
    pub writer: AgentOverride,
    #[serde(default)]
    pub reviewer: AgentOverride,
    #[serde(default)]
    pub producer: AgentOverride,
}

impl AgentOverrides {
    pub fn for_role(&self, role: AgentRole) -> &AgentOverride {
        match role {
            AgentRole::Template => &self.template,
            AgentRole::Writer => &self.writer,
            AgentRole::Reviewer => &self.reviewer,
            AgentRole::Producer => &self.producer,
        }
    }

    pub fn for_role_mut(&mut self, role: AgentRole) -> &mut AgentOverride {
        match role {
            AgentRole::Template => &mut self.template,
            AgentRole::Writer => &mut self.writer,
            AgentRole::Reviewer => &mut self.reviewer,
            AgentRole::Producer => &mut self.producer,
        }
    }
}

/// Backend settings resolved for a single role.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLlm {
    pub provider: ProviderKind,
    pub model: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub endpoint: Option<String>,
    pub deployment: Option<String>,
    pub api_version: String,
}

impl ResolvedLlm {
    /// Human-readable reasons this role cannot be served.
    pub fn problems(&self, role: AgentRole) -> Vec<String> {
        let prefix = role.env_prefix();
        let mut problems = Vec::new();
        match self.provider {
            ProviderKind::Azure => {
                if self.endpoint.is_none() {
                    problems.push("AZURE_OPENAI_ENDPOINT must be set for Azure provider".to_string());
                }
                if self.api_key.is_none() {
                    problems.push("AZURE_OPENAI_API_KEY must be set for Azure provider".to_string());
                }
                if self.deployment.is_none() {
                    problems.push(format!(
                        "Azure deployment name missing for {role}. \
                         Set {prefix}_AZURE_DEPLOYMENT_NAME or AZURE_OPENAI_DEPLOYMENT_NAME."
                    ));
                }
            }
            ProviderKind::OpenAi => {
                if self.model.is_none() {
                    problems.push(format!(
                        "Model ID missing for {role}. Set {prefix}_CHAT_MODEL_ID or OPENAI_CHAT_MODEL_ID."
                    ));
                }
                if self.api_key.is_none() && self.base_url.is_none() {
                    problems.push(
                        "Either OPENAI_API_KEY or OPENAI_BASE_URL should be configured."
                            .to_string(),
                    );
                }
            }
            ProviderKind::Mock => {}
        }
        problems
    }
}

/// Writer/reviewer loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct WorkflowConfig {
    /// Maximum writer/reviewer iterations per loop run (1-10)
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// How many times a paused session may send lyrics back for regeneration
    #[serde(default = "default_max_regenerations")]
    pub max_regenerations: u32,
}

const fn default_max_iterations() -> u32 {
    3
}

const fn default_max_regenerations() -> u32 {
    2
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            max_regenerations: default_max_regenerations(),
        }
    }
}

/// Tunable template-quality heuristics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HeuristicsConfig {
    /// Templates shorter than this are treated as missing
    #[serde(default = "default_min_template_chars")]
    pub min_template_chars: usize,

    /// Minimum length when the reference was only artist/song names
    #[serde(default = "default_names_only_min_chars")]
    pub names_only_min_chars: usize,

    /// Hedging-word hits at which a template is considered a guess
    #[serde(default = "default_hedge_threshold")]
    pub hedge_threshold: usize,

    /// Cap on repeated n-grams mined from reference lyrics
    #[serde(default = "default_max_forbidden_ngrams")]
    pub max_forbidden_ngrams: usize,

    /// Phrases that mean the model admitted it does not know the song
    #[serde(default = "default_failure_markers")]
    pub failure_markers: Vec<String>,

    /// Vocabulary that signals the model is generalising rather than describing
    #[serde(default = "default_hedging_words")]
    pub hedging_words: Vec<String>,
}

const fn default_min_template_chars() -> usize {
    40
}

const fn default_names_only_min_chars() -> usize {
    120
}

const fn default_hedge_threshold() -> usize {
    2
}

const fn default_max_forbidden_ngrams() -> usize {
    15
}

fn default_failure_markers() -> Vec<String> {
    [
        "could not find",
        "couldn't find",
        "no lyrics",
        "lyrics not found",
        "not enough reference",
        "insufficient reference",
        "don't have the exact lyrics",
        "cannot provide lyrics",
        "cannot locate lyrics",
        "without the lyrics",
        "i can provide a detailed analysis",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_hedging_words() -> Vec<String> {
    [
        "typically",
        "generally",
        "commonly",
        "usually",
        "often",
        "may",
        "might",
        "tends to",
        "tend to",
        "varied",
        "varies",
        "vary",
        "blend",
        "mix",
        "mixture",
        "overview",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl Default for HeuristicsConfig {
    fn default() -> Self {
        Self {
            min_template_chars: default_min_template_chars(),
            names_only_min_chars: default_names_only_min_chars(),
            hedge_threshold: default_hedge_threshold(),
            max_forbidden_ngrams: default_max_forbidden_ngrams(),
            failure_markers: default_failure_markers(),
            hedging_words: default_hedging_words(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default)]
    pub format: LogFormat,

    /// Directory for daily-rotated JSON log files (stderr only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            log_dir: None,
        }
    }
}

/// HTTP API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_true")]
    pub enable_cors: bool,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8000
}

const fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            enable_cors: default_true(),
        }
    }
}

/// Where paused sessions are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckpointBackend {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct CheckpointConfig {
    #[serde(default)]
    pub backend: CheckpointBackend,
    #[serde(default = "default_checkpoint_dir")]
    pub dir: PathBuf,
    /// Age after which a file lease left by a crashed process is broken
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

fn default_checkpoint_dir() -> PathBuf {
    PathBuf::from(".songsmith/checkpoints")
}

fn default_lock_ttl_secs() -> u64 {
    900
}

impl CheckpointConfig {
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            backend: CheckpointBackend::default(),
            dir: default_checkpoint_dir(),
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_override_wins() {
        let mut config = Config::default();
        config.llm.openai.model = Some("gpt-4o-mini".to_string());
        config.llm.openai.api_key = Some("sk-test".to_string());
        config.agents.reviewer.model = Some("gpt-4o".to_string());

        assert_eq!(
            config.resolve_agent(AgentRole::Writer).model.as_deref(),
            Some("gpt-4o-mini")
        );
        assert_eq!(
            config.resolve_agent(AgentRole::Reviewer).model.as_deref(),
            Some("gpt-4o")
        );
    }

    #[test]
    fn test_openai_problems() {
        let resolved = Config::default().resolve_agent(AgentRole::Writer);
        let problems = resolved.problems(AgentRole::Writer);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].contains("WRITER_CHAT_MODEL_ID"));
    }

    #[test]
    fn test_azure_deployment_override() {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::Azure;
        config.llm.azure.endpoint = Some("https://example.openai.azure.com".to_string());
        config.llm.azure.api_key = Some("key".to_string());
        config.llm.azure.deployment = Some("shared".to_string());
        config.agents.producer.deployment = Some("producer-deploy".to_string());

        let producer = config.resolve_agent(AgentRole::Producer);
        assert_eq!(producer.deployment.as_deref(), Some("producer-deploy"));
        assert!(producer.problems(AgentRole::Producer).is_empty());
        assert_eq!(
            config.resolve_agent(AgentRole::Writer).deployment.as_deref(),
            Some("shared")
        );
    }

    #[test]
    fn test_mock_needs_nothing() {
        let mut config = Config::default();
        config.llm.provider = ProviderKind::Mock;
        for role in AgentRole::ALL {
            assert!(config.resolve_agent(role).problems(role).is_empty());
        }
    }
}
