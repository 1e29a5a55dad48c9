//! OpenAI-compatible chat completions agent.
//!
//! Talks to any endpoint implementing `POST /chat/completions` (OpenAI,
//! Ollama, LM Studio, ...) and to Azure OpenAI deployments. The template
//! role is offered the `search_lyrics` tool; tool calls are answered locally
//! and the conversation is replayed until the model produces text.

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::domain::errors::{AgentInvocationError, DomainError, DomainResult};
use crate::domain::models::{AgentRole, ConversationHandle, LlmConfig, ProviderKind, ResolvedLlm};
use crate::domain::ports::Agent;

use super::prompts::{search_lyrics, system_prompt, uses_search_tool, SEARCH_LYRICS_TOOL};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Upper bound on tool-call round trips within one agent call.
const MAX_TOOL_ROUNDS: u32 = 4;

/// Where requests are sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    OpenAi {
        base_url: String,
    },
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

/// Configuration for one OpenAI-compatible agent.
#[derive(Debug, Clone)]
pub struct OpenAiAgentConfig {
    pub endpoint: Endpoint,
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: u64,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

impl OpenAiAgentConfig {
    /// Plain OpenAI-compatible endpoint.
    pub fn openai(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint::OpenAi {
                base_url: base_url.into(),
            },
            api_key: None,
            model: Some(model.into()),
            timeout_secs: 120,
            max_tokens: None,
            temperature: None,
        }
    }

    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Build from resolved role settings.
    pub fn from_resolved(resolved: &ResolvedLlm, llm: &LlmConfig) -> DomainResult<Self> {
        let endpoint = match resolved.provider {
            ProviderKind::Azure => Endpoint::Azure {
                endpoint: resolved.endpoint.clone().ok_or_else(|| {
                    DomainError::Configuration("Azure endpoint is not configured".to_string())
                })?,
                deployment: resolved.deployment.clone().ok_or_else(|| {
                    DomainError::Configuration("Azure deployment is not configured".to_string())
                })?,
                api_version: resolved.api_version.clone(),
            },
            ProviderKind::OpenAi | ProviderKind::Mock => Endpoint::OpenAi {
                base_url: resolved
                    .base_url
                    .clone()
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
        };
        Ok(Self {
            endpoint,
            api_key: resolved.api_key.clone(),
            model: resolved.model.clone(),
            timeout_secs: llm.timeout_secs,
            max_tokens: llm.max_tokens,
            temperature: llm.temperature,
        })
    }

    /// Full chat completions URL.
    pub fn url(&self) -> String {
        match &self.endpoint {
            Endpoint::OpenAi { base_url } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: impl Into<String>) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content.into()),
            tool_calls: None,
            tool_call_id: Some(call_id.into()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "function_kind")]
    pub kind: String,
    pub function: FunctionCall,
}

fn function_kind() -> String {
    "function".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

/// Request body for chat completions.
#[derive(Debug, Serialize)]
pub struct ChatRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

fn search_tool_schema() -> serde_json::Value {
    serde_json::json!([{
        "type": "function",
        "function": {
            "name": SEARCH_LYRICS_TOOL,
            "description": "Search for song lyrics. Use this when you need lyrics for a song you do not fully remember.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Song title, artist name, or search query for finding lyrics"
                    }
                },
                "required": ["query"]
            }
        }
    }])
}

/// Answer each tool call locally.
pub fn answer_tool_calls(calls: &[ToolCall]) -> Vec<ChatMessage> {
    calls
        .iter()
        .map(|call| {
            let content = if call.function.name == SEARCH_LYRICS_TOOL {
                let query = serde_json::from_str::<serde_json::Value>(&call.function.arguments)
                    .ok()
                    .and_then(|args| args.get("query").and_then(|q| q.as_str()).map(str::to_string))
                    .unwrap_or_default();
                search_lyrics(&query)
            } else {
                warn!(tool = %call.function.name, "model requested unknown tool");
                format!("Unknown tool '{}'", call.function.name)
            };
            ChatMessage::tool_result(&call.id, content)
        })
        .collect()
}

/// Agent backed by an OpenAI-compatible chat completions endpoint.
pub struct OpenAiCompatibleAgent {
    role: AgentRole,
    system_prompt: String,
    config: OpenAiAgentConfig,
    client: Client,
}

impl OpenAiCompatibleAgent {
    pub fn new(role: AgentRole, config: OpenAiAgentConfig) -> DomainResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DomainError::Configuration(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            role,
            system_prompt: system_prompt(role).to_string(),
            config,
            client,
        })
    }

    fn build_request(&self, messages: Vec<ChatMessage>) -> ChatRequest {
        ChatRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
            tools: uses_search_tool(self.role).then(search_tool_schema),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatMessage, AgentInvocationError> {
        let mut builder = self
            .client
            .post(self.config.url())
            .header(header::CONTENT_TYPE, "application/json")
            .json(request);

        if let Some(key) = &self.config.api_key {
            builder = match self.config.endpoint {
                Endpoint::Azure { .. } => builder.header("api-key", key),
                Endpoint::OpenAi { .. } => builder.bearer_auth(key),
            };
        }

        let response = builder.send().await?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AgentInvocationError::Status { status, body });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| AgentInvocationError::MalformedResponse(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message)
            .ok_or(AgentInvocationError::EmptyResponse)
    }
}

#[async_trait]
impl Agent for OpenAiCompatibleAgent {
    fn role(&self) -> AgentRole {
        self.role
    }

    fn name(&self) -> &'static str {
        match self.config.endpoint {
            Endpoint::OpenAi { .. } => "openai",
            Endpoint::Azure { .. } => "azure",
        }
    }

    async fn run(
        &self,
        prompt: &str,
        thread: ConversationHandle,
    ) -> Result<String, AgentInvocationError> {
        let mut messages = vec![
            ChatMessage::text("system", self.system_prompt.clone()),
            ChatMessage::text("user", prompt),
        ];

        for round in 0..=MAX_TOOL_ROUNDS {
            let request = self.build_request(messages.clone());
            let reply = self.complete(&request).await?;

            match reply.tool_calls.clone().filter(|calls| !calls.is_empty()) {
                Some(calls) => {
                    debug!(thread = %thread.id(), round, calls = calls.len(), "answering tool calls");
                    messages.push(reply);
                    messages.extend(answer_tool_calls(&calls));
                }
                None => return Ok(reply.content.unwrap_or_default()),
            }
        }

        Err(AgentInvocationError::ToolLoopExhausted(MAX_TOOL_ROUNDS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completion(content: &str) -> String {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}}]
        })
        .to_string()
    }

    #[test]
    fn test_urls() {
        let openai = OpenAiAgentConfig::openai("http://localhost:11434/v1/", "llama3");
        assert_eq!(openai.url(), "http://localhost:11434/v1/chat/completions");

        let azure = OpenAiAgentConfig {
            endpoint: Endpoint::Azure {
                endpoint: "https://x.openai.azure.com/".to_string(),
                deployment: "gpt4o".to_string(),
                api_version: "2024-06-01".to_string(),
            },
            ..openai
        };
        assert_eq!(
            azure.url(),
            "https://x.openai.azure.com/openai/deployments/gpt4o/chat/completions?api-version=2024-06-01"
        );
    }

    #[test]
    fn test_tool_schema_only_for_template() {
        let config = OpenAiAgentConfig::openai(DEFAULT_OPENAI_BASE_URL, "gpt-4o");
        let template = OpenAiCompatibleAgent::new(AgentRole::Template, config.clone()).unwrap();
        let writer = OpenAiCompatibleAgent::new(AgentRole::Writer, config).unwrap();
        assert!(template.build_request(vec![]).tools.is_some());
        assert!(writer.build_request(vec![]).tools.is_none());
    }

    #[test]
    fn test_answer_tool_calls() {
        let calls = vec![ToolCall {
            id: "call_1".to_string(),
            kind: function_kind(),
            function: FunctionCall {
                name: SEARCH_LYRICS_TOOL.to_string(),
                arguments: r#"{"query": "Skyfall"}"#.to_string(),
            },
        }];
        let replies = answer_tool_calls(&calls);
        assert_eq!(replies.len(), 1);
        assert_eq!(replies[0].role, "tool");
        assert_eq!(replies[0].tool_call_id.as_deref(), Some("call_1"));
        assert!(replies[0].content.as_deref().unwrap().contains("'Skyfall'"));
    }

    #[tokio::test]
    async fn test_run_against_compatible_endpoint() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion("[VERSE 1]\nfresh lines"))
            .create_async()
            .await;

        let config = OpenAiAgentConfig::openai(server.url(), "gpt-4o-mini").with_api_key("sk-test");
        let agent = OpenAiCompatibleAgent::new(AgentRole::Writer, config).unwrap();
        let output = agent
            .run("write", ConversationHandle::new(AgentRole::Writer))
            .await
            .unwrap();

        assert_eq!(output, "[VERSE 1]\nfresh lines");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_azure_uses_api_key_header() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/openai/deployments/lyrics/chat/completions")
            .match_query(mockito::Matcher::UrlEncoded(
                "api-version".into(),
                "2024-06-01".into(),
            ))
            .match_header("api-key", "azure-key")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(completion("ok"))
            .create_async()
            .await;

        let config = OpenAiAgentConfig {
            endpoint: Endpoint::Azure {
                endpoint: server.url(),
                deployment: "lyrics".to_string(),
                api_version: "2024-06-01".to_string(),
            },
            api_key: Some("azure-key".to_string()),
            model: None,
            timeout_secs: 5,
            max_tokens: None,
            temperature: None,
        };
        let agent = OpenAiCompatibleAgent::new(AgentRole::Reviewer, config).unwrap();
        let output = agent
            .run("review", ConversationHandle::new(AgentRole::Reviewer))
            .await
            .unwrap();
        assert_eq!(output, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_error_status_is_typed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let config = OpenAiAgentConfig::openai(server.url(), "gpt-4o-mini");
        let agent = OpenAiCompatibleAgent::new(AgentRole::Producer, config).unwrap();
        let err = agent
            .run("produce", ConversationHandle::new(AgentRole::Producer))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentInvocationError::Status { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_no_choices_is_empty_response() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"choices": []}"#)
            .create_async()
            .await;

        let config = OpenAiAgentConfig::openai(server.url(), "gpt-4o-mini");
        let agent = OpenAiCompatibleAgent::new(AgentRole::Writer, config).unwrap();
        let err = agent
            .run("write", ConversationHandle::new(AgentRole::Writer))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentInvocationError::EmptyResponse));
    }
}
