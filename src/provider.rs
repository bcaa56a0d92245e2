//! Model Provider Abstraction
//!
//! Text-in/text-out clients for the generation service: local models via
//! Ollama (native `/api/chat` or `/api/generate`) and any OpenAI-compatible
//! chat completions endpoint. Transport retries, pacing and timeouts live in
//! [`retry::GenerationService`], not in the clients.

use crate::error::PipelineError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

pub mod retry;

pub use retry::{BackoffPolicy, GenerationService};

pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// Which Ollama endpoint to call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OllamaApi {
    /// `/api/chat`: system and user messages
    Chat,
    /// `/api/generate`: a single prompt
    Generate,
}

/// Model provider configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ModelProvider {
    Ollama {
        model: String,
        base_url: Option<String>, // Default: http://127.0.0.1:11434
        api: OllamaApi,
    },
    OpenAI {
        model: String,
        base_url: Option<String>, // For self-hosted OpenAI-compatible servers
        api_key: Option<String>,
    },
}

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }
}

/// Generation parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,        // Nucleus sampling
    pub context_window: Option<u32>, // Ollama num_ctx
    pub max_tokens: Option<u32>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            top_p: Some(0.9),
            context_window: Some(8192),
            max_tokens: None,
        }
    }
}

/// Completion response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub finish_reason: Option<String>,
}

/// Model provider client trait
#[async_trait]
pub trait ModelProviderClient: Send + Sync {
    /// Generate a completion from a list of messages
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// Get the model name
    fn model_name(&self) -> &str;

    /// List available models from the provider
    async fn list_models(&self) -> Result<Vec<String>, PipelineError>;
}

fn role_to_string(role: MessageRole) -> &'static str {
    match role {
        MessageRole::System => "system",
        MessageRole::User => "user",
        MessageRole::Assistant => "assistant",
    }
}

fn map_http_error(error: reqwest::Error) -> PipelineError {
    if let Some(status) = error.status() {
        error_for_status(status, error.to_string())
    } else if error.is_timeout() {
        PipelineError::ProviderRequestFailed(format!("Request timeout: {}", error))
    } else if error.is_connect() {
        PipelineError::ProviderRequestFailed(format!("Connection error: {}", error))
    } else {
        PipelineError::ProviderError(format!("HTTP error: {}", error))
    }
}

fn error_for_status(status: StatusCode, detail: String) -> PipelineError {
    match status.as_u16() {
        401 | 403 => PipelineError::ProviderAuthFailed(format!("Authentication failed: {}", detail)),
        429 => PipelineError::ProviderRateLimit(format!("Rate limit exceeded: {}", detail)),
        404 => PipelineError::ProviderModelNotFound(format!("Model not found: {}", detail)),
        _ => PipelineError::ProviderRequestFailed(format!(
            "Request failed with status {}: {}",
            status, detail
        )),
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, PipelineError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(error_for_status(status, error_text))
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_provider_http_client(request_timeout: Duration) -> Result<Client, PipelineError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| PipelineError::ProviderError(format!("Failed to create HTTP client: {}", e)))
}

/// Split an Ollama URL into its base and, when the URL names one, the API.
///
/// `http://host:11434/api/chat` → (`http://host:11434`, Some(Chat)).
pub fn split_ollama_endpoint(url: &str) -> (String, Option<OllamaApi>) {
    let trimmed = url.trim().trim_end_matches('/');
    if let Some(base) = trimmed.strip_suffix("/api/chat") {
        (base.to_string(), Some(OllamaApi::Chat))
    } else if let Some(base) = trimmed.strip_suffix("/api/generate") {
        (base.to_string(), Some(OllamaApi::Generate))
    } else {
        (trimmed.to_string(), None)
    }
}

fn ollama_options(options: &CompletionOptions) -> serde_json::Value {
    let mut out = serde_json::Map::new();
    if let Some(t) = options.temperature {
        out.insert("temperature".to_string(), json!(t));
    }
    if let Some(p) = options.top_p {
        out.insert("top_p".to_string(), json!(p));
    }
    if let Some(ctx) = options.context_window {
        out.insert("num_ctx".to_string(), json!(ctx));
    }
    if let Some(max) = options.max_tokens {
        out.insert("num_predict".to_string(), json!(max));
    }
    serde_json::Value::Object(out)
}

/// Request body for Ollama `/api/chat`.
pub fn ollama_chat_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
    let messages: Vec<_> = messages
        .iter()
        .map(|m| json!({"role": role_to_string(m.role), "content": m.content}))
        .collect();
    json!({
        "model": model,
        "messages": messages,
        "stream": false,
        "options": ollama_options(options),
    })
}

/// Request body for Ollama `/api/generate`: message contents joined by a
/// blank line into one prompt.
pub fn ollama_generate_body(model: &str, messages: &[ChatMessage], options: &CompletionOptions) -> serde_json::Value {
    let prompt = messages
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");
    json!({
        "model": model,
        "prompt": prompt,
        "stream": false,
        "options": ollama_options(options),
    })
}

/// Ollama provider client (local models)
pub struct OllamaClient {
    client: Client,
    model: String,
    base_url: String,
    api: OllamaApi,
}

impl OllamaClient {
    pub fn new(
        model: String,
        base_url: Option<String>,
        api: OllamaApi,
        request_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let (base_url, inferred) =
            split_ollama_endpoint(base_url.as_deref().unwrap_or(DEFAULT_OLLAMA_URL));
        let client = build_provider_http_client(request_timeout)?;

        Ok(Self {
            client,
            model,
            base_url,
            api: inferred.unwrap_or(api),
        })
    }

    pub fn api(&self) -> OllamaApi {
        self.api
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ModelProviderClient for OllamaClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        #[derive(Deserialize)]
        struct ChatResponse {
            #[serde(default)]
            model: String,
            message: Option<ChatResponseMessage>,
            done_reason: Option<String>,
        }
        #[derive(Deserialize)]
        struct ChatResponseMessage {
            #[serde(default)]
            content: String,
        }
        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            model: String,
            #[serde(default)]
            response: String,
            done_reason: Option<String>,
        }

        let (path, body) = match self.api {
            OllamaApi::Chat => ("api/chat", ollama_chat_body(&self.model, &messages, &options)),
            OllamaApi::Generate => (
                "api/generate",
                ollama_generate_body(&self.model, &messages, &options),
            ),
        };
        let url = format!("{}/{}", self.base_url, path);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response).await?;

        let (content, model, finish_reason) = match self.api {
            OllamaApi::Chat => {
                let parsed: ChatResponse = response.json().await.map_err(|e| {
                    PipelineError::ProviderError(format!("Failed to parse response: {}", e))
                })?;
                (
                    parsed.message.map(|m| m.content).unwrap_or_default(),
                    parsed.model,
                    parsed.done_reason,
                )
            }
            OllamaApi::Generate => {
                let parsed: GenerateResponse = response.json().await.map_err(|e| {
                    PipelineError::ProviderError(format!("Failed to parse response: {}", e))
                })?;
                (parsed.response, parsed.model, parsed.done_reason)
            }
        };

        Ok(CompletionResponse {
            content,
            model: if model.is_empty() { self.model.clone() } else { model },
            finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, PipelineError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self.client.get(&url).send().await.map_err(map_http_error)?;
        let response = check_status(response).await?;

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let tags: TagsResponse = response.json().await.map_err(|e| {
            PipelineError::ProviderError(format!("Failed to parse models response: {}", e))
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}

// OpenAI-compatible API request/response structures
#[derive(Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
}

#[derive(Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatCompletionResponse {
    model: String,
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

/// OpenAI-compatible chat completions client
pub struct OpenAICompatibleClient {
    client: Client,
    model: String,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAICompatibleClient {
    pub fn new(
        model: String,
        base_url: Option<String>,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, PipelineError> {
        let client = build_provider_http_client(request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            model,
            base_url,
            api_key,
        })
    }

    fn authorize(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(api_key) => builder.header("Authorization", format!("Bearer {}", api_key)),
            None => builder,
        }
    }
}

#[async_trait]
impl ModelProviderClient for OpenAICompatibleClient {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        options: CompletionOptions,
    ) -> Result<CompletionResponse, PipelineError> {
        let request = ChatCompletionRequest {
            model: self.model.clone(),
            messages: messages
                .into_iter()
                .map(|msg| OpenAIMessage {
                    role: role_to_string(msg.role).to_string(),
                    content: msg.content,
                })
                .collect(),
            temperature: options.temperature,
            top_p: options.top_p,
            max_tokens: options.max_tokens,
            stream: false,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .authorize(self.client.post(&url))
            .json(&request)
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response).await?;

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            PipelineError::ProviderError(format!("Failed to parse response: {}", e))
        })?;

        let choice = completion
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::ProviderError("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: completion.model,
            finish_reason: choice.finish_reason,
        })
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    async fn list_models(&self) -> Result<Vec<String>, PipelineError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .authorize(self.client.get(&url))
            .send()
            .await
            .map_err(map_http_error)?;
        let response = check_status(response).await?;

        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            id: String,
        }

        let models: ModelsResponse = response.json().await.map_err(|e| {
            PipelineError::ProviderError(format!("Failed to parse models response: {}", e))
        })?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}

/// Provider factory for creating provider clients
pub struct ProviderFactory;

impl ProviderFactory {
    pub fn create_client(
        provider: &ModelProvider,
        request_timeout: Duration,
    ) -> Result<Box<dyn ModelProviderClient>, PipelineError> {
        match provider {
            ModelProvider::Ollama {
                model,
                base_url,
                api,
            } => Ok(Box::new(OllamaClient::new(
                model.clone(),
                base_url.clone(),
                *api,
                request_timeout,
            )?)),
            ModelProvider::OpenAI {
                model,
                base_url,
                api_key,
            } => Ok(Box::new(OpenAICompatibleClient::new(
                model.clone(),
                base_url.clone(),
                api_key.clone(),
                request_timeout,
            )?)),
        }
    }
}
