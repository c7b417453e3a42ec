//! Completion module — chat-completion client for summary generation
//!
//! Provides a `CompletionBackend` trait with one production implementation:
//! - **OpenRouter** — `POST /chat/completions` against the OpenRouter API
//!
//! The trait is the injection seam: the orchestrator receives an
//! `Arc<dyn CompletionBackend>` built once at startup, never a lazy global.
//! Failures are classified into distinct variants, each carrying the
//! provider's error message when the body contains one — there is no
//! string-encoded "CODE:message" channel anywhere.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Hard per-call timeout. Independent of the caller's cancellation token.
pub const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// Token cap sent with every completion request.
pub const DEFAULT_MAX_TOKENS: u32 = 500;

/// System message prepended to every summarization call.
pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that summarizes voice notes accurately and concisely.";

// ============================================================================
// CompletionBackend trait
// ============================================================================

/// Abstraction over completion providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Run one completion call. Returns the generated text from the first
    /// choice. Honors `cancel` only if it is already triggered before the
    /// call starts; an in-flight call is bounded by the client timeout alone.
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError>;

    /// Backend name for logging.
    fn name(&self) -> &str;
}

/// One summarization call: which model, with what prompt and source text.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub transcript: String,
    pub temperature: f64,
}

// ============================================================================
// Error types
// ============================================================================

/// Completion call errors. `code()` yields the machine-readable code carried
/// into per-model result entries; `message()` the human-readable part.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider server error: {0}")]
    Server(String),

    #[error("Provider API error: {0}")]
    Api(String),

    #[error("No content received from model")]
    NoContent,

    #[error("Request cancelled before dispatch")]
    Cancelled,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Missing API key")]
    MissingApiKey,
}

impl CompletionError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::RateLimited(_) => "RATE_LIMIT",
            Self::Server(_) => "SERVER_ERROR",
            Self::Api(_) => "API_ERROR",
            Self::NoContent => "NO_CONTENT",
            Self::Cancelled | Self::Http(_) | Self::MissingApiKey => "UNKNOWN_ERROR",
        }
    }

    /// The provider-extracted (or fallback) message, without the variant
    /// prefix — this is what result entries expose next to `code`.
    pub fn message(&self) -> String {
        match self {
            Self::RateLimited(m) | Self::Server(m) | Self::Api(m) => m.clone(),
            other => other.to_string(),
        }
    }
}

// ============================================================================
// Config types
// ============================================================================

/// OpenRouter client configuration. The key comes from the environment at
/// process startup; the rest from the `[summarizer]` config section.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub max_tokens: u32,
    pub timeout: Duration,
    /// Sent as `HTTP-Referer` (OpenRouter attribution header).
    pub referer: String,
    /// Sent as `X-Title`.
    pub title: String,
}

impl CompletionConfig {
    pub fn new(api_key: Option<String>) -> Self {
        let api_key = api_key
            .or_else(|| std::env::var("OPENROUTER_API_KEY").ok())
            .unwrap_or_default();

        Self {
            api_key,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            referer: "http://localhost:8780".to_string(),
            title: "Voice Note Summarizer".to_string(),
        }
    }
}

// ============================================================================
// OpenRouter API structs (private)
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorResponse {
    error: Option<ProviderErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ProviderErrorDetail {
    message: String,
}

// ============================================================================
// OpenRouterClient
// ============================================================================

/// OpenRouter completion client.
#[derive(Debug, Clone)]
pub struct OpenRouterClient {
    client: Client,
    config: CompletionConfig,
    base_url: String,
}

impl OpenRouterClient {
    pub fn new(config: CompletionConfig) -> Result<Self, CompletionError> {
        Self::with_base_url(config, "https://openrouter.ai/api/v1".to_string())
    }

    /// Create a client with a custom base URL (configuration / testing).
    pub fn with_base_url(
        config: CompletionConfig,
        base_url: String,
    ) -> Result<Self, CompletionError> {
        if config.api_key.is_empty() {
            return Err(CompletionError::MissingApiKey);
        }

        let client = Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    async fn complete_once(
        &self,
        request: &CompletionRequest,
    ) -> Result<String, CompletionError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: format!(
                        "{}\n\nTranscript to summarize:\n{}",
                        request.prompt, request.transcript
                    ),
                },
            ],
            temperature: request.temperature,
            max_tokens: self.config.max_tokens,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .header("HTTP-Referer", self.config.referer.as_str())
            .header("X-Title", self.config.title.as_str())
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let provider_message = serde_json::from_str::<ProviderErrorResponse>(&error_body)
                .ok()
                .and_then(|e| e.error)
                .map(|e| e.message);

            tracing::error!(
                model = %request.model,
                code = status.as_u16(),
                message = provider_message.as_deref().unwrap_or(&error_body),
                "Completion API error"
            );

            return Err(if status == StatusCode::TOO_MANY_REQUESTS {
                CompletionError::RateLimited(
                    provider_message.unwrap_or_else(|| "Rate limited".to_string()),
                )
            } else if status.is_server_error() {
                CompletionError::Server(
                    provider_message.unwrap_or_else(|| "Server error".to_string()),
                )
            } else {
                CompletionError::Api(provider_message.unwrap_or_else(|| {
                    status
                        .canonical_reason()
                        .unwrap_or("API error")
                        .to_string()
                }))
            });
        }

        let chat: ChatResponse = response.json().await?;

        chat.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.is_empty())
            .ok_or(CompletionError::NoContent)
    }
}

#[async_trait]
impl CompletionBackend for OpenRouterClient {
    async fn complete(
        &self,
        request: &CompletionRequest,
        cancel: &CancellationToken,
    ) -> Result<String, CompletionError> {
        if cancel.is_cancelled() {
            return Err(CompletionError::Cancelled);
        }
        self.complete_once(request).await
    }

    fn name(&self) -> &str {
        "openrouter"
    }
}

// ============================================================================
// TESTS
// ============================================================================
