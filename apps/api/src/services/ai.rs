//! Chat service contract and the Anthropic-backed implementation.
//!
//! ARCHITECTURAL RULE: no other module may call the AI provider directly.
//! All AI interactions go through `ChatService`.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::errors::AppError;
use crate::services::blob::BlobStore;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
/// Model used when the caller does not override it via `ChatOptions`.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-5";
const MAX_TOKENS: u32 = 4096;

/// One part of a user message sent to the AI.
#[derive(Debug, Clone)]
pub enum ContentPart {
    /// Reference to a blob previously stored through the blob store.
    File { locator: String },
    Text { text: String },
}

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: Vec<ContentPart>,
}

impl ChatMessage {
    pub fn user(content: Vec<ContentPart>) -> Self {
        Self {
            role: "user".to_string(),
            content,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChatOptions {
    pub model: Option<String>,
}

/// Assistant reply content: a plain string or a sequence of typed parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ResponsePart>),
}

impl MessageContent {
    pub fn is_empty(&self) -> bool {
        match self {
            MessageContent::Text(text) => text.trim().is_empty(),
            MessageContent::Parts(parts) => parts.is_empty(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponsePart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AssistantMessage {
    pub content: MessageContent,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub message: AssistantMessage,
}

#[async_trait]
pub trait ChatService: Send + Sync {
    /// Submits one chat request. A single attempt: callers decide whether a
    /// failed analysis is rerun from scratch.
    async fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<ChatResponse, AppError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Anthropic Messages API backend
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<ApiMessage>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiPart {
    Document { source: UrlSource },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct UrlSource {
    #[serde(rename = "type")]
    source_type: &'static str,
    url: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ResponsePart>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

/// Chat backend over the Anthropic Messages API. File parts are resolved to
/// time-limited share URLs through the blob store, so the provider fetches
/// the stored resume by reference.
pub struct AnthropicChat {
    client: reqwest::Client,
    api_key: String,
    blobs: Arc<dyn BlobStore>,
}

impl AnthropicChat {
    pub fn new(api_key: String, blobs: Arc<dyn BlobStore>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            blobs,
        }
    }

    async fn resolve_part(&self, part: ContentPart) -> Result<ApiPart, AppError> {
        match part {
            ContentPart::File { locator } => {
                let url = self.blobs.share_url(&locator).await?;
                Ok(ApiPart::Document {
                    source: UrlSource {
                        source_type: "url",
                        url,
                    },
                })
            }
            ContentPart::Text { text } => Ok(ApiPart::Text { text }),
        }
    }
}

#[async_trait]
impl ChatService for AnthropicChat {
    async fn invoke(
        &self,
        messages: Vec<ChatMessage>,
        options: ChatOptions,
    ) -> Result<ChatResponse, AppError> {
        let mut api_messages = Vec::with_capacity(messages.len());
        for message in messages {
            let mut content = Vec::with_capacity(message.content.len());
            for part in message.content {
                content.push(self.resolve_part(part).await?);
            }
            api_messages.push(ApiMessage {
                role: message.role,
                content,
            });
        }

        let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
        let request_body = ApiRequest {
            model,
            max_tokens: MAX_TOKENS,
            messages: api_messages,
        };

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| AppError::AiInvocationFailed(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(AppError::AiInvocationFailed(format!(
                "API error (status {}): {message}",
                status.as_u16()
            )));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| AppError::AiInvocationFailed(format!("unreadable response: {e}")))?;

        debug!(
            "chat call succeeded: input_tokens={}, output_tokens={}",
            api_response.usage.input_tokens, api_response.usage.output_tokens
        );

        Ok(ChatResponse {
            message: AssistantMessage {
                content: MessageContent::Parts(api_response.content),
            },
        })
    }
}
