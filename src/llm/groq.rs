use std::time::Duration;

use async_openai::{
    config::OpenAIConfig,
    error::{ApiError, OpenAIError},
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
    },
    Client,
};
use async_trait::async_trait;
use futures::StreamExt;
use tokio::sync::mpsc;

use super::{CompletionClient, CompletionSettings, LlmError, TokenStream};
use crate::models::{ChatMessage, Role};

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1";

/// Client for Groq's OpenAI-compatible chat API (or any other endpoint
/// speaking the same protocol).
#[derive(Clone)]
pub struct GroqClient {
    client: Client<OpenAIConfig>,
}

impl GroqClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_base_url(api_key, GROQ_API_URL)
    }

    pub fn with_base_url(api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        let config = OpenAIConfig::new()
            .with_api_base(base_url.trim_end_matches('/'))
            .with_api_key(api_key);
        // Failures go straight back to the caller, which answers with an
        // apology or keeps the roadmap as it is.
        let client = Client::with_config(config).with_backoff(no_retry());
        Self { client }
    }
}

fn no_retry() -> backoff::ExponentialBackoff {
    backoff::ExponentialBackoffBuilder::new()
        .with_max_elapsed_time(Some(Duration::ZERO))
        .build()
}

fn request_message(message: &ChatMessage) -> Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.clone();
    Ok(match message.role {
        Role::System => ChatCompletionRequestMessage::System(
            ChatCompletionRequestSystemMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::User => ChatCompletionRequestMessage::User(
            ChatCompletionRequestUserMessageArgs::default()
                .content(content)
                .build()?,
        ),
        Role::Assistant => ChatCompletionRequestMessage::Assistant(
            ChatCompletionRequestAssistantMessageArgs::default()
                .content(content)
                .build()?,
        ),
    })
}

fn build_request(
    messages: &[ChatMessage],
    settings: &CompletionSettings,
) -> Result<CreateChatCompletionRequest, OpenAIError> {
    let messages = messages
        .iter()
        .map(request_message)
        .collect::<Result<Vec<_>, _>>()?;

    CreateChatCompletionRequestArgs::default()
        .model(&settings.model)
        .messages(messages)
        .temperature(settings.temperature)
        .max_tokens(u16::try_from(settings.max_tokens).unwrap_or(u16::MAX))
        .build()
}

fn is_rate_limit(error: &ApiError) -> bool {
    let code = error.code.as_ref().map(ToString::to_string).unwrap_or_default();
    code.contains("rate_limit") || error.message.to_lowercase().contains("rate limit")
}

fn classify(error: OpenAIError) -> LlmError {
    match error {
        OpenAIError::ApiError(api) if is_rate_limit(&api) => LlmError::RateLimited,
        OpenAIError::ApiError(api) => LlmError::Api(api.message),
        OpenAIError::StreamError(msg) if msg.contains("429") => LlmError::RateLimited,
        OpenAIError::StreamError(msg) => LlmError::Stream(msg),
        other => LlmError::Client(other),
    }
}

#[async_trait]
impl CompletionClient for GroqClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &CompletionSettings,
    ) -> Result<String, LlmError> {
        let request = build_request(messages, settings).map_err(classify)?;
        let response = self.client.chat().create(request).await.map_err(classify)?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_default();
        if content.trim().is_empty() {
            return Err(LlmError::Empty);
        }
        Ok(content)
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        settings: &CompletionSettings,
    ) -> Result<TokenStream, LlmError> {
        let request = build_request(messages, settings).map_err(classify)?;
        let mut chunks = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(classify)?;
        let (tx, rx) = mpsc::channel(64);

        tokio::spawn(async move {
            while let Some(chunk) = chunks.next().await {
                let text = match chunk {
                    Ok(chunk) => chunk
                        .choices
                        .into_iter()
                        .next()
                        .and_then(|c| c.delta.content)
                        .filter(|s| !s.is_empty()),
                    Err(e) => {
                        let _ = tx.send(Err(classify(e))).await;
                        return;
                    }
                };
                if let Some(text) = text {
                    if tx.send(Ok(text)).await.is_err() {
                        return;
                    }
                }
            }
        });

        Ok(rx)
    }
}
