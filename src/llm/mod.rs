//! Chat-completion clients.
//!
//! [`CompletionClient`] is the seam between the advisor and the hosted model.
//! [`GroqClient`] talks to any OpenAI-compatible `chat/completions` endpoint;
//! [`ScriptedClient`] replays canned replies and needs no network.

mod groq;
mod scripted;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;

pub use groq::{GroqClient, GROQ_API_URL};
pub use scripted::ScriptedClient;

use crate::models::ChatMessage;

pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_TOKENS: u32 = 800;

/// Roadmap proposals return a whole tree, so they get more room and less
/// sampling noise than chat replies.
pub const PROPOSAL_TEMPERATURE: f32 = 0.5;
pub const PROPOSAL_MAX_TOKENS: u32 = 2500;

/// Streamed completion: text chunks in arrival order, then the channel closes.
pub type TokenStream = mpsc::Receiver<Result<String, LlmError>>;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Completion API error: {0}")]
    Api(String),

    #[error("Rate limited by completion API")]
    RateLimited,

    #[error("Completion stream failed: {0}")]
    Stream(String),

    #[error("Completion request failed: {0}")]
    Client(#[source] async_openai::error::OpenAIError),

    #[error("Completion API returned no text")]
    Empty,
}

/// Model parameters sent with every request.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for CompletionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }
}

#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Return the full completion for `messages`.
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &CompletionSettings,
    ) -> Result<String, LlmError>;

    /// Stream the completion for `messages`.
    ///
    /// The default sends the whole completion as a single chunk.
    async fn stream(
        &self,
        messages: &[ChatMessage],
        settings: &CompletionSettings,
    ) -> Result<TokenStream, LlmError> {
        let text = self.complete(messages, settings).await?;
        let (tx, rx) = mpsc::channel(1);
        // Capacity 1 and a fresh channel: this cannot block.
        let _ = tx.send(Ok(text)).await;
        Ok(rx)
    }
}
