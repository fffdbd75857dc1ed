use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CompletionClient, CompletionSettings, LlmError};
use crate::models::ChatMessage;

/// Replays canned replies in order and records every request.
///
/// Once the script runs out every call fails, as does every call to a client
/// built with [`ScriptedClient::failing`].
#[derive(Debug, Default)]
pub struct ScriptedClient {
    replies: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<Vec<ChatMessage>>>,
    settings: Mutex<Vec<CompletionSettings>>,
}

impl ScriptedClient {
    pub fn new<I>(replies: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            requests: Mutex::new(Vec::new()),
            settings: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self::default()
    }

    /// Message lists received so far, oldest first.
    pub fn requests(&self) -> Vec<Vec<ChatMessage>> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Settings received with each request, oldest first.
    pub fn settings(&self) -> Vec<CompletionSettings> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl CompletionClient for ScriptedClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        settings: &CompletionSettings,
    ) -> Result<String, LlmError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(messages.to_vec());
        }
        if let Ok(mut seen) = self.settings.lock() {
            seen.push(settings.clone());
        }
        self.replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front())
            .ok_or_else(|| LlmError::Api("no scripted reply".to_string()))
    }
}
