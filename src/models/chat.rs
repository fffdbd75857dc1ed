use serde::{Deserialize, Serialize};

/// A single role-tagged turn as consumed by chat-completion APIs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Body of `POST /api/chat` and `POST /api/chat/stream`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub message: Option<String>,
    /// Session key. Falls back to the `user_id` cookie, then `default_user`.
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Result of one chat exchange.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    pub response: String,
    pub roadmap: super::Roadmap,
    /// Ids added to the roadmap by this exchange, in tree order.
    pub new_nodes: Vec<String>,
}

/// Item of a streamed chat exchange.
#[derive(Debug, Clone)]
pub enum ChatEvent {
    /// A chunk of the assistant's reply.
    Token(String),
    /// Sent once after the reply, with the updated roadmap.
    Roadmap(ChatReply),
}
