use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChatMessage, Roadmap, UnknownVariant};

/// Per-user conversation state.
///
/// Created on the first request for a user id with the system prompt as the
/// only history entry and the default roadmap. Every exchange appends exactly
/// one user and one assistant turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub history: Vec<ChatMessage>,
    pub roadmap: Roadmap,
    /// Interests identified so far, in first-seen order.
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub knowledge_level: Option<KnowledgeLevel>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>, system_prompt: &str, roadmap: Roadmap) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            history: vec![ChatMessage::system(system_prompt)],
            roadmap,
            interests: Vec::new(),
            knowledge_level: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Record interests not seen before. Returns true if any were new.
    pub fn note_interests<I>(&mut self, interests: I) -> bool
    where
        I: IntoIterator<Item = String>,
    {
        let mut added = false;
        for interest in interests {
            if !self.interests.iter().any(|i| i.eq_ignore_ascii_case(&interest)) {
                self.interests.push(interest);
                added = true;
            }
        }
        added
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Coarse self-assessed expertise used to pick template nodes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum KnowledgeLevel {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl KnowledgeLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Parse, treating anything unrecognized as [`KnowledgeLevel::Beginner`].
    pub fn from_str_or_default(s: &str) -> Self {
        s.parse().unwrap_or_default()
    }
}

impl FromStr for KnowledgeLevel {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            _ => Err(UnknownVariant::new("knowledge level", s)),
        }
    }
}

/// Body of `POST /api/roadmap/{user_id}/interests`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrowInput {
    /// Interests to grow from. Defaults to the interests recorded on the session.
    #[serde(default)]
    pub interests: Option<Vec<String>>,
    /// Knowledge level as free text; unknown values mean beginner.
    #[serde(default)]
    pub level: Option<String>,
}

/// Result of growing a roadmap from interests.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowReply {
    pub roadmap: Roadmap,
    pub new_nodes: Vec<String>,
    pub level: KnowledgeLevel,
}
