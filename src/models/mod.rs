//! Domain models for CareerPath.
//!
//! # Core Concepts
//!
//! - [`Roadmap`]: A tree of [`RoadmapNode`]s with exactly one root. Nodes are
//!   appended as the user chats and are never removed within a session.
//! - [`ChatMessage`]: One role-tagged turn of the conversation sent to the
//!   completion API.
//! - [`Session`]: Everything kept per user: history, roadmap, identified
//!   interests and the assessed [`KnowledgeLevel`].

mod chat;
mod node;
mod session;

pub use chat::*;
pub use node::*;
pub use session::*;

use thiserror::Error;

/// A string that names no variant of a model enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}
