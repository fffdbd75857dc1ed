//! The roadmap tree and the policies that grow it.
//!
//! An [`UpdatePolicy`] turns the current tree and one user message into a
//! new tree that keeps every existing node, plus the ids it added. Two
//! policies exist: [`KeywordPolicy`] works offline from a rule table,
//! [`ModelPolicy`] asks the completion model for a new tree.

mod defaults;
mod keyword;
pub mod knowledge;
mod proposal;
mod render;
mod tree;

use async_trait::async_trait;

pub use defaults::{default_roadmap, ROOT_ID};
pub use keyword::KeywordPolicy;
pub use proposal::{apply_proposal, parse_proposal, ModelPolicy, ProposalError};
pub use render::render_outline;
pub use tree::TreeError;

use crate::models::Roadmap;

/// Result of one policy run.
#[derive(Debug, Clone)]
pub struct RoadmapUpdate {
    pub roadmap: Roadmap,
    /// Ids not present before the update, in tree order.
    pub new_nodes: Vec<String>,
}

impl RoadmapUpdate {
    pub fn unchanged(current: &Roadmap) -> Self {
        Self {
            roadmap: current.clone(),
            new_nodes: Vec::new(),
        }
    }
}

/// Strategy for growing a roadmap from a chat message.
///
/// Implementations must never drop or renumber an existing node, and must
/// return the input unchanged when they cannot produce an update.
#[async_trait]
pub trait UpdatePolicy: Send + Sync {
    fn name(&self) -> &'static str;

    async fn update(&self, current: &Roadmap, text: &str) -> RoadmapUpdate;
}
