//! Model-proposed roadmap growth.
//!
//! The model is shown the current tree and the user's message and asked to
//! return the whole updated tree as JSON. The reply is parsed leniently (code
//! fences, `label`/`description` spellings, missing ids, or the flat
//! `{nodes, nodeDetails}` layout) and then validated into a [`Roadmap`].
//!
//! A proposal that keeps every existing id replaces the tree; otherwise only
//! its new nodes are merged in. Any failure leaves the tree as it was.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use super::{RoadmapUpdate, TreeError, UpdatePolicy};
use crate::llm::{CompletionClient, CompletionSettings, LlmError};
use crate::models::{ChatMessage, NodeType, Priority, Roadmap, RoadmapNode};

#[derive(Debug, Error)]
pub enum ProposalError {
    #[error("Model reply contained no JSON")]
    Empty,

    #[error("Model reply is not a roadmap: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("Proposed node {0} has no title")]
    MissingTitle(String),

    #[error("Proposed tree has {0} root nodes")]
    RootCount(usize),

    #[error("Proposed node {node} names unknown parent {parent}")]
    UnknownParent { node: String, parent: String },

    #[error("Proposed node {0} is not reachable from the root")]
    Unreachable(String),

    #[error(transparent)]
    Invalid(#[from] TreeError),

    #[error(transparent)]
    Llm(#[from] LlmError),
}

const INSTRUCTIONS: &str = r#"You maintain a career learning roadmap for the user.
Given the current roadmap as JSON and the user's latest message, return the complete updated roadmap.

Rules:
- Keep every existing node with its id unchanged. Never remove nodes.
- Add new nodes only where the message shows a new interest or goal.
- Each node has: "id" (unique string), "title", "type" (one of ROOT, CATEGORY, TOPIC, SUBTOPIC, DECISION, RESOURCE), "content", "resources" (list of strings), "children" (list of nodes).
- Reply with the JSON object only, no commentary."#;

/// Grows the tree by asking the completion model for a new version of it.
pub struct ModelPolicy {
    client: Arc<dyn CompletionClient>,
    settings: CompletionSettings,
}

impl ModelPolicy {
    pub fn new(client: Arc<dyn CompletionClient>, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    fn prompt(current: &Roadmap, text: &str) -> Result<Vec<ChatMessage>, ProposalError> {
        let tree = serde_json::to_string_pretty(current)?;
        Ok(vec![
            ChatMessage::system(INSTRUCTIONS),
            ChatMessage::user(format!(
                "Current roadmap:\n{}\n\nUser message:\n{}",
                tree, text
            )),
        ])
    }

    async fn propose(&self, current: &Roadmap, text: &str) -> Result<RoadmapUpdate, ProposalError> {
        let messages = Self::prompt(current, text)?;
        let reply = self.client.complete(&messages, &self.settings).await?;
        let proposed = parse_proposal(&reply)?;
        Ok(apply_proposal(current, proposed))
    }
}

#[async_trait]
impl UpdatePolicy for ModelPolicy {
    fn name(&self) -> &'static str {
        "model"
    }

    async fn update(&self, current: &Roadmap, text: &str) -> RoadmapUpdate {
        match self.propose(current, text).await {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!("Keeping roadmap unchanged, proposal rejected: {}", e);
                RoadmapUpdate::unchanged(current)
            }
        }
    }
}

/// Replace `current` with `proposed` if nothing is lost, else merge.
pub fn apply_proposal(current: &Roadmap, proposed: Roadmap) -> RoadmapUpdate {
    let before = current.id_set();
    if proposed.is_superset_of(current) {
        let mut roadmap = proposed;
        keep_flags(current, &mut roadmap);
        let new_nodes = roadmap.ids_added_since(&before);
        return RoadmapUpdate { roadmap, new_nodes };
    }

    let missing = current
        .ids()
        .into_iter()
        .filter(|id| !proposed.contains(id))
        .count();
    tracing::debug!("Proposal drops {} existing nodes, merging new ones only", missing);

    let mut roadmap = current.clone();
    let new_nodes = roadmap.merge(&proposed);
    RoadmapUpdate { roadmap, new_nodes }
}

/// Models seldom echo display flags, so nodes that survive a replacement
/// keep the ones they already had.
fn keep_flags(current: &Roadmap, roadmap: &mut Roadmap) {
    roadmap.for_each_mut(|node| {
        if let Some(old) = current.find(&node.id) {
            node.highlight |= old.highlight;
            node.collapsed |= old.collapsed;
            node.priority = node.priority.or(old.priority);
        }
    });
}

/// Cut the JSON object out of a model reply.
fn extract_json(reply: &str) -> Option<&str> {
    let body = if let Some(start) = reply.find("```json") {
        let rest = &reply[start + "```json".len()..];
        rest.find("```").map_or(rest, |end| &rest[..end])
    } else if let Some(start) = reply.find("```") {
        let rest = &reply[start + 3..];
        rest.find("```").map_or(rest, |end| &rest[..end])
    } else {
        reply
    };

    let open = body.find('{')?;
    let close = body.rfind('}')?;
    (close > open).then(|| &body[open..=close])
}

/// Parse and validate a model reply into a tree.
pub fn parse_proposal(reply: &str) -> Result<Roadmap, ProposalError> {
    let json = extract_json(reply).ok_or(ProposalError::Empty)?;
    let root = match serde_json::from_str::<ProposedTree>(json)? {
        ProposedTree::Flat(flat) => flat.into_nested()?,
        ProposedTree::Nested(node) => node,
    };
    let mut root = root.into_node()?;
    root.node_type = NodeType::Root;
    Ok(Roadmap::from_root(root)?)
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ProposedTree {
    Flat(FlatTree),
    Nested(ProposedNode),
}

#[derive(Debug, Default, Deserialize)]
struct ProposedNode {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, alias = "label")]
    title: Option<String>,
    #[serde(default, rename = "type", alias = "node_type")]
    node_type: Option<String>,
    #[serde(default, alias = "description")]
    content: Option<String>,
    #[serde(default)]
    resources: Vec<String>,
    #[serde(default)]
    highlight: bool,
    #[serde(default)]
    priority: Option<String>,
    #[serde(default)]
    collapsed: bool,
    #[serde(default)]
    children: Vec<ProposedNode>,
}

fn parse_priority(value: &str) -> Option<Priority> {
    match value.trim().to_ascii_lowercase().as_str() {
        "high" => Some(Priority::High),
        "low" => Some(Priority::Low),
        _ => None,
    }
}

impl ProposedNode {
    fn into_node(self) -> Result<RoadmapNode, ProposalError> {
        let id = self
            .id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let title = self
            .title
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| ProposalError::MissingTitle(id.clone()))?;
        let node_type = self
            .node_type
            .as_deref()
            .and_then(|t| t.parse().ok())
            .unwrap_or(NodeType::Topic);

        let mut node = RoadmapNode::new(id, title, node_type)
            .with_content(self.content.unwrap_or_default())
            .with_resources(self.resources);
        node.highlight = self.highlight;
        node.priority = self.priority.as_deref().and_then(parse_priority);
        node.collapsed = self.collapsed;
        node.children = self
            .children
            .into_iter()
            .map(ProposedNode::into_node)
            .collect::<Result<_, _>>()?;
        Ok(node)
    }
}

/// The `{nodes: [...], nodeDetails: {...}}` layout some models prefer.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FlatTree {
    nodes: Vec<FlatNode>,
    #[serde(default)]
    node_details: HashMap<String, FlatDetails>,
}

#[derive(Debug, Deserialize)]
struct FlatNode {
    id: String,
    #[serde(default, alias = "label")]
    title: Option<String>,
    #[serde(default, rename = "type")]
    node_type: Option<String>,
    #[serde(default, alias = "parentId", alias = "parent_id")]
    parent: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct FlatDetails {
    #[serde(default, alias = "description")]
    content: Option<String>,
    #[serde(default)]
    resources: Vec<String>,
}

impl FlatTree {
    fn into_nested(mut self) -> Result<ProposedNode, ProposalError> {
        let ids: HashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        let roots: Vec<&FlatNode> = self.nodes.iter().filter(|n| n.parent.is_none()).collect();
        if roots.len() != 1 {
            return Err(ProposalError::RootCount(roots.len()));
        }
        let root_id = roots[0].id.clone();

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for node in &self.nodes {
            if let Some(parent) = &node.parent {
                if !ids.contains(parent.as_str()) {
                    return Err(ProposalError::UnknownParent {
                        node: node.id.clone(),
                        parent: parent.clone(),
                    });
                }
                children.entry(parent.clone()).or_default().push(node.id.clone());
            }
        }

        let mut by_id: HashMap<String, FlatNode> =
            self.nodes.drain(..).map(|n| (n.id.clone(), n)).collect();
        let total = by_id.len();
        let root = build_nested(&root_id, &mut by_id, &children, &mut self.node_details)?;

        // Anything left over sits on a parent cycle detached from the root.
        if let Some(stray) = by_id.keys().next() {
            return Err(ProposalError::Unreachable(stray.clone()));
        }
        debug_assert_eq!(total, count(&root));
        Ok(root)
    }
}

fn build_nested(
    id: &str,
    by_id: &mut HashMap<String, FlatNode>,
    children: &HashMap<String, Vec<String>>,
    details: &mut HashMap<String, FlatDetails>,
) -> Result<ProposedNode, ProposalError> {
    // Removing on visit means a repeated id ends the walk instead of looping.
    let flat = by_id
        .remove(id)
        .ok_or_else(|| ProposalError::Invalid(TreeError::DuplicateId(id.to_string())))?;
    let detail = details.remove(id).unwrap_or_default();

    let mut node = ProposedNode {
        id: Some(flat.id),
        title: flat.title,
        node_type: flat.node_type,
        content: detail.content,
        resources: detail.resources,
        ..Default::default()
    };
    for child in children.get(id).into_iter().flatten() {
        node.children
            .push(build_nested(child, by_id, children, details)?);
    }
    Ok(node)
}

fn count(node: &ProposedNode) -> usize {
    1 + node.children.iter().map(count).sum::<usize>()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;
    use crate::roadmap::default_roadmap;

    fn policy(reply: &str) -> ModelPolicy {
        ModelPolicy::new(
            Arc::new(ScriptedClient::new([reply.to_string()])),
            CompletionSettings::default(),
        )
    }

    fn grown_default_json() -> String {
        let mut tree = default_roadmap();
        tree.add_child(
            "web",
            RoadmapNode::new("web_frontend", "Frontend Development", NodeType::Topic),
        )
        .unwrap();
        serde_json::to_string(&tree).unwrap()
    }

    #[test]
    fn extracts_json_from_fenced_reply() {
        let reply = "Sure!\n```json\n{\"id\": \"r\", \"title\": \"R\"}\n```\nEnjoy.";
        assert_eq!(extract_json(reply), Some("{\"id\": \"r\", \"title\": \"R\"}"));
        assert_eq!(extract_json("no json here"), None);
    }

    #[test]
    fn nested_reply_with_lenient_fields_parses() {
        let tree = parse_proposal(
            r#"{"label": "Root", "type": "root", "children": [
                {"id": "ml", "label": "ML", "description": "Models", "type": "subtopic"},
                {"title": "No id", "type": "weird"}
            ]}"#,
        )
        .unwrap();

        let root = tree.root();
        assert_eq!(root.node_type, NodeType::Root);
        assert_eq!(root.children[0].node_type, NodeType::Subtopic);
        assert_eq!(root.children[0].content, "Models");
        assert_eq!(root.children[1].node_type, NodeType::Topic);
        assert!(!root.children[1].id.is_empty());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn flat_reply_is_nested_by_parent() {
        let tree = parse_proposal(
            r#"{"nodes": [
                {"id": "root", "label": "Your Career Path", "type": "root", "parent": null},
                {"id": "ai_ml", "label": "AI & ML", "type": "category", "parent": "root"},
                {"id": "ml_fundamentals", "label": "ML Fundamentals", "type": "topic", "parent": "ai_ml"}
            ],
            "nodeDetails": {"ai_ml": {"content": "Learning systems", "resources": ["Fast.ai"]}}}"#,
        )
        .unwrap();

        assert_eq!(tree.ids(), ["root", "ai_ml", "ml_fundamentals"]);
        let ai = tree.find("ai_ml").unwrap();
        assert_eq!(ai.resources, ["Fast.ai"]);
        assert_eq!(
            tree.find("ml_fundamentals").unwrap().parent_id.as_deref(),
            Some("ai_ml")
        );
    }

    #[test]
    fn flat_reply_with_cycle_is_rejected() {
        let err = parse_proposal(
            r#"{"nodes": [
                {"id": "root", "label": "Root"},
                {"id": "a", "label": "A", "parent": "b"},
                {"id": "b", "label": "B", "parent": "a"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProposalError::Unreachable(_)));
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = parse_proposal(
            r#"{"id": "r", "title": "R", "children": [
                {"id": "x", "title": "X"}, {"id": "x", "title": "X again"}
            ]}"#,
        )
        .unwrap_err();
        assert!(matches!(err, ProposalError::Invalid(TreeError::DuplicateId(_))));
    }

    #[test]
    fn missing_title_is_rejected() {
        let err = parse_proposal(r#"{"id": "r"}"#).unwrap_err();
        assert!(matches!(err, ProposalError::MissingTitle(ref id) if id == "r"));
    }

    #[tokio::test]
    async fn superset_proposal_replaces_tree() {
        let current = default_roadmap();
        let update = policy(&format!("```json\n{}\n```", grown_default_json()))
            .update(&current, "frontend")
            .await;

        assert_eq!(update.new_nodes, ["web_frontend"]);
        assert!(update.roadmap.is_superset_of(&current));
    }

    #[test]
    fn echoed_flags_are_read() {
        let tree = parse_proposal(
            r#"{"id": "root", "title": "R", "children": [
                {"id": "a", "title": "A", "highlight": true, "priority": "HIGH", "collapsed": true},
                {"id": "b", "title": "B", "priority": "medium"}
            ]}"#,
        )
        .unwrap();

        let a = tree.find("a").unwrap();
        assert!(a.highlight && a.collapsed);
        assert_eq!(a.priority, Some(Priority::High));
        assert_eq!(tree.find("b").unwrap().priority, None);
    }

    #[test]
    fn replacement_keeps_flags_the_reply_left_out() {
        let mut current = default_roadmap();
        current.for_each_mut(|node| {
            if node.id == "ai" {
                node.highlight = true;
                node.priority = Some(Priority::Low);
            }
        });
        let update = apply_proposal(&current, parse_proposal(&grown_default_json()).unwrap());

        let ai = update.roadmap.find("ai").unwrap();
        assert!(ai.highlight);
        assert_eq!(ai.priority, Some(Priority::Low));
        assert_eq!(update.new_nodes, ["web_frontend"]);
    }

    #[tokio::test]
    async fn lossy_proposal_only_contributes_new_nodes() {
        let current = default_roadmap();
        let reply = r#"{"id": "root", "title": "Fresh", "type": "ROOT", "children": [
            {"id": "web", "title": "Web", "type": "CATEGORY", "children": [
                {"id": "web_backend", "title": "Backend Development", "type": "TOPIC"}
            ]},
            {"id": "games", "title": "Game Development", "type": "CATEGORY"}
        ]}"#;

        let update = policy(reply).update(&current, "backend and games").await;

        assert_eq!(update.new_nodes, ["web_backend", "games"]);
        assert!(update.roadmap.is_superset_of(&current));
        assert_eq!(update.roadmap.root().title, "Technology Careers");
        assert_eq!(
            update.roadmap.find("web_backend").unwrap().parent_id.as_deref(),
            Some("web")
        );
    }

    #[tokio::test]
    async fn malformed_reply_keeps_tree() {
        let current = default_roadmap();
        let update = policy("{\"id\": \"root\", \"children\": [").update(&current, "hi").await;
        assert!(update.new_nodes.is_empty());
        assert_eq!(update.roadmap, current);
    }

    #[tokio::test]
    async fn client_error_keeps_tree() {
        let current = default_roadmap();
        let policy = ModelPolicy::new(
            Arc::new(ScriptedClient::failing()),
            CompletionSettings::default(),
        );
        let update = policy.update(&current, "anything").await;
        assert_eq!(update.roadmap, current);
    }
}
