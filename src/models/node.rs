use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::UnknownVariant;

/// One entry of a roadmap tree.
///
/// Children are owned and their order is the display order. `parent_id` is a
/// back-reference kept in sync by the tree operations in [`crate::roadmap`];
/// it is `None` only for the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadmapNode {
    pub id: String,
    #[serde(alias = "label")]
    pub title: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(default, alias = "description")]
    pub content: String,
    #[serde(default)]
    pub resources: Vec<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// Set by knowledge-level customization to draw attention to a node.
    #[serde(default, skip_serializing_if = "is_false")]
    pub highlight: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    /// Hint for the client to render the node folded.
    #[serde(default, skip_serializing_if = "is_false")]
    pub collapsed: bool,
    #[serde(default)]
    pub children: Vec<RoadmapNode>,
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl RoadmapNode {
    pub fn new(id: impl Into<String>, title: impl Into<String>, node_type: NodeType) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            node_type,
            content: String::new(),
            resources: Vec::new(),
            parent_id: None,
            highlight: false,
            priority: None,
            collapsed: false,
            children: Vec::new(),
        }
    }

    pub fn with_content(mut self, content: impl Into<String>) -> Self {
        self.content = content.into();
        self
    }

    pub fn with_resources<I, S>(mut self, resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_highlight(mut self) -> Self {
        self.highlight = true;
        self
    }

    /// Number of nodes in this subtree, including `self`.
    pub fn subtree_len(&self) -> usize {
        1 + self.children.iter().map(|c| c.subtree_len()).sum::<usize>()
    }
}

/// The kind of a roadmap node. Controls how the client draws it, not how the
/// tree behaves.
///
/// Serialized upper-case (`"TOPIC"`); the lower-case spellings used by older
/// clients and by model replies are accepted on input.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeType {
    #[serde(alias = "root")]
    Root,
    #[serde(alias = "category")]
    Category,
    #[serde(alias = "topic")]
    Topic,
    #[serde(alias = "subtopic")]
    Subtopic,
    #[serde(alias = "decision")]
    Decision,
    #[serde(alias = "resource")]
    Resource,
}

/// Case-insensitive parse.
impl FromStr for NodeType {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "root" => Ok(Self::Root),
            "category" => Ok(Self::Category),
            "topic" => Ok(Self::Topic),
            "subtopic" => Ok(Self::Subtopic),
            "decision" => Ok(Self::Decision),
            "resource" => Ok(Self::Resource),
            _ => Err(UnknownVariant::new("node type", s)),
        }
    }
}

/// Emphasis assigned by knowledge-level customization.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Low,
}

/// A roadmap: one root node owning the rest of the tree.
///
/// Serializes as the root node itself. Use [`Roadmap::from_root`] when the
/// tree comes from an untrusted source so that it is validated first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Roadmap {
    pub(crate) root: RoadmapNode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_type_accepts_both_spellings() {
        let upper: NodeType = serde_json::from_str("\"SUBTOPIC\"").unwrap();
        let lower: NodeType = serde_json::from_str("\"subtopic\"").unwrap();
        assert_eq!(upper, NodeType::Subtopic);
        assert_eq!(lower, NodeType::Subtopic);
        assert_eq!(serde_json::to_string(&lower).unwrap(), "\"SUBTOPIC\"");
    }

    #[test]
    fn node_type_from_str_is_case_insensitive() {
        assert_eq!("Decision".parse::<NodeType>(), Ok(NodeType::Decision));
        assert_eq!(" resource ".parse::<NodeType>(), Ok(NodeType::Resource));
        assert!("leaf".parse::<NodeType>().is_err());
    }

    #[test]
    fn unset_hints_are_omitted_from_json() {
        let node = RoadmapNode::new("web", "Web Development", NodeType::Category);
        let json = serde_json::to_value(&node).unwrap();
        assert!(json.get("highlight").is_none());
        assert!(json.get("priority").is_none());
        assert!(json.get("collapsed").is_none());
        assert_eq!(json["type"], "CATEGORY");
    }

    #[test]
    fn label_and_description_are_accepted_as_aliases() {
        let node: RoadmapNode = serde_json::from_value(serde_json::json!({
            "id": "ml",
            "label": "Machine Learning",
            "type": "topic",
            "description": "Learning from data"
        }))
        .unwrap();
        assert_eq!(node.title, "Machine Learning");
        assert_eq!(node.content, "Learning from data");
        assert!(node.children.is_empty());
    }
}
