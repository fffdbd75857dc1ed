use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use super::SeedError;
use crate::models::{NodeType, Roadmap, RoadmapNode};

/// Background colour roadmap.sh uses for section headings.
const CATEGORY_COLOUR: &str = "#2ecc71";

/// Node kinds that carry a learnable topic. Titles, paragraphs, buttons and
/// the like are decoration.
const CONTENT_KINDS: &[&str] = &["text", "topic", "subtopic"];

/// A roadmap.sh definition: a drawing of nodes joined by edges.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawRoadmap {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default)]
    pub edges: Vec<RawEdge>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: RawData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawData {
    #[serde(default, alias = "text")]
    pub label: Option<String>,
    #[serde(default)]
    pub style: Option<RawStyle>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawStyle {
    #[serde(default)]
    pub background_color: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEdge {
    pub source: String,
    pub target: String,
}

/// `ai-agents` becomes `AI Agents`.
pub fn title_for(name: &str) -> String {
    name.split(['-', '_', ' '])
        .filter(|w| !w.is_empty())
        .map(|word| match word {
            "ios" => "iOS".to_string(),
            "ai" | "ui" | "ux" => word.to_ascii_uppercase(),
            _ => {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn node_type(node: &RawNode) -> NodeType {
    let colour = node
        .data
        .style
        .as_ref()
        .and_then(|s| s.background_color.as_deref());
    if colour.is_some_and(|c| c.eq_ignore_ascii_case(CATEGORY_COLOUR)) {
        NodeType::Category
    } else if node.kind.as_deref() == Some("subtopic") {
        NodeType::Subtopic
    } else {
        NodeType::Topic
    }
}

/// Turn a roadmap.sh definition into a tree rooted at `<name>_root`.
///
/// Each content node gets at most one parent: the first edge that reaches it.
/// Later edges to the same node, self loops and edges that would close a
/// cycle are ignored. Nodes without a parent hang off the root. Imported ids
/// are prefixed with `<name>:`.
pub fn convert(name: &str, raw: &RawRoadmap) -> Result<Roadmap, SeedError> {
    let content: Vec<&RawNode> = raw
        .nodes
        .iter()
        .filter(|n| {
            n.kind
                .as_deref()
                .is_some_and(|k| CONTENT_KINDS.contains(&k))
                && n.data
                    .label
                    .as_deref()
                    .is_some_and(|l| !l.trim().is_empty())
        })
        .collect();

    let mut known = HashSet::new();
    let content: Vec<&RawNode> = content
        .into_iter()
        .filter(|n| known.insert(n.id.as_str()))
        .collect();

    let mut parent_of: HashMap<&str, &str> = HashMap::new();
    let mut children: HashMap<&str, Vec<&str>> = HashMap::new();
    for edge in &raw.edges {
        let (source, target) = (edge.source.as_str(), edge.target.as_str());
        if source == target
            || !known.contains(source)
            || !known.contains(target)
            || parent_of.contains_key(target)
            || is_ancestor(&parent_of, target, source)
        {
            continue;
        }
        parent_of.insert(target, source);
        children.entry(source).or_default().push(target);
    }

    let by_id: HashMap<&str, &RawNode> = content.iter().map(|n| (n.id.as_str(), *n)).collect();
    let title = title_for(name);
    let mut root = RoadmapNode::new(format!("{}_root", name), &title, NodeType::Root)
        .with_content(format!("Your personalized {} roadmap", title));
    root.children = content
        .iter()
        .filter(|n| !parent_of.contains_key(n.id.as_str()))
        .map(|n| build(name, n, &by_id, &children))
        .collect();

    Ok(Roadmap::from_root(root)?)
}

/// True if `candidate` is `node` or one of its ancestors.
fn is_ancestor(parent_of: &HashMap<&str, &str>, candidate: &str, node: &str) -> bool {
    let mut current = Some(node);
    while let Some(id) = current {
        if id == candidate {
            return true;
        }
        current = parent_of.get(id).copied();
    }
    false
}

fn build(
    name: &str,
    node: &RawNode,
    by_id: &HashMap<&str, &RawNode>,
    children: &HashMap<&str, Vec<&str>>,
) -> RoadmapNode {
    let label = node.data.label.clone().unwrap_or_default();
    let mut out = RoadmapNode::new(format!("{}:{}", name, node.id), label.trim(), node_type(node))
        .with_content(label.trim());
    out.children = children
        .get(node.id.as_str())
        .into_iter()
        .flatten()
        .filter_map(|id| by_id.get(id))
        .map(|child| build(name, child, by_id, children))
        .collect();
    out
}
