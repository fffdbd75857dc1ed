//! Tree operations on [`Roadmap`].
//!
//! All mutation goes through here so the invariants hold after every call:
//! one root, ids unique and non-empty, every child's `parent_id` equal to its
//! parent's `id`. Nothing in this module removes a node.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::{NodeType, Roadmap, RoadmapNode};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Duplicate node id: {0}")]
    DuplicateId(String),

    #[error("Node id must not be empty")]
    EmptyId,

    #[error("Root node {0} must not have a parent")]
    RootHasParent(String),

    #[error("Node {child} points at parent {listed:?} but sits under {actual}")]
    ParentMismatch {
        child: String,
        listed: Option<String>,
        actual: String,
    },
}

impl Roadmap {
    /// Build a roadmap from an untrusted root, relinking `parent_id`s and
    /// rejecting empty or duplicate ids.
    pub fn from_root(mut root: RoadmapNode) -> Result<Self, TreeError> {
        root.parent_id = None;
        relink(&mut root);
        let roadmap = Self { root };
        roadmap.validate()?;
        Ok(roadmap)
    }

    /// A tree holding only a root node.
    pub fn root_only(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            root: RoadmapNode::new(id, title, NodeType::Root),
        }
    }

    pub fn root(&self) -> &RoadmapNode {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut RoadmapNode {
        &mut self.root
    }

    pub fn into_root(self) -> RoadmapNode {
        self.root
    }

    pub fn len(&self) -> usize {
        self.root.subtree_len()
    }

    /// All ids in pre-order (root first, children in display order).
    pub fn ids(&self) -> Vec<String> {
        let mut out = Vec::with_capacity(self.len());
        collect_ids(&self.root, &mut out);
        out
    }

    pub fn id_set(&self) -> HashSet<String> {
        self.ids().into_iter().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.find(id).is_some()
    }

    pub fn find(&self, id: &str) -> Option<&RoadmapNode> {
        find_in(&self.root, id)
    }

    pub fn find_mut(&mut self, id: &str) -> Option<&mut RoadmapNode> {
        find_in_mut(&mut self.root, id)
    }

    /// Direct child of `parent_id` whose title matches case-insensitively.
    pub fn find_child_by_title(&self, parent_id: &str, title: &str) -> Option<&RoadmapNode> {
        self.find(parent_id)?
            .children
            .iter()
            .find(|c| c.title.eq_ignore_ascii_case(title.trim()))
    }

    /// Append `node` (with its subtree) under `parent_id` and return its id.
    ///
    /// Fails without modifying the tree if the parent is missing or any id in
    /// the new subtree is empty or already taken.
    pub fn add_child(&mut self, parent_id: &str, mut node: RoadmapNode) -> Result<String, TreeError> {
        if !self.contains(parent_id) {
            return Err(TreeError::NodeNotFound(parent_id.to_string()));
        }

        let mut seen = self.id_set();
        check_unique(&node, &mut seen)?;

        node.parent_id = Some(parent_id.to_string());
        relink(&mut node);
        let id = node.id.clone();

        // Presence was checked above.
        if let Some(parent) = self.find_mut(parent_id) {
            parent.children.push(node);
        }
        Ok(id)
    }

    /// Graft every node of `other` whose id is not yet present.
    ///
    /// Each new node keeps its position relative to its parent in `other`; if
    /// that parent is unknown here the node goes under this tree's root.
    /// Existing nodes are left untouched. Returns the added ids in pre-order.
    pub fn merge(&mut self, other: &Roadmap) -> Vec<String> {
        let mut added = Vec::new();
        let root_id = self.root.id.clone();
        for child in &other.root.children {
            self.merge_node(child, &other.root.id, &root_id, &mut added);
        }
        added
    }

    fn merge_node(
        &mut self,
        node: &RoadmapNode,
        proposed_parent: &str,
        root_id: &str,
        added: &mut Vec<String>,
    ) {
        if !self.contains(&node.id) {
            let parent = if self.contains(proposed_parent) {
                proposed_parent
            } else {
                root_id
            };
            let mut copy = node.clone();
            copy.children.clear();
            match self.add_child(parent, copy) {
                Ok(id) => added.push(id),
                Err(e) => {
                    tracing::warn!("Skipping node {} during merge: {}", node.id, e);
                    return;
                }
            }
        }
        for child in &node.children {
            self.merge_node(child, &node.id, root_id, added);
        }
    }

    /// Ids present now that were not in `before`, in pre-order.
    pub fn ids_added_since(&self, before: &HashSet<String>) -> Vec<String> {
        self.ids()
            .into_iter()
            .filter(|id| !before.contains(id))
            .collect()
    }

    /// True if every id of `other` is present in this tree.
    pub fn is_superset_of(&self, other: &Roadmap) -> bool {
        let mine = self.id_set();
        other.ids().iter().all(|id| mine.contains(id))
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), TreeError> {
        if self.root.parent_id.is_some() {
            return Err(TreeError::RootHasParent(self.root.id.clone()));
        }
        let mut seen = HashSet::new();
        validate_node(&self.root, &mut seen)
    }

    /// Visit every node mutably in pre-order.
    pub fn for_each_mut<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut RoadmapNode),
    {
        visit_mut(&mut self.root, &mut f);
    }
}

fn collect_ids(node: &RoadmapNode, out: &mut Vec<String>) {
    out.push(node.id.clone());
    for child in &node.children {
        collect_ids(child, out);
    }
}

fn find_in<'a>(node: &'a RoadmapNode, id: &str) -> Option<&'a RoadmapNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter().find_map(|c| find_in(c, id))
}

fn find_in_mut<'a>(node: &'a mut RoadmapNode, id: &str) -> Option<&'a mut RoadmapNode> {
    if node.id == id {
        return Some(node);
    }
    node.children.iter_mut().find_map(|c| find_in_mut(c, id))
}

fn relink(node: &mut RoadmapNode) {
    let id = node.id.clone();
    for child in &mut node.children {
        child.parent_id = Some(id.clone());
        relink(child);
    }
}

fn check_unique(node: &RoadmapNode, seen: &mut HashSet<String>) -> Result<(), TreeError> {
    if node.id.trim().is_empty() {
        return Err(TreeError::EmptyId);
    }
    if !seen.insert(node.id.clone()) {
        return Err(TreeError::DuplicateId(node.id.clone()));
    }
    node.children.iter().try_for_each(|c| check_unique(c, seen))
}

fn validate_node(node: &RoadmapNode, seen: &mut HashSet<String>) -> Result<(), TreeError> {
    if node.id.trim().is_empty() {
        return Err(TreeError::EmptyId);
    }
    if !seen.insert(node.id.clone()) {
        return Err(TreeError::DuplicateId(node.id.clone()));
    }
    for child in &node.children {
        if child.parent_id.as_deref() != Some(node.id.as_str()) {
            return Err(TreeError::ParentMismatch {
                child: child.id.clone(),
                listed: child.parent_id.clone(),
                actual: node.id.clone(),
            });
        }
        validate_node(child, seen)?;
    }
    Ok(())
}

fn visit_mut<F>(node: &mut RoadmapNode, f: &mut F)
where
    F: FnMut(&mut RoadmapNode),
{
    f(node);
    for child in &mut node.children {
        visit_mut(child, f);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topic(id: &str, title: &str) -> RoadmapNode {
        RoadmapNode::new(id, title, NodeType::Topic)
    }

    fn sample() -> Roadmap {
        let mut tree = Roadmap::root_only("root", "Technology Careers");
        tree.add_child("root", RoadmapNode::new("web", "Web Development", NodeType::Category))
            .unwrap();
        tree.add_child("web", topic("web_frontend", "Frontend Development"))
            .unwrap();
        tree
    }

    #[test]
    fn add_child_links_parent_and_keeps_order() {
        let mut tree = sample();
        tree.add_child("web", topic("web_backend", "Backend Development"))
            .unwrap();

        let web = tree.find("web").unwrap();
        let titles: Vec<_> = web.children.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, ["Frontend Development", "Backend Development"]);
        assert_eq!(web.children[1].parent_id.as_deref(), Some("web"));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn add_child_rejects_unknown_parent() {
        let mut tree = sample();
        let err = tree.add_child("nope", topic("x", "X")).unwrap_err();
        assert_eq!(err, TreeError::NodeNotFound("nope".into()));
        assert_eq!(tree.len(), 3);
    }

    #[test]
    fn add_child_rejects_taken_id_anywhere_in_subtree() {
        let mut tree = sample();
        let mut node = topic("fresh", "Fresh");
        node.children.push(topic("web", "Clash"));
        let err = tree.add_child("root", node).unwrap_err();
        assert_eq!(err, TreeError::DuplicateId("web".into()));
        assert!(!tree.contains("fresh"));
    }

    #[test]
    fn add_child_relinks_nested_subtree() {
        let mut tree = sample();
        let mut node = topic("ai", "AI");
        node.children.push(topic("ai_nlp", "NLP"));
        tree.add_child("root", node).unwrap();
        assert_eq!(tree.find("ai_nlp").unwrap().parent_id.as_deref(), Some("ai"));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn ids_are_pre_order() {
        let tree = sample();
        assert_eq!(tree.ids(), ["root", "web", "web_frontend"]);
    }

    #[test]
    fn find_child_by_title_ignores_case() {
        let tree = sample();
        let found = tree.find_child_by_title("web", "frontend development");
        assert_eq!(found.map(|n| n.id.as_str()), Some("web_frontend"));
        assert!(tree.find_child_by_title("root", "Frontend Development").is_none());
    }

    #[test]
    fn merge_adds_only_new_nodes_under_their_parents() {
        let mut tree = sample();
        let mut other = sample();
        other
            .add_child("web_frontend", topic("web_react", "React"))
            .unwrap();
        other.find_mut("web").unwrap().title = "Renamed".into();

        let added = tree.merge(&other);

        assert_eq!(added, ["web_react"]);
        assert_eq!(tree.find("web").unwrap().title, "Web Development");
        assert_eq!(
            tree.find("web_react").unwrap().parent_id.as_deref(),
            Some("web_frontend")
        );
    }

    #[test]
    fn merge_puts_orphans_under_root() {
        let mut tree = sample();
        let mut other = Roadmap::root_only("other_root", "Other");
        let mut cloud = RoadmapNode::new("cloud", "Cloud", NodeType::Category);
        cloud.children.push(topic("cloud_aws", "AWS"));
        other.add_child("other_root", cloud).unwrap();

        let added = tree.merge(&other);

        assert_eq!(added, ["cloud", "cloud_aws"]);
        assert_eq!(tree.find("cloud").unwrap().parent_id.as_deref(), Some("root"));
        assert!(!tree.contains("other_root"));
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn from_root_relinks_and_rejects_duplicates() {
        let mut root = RoadmapNode::new("r", "Root", NodeType::Root);
        root.parent_id = Some("bogus".into());
        root.children.push(topic("a", "A"));
        let tree = Roadmap::from_root(root.clone()).unwrap();
        assert!(tree.root().parent_id.is_none());
        assert_eq!(tree.find("a").unwrap().parent_id.as_deref(), Some("r"));

        root.children.push(topic("a", "A again"));
        assert_eq!(
            Roadmap::from_root(root).unwrap_err(),
            TreeError::DuplicateId("a".into())
        );
    }

    #[test]
    fn validate_detects_broken_back_reference() {
        let tree: Roadmap = serde_json::from_value(serde_json::json!({
            "id": "root",
            "title": "Root",
            "type": "ROOT",
            "children": [
                {"id": "a", "title": "A", "type": "TOPIC", "parent_id": "elsewhere"}
            ]
        }))
        .unwrap();

        assert!(matches!(
            tree.validate(),
            Err(TreeError::ParentMismatch { ref child, .. }) if child == "a"
        ));
    }

    #[test]
    fn superset_check() {
        let small = sample();
        let mut big = sample();
        big.add_child("root", topic("extra", "Extra")).unwrap();
        assert!(big.is_superset_of(&small));
        assert!(!small.is_superset_of(&big));
    }
}
