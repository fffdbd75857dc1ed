//! Knowledge-level customization.
//!
//! Adds level-specific template topics for agentic AI and sets presentation
//! hints on AI-related nodes. Only ever appends nodes and edits hints.

use uuid::Uuid;

use crate::interests::{self, Mentions};
use crate::models::{KnowledgeLevel, NodeType, Priority, Roadmap, RoadmapNode};

const AI_ENGINEERING: &str = "AI Engineering";
const AGENTIC_AI: &str = "Agentic AI";

struct Template {
    slug: &'static str,
    title: &'static str,
    content: &'static str,
    resource: Option<&'static str>,
    highlight: bool,
}

const fn t(
    slug: &'static str,
    title: &'static str,
    content: &'static str,
    resource: Option<&'static str>,
    highlight: bool,
) -> Template {
    Template {
        slug,
        title,
        content,
        resource,
        highlight,
    }
}

const AGENTIC_BEGINNER: &[Template] = &[
    t(
        "ai_agent_basics",
        "What is an AI Agent?",
        "AI agents are autonomous systems that perceive their environment, make decisions, and act to reach a goal.",
        None,
        true,
    ),
    t(
        "llm_basics",
        "LLM Foundations",
        "How large language models work as the core of modern AI agents.",
        Some("https://huggingface.co/learn/nlp-course/chapter1/1"),
        true,
    ),
    t(
        "prompt_engineering",
        "Prompt Engineering",
        "Crafting prompts that guide agent behavior.",
        Some("https://www.promptingguide.ai/"),
        false,
    ),
    t(
        "tools_basics",
        "Tools and Functions",
        "How agents use tools and call functions.",
        Some("https://platform.openai.com/docs/guides/function-calling"),
        false,
    ),
];

const AGENTIC_INTERMEDIATE: &[Template] = &[
    t(
        "agent_frameworks",
        "Agent Frameworks",
        "LangChain, AutoGPT and other frameworks for building AI agents.",
        Some("https://python.langchain.com/docs/get_started/introduction"),
        true,
    ),
    t(
        "tool_integration",
        "Tool Integration",
        "Connecting agents to external tools, APIs and data sources.",
        None,
        true,
    ),
    t(
        "agent_memory",
        "Agent Memory Systems",
        "Memory architectures for persistent agent knowledge.",
        None,
        true,
    ),
    t(
        "rag_systems",
        "Retrieval-Augmented Generation",
        "Giving agents external knowledge with RAG.",
        Some("https://www.pinecone.io/learn/retrieval-augmented-generation/"),
        false,
    ),
    t(
        "vector_embeddings",
        "Vector Embeddings",
        "Embeddings for semantic search and retrieval.",
        Some("https://www.sbert.net/"),
        false,
    ),
];

const AGENTIC_ADVANCED: &[Template] = &[
    t(
        "multi_agent_systems",
        "Multi-Agent Systems",
        "Systems of multiple collaborating AI agents.",
        Some("https://arxiv.org/abs/2304.03442"),
        true,
    ),
    t(
        "reasoning_techniques",
        "Advanced Reasoning",
        "Chain-of-thought, tree-of-thought and other reasoning methods.",
        Some("https://arxiv.org/abs/2305.10601"),
        true,
    ),
    t(
        "agent_alignment",
        "Agent Alignment & Safety",
        "Keeping agents aligned with human values and goals.",
        None,
        true,
    ),
    t(
        "advanced_rag",
        "Advanced RAG Architectures",
        "HyDE, multi-vector retrieval and other recent retrieval designs.",
        Some("https://arxiv.org/abs/2212.10496"),
        false,
    ),
    t(
        "research_frontiers",
        "Research Frontiers",
        "Current research and emerging techniques in agentic AI.",
        Some("https://arxiv.org/list/cs.AI/recent"),
        false,
    ),
];

fn agentic_templates(level: KnowledgeLevel) -> &'static [Template] {
    match level {
        KnowledgeLevel::Beginner => AGENTIC_BEGINNER,
        KnowledgeLevel::Intermediate => AGENTIC_INTERMEDIATE,
        KnowledgeLevel::Advanced => AGENTIC_ADVANCED,
    }
}

fn level_note(level: KnowledgeLevel) -> &'static str {
    match level {
        KnowledgeLevel::Beginner => "Customized for beginners with foundation-building content",
        KnowledgeLevel::Intermediate => {
            "Customized for intermediate users with practical implementation focus"
        }
        KnowledgeLevel::Advanced => "Customized for advanced users with cutting-edge techniques",
    }
}

fn short_id(slug: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}", slug, &suffix[..8])
}

impl Template {
    fn to_node(&self) -> RoadmapNode {
        let mut node = RoadmapNode::new(short_id(self.slug), self.title, NodeType::Topic)
            .with_content(self.content)
            .with_resources(self.resource);
        node.highlight = self.highlight;
        node
    }
}

/// Customize `tree` for `interests` at `level` and return the added ids.
pub fn customize(tree: &mut Roadmap, interests: &[String], level: KnowledgeLevel) -> Vec<String> {
    let before = tree.id_set();

    if interests::wants_agentic_ai(interests) {
        if let Err(e) = ensure_agentic_branch(tree, level) {
            tracing::warn!("Could not add agentic AI branch: {}", e);
        }
    }

    if interests::wants_ai(interests) {
        mark_ai_nodes(tree, level);
        extend_agent_nodes(tree, level);
    }

    let note = level_note(level);
    let root = tree.root_mut();
    if !root.content.contains(note) {
        if root.content.is_empty() {
            root.content = note.to_string();
        } else {
            root.content = format!("{} - {}", root.content, note);
        }
    }

    tree.ids_added_since(&before)
}

fn ensure_agentic_branch(
    tree: &mut Roadmap,
    level: KnowledgeLevel,
) -> Result<(), super::TreeError> {
    let root_id = tree.root().id.clone();

    let category_id = match tree.find_child_by_title(&root_id, AI_ENGINEERING) {
        Some(node) => node.id.clone(),
        None => tree.add_child(
            &root_id,
            RoadmapNode::new(short_id("ai_engineering"), AI_ENGINEERING, NodeType::Category)
                .with_content("Artificial intelligence and ML engineering paths"),
        )?,
    };

    let topic_id = match tree.find_child_by_title(&category_id, AGENTIC_AI) {
        Some(node) => node.id.clone(),
        None => tree.add_child(
            &category_id,
            RoadmapNode::new(short_id("agentic_ai"), AGENTIC_AI, NodeType::Topic)
                .with_content("Developing autonomous AI agents")
                .with_highlight(),
        )?,
    };

    for template in agentic_templates(level) {
        if tree.find_child_by_title(&topic_id, template.title).is_none() {
            tree.add_child(&topic_id, template.to_node())?;
        }
    }
    Ok(())
}

fn is_ai_title(title: &str) -> bool {
    let lower = title.to_lowercase();
    lower.contains("agent")
        || Mentions::new(title).any(&["ai", "artificial intelligence", "machine learning", "ml"])
}

fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    needles.iter().any(|n| haystack.contains(n))
}

fn mark_ai_nodes(tree: &mut Roadmap, level: KnowledgeLevel) {
    tree.for_each_mut(|node| {
        if !is_ai_title(&node.title) {
            return;
        }
        let title = node.title.to_lowercase();
        match level {
            KnowledgeLevel::Beginner => {
                if contains_any(&title, &["introduction", "fundamental", "basic"]) {
                    node.highlight = true;
                    node.priority = Some(Priority::High);
                }
            }
            KnowledgeLevel::Intermediate => {
                if contains_any(&title, &["framework", "implement", "develop", "tool"]) {
                    node.highlight = true;
                    node.priority = Some(Priority::High);
                }
                if contains_any(&title, &["introduction", "basic"]) {
                    node.priority = Some(Priority::Low);
                }
            }
            KnowledgeLevel::Advanced => {
                if contains_any(&title, &["advanced", "research", "cutting-edge", "system"]) {
                    node.highlight = true;
                    node.priority = Some(Priority::High);
                }
                if contains_any(&title, &["introduction", "basic", "fundamental"]) {
                    node.collapsed = true;
                    node.priority = Some(Priority::Low);
                }
            }
        }
    });
}

fn is_template_title(title: &str) -> bool {
    [AGENTIC_BEGINNER, AGENTIC_INTERMEDIATE, AGENTIC_ADVANCED]
        .iter()
        .flat_map(|set| set.iter())
        .any(|t| t.title.eq_ignore_ascii_case(title))
}

fn extend_agent_nodes(tree: &mut Roadmap, level: KnowledgeLevel) {
    // Template topics mention agents too; they never receive templates.
    let targets: Vec<String> = tree
        .ids()
        .into_iter()
        .filter(|id| {
            tree.find(id).is_some_and(|n| {
                n.title.to_lowercase().contains("agent") && !is_template_title(&n.title)
            })
        })
        .collect();

    for parent_id in targets {
        for template in agentic_templates(level) {
            let exists = tree.find(&parent_id).is_some_and(|parent| {
                let wanted = template.title.to_lowercase();
                parent
                    .children
                    .iter()
                    .any(|c| c.title.to_lowercase().contains(&wanted))
            });
            if exists {
                continue;
            }
            let mut node = template.to_node();
            node.highlight = true;
            if let Err(e) = tree.add_child(&parent_id, node) {
                tracing::warn!("Skipping template {} under {}: {}", template.title, parent_id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Roadmap {
        Roadmap::root_only("root", "Technology Careers")
    }

    fn titles_under<'a>(tree: &'a Roadmap, id: &str) -> Vec<&'a str> {
        tree.find(id)
            .unwrap()
            .children
            .iter()
            .map(|c| c.title.as_str())
            .collect()
    }

    #[test]
    fn agentic_interest_builds_branch_for_level() {
        let mut tree = base();
        let added = customize(&mut tree, &["agentic ai".into()], KnowledgeLevel::Intermediate);

        let category = tree.find_child_by_title("root", AI_ENGINEERING).unwrap();
        let topic = &category.children[0];
        assert_eq!(topic.title, AGENTIC_AI);
        assert_eq!(topic.children.len(), AGENTIC_INTERMEDIATE.len());
        assert_eq!(added.len(), 2 + AGENTIC_INTERMEDIATE.len());
        assert!(tree.validate().is_ok());
    }

    #[test]
    fn repeated_customization_adds_nothing() {
        let mut tree = base();
        let interests = vec!["agentic ai".to_string()];
        customize(&mut tree, &interests, KnowledgeLevel::Beginner);
        let len = tree.len();

        let added = customize(&mut tree, &interests, KnowledgeLevel::Beginner);

        assert!(added.is_empty());
        assert_eq!(tree.len(), len);
    }

    #[test]
    fn advanced_level_collapses_basics() {
        let mut tree = base();
        tree.add_child(
            "root",
            RoadmapNode::new("ai_intro", "Introduction to AI", NodeType::Topic),
        )
        .unwrap();
        tree.add_child(
            "root",
            RoadmapNode::new("ai_research", "AI Research", NodeType::Topic),
        )
        .unwrap();

        customize(&mut tree, &["artificial intelligence".into()], KnowledgeLevel::Advanced);

        let intro = tree.find("ai_intro").unwrap();
        assert!(intro.collapsed);
        assert_eq!(intro.priority, Some(Priority::Low));
        let research = tree.find("ai_research").unwrap();
        assert!(research.highlight);
        assert_eq!(research.priority, Some(Priority::High));
    }

    #[test]
    fn agent_nodes_get_templates_once() {
        let mut tree = base();
        tree.add_child("root", RoadmapNode::new("ai_agents", "AI Agents", NodeType::Topic))
            .unwrap();

        customize(&mut tree, &["ai".into()], KnowledgeLevel::Advanced);
        customize(&mut tree, &["ai".into()], KnowledgeLevel::Advanced);

        let titles = titles_under(&tree, "ai_agents");
        assert_eq!(titles.len(), AGENTIC_ADVANCED.len());
        assert!(titles.contains(&"Multi-Agent Systems"));
    }

    #[test]
    fn unrelated_interests_only_touch_root_note() {
        let mut tree = base();
        let added = customize(&mut tree, &["blockchain".into()], KnowledgeLevel::Beginner);
        assert!(added.is_empty());
        assert_eq!(tree.root().content, level_note(KnowledgeLevel::Beginner));
    }
}
