//! Rule-table roadmap growth.
//!
//! Each [`Branch`] is a category under the root with optional topics. A branch
//! fires when the message mentions one of its keywords or one of its topics'
//! keywords; a topic fires on its own keywords. Existing nodes are matched by
//! id or (case-insensitive) title, so applying the same message twice adds
//! nothing the second time.

use async_trait::async_trait;

use super::{RoadmapUpdate, UpdatePolicy};
use crate::interests::Mentions;
use crate::models::{NodeType, Roadmap, RoadmapNode};

struct Topic {
    id: &'static str,
    title: &'static str,
    content: &'static str,
    resources: &'static [&'static str],
    keywords: &'static [&'static str],
}

struct Branch {
    id: &'static str,
    title: &'static str,
    content: &'static str,
    resources: &'static [&'static str],
    keywords: &'static [&'static str],
    topics: &'static [Topic],
}

const BRANCHES: &[Branch] = &[
    Branch {
        id: "ai",
        title: "AI & Machine Learning",
        content: "Systems that learn from data, find patterns and make decisions with little human intervention.",
        resources: &["Coursera Machine Learning", "Fast.ai", "DeepLearning.AI"],
        keywords: &[
            "ai",
            "artificial intelligence",
            "machine learning",
            "ml",
            "deep learning",
        ],
        topics: &[
            Topic {
                id: "ai_nlp",
                title: "Natural Language Processing",
                content: "Teaching machines to read, understand and generate human language.",
                resources: &["Hugging Face NLP Course", "Speech and Language Processing"],
                keywords: &["nlp", "natural language", "language model", "language models", "llm", "llms"],
            },
            Topic {
                id: "ai_vision",
                title: "Computer Vision",
                content: "Extracting information from images and video.",
                resources: &["CS231n", "OpenCV Tutorials"],
                keywords: &["computer vision", "vision", "image", "images"],
            },
            Topic {
                id: "ai_rl",
                title: "Reinforcement Learning",
                content: "Agents that learn by trial and error from rewards.",
                resources: &["Sutton & Barto", "Spinning Up in Deep RL"],
                keywords: &["reinforcement learning", "reinforcement"],
            },
            Topic {
                id: "ai_robotics",
                title: "Robotics AI",
                content: "Perception, planning and control for physical robots.",
                resources: &["Modern Robotics", "ROS Tutorials"],
                keywords: &["robot", "robots", "robotics"],
            },
            Topic {
                id: "ai_agents",
                title: "AI Agents",
                content: "Autonomous systems that plan, use tools and act toward a goal.",
                resources: &["LangChain Documentation", "Prompt Engineering Guide"],
                keywords: &["agent", "agents", "agentic"],
            },
        ],
    },
    Branch {
        id: "web",
        title: "Web Development",
        content: "Building websites and web applications, from the browser to the server.",
        resources: &["MDN Web Docs", "The Odin Project", "freeCodeCamp"],
        keywords: &["web", "website", "websites", "javascript"],
        topics: &[
            Topic {
                id: "web_frontend",
                title: "Frontend Development",
                content: "The user interface and experience of a website or application.",
                resources: &["MDN Web Docs", "Frontend Masters", "CSS-Tricks"],
                keywords: &["frontend", "front end", "react", "css", "html"],
            },
            Topic {
                id: "web_backend",
                title: "Backend Development",
                content: "Server-side logic, databases and application architecture.",
                resources: &["Node.js Documentation", "Django Documentation", "SQL Tutorial"],
                keywords: &["backend", "back end", "server side", "api", "apis", "node.js"],
            },
            Topic {
                id: "web_fullstack",
                title: "Full Stack Development",
                content: "Owning a feature from the database to the browser.",
                resources: &["Full Stack Open", "The Odin Project"],
                keywords: &["full stack", "fullstack"],
            },
        ],
    },
    Branch {
        id: "data",
        title: "Data Science",
        content: "Programming, statistics and domain knowledge combined to extract insight from data.",
        resources: &["Kaggle", "DataCamp", "R for Data Science"],
        keywords: &["data", "data science", "statistics"],
        topics: &[
            Topic {
                id: "data_analysis",
                title: "Data Analysis",
                content: "Inspecting, cleaning and modeling data to support decisions.",
                resources: &["Python for Data Analysis", "SQL for Data Analysis"],
                keywords: &["analysis", "analytics", "analyst", "sql"],
            },
            Topic {
                id: "data_viz",
                title: "Data Visualization",
                content: "Presenting data so that patterns are easy to see.",
                resources: &["Storytelling with Data", "D3.js Documentation"],
                keywords: &["visualization", "visualisation", "dashboards", "tableau"],
            },
            Topic {
                id: "data_engineering",
                title: "Data Engineering",
                content: "Pipelines and storage that move data reliably at scale.",
                resources: &["Fundamentals of Data Engineering", "Apache Airflow Documentation"],
                keywords: &["data engineering", "pipelines", "etl"],
            },
        ],
    },
    Branch {
        id: "cloud",
        title: "Cloud Computing",
        content: "Running and operating software on managed infrastructure.",
        resources: &["AWS Skill Builder", "Microsoft Learn", "Google Cloud Skills Boost"],
        keywords: &["cloud", "infrastructure"],
        topics: &[
            Topic {
                id: "cloud_devops",
                title: "DevOps",
                content: "Automating build, deployment and operations.",
                resources: &["The Phoenix Project", "Kubernetes Documentation"],
                keywords: &["devops", "deployment", "kubernetes", "docker", "ci"],
            },
            Topic {
                id: "cloud_platforms",
                title: "Cloud Platforms",
                content: "The major public clouds and their core services.",
                resources: &["AWS Documentation", "Azure Documentation", "Google Cloud Documentation"],
                keywords: &["aws", "azure", "gcp"],
            },
        ],
    },
    Branch {
        id: "software",
        title: "Software Development",
        content: "Designing, programming, testing and maintaining software.",
        resources: &["freeCodeCamp", "The Odin Project", "MIT OpenCourseWare"],
        keywords: &["programming", "coding", "developer", "software"],
        topics: &[],
    },
    Branch {
        id: "mobile",
        title: "Mobile Development",
        content: "Apps for phones and tablets.",
        resources: &["Android Developers", "Apple Developer Documentation"],
        keywords: &["mobile", "app", "apps"],
        topics: &[
            Topic {
                id: "mobile_android",
                title: "Android Development",
                content: "Native Android apps with Kotlin.",
                resources: &["Android Basics with Compose"],
                keywords: &["android", "kotlin"],
            },
            Topic {
                id: "mobile_ios",
                title: "iOS Development",
                content: "Native iOS apps with Swift.",
                resources: &["Hacking with Swift"],
                keywords: &["ios", "swift", "swiftui"],
            },
            Topic {
                id: "mobile_cross_platform",
                title: "Cross-Platform Development",
                content: "One codebase for several mobile platforms.",
                resources: &["Flutter Documentation", "React Native Documentation"],
                keywords: &["flutter", "react native"],
            },
        ],
    },
    Branch {
        id: "security",
        title: "Cybersecurity",
        content: "Protecting systems, networks and data from attack.",
        resources: &["TryHackMe", "OWASP"],
        keywords: &["security", "cybersecurity"],
        topics: &[Topic {
            id: "security_pentest",
            title: "Penetration Testing",
            content: "Finding vulnerabilities by attacking systems with permission.",
            resources: &["Hack The Box", "The Web Application Hacker's Handbook"],
            keywords: &["penetration", "pentesting", "hacking", "ethical hacking"],
        }],
    },
    Branch {
        id: "blockchain",
        title: "Blockchain",
        content: "Distributed ledgers and the applications built on them.",
        resources: &["Ethereum Documentation", "CryptoZombies"],
        keywords: &["blockchain", "crypto", "web3"],
        topics: &[Topic {
            id: "blockchain_contracts",
            title: "Smart Contracts",
            content: "Programs that run on a blockchain.",
            resources: &["Solidity Documentation"],
            keywords: &["smart contract", "smart contracts", "solidity"],
        }],
    },
];

/// Grows the tree from a fixed keyword table. Needs no network access.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordPolicy;

impl KeywordPolicy {
    pub fn new() -> Self {
        Self
    }

    /// Apply the rule table to `tree` in place and return the added ids.
    pub fn apply(&self, tree: &mut Roadmap, text: &str) -> Vec<String> {
        let mentions = Mentions::new(text);
        if mentions.is_empty() {
            return Vec::new();
        }

        let before = tree.id_set();
        for branch in BRANCHES {
            let topics: Vec<&Topic> = branch
                .topics
                .iter()
                .filter(|t| mentions.any(t.keywords))
                .collect();
            if topics.is_empty() && !mentions.any(branch.keywords) {
                continue;
            }

            let branch_id = match ensure_branch(tree, branch) {
                Ok(id) => id,
                Err(e) => {
                    tracing::warn!("Could not add branch {}: {}", branch.id, e);
                    continue;
                }
            };

            for topic in topics {
                if let Err(e) = ensure_topic(tree, &branch_id, topic) {
                    tracing::warn!("Could not add topic {}: {}", topic.id, e);
                }
            }
        }
        tree.ids_added_since(&before)
    }
}

fn ensure_branch(tree: &mut Roadmap, branch: &Branch) -> Result<String, super::TreeError> {
    if tree.contains(branch.id) {
        return Ok(branch.id.to_string());
    }
    let root_id = tree.root().id.clone();
    if let Some(existing) = tree.find_child_by_title(&root_id, branch.title) {
        return Ok(existing.id.clone());
    }
    let node = RoadmapNode::new(branch.id, branch.title, NodeType::Category)
        .with_content(branch.content)
        .with_resources(branch.resources.iter().copied());
    tree.add_child(&root_id, node)
}

fn ensure_topic(tree: &mut Roadmap, branch_id: &str, topic: &Topic) -> Result<(), super::TreeError> {
    // An id used anywhere in the tree counts as present.
    if tree.contains(topic.id) || tree.find_child_by_title(branch_id, topic.title).is_some() {
        return Ok(());
    }
    let node = RoadmapNode::new(topic.id, topic.title, NodeType::Topic)
        .with_content(topic.content)
        .with_resources(topic.resources.iter().copied());
    tree.add_child(branch_id, node).map(|_| ())
}

#[async_trait]
impl UpdatePolicy for KeywordPolicy {
    fn name(&self) -> &'static str {
        "keyword"
    }

    async fn update(&self, current: &Roadmap, text: &str) -> RoadmapUpdate {
        let mut roadmap = current.clone();
        let new_nodes = self.apply(&mut roadmap, text);
        RoadmapUpdate { roadmap, new_nodes }
    }
}
