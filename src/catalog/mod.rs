//! Public seed roadmaps from the developer-roadmap project.
//!
//! Roadmap definitions are node/edge graphs drawn for roadmap.sh. They are
//! fetched once, cached on disk, turned into a [`Roadmap`] by [`convert`] and
//! grafted into a user's tree as a trimmed category by [`SeedCatalog::grow`].

mod convert;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use reqwest::Client;
use thiserror::Error;

pub use convert::{convert, title_for, RawRoadmap};

use crate::interests::Mentions;
use crate::models::{NodeType, Roadmap, RoadmapNode};
use crate::roadmap::TreeError;

pub const ROADMAP_SOURCE_URL: &str =
    "https://raw.githubusercontent.com/kamranahmedse/developer-roadmap/master/src/data/roadmaps";

/// Roadmaps offered to clients.
pub const AVAILABLE: &[&str] = &[
    "ai-agents",
    "ai-engineer",
    "frontend",
    "backend",
    "devops",
    "python",
    "javascript",
    "react",
    "android",
    "software-architect",
];

/// Roadmaps fetched at startup when cache warming is on.
pub const WARM_SET: &[&str] = &["ai-agents", "frontend", "backend", "python"];

/// How many matched roadmaps one grow call grafts.
const MAX_GRAFTS: usize = 3;
/// Levels kept below the grafted category.
const MAX_DEPTH: usize = 2;
/// Children kept per node.
const MAX_CHILDREN: usize = 5;

/// Interest aliases and the roadmaps they select.
const INTEREST_ROADMAPS: &[(&[&str], &[&str])] = &[
    (
        &["ai", "artificial intelligence", "machine learning", "agentic ai"],
        &["ai-agents", "ai-engineer", "prompt-engineering"],
    ),
    (
        &["web development", "web", "frontend", "backend"],
        &["frontend", "backend", "javascript", "react", "nodejs"],
    ),
    (
        &["mobile", "mobile development", "android", "ios"],
        &["android", "flutter", "react-native"],
    ),
    (
        &["devops", "cloud", "cloud computing"],
        &["devops", "kubernetes", "docker"],
    ),
    (&["python"], &["python", "django", "fastapi"]),
    (
        &["data science", "data"],
        &["data-science", "machine-learning"],
    ),
    (
        &["software architecture", "architecture", "system design"],
        &["software-architect", "system-design"],
    ),
];

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Invalid roadmap name: {0}")]
    InvalidName(String),

    #[error("Failed to fetch roadmap {name}: {source}")]
    Http {
        name: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Cache I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Roadmap definition is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Roadmap definition does not form a tree: {0}")]
    Tree(#[from] TreeError),
}

/// Roadmap names selected by `interests`, deduplicated, in table order per
/// interest.
pub fn match_interests(interests: &[String]) -> Vec<&'static str> {
    let mut matched: Vec<&'static str> = Vec::new();
    for interest in interests {
        let mentions = Mentions::new(interest);
        for (aliases, roadmaps) in INTEREST_ROADMAPS {
            if !mentions.any(aliases) {
                continue;
            }
            for &name in roadmaps.iter() {
                if !matched.contains(&name) {
                    matched.push(name);
                }
            }
        }
    }
    matched
}

fn check_name(name: &str) -> Result<(), SeedError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SeedError::InvalidName(name.to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct SeedCatalog {
    client: Client,
    base_url: String,
    cache_dir: PathBuf,
}

impl SeedCatalog {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self::with_base_url(cache_dir, ROADMAP_SOURCE_URL)
    }

    pub fn with_base_url(cache_dir: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache_dir: cache_dir.into(),
        }
    }

    /// `roadmaps/` under the platform cache directory.
    pub fn default_cache_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "careerpath")
            .map(|dirs| dirs.cache_dir().join("roadmaps"))
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn available() -> &'static [&'static str] {
        AVAILABLE
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    /// The raw definition of `name`, from the cache or else the network.
    pub async fn fetch(&self, name: &str) -> Result<RawRoadmap, SeedError> {
        check_name(name)?;
        let path = self.cache_path(name);

        match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice(&bytes) {
                Ok(raw) => return Ok(raw),
                Err(e) => tracing::warn!("Ignoring corrupt cache file {}: {}", path.display(), e),
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let url = format!("{}/{}/{}.json", self.base_url, name, name);
        tracing::debug!("Fetching seed roadmap {}", url);
        let http = |source| SeedError::Http {
            name: name.to_string(),
            source,
        };
        let bytes = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(http)?
            .bytes()
            .await
            .map_err(http)?;

        let raw: RawRoadmap = serde_json::from_slice(&bytes)?;
        tokio::fs::create_dir_all(&self.cache_dir).await?;
        tokio::fs::write(&path, &bytes).await?;
        Ok(raw)
    }

    /// Fetch and convert `name`.
    pub async fn load(&self, name: &str) -> Result<Roadmap, SeedError> {
        let raw = self.fetch(name).await?;
        convert(name, &raw)
    }

    /// Fetch `names` into the cache, logging failures.
    pub async fn warm(&self, names: &[&str]) {
        for name in names {
            match self.fetch(name).await {
                Ok(_) => tracing::info!("Cached seed roadmap {}", name),
                Err(e) => tracing::warn!("Could not cache seed roadmap {}: {}", name, e),
            }
        }
    }

    /// Graft the seed roadmaps matching `interests` into `tree`.
    ///
    /// Each becomes a category under the root, skipped if the root already
    /// has a child with that title. Returns the added ids.
    pub async fn grow(&self, tree: &mut Roadmap, interests: &[String]) -> Vec<String> {
        let before = tree.id_set();
        let root_id = tree.root().id.clone();

        for name in match_interests(interests).into_iter().take(MAX_GRAFTS) {
            let title = title_for(name);
            if tree.find_child_by_title(&root_id, &title).is_some() {
                continue;
            }

            let seed = match self.load(name).await {
                Ok(seed) => seed,
                Err(e) => {
                    tracing::warn!("Skipping seed roadmap {}: {}", name, e);
                    continue;
                }
            };

            let mut category = RoadmapNode::new(format!("{}:category", name), &title, NodeType::Category)
                .with_content(format!("Learning path for {}", title));
            category.children = seed
                .into_root()
                .children
                .into_iter()
                .take(MAX_CHILDREN)
                .map(|child| trimmed(child, 0))
                .collect();

            if let Err(e) = tree.add_child(&root_id, category) {
                tracing::warn!("Could not graft seed roadmap {}: {}", name, e);
            }
        }

        tree.ids_added_since(&before)
    }
}

fn trimmed(mut node: RoadmapNode, depth: usize) -> RoadmapNode {
    node.children = if depth >= MAX_DEPTH {
        Vec::new()
    } else {
        node.children
            .into_iter()
            .take(MAX_CHILDREN)
            .map(|child| trimmed(child, depth + 1))
            .collect()
    };
    node
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // Nothing listens on the discard port, so network fetches fail fast.
    const OFFLINE: &str = "http://127.0.0.1:9";

    fn frontend_json() -> &'static str {
        r##"{
            "nodes": [
                {"id": "a", "type": "topic", "data": {"label": "Internet"}},
                {"id": "b", "type": "topic", "data": {"label": "HTML", "style": {"backgroundColor": "#2ecc71"}}},
                {"id": "c", "type": "subtopic", "data": {"label": "Forms"}},
                {"id": "d", "type": "subtopic", "data": {"label": "Semantic HTML"}},
                {"id": "e", "type": "subtopic", "data": {"label": "Accessibility"}},
                {"id": "n", "type": "paragraph", "data": {"label": "A note"}}
            ],
            "edges": [
                {"source": "b", "target": "c"},
                {"source": "c", "target": "d"},
                {"source": "d", "target": "e"}
            ]
        }"##
    }

    fn cached_catalog(files: &[(&str, &str)]) -> (TempDir, SeedCatalog) {
        let dir = TempDir::new().unwrap();
        for (name, body) in files {
            std::fs::write(dir.path().join(format!("{}.json", name)), body).unwrap();
        }
        let catalog = SeedCatalog::with_base_url(dir.path(), OFFLINE);
        (dir, catalog)
    }

    #[test]
    fn interests_match_roadmaps_without_duplicates() {
        let matched = match_interests(&["artificial intelligence".into(), "agentic ai".into()]);
        assert_eq!(matched, ["ai-agents", "ai-engineer", "prompt-engineering"]);

        let matched = match_interests(&["web development".into(), "python".into()]);
        assert_eq!(matched[..2], ["frontend", "backend"]);
        assert!(matched.contains(&"python"));

        assert!(match_interests(&["gardening".into()]).is_empty());
    }

    #[test]
    fn names_with_path_characters_are_rejected() {
        assert!(check_name("ai-agents").is_ok());
        assert!(check_name("../etc").is_err());
        assert!(check_name("").is_err());
    }

    #[tokio::test]
    async fn fetch_prefers_cache() {
        let (_dir, catalog) = cached_catalog(&[("frontend", frontend_json())]);
        let raw = catalog.fetch("frontend").await.unwrap();
        assert_eq!(raw.nodes.len(), 6);
    }

    #[tokio::test]
    async fn fetch_failure_is_reported() {
        let (_dir, catalog) = cached_catalog(&[]);
        let err = catalog.fetch("frontend").await.unwrap_err();
        assert!(matches!(err, SeedError::Http { ref name, .. } if name == "frontend"));
    }

    #[tokio::test]
    async fn grow_grafts_trimmed_category_once() {
        let (_dir, catalog) = cached_catalog(&[("frontend", frontend_json())]);
        let mut tree = Roadmap::root_only("root", "Technology Careers");
        let interests = vec!["frontend".to_string()];

        let added = catalog.grow(&mut tree, &interests).await;

        let category = tree.find("frontend:category").unwrap();
        assert_eq!(category.title, "Frontend");
        assert_eq!(added[0], "frontend:category");
        // b -> c -> d kept, e is below the depth limit.
        assert!(tree.contains("frontend:d"));
        assert!(!tree.contains("frontend:e"));
        assert!(tree.validate().is_ok());

        let again = catalog.grow(&mut tree, &interests).await;
        assert!(again.is_empty());
    }

    #[tokio::test]
    async fn grow_skips_roadmaps_that_fail() {
        let (_dir, catalog) = cached_catalog(&[("backend", r#"{"nodes": [], "edges": []}"#)]);
        let mut tree = Roadmap::root_only("root", "Root");

        // "frontend" is not cached and cannot be fetched; "backend" is empty.
        let added = catalog.grow(&mut tree, &["web".to_string()]).await;

        assert_eq!(added, ["backend:category"]);
        assert!(!tree.contains("frontend:category"));
    }
}
