//! Keyword matching over chat text.
//!
//! Matching is on whole words so that short keywords like "ai" or "ml" do not
//! fire inside "maintain" or "html". Multi-word keywords match as a phrase.

/// Lower-cased word sequence of a message, ready for keyword lookups.
#[derive(Debug, Clone)]
pub struct Mentions {
    words: Vec<String>,
}

impl Mentions {
    pub fn new(text: &str) -> Self {
        Self {
            words: tokenize(text),
        }
    }

    /// True if `keyword` occurs as a whole word or word sequence.
    pub fn has(&self, keyword: &str) -> bool {
        let needle = tokenize(keyword);
        if needle.is_empty() || needle.len() > self.words.len() {
            return false;
        }
        self.words
            .windows(needle.len())
            .any(|window| window == needle.as_slice())
    }

    pub fn any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.has(k))
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

/// Interest label and the keywords that signal it.
const INTERESTS: &[(&str, &[&str])] = &[
    (
        "artificial intelligence",
        &[
            "ai",
            "artificial intelligence",
            "machine learning",
            "ml",
            "deep learning",
            "neural network",
            "neural networks",
            "llm",
            "llms",
        ],
    ),
    (
        "agentic ai",
        &["agentic", "ai agent", "ai agents", "autonomous agents"],
    ),
    (
        "web development",
        &[
            "web",
            "frontend",
            "front end",
            "backend",
            "back end",
            "full stack",
            "fullstack",
            "javascript",
            "react",
        ],
    ),
    (
        "data science",
        &["data science", "data", "analytics", "statistics", "visualization"],
    ),
    (
        "cloud computing",
        &["cloud", "aws", "azure", "gcp", "devops", "kubernetes", "docker"],
    ),
    ("mobile development", &["mobile", "android", "ios", "flutter"]),
    ("cybersecurity", &["security", "cybersecurity", "hacking"]),
    (
        "blockchain",
        &["blockchain", "crypto", "web3", "smart contract", "smart contracts"],
    ),
    ("python", &["python", "django", "fastapi"]),
    (
        "software architecture",
        &["software architecture", "system design", "architect"],
    ),
];

/// Interests mentioned in `text`, in table order, without duplicates.
pub fn extract(text: &str) -> Vec<String> {
    let mentions = Mentions::new(text);
    INTERESTS
        .iter()
        .filter(|(_, keywords)| mentions.any(keywords))
        .map(|(label, _)| label.to_string())
        .collect()
}

/// True if any interest names agentic AI.
pub fn wants_agentic_ai(interests: &[String]) -> bool {
    interests.iter().any(|i| {
        let m = Mentions::new(i);
        m.has("agentic") || m.has("ai agents") || m.has("ai agent")
    })
}

/// True if any interest names AI or machine learning in general.
pub fn wants_ai(interests: &[String]) -> bool {
    interests.iter().any(|i| {
        Mentions::new(i).any(&[
            "ai",
            "artificial intelligence",
            "machine learning",
            "ml",
        ])
    })
}
