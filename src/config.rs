//! Runtime configuration, from command-line flags with environment fallbacks.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Args, ValueEnum};

use crate::advisor::Advisor;
use crate::catalog::{SeedCatalog, ROADMAP_SOURCE_URL};
use crate::llm::{
    CompletionClient, CompletionSettings, GroqClient, DEFAULT_MAX_TOKENS, DEFAULT_MODEL,
    DEFAULT_TEMPERATURE, GROQ_API_URL, PROPOSAL_MAX_TOKENS, PROPOSAL_TEMPERATURE,
};
use crate::relay::ChatRelay;
use crate::roadmap::{KeywordPolicy, ModelPolicy, UpdatePolicy};
use crate::store::{MemoryStore, SessionStore, SqliteStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyKind {
    /// Model policy when an API key is set, keyword policy otherwise
    Auto,
    Keyword,
    Model,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Args)]
pub struct Config {
    /// Groq API key; chat replies a setup notice without it
    #[arg(long, env = "GROQ_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the OpenAI-compatible completion API
    #[arg(long, env = "CAREERPATH_API_URL", default_value = GROQ_API_URL)]
    pub api_url: String,

    #[arg(long, env = "CAREERPATH_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Sampling temperature for chat replies
    #[arg(long, env = "CAREERPATH_TEMPERATURE", default_value_t = DEFAULT_TEMPERATURE)]
    pub temperature: f32,

    /// Token limit for chat replies
    #[arg(long, env = "CAREERPATH_MAX_TOKENS", default_value_t = DEFAULT_MAX_TOKENS)]
    pub max_tokens: u32,

    /// Sampling temperature for model roadmap proposals
    #[arg(long, env = "CAREERPATH_POLICY_TEMPERATURE", default_value_t = PROPOSAL_TEMPERATURE)]
    pub policy_temperature: f32,

    /// Token limit for model roadmap proposals
    #[arg(long, env = "CAREERPATH_POLICY_MAX_TOKENS", default_value_t = PROPOSAL_MAX_TOKENS)]
    pub policy_max_tokens: u32,

    /// How chat messages grow the roadmap
    #[arg(long, env = "CAREERPATH_POLICY", value_enum, default_value = "auto")]
    pub policy: PolicyKind,

    /// Where sessions are kept
    #[arg(long, env = "CAREERPATH_STORE", value_enum, default_value = "memory")]
    pub store: StoreKind,

    /// SQLite file for the sqlite store (default: platform data dir)
    #[arg(long, env = "CAREERPATH_DB")]
    pub db: Option<PathBuf>,

    /// Seed roadmap cache directory (default: platform cache dir)
    #[arg(long, env = "CAREERPATH_CACHE_DIR")]
    pub cache_dir: Option<PathBuf>,

    /// Source of seed roadmap definitions
    #[arg(long, env = "CAREERPATH_SEED_URL", default_value = ROADMAP_SOURCE_URL)]
    pub seed_url: String,

    /// Fetch common seed roadmaps into the cache at startup
    #[arg(long)]
    pub warm_cache: bool,
}

impl Config {
    pub fn settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.model.clone(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }

    /// Settings for the model policy. Same model, its own sampling limits.
    pub fn policy_settings(&self) -> CompletionSettings {
        CompletionSettings {
            model: self.model.clone(),
            temperature: self.policy_temperature,
            max_tokens: self.policy_max_tokens,
        }
    }

    fn client(&self) -> Option<Arc<dyn CompletionClient>> {
        let key = self.api_key.as_deref().map(str::trim).filter(|k| !k.is_empty())?;
        Some(Arc::new(GroqClient::with_base_url(key, &self.api_url)))
    }

    pub fn open_store(&self) -> Result<Arc<dyn SessionStore>> {
        match self.store {
            StoreKind::Memory => Ok(Arc::new(MemoryStore::new())),
            StoreKind::Sqlite => {
                let path = match &self.db {
                    Some(path) => path.clone(),
                    None => SqliteStore::default_path()?,
                };
                tracing::info!("Using session database {}", path.display());
                let store = SqliteStore::open(&path)?;
                store.migrate()?;
                Ok(Arc::new(store))
            }
        }
    }

    pub fn catalog(&self) -> Option<SeedCatalog> {
        let dir = self.cache_dir.clone().or_else(SeedCatalog::default_cache_dir)?;
        Some(SeedCatalog::with_base_url(dir, &self.seed_url))
    }

    pub fn build_policy(&self, client: Option<&Arc<dyn CompletionClient>>) -> Arc<dyn UpdatePolicy> {
        match (self.policy, client) {
            (PolicyKind::Keyword, _) | (PolicyKind::Auto, None) => Arc::new(KeywordPolicy::new()),
            (PolicyKind::Model, Some(client)) | (PolicyKind::Auto, Some(client)) => {
                Arc::new(ModelPolicy::new(client.clone(), self.policy_settings()))
            }
            (PolicyKind::Model, None) => {
                tracing::warn!("Model policy needs an API key, falling back to keyword policy");
                Arc::new(KeywordPolicy::new())
            }
        }
    }

    /// Wire up the advisor described by this configuration.
    pub fn build_advisor(&self) -> Result<Advisor> {
        let client = self.client();
        if client.is_none() {
            tracing::warn!("GROQ_API_KEY is not set; chat will reply with a setup notice");
        }

        let policy = self.build_policy(client.as_ref());
        tracing::info!("Roadmap policy: {}", policy.name());

        let relay = ChatRelay::new(client, self.settings());
        let mut advisor = Advisor::new(self.open_store()?, relay, policy);
        match self.catalog() {
            Some(catalog) => advisor = advisor.with_catalog(catalog),
            None => tracing::warn!("No cache directory available, seed roadmaps disabled"),
        }
        Ok(advisor)
    }
}
