//! Session-level operations behind the HTTP API.

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::mpsc;

use crate::catalog::SeedCatalog;
use crate::interests;
use crate::models::{
    ChatEvent, ChatReply, GrowInput, GrowReply, KnowledgeLevel, Roadmap, Session,
};
use crate::relay::{self, ChatRelay};
use crate::roadmap::{self, knowledge, render_outline, RoadmapUpdate, UpdatePolicy};
use crate::store::SessionStore;

pub const DEFAULT_USER: &str = "default_user";

/// Chat and roadmap operations for one user id at a time.
///
/// Cheap to clone; all parts are shared.
#[derive(Clone)]
pub struct Advisor {
    store: Arc<dyn SessionStore>,
    relay: Arc<ChatRelay>,
    policy: Arc<dyn UpdatePolicy>,
    catalog: Option<Arc<SeedCatalog>>,
}

impl Advisor {
    pub fn new(
        store: Arc<dyn SessionStore>,
        relay: ChatRelay,
        policy: Arc<dyn UpdatePolicy>,
    ) -> Self {
        Self {
            store,
            relay: Arc::new(relay),
            policy,
            catalog: None,
        }
    }

    pub fn with_catalog(mut self, catalog: SeedCatalog) -> Self {
        self.catalog = Some(Arc::new(catalog));
        self
    }

    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn is_configured(&self) -> bool {
        self.relay.is_configured()
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Load the session for `user_id`, creating and saving it on first use.
    pub fn session(&self, user_id: &str) -> Result<Session> {
        if let Some(session) = self.store.load(user_id)? {
            return Ok(session);
        }
        tracing::info!("Starting session {}", user_id);
        let session = Session::new(user_id, relay::SYSTEM_PROMPT, roadmap::default_roadmap());
        self.store.save(&session)?;
        Ok(session)
    }

    pub fn roadmap(&self, user_id: &str) -> Result<Roadmap> {
        Ok(self.session(user_id)?.roadmap)
    }

    /// Record interests, get the assistant's reply and grow the roadmap.
    pub async fn chat(&self, user_id: &str, message: &str) -> Result<ChatReply> {
        let mut session = self.session(user_id)?;
        let context = prepare(&mut session, message);

        let response = self
            .relay
            .reply(&mut session.history, message, context)
            .await;
        let new_nodes = self.grow_from_message(&mut session, message).await;

        self.finish(&mut session, &new_nodes)?;
        Ok(ChatReply {
            response,
            roadmap: session.roadmap,
            new_nodes,
        })
    }

    /// Streaming form of [`Advisor::chat`].
    ///
    /// Emits the reply as [`ChatEvent::Token`]s and then one
    /// [`ChatEvent::Roadmap`]. The session is saved before the final event.
    pub async fn chat_stream(
        &self,
        user_id: &str,
        message: &str,
    ) -> Result<mpsc::Receiver<ChatEvent>> {
        let mut session = self.session(user_id)?;
        let (tx, rx) = mpsc::channel(64);
        let advisor = self.clone();
        let message = message.to_string();

        tokio::spawn(async move {
            let context = prepare(&mut session, &message);
            let response = advisor
                .relay
                .reply_streaming(&mut session.history, &message, context, &tx)
                .await;
            let new_nodes = advisor.grow_from_message(&mut session, &message).await;

            if let Err(e) = advisor.finish(&mut session, &new_nodes) {
                tracing::error!("Failed to save session {}: {:#}", session.id, e);
            }
            let _ = tx
                .send(ChatEvent::Roadmap(ChatReply {
                    response,
                    roadmap: session.roadmap,
                    new_nodes,
                }))
                .await;
        });

        Ok(rx)
    }

    /// Grow the roadmap from seed roadmaps and tailor it to a knowledge level.
    pub async fn grow(&self, user_id: &str, input: GrowInput) -> Result<GrowReply> {
        let mut session = self.session(user_id)?;
        let before = session.roadmap.id_set();

        let interests = match input.interests {
            Some(given) => {
                session.note_interests(given.iter().cloned());
                given
            }
            None => session.interests.clone(),
        };
        let level = input
            .level
            .as_deref()
            .map(KnowledgeLevel::from_str_or_default)
            .or(session.knowledge_level)
            .unwrap_or_default();
        session.knowledge_level = Some(level);

        if let Some(catalog) = &self.catalog {
            catalog.grow(&mut session.roadmap, &interests).await;
        }
        knowledge::customize(&mut session.roadmap, &interests, level);

        let new_nodes = session.roadmap.ids_added_since(&before);
        self.finish(&mut session, &new_nodes)?;
        Ok(GrowReply {
            roadmap: session.roadmap,
            new_nodes,
            level,
        })
    }

    async fn grow_from_message(&self, session: &mut Session, message: &str) -> Vec<String> {
        let RoadmapUpdate { roadmap, new_nodes } = self.policy.update(&session.roadmap, message).await;

        // Policies promise never to drop nodes; hold them to it.
        if !roadmap.is_superset_of(&session.roadmap) {
            tracing::warn!(
                "Policy {} dropped existing nodes, keeping previous roadmap",
                self.policy.name()
            );
            return Vec::new();
        }
        if let Err(e) = roadmap.validate() {
            tracing::warn!("Policy {} produced an invalid roadmap: {}", self.policy.name(), e);
            return Vec::new();
        }

        session.roadmap = roadmap;
        new_nodes
    }

    fn finish(&self, session: &mut Session, new_nodes: &[String]) -> Result<()> {
        session.touch();
        self.store.save(session)?;
        if !new_nodes.is_empty() {
            tracing::debug!(
                "Roadmap for {} grew by {}:\n{}",
                session.id,
                new_nodes.join(", "),
                render_outline(&session.roadmap)
            );
        }
        Ok(())
    }
}

/// Note interests from `message` and build the context line for the model.
fn prepare(session: &mut Session, message: &str) -> Option<String> {
    session.note_interests(interests::extract(message));
    relay::context_line(&session.interests, session.knowledge_level)
}
