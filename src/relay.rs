//! Chat relay between the session history and the completion API.
//!
//! Every call appends exactly one user turn and one assistant turn to the
//! history, whatever happens upstream: the model's reply, the apology when
//! the API fails, or the not-configured notice when no client is set.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::llm::{CompletionClient, CompletionSettings};
use crate::models::{ChatEvent, ChatMessage, KnowledgeLevel};

pub const SYSTEM_PROMPT: &str = "You are CareerPath.AI, a friendly and knowledgeable career guidance expert. \
Help the user explore technology career paths and build a personalized learning roadmap. \
The user sees the roadmap as an interactive tree next to this chat and it grows as they talk.

- Be warm, concise and specific: name concrete skills, tools and learning steps.
- Gauge the user's experience through natural questions and tailor advice to it.
- Refer to the branches of the roadmap when you suggest what to learn next.
- For AI agents: beginners start with LLM and prompting basics, intermediate users with frameworks, tool use and memory, advanced users with multi-agent systems and reasoning.";

pub const APOLOGY: &str = "I'm sorry, I encountered an error. Please try again.";

pub const NOT_CONFIGURED: &str =
    "The career advisor is not configured: set GROQ_API_KEY on the server to enable chat. \
Your roadmap still grows from what you write.";

/// Transient system line describing what is known about the user.
pub fn context_line(interests: &[String], level: Option<KnowledgeLevel>) -> Option<String> {
    if interests.is_empty() && level.is_none() {
        return None;
    }
    let mut line = format!(
        "Based on our conversation, I've identified these interests: {}",
        if interests.is_empty() {
            "none yet".to_string()
        } else {
            interests.join(", ")
        }
    );
    if let Some(level) = level {
        line.push_str(&format!("\nThe user's knowledge level is {}.", level.as_str()));
    }
    Some(line)
}

pub struct ChatRelay {
    client: Option<Arc<dyn CompletionClient>>,
    settings: CompletionSettings,
}

impl ChatRelay {
    pub fn new(client: Option<Arc<dyn CompletionClient>>, settings: CompletionSettings) -> Self {
        Self { client, settings }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    pub fn settings(&self) -> &CompletionSettings {
        &self.settings
    }

    fn outgoing(history: &[ChatMessage], context: Option<String>) -> Vec<ChatMessage> {
        let mut messages = history.to_vec();
        if let Some(context) = context {
            messages.push(ChatMessage::system(context));
        }
        messages
    }

    /// Send `text` with the history and record both turns.
    pub async fn reply(
        &self,
        history: &mut Vec<ChatMessage>,
        text: &str,
        context: Option<String>,
    ) -> String {
        history.push(ChatMessage::user(text));

        let reply = match &self.client {
            None => NOT_CONFIGURED.to_string(),
            Some(client) => {
                let messages = Self::outgoing(history, context);
                match client.complete(&messages, &self.settings).await {
                    Ok(reply) if !reply.trim().is_empty() => reply,
                    Ok(_) => {
                        tracing::warn!("Completion API returned an empty reply");
                        APOLOGY.to_string()
                    }
                    Err(e) => {
                        tracing::error!("Completion request failed: {}", e);
                        APOLOGY.to_string()
                    }
                }
            }
        };

        history.push(ChatMessage::assistant(reply.clone()));
        reply
    }

    /// Like [`ChatRelay::reply`], forwarding chunks to `events` as they arrive.
    ///
    /// A stream that fails before producing text yields the apology. One that
    /// fails midway keeps the text already sent, since the user has seen it.
    pub async fn reply_streaming(
        &self,
        history: &mut Vec<ChatMessage>,
        text: &str,
        context: Option<String>,
        events: &mpsc::Sender<ChatEvent>,
    ) -> String {
        history.push(ChatMessage::user(text));

        let reply = match &self.client {
            None => NOT_CONFIGURED.to_string(),
            Some(client) => {
                let messages = Self::outgoing(history, context);
                match client.stream(&messages, &self.settings).await {
                    Ok(mut tokens) => {
                        let mut reply = String::new();
                        while let Some(token) = tokens.recv().await {
                            match token {
                                Ok(token) => {
                                    reply.push_str(&token);
                                    // A closed receiver only means the caller left.
                                    let _ = events.send(ChatEvent::Token(token)).await;
                                }
                                Err(e) => {
                                    tracing::error!("Completion stream failed: {}", e);
                                    break;
                                }
                            }
                        }
                        if reply.trim().is_empty() {
                            let _ = events.send(ChatEvent::Token(APOLOGY.to_string())).await;
                            APOLOGY.to_string()
                        } else {
                            reply
                        }
                    }
                    Err(e) => {
                        tracing::error!("Completion request failed: {}", e);
                        let _ = events.send(ChatEvent::Token(APOLOGY.to_string())).await;
                        APOLOGY.to_string()
                    }
                }
            }
        };

        if !self.is_configured() {
            let _ = events.send(ChatEvent::Token(reply.clone())).await;
        }

        history.push(ChatMessage::assistant(reply.clone()));
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedClient;
    use crate::models::Role;

    fn relay(client: ScriptedClient) -> (ChatRelay, Arc<ScriptedClient>) {
        let client = Arc::new(client);
        let shared: Arc<dyn CompletionClient> = client.clone();
        let relay = ChatRelay::new(Some(shared), CompletionSettings::default());
        (relay, client)
    }

    #[tokio::test]
    async fn reply_appends_two_turns() {
        let (relay, _) = relay(ScriptedClient::new(["Try Rust.".to_string()]));
        let mut history = vec![ChatMessage::system(SYSTEM_PROMPT)];

        let reply = relay.reply(&mut history, "What should I learn?", None).await;

        assert_eq!(reply, "Try Rust.");
        assert_eq!(history.len(), 3);
        assert_eq!(history[1], ChatMessage::user("What should I learn?"));
        assert_eq!(history[2], ChatMessage::assistant("Try Rust."));
    }

    #[tokio::test]
    async fn context_is_sent_but_not_stored() {
        let (relay, client) = relay(ScriptedClient::new(["ok".to_string()]));
        let mut history = vec![ChatMessage::system(SYSTEM_PROMPT)];
        let context = context_line(&["web development".into()], None);

        relay.reply(&mut history, "hi", context).await;

        let requests = client.requests();
        let sent = &requests[0];
        assert_eq!(sent.len(), 3);
        assert_eq!(sent[2].role, Role::System);
        assert!(sent[2].content.contains("web development"));
        assert!(history.iter().all(|m| !m.content.contains("identified these interests")));
    }

    #[tokio::test]
    async fn api_failure_records_apology() {
        let (relay, _) = relay(ScriptedClient::failing());
        let mut history = vec![ChatMessage::system(SYSTEM_PROMPT)];

        let reply = relay.reply(&mut history, "hello", None).await;

        assert_eq!(reply, APOLOGY);
        assert_eq!(history.last(), Some(&ChatMessage::assistant(APOLOGY)));
        assert_eq!(history.len(), 3);
    }

    #[tokio::test]
    async fn missing_client_returns_notice() {
        let relay = ChatRelay::new(None, CompletionSettings::default());
        let mut history = Vec::new();
        let reply = relay.reply(&mut history, "hello", None).await;
        assert_eq!(reply, NOT_CONFIGURED);
        assert_eq!(history.len(), 2);
    }

    #[tokio::test]
    async fn streaming_forwards_tokens_and_records_reply() {
        let (relay, _) = relay(ScriptedClient::new(["Learn SQL.".to_string()]));
        let (tx, mut rx) = mpsc::channel(8);
        let mut history = Vec::new();

        let reply = relay.reply_streaming(&mut history, "data?", None, &tx).await;
        drop(tx);

        let mut tokens = Vec::new();
        while let Some(ChatEvent::Token(t)) = rx.recv().await {
            tokens.push(t);
        }
        assert_eq!(tokens.concat(), "Learn SQL.");
        assert_eq!(reply, "Learn SQL.");
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn context_line_lists_interests_and_level() {
        assert_eq!(context_line(&[], None), None);
        let line = context_line(
            &["data science".into(), "python".into()],
            Some(KnowledgeLevel::Advanced),
        )
        .unwrap();
        assert!(line.contains("data science, python"));
        assert!(line.contains("advanced"));
    }
}
