use std::convert::Infallible;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse,
    },
    Json,
};
use futures::{Stream, StreamExt};
use serde::Deserialize;
use tokio_stream::wrappers::ReceiverStream;

use crate::advisor::{Advisor, DEFAULT_USER};
use crate::catalog::SeedCatalog;
use crate::models::*;

// ============================================================
// Error Handling
// ============================================================

/// Log an internal error and return a sanitized response to the client.
fn internal_error(e: impl std::fmt::Display) -> (StatusCode, String) {
    tracing::error!("Internal error: {:#}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Internal server error".to_string(),
    )
}

fn bad_request(msg: &str) -> (StatusCode, String) {
    tracing::warn!("Validation error: {}", msg);
    (StatusCode::BAD_REQUEST, msg.to_string())
}

// ============================================================
// User identity
// ============================================================

#[derive(Debug, Default, Deserialize)]
pub struct UserQuery {
    pub user_id: Option<String>,
}

fn cookie_user_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == "user_id")
        .map(|(_, value)| value.trim().to_string())
}

/// First non-blank of the explicit id, the `user_id` cookie, `default_user`.
fn resolve_user_id(explicit: Option<String>, headers: &HeaderMap) -> String {
    explicit
        .filter(|id| !id.trim().is_empty())
        .or_else(|| cookie_user_id(headers).filter(|id| !id.is_empty()))
        .unwrap_or_else(|| DEFAULT_USER.to_string())
}

fn message_of(input: &ChatInput) -> Result<&str, (StatusCode, String)> {
    input
        .message
        .as_deref()
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .ok_or_else(|| bad_request("No message provided"))
}

// ============================================================
// Health
// ============================================================

pub async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok" }))
}

// ============================================================
// Chat
// ============================================================

pub async fn chat(
    State(advisor): State<Advisor>,
    headers: HeaderMap,
    Json(input): Json<ChatInput>,
) -> Result<Json<ChatReply>, (StatusCode, String)> {
    let message = message_of(&input)?;
    let user_id = resolve_user_id(input.user_id.clone(), &headers);

    advisor
        .chat(&user_id, message)
        .await
        .map(Json)
        .map_err(internal_error)
}

fn sse_event(event: ChatEvent) -> Event {
    match event {
        ChatEvent::Token(text) => Event::default().event("token").data(text),
        ChatEvent::Roadmap(reply) => {
            let payload = serde_json::json!({
                "roadmap": reply.roadmap,
                "newNodes": reply.new_nodes,
            });
            Event::default().event("roadmap").data(payload.to_string())
        }
    }
}

pub async fn chat_stream(
    State(advisor): State<Advisor>,
    headers: HeaderMap,
    Json(input): Json<ChatInput>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let message = message_of(&input)?;
    let user_id = resolve_user_id(input.user_id.clone(), &headers);

    let events = advisor
        .chat_stream(&user_id, message)
        .await
        .map_err(internal_error)?;
    let stream = ReceiverStream::new(events).map(|event| Ok(sse_event(event)));
    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

// ============================================================
// Roadmaps
// ============================================================

pub async fn get_roadmap(
    State(advisor): State<Advisor>,
    Query(query): Query<UserQuery>,
    headers: HeaderMap,
) -> Result<Json<Roadmap>, (StatusCode, String)> {
    let user_id = resolve_user_id(query.user_id, &headers);
    advisor.roadmap(&user_id).map(Json).map_err(internal_error)
}

pub async fn get_user_roadmap(
    State(advisor): State<Advisor>,
    Path(user_id): Path<String>,
) -> Result<Json<Roadmap>, (StatusCode, String)> {
    advisor.roadmap(&user_id).map(Json).map_err(internal_error)
}

pub async fn grow_roadmap(
    State(advisor): State<Advisor>,
    Path(user_id): Path<String>,
    body: Option<Json<GrowInput>>,
) -> Result<Json<GrowReply>, (StatusCode, String)> {
    let input = body.map(|Json(input)| input).unwrap_or_default();
    advisor
        .grow(&user_id, input)
        .await
        .map(Json)
        .map_err(internal_error)
}

pub async fn list_seed_roadmaps() -> impl IntoResponse {
    Json(SeedCatalog::available())
}
