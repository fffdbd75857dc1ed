mod handlers;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::advisor::Advisor;

pub fn create_router(advisor: Advisor) -> Router {
    let api = Router::new()
        // Chat
        .route("/chat", post(handlers::chat))
        .route("/chat/stream", post(handlers::chat_stream))
        // Roadmaps
        .route("/roadmap", get(handlers::get_roadmap))
        .route("/roadmap/{user_id}", get(handlers::get_user_roadmap))
        .route("/roadmap/{user_id}/interests", post(handlers::grow_roadmap))
        .route("/roadmaps", get(handlers::list_seed_roadmaps))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(advisor)
}
