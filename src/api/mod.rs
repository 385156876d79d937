pub mod books;
pub mod covers;
pub mod events;
pub mod health;
pub mod notes;
pub mod progress;
pub mod session;
pub mod stats;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
};
use serde_json::json;

use crate::services::ServiceError;
use crate::state::AppState;

pub fn api_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(health::health_check))
        // Books
        .route("/books", get(books::list_books).post(books::create_book))
        .route(
            "/books/:id",
            get(books::get_book)
                .put(books::update_book)
                .delete(books::delete_book),
        )
        // Notes
        .route(
            "/books/:id/notes",
            get(notes::list_notes).post(notes::create_note),
        )
        // Progress
        .route(
            "/books/:id/progress/:participant",
            put(progress::update_progress),
        )
        // Cover lookup
        .route("/covers/search", get(covers::search_covers))
        // Stats
        .route("/stats", get(stats::get_stats))
        // Session view state
        .route(
            "/session",
            get(session::get_session).put(session::update_session),
        )
        // Change-event push
        .route("/events", get(events::subscribe))
        .with_state(state)
}

/// Map service failures onto responses. Write failures surface inline and
/// are never retried automatically; an unprovisioned schema gets the setup
/// hint instead of a raw driver message.
pub(crate) fn error_response(err: ServiceError) -> Response {
    let (status, message) = match &err {
        ServiceError::SchemaNotProvisioned => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database tables not found. Apply schema.sql to the backend store first.".to_string(),
        ),
        ServiceError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        ServiceError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        ServiceError::Database(msg) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Database error: {}", msg),
        ),
    };
    (status, Json(json!({ "error": message }))).into_response()
}
