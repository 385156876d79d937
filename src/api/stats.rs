use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;

use crate::services::book_service;
use crate::state::AppState;

use super::error_response;

#[utoipa::path(
    get,
    path = "/api/stats",
    responses(
        (status = 200, description = "Finished counts per reader, plus finished-together")
    )
)]
pub async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    match state.cache.books().await {
        Ok(books) => {
            Json(json!({ "stats": book_service::reading_stats(&books) })).into_response()
        }
        Err(e) => error_response(e),
    }
}
