use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;

use crate::models::Participant;
use crate::services::progress_service::ProgressUpdate;
use crate::state::AppState;

use super::error_response;

#[utoipa::path(
    put,
    path = "/api/books/{id}/progress/{participant}",
    responses(
        (status = 200, description = "Progress upserted for this reader"),
        (status = 400, description = "Invalid page or rating")
    )
)]
pub async fn update_progress(
    State(state): State<AppState>,
    Path((id, reader)): Path<(String, Participant)>,
    Json(update): Json<ProgressUpdate>,
) -> impl IntoResponse {
    match state.cache.update_progress(&id, reader, update).await {
        Ok(()) => Json(json!({ "message": "Progress updated" })).into_response(),
        Err(e) => error_response(e),
    }
}
