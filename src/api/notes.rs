use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::models::Participant;
use crate::services::note_service::NewNote;
use crate::state::AppState;

use super::error_response;

#[derive(Debug, Deserialize)]
pub struct CreateNoteRequest {
    pub text: String,
    pub page_number: Option<i32>,
    pub author: Participant,
}

#[utoipa::path(
    get,
    path = "/api/books/{id}/notes",
    responses(
        (status = 200, description = "Notes for the book, newest first")
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.cache.notes(&id).await {
        Ok(notes) => Json(json!({ "notes": notes, "total": notes.len() })).into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    post,
    path = "/api/books/{id}/notes",
    responses(
        (status = 201, description = "Note added"),
        (status = 400, description = "Invalid note")
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(payload): Json<CreateNoteRequest>,
) -> impl IntoResponse {
    let new = NewNote {
        book_id: id,
        text: payload.text,
        page_number: payload.page_number,
        author: payload.author,
    };

    match state.cache.add_note(new).await {
        Ok(note) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Note added successfully",
                "note": note
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}
