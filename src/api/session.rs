use axum::{Json, extract::State, response::IntoResponse};

use crate::session::SessionPatch;
use crate::state::AppState;

pub async fn get_session(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.session.current())
}

pub async fn update_session(
    State(state): State<AppState>,
    Json(patch): Json<SessionPatch>,
) -> impl IntoResponse {
    Json(state.session.apply(patch))
}
