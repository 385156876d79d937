use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CoversQuery {
    pub title: String,
    pub author: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/covers/search",
    responses(
        (status = 200, description = "Up to three candidate cover URLs; empty when the lookup fails")
    )
)]
pub async fn search_covers(
    State(state): State<AppState>,
    Query(params): Query<CoversQuery>,
) -> impl IntoResponse {
    let title = params.title.trim();
    if title.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "title must not be empty" })),
        )
            .into_response();
    }

    // Cover lookup is best-effort: a failed or empty search renders as
    // "no covers", never as an error.
    let covers = match state
        .covers
        .search_covers(title, params.author.as_deref())
        .await
    {
        Ok(covers) => covers,
        Err(e) => {
            tracing::warn!("Cover search failed: {}", e);
            Vec::new()
        }
    };

    Json(json!({ "covers": covers })).into_response()
}
