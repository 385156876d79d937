use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;

use crate::services::book_service::{self, BookPatch, BookView, NewBook};
use crate::state::AppState;

use super::error_response;

#[derive(Debug, Default, Deserialize)]
pub struct BooksQuery {
    pub view: Option<BookView>,
    pub search: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/books",
    responses(
        (status = 200, description = "Books with both readers' progress, newest first")
    )
)]
pub async fn list_books(
    State(state): State<AppState>,
    Query(params): Query<BooksQuery>,
) -> impl IntoResponse {
    let books = match state.cache.books().await {
        Ok(books) => books,
        Err(e) => return error_response(e),
    };

    let mut books = book_service::filter_view(books, params.view.unwrap_or_default());
    if let Some(query) = params.search.as_deref()
        && !query.trim().is_empty()
    {
        books = book_service::filter_search(books, query.trim());
    }

    Json(json!({ "books": books, "total": books.len() })).into_response()
}

pub async fn get_book(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    let books = match state.cache.books().await {
        Ok(books) => books,
        Err(e) => return error_response(e),
    };

    match books.into_iter().find(|b| b.id == id) {
        Some(book) => Json(json!({ "book": book })).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Book not found" })),
        )
            .into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/api/books",
    responses(
        (status = 201, description = "Book created; both readers got a progress row"),
        (status = 400, description = "Invalid book")
    )
)]
pub async fn create_book(
    State(state): State<AppState>,
    Json(payload): Json<NewBook>,
) -> impl IntoResponse {
    match state.cache.add_book(payload).await {
        Ok(book) => (
            StatusCode::CREATED,
            Json(json!({
                "message": "Book created successfully",
                "book": book
            })),
        )
            .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    put,
    path = "/api/books/{id}",
    responses(
        (status = 200, description = "Book updated; omitted optional fields are cleared"),
        (status = 404, description = "No such book")
    )
)]
pub async fn update_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<BookPatch>,
) -> impl IntoResponse {
    match state.cache.update_book(&id, patch).await {
        Ok(book) => Json(json!({
            "message": "Book updated successfully",
            "book": book
        }))
        .into_response(),
        Err(e) => error_response(e),
    }
}

#[utoipa::path(
    delete,
    path = "/api/books/{id}",
    responses(
        (status = 200, description = "Book deleted; progress and notes cascade"),
        (status = 404, description = "No such book")
    )
)]
pub async fn delete_book(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.cache.delete_book(&id).await {
        Ok(()) => {
            if state.session.current().selected_book_id.as_deref() == Some(id.as_str()) {
                state.session.select_book(None);
            }
            Json(json!({ "message": "Book deleted successfully" })).into_response()
        }
        Err(e) => error_response(e),
    }
}
