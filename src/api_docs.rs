use crate::api;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::health::health_check,
        api::books::list_books,
        api::books::create_book,
        api::books::update_book,
        api::books::delete_book,
        api::notes::list_notes,
        api::notes::create_note,
        api::progress::update_progress,
        api::covers::search_covers,
        api::stats::get_stats,
    ),
    tags(
        (name = "booknook", description = "Booknook API")
    )
)]
pub struct ApiDoc;
