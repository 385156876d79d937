use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use booknook::api;
use booknook::config::Config;
use booknook::db;
use booknook::state::AppState;
use sea_orm::{ConnectionTrait, DatabaseConnection, Statement};
use serde_json::{Value, json};
use tower::util::ServiceExt; // for `oneshot`
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const SCHEMA: [&str; 3] = [
    r#"
    CREATE TABLE books (
        id TEXT PRIMARY KEY,
        title TEXT NOT NULL,
        author TEXT,
        added_by TEXT NOT NULL,
        cover_image_url TEXT,
        total_pages INTEGER,
        created_at TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE user_progress (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        user_name TEXT NOT NULL,
        progress TEXT NOT NULL DEFAULT 'not_started',
        current_page INTEGER NOT NULL DEFAULT 0,
        rating INTEGER,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        UNIQUE (book_id, user_name)
    )
    "#,
    r#"
    CREATE TABLE notes (
        id TEXT PRIMARY KEY,
        book_id TEXT NOT NULL REFERENCES books(id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        page_number INTEGER,
        author TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
    "#,
];

fn test_config(openlibrary_url: &str) -> Config {
    Config {
        database_url: "sqlite::memory:".to_string(),
        port: 0,
        cors_allowed_origins: Vec::new(),
        openlibrary_url: openlibrary_url.to_string(),
    }
}

async fn setup_db() -> DatabaseConnection {
    let db = db::connect("sqlite::memory:")
        .await
        .expect("Failed to connect");
    for ddl in SCHEMA {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            ddl.to_owned(),
        ))
        .await
        .expect("Failed to provision schema");
    }
    db
}

async fn setup_app() -> (Router, AppState) {
    let db = setup_db().await;
    let state = AppState::new(db, &test_config("http://127.0.0.1:9"));
    (api::api_router(state.clone()), state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method("GET")
        .body(Body::empty())
        .unwrap()
}

fn send_json(uri: &str, http_method: &str, payload: Value) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .method(http_method)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    serde_json::from_slice(&bytes).expect("Body is not JSON")
}

async fn create_book(app: &Router, payload: Value) -> String {
    let response = app
        .clone()
        .oneshot(send_json("/books", "POST", payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    body["book"]["id"].as_str().expect("book id").to_string()
}

#[tokio::test]
async fn health_check_reports_ok() {
    let (app, _state) = setup_app().await;
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "booknook");
}

#[tokio::test]
async fn adding_a_book_seeds_both_readers() {
    let (app, _state) = setup_app().await;
    create_book(
        &app,
        json!({
            "title": "Dune",
            "author": "Herbert",
            "added_by": "August",
            "initial_status": "started"
        }),
    )
    .await;

    let response = app.oneshot(get("/books")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    let book = &body["books"][0];
    assert_eq!(book["title"], "Dune");
    assert_eq!(book["added_by"], "August");
    assert_eq!(book["august"]["status"], "started");
    assert_eq!(book["august"]["current_page"], 0);
    assert_eq!(book["viola"]["status"], "not_started");
    assert_eq!(book["viola"]["current_page"], 0);
}

#[tokio::test]
async fn empty_titles_are_rejected_inline() {
    let (app, _state) = setup_app().await;
    let response = app
        .oneshot(send_json(
            "/books",
            "POST",
            json!({ "title": "   ", "added_by": "Viola" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("title"));
}

#[tokio::test]
async fn wishlist_view_splits_off_wished_books() {
    let (app, _state) = setup_app().await;
    let library_id = create_book(&app, json!({ "title": "Emma", "added_by": "August" })).await;
    create_book(
        &app,
        json!({
            "title": "Dune",
            "added_by": "Viola",
            "initial_status": "wishlist"
        }),
    )
    .await;

    let response = app.clone().oneshot(get("/books?view=library")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["id"], library_id.as_str());

    let response = app.clone().oneshot(get("/books?view=wishlist")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["books"][0]["title"], "Dune");

    let response = app
        .oneshot(get("/books?view=library&search=emma"))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
}

#[tokio::test]
async fn progress_upsert_and_percent_flow_through_the_api() {
    let (app, _state) = setup_app().await;
    let id = create_book(&app, json!({ "title": "Dune", "added_by": "August" })).await;

    // Give the book a page count so percent becomes meaningful.
    let response = app
        .clone()
        .oneshot(send_json(
            &format!("/books/{}", id),
            "PUT",
            json!({ "title": "Dune", "author": "Herbert", "total_pages": 300 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(send_json(
            &format!("/books/{}/progress/Viola", id),
            "PUT",
            json!({ "status": "started", "current_page": 120 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.clone().oneshot(get(&format!("/books/{}", id))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["book"]["viola"]["status"], "started");
    assert_eq!(body["book"]["viola"]["current_page"], 120);
    assert_eq!(body["book"]["viola"]["percent"], 40);

    // Out-of-range ratings are rejected and nothing changes.
    let response = app
        .clone()
        .oneshot(send_json(
            &format!("/books/{}/progress/Viola", id),
            "PUT",
            json!({ "status": "finished", "rating": 9 }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.oneshot(get(&format!("/books/{}", id))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["book"]["viola"]["status"], "started");
}

#[tokio::test]
async fn updating_a_book_clears_omitted_fields() {
    let (app, _state) = setup_app().await;
    let id = create_book(
        &app,
        json!({ "title": "Gatsby", "author": "Fitzgerald", "added_by": "August" }),
    )
    .await;

    let response = app
        .clone()
        .oneshot(send_json(
            &format!("/books/{}", id),
            "PUT",
            json!({ "title": "The Great Gatsby" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["book"]["title"], "The Great Gatsby");
    assert_eq!(body["book"]["author"], Value::Null);

    let response = app
        .oneshot(send_json(
            "/books/does-not-exist",
            "PUT",
            json!({ "title": "X" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn deleting_a_book_clears_the_selection() {
    let (app, state) = setup_app().await;
    let id = create_book(&app, json!({ "title": "Dune", "added_by": "August" })).await;

    let response = app
        .clone()
        .oneshot(send_json(
            "/session",
            "PUT",
            json!({ "selected_book_id": id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        state.session.current().selected_book_id.as_deref(),
        Some(id.as_str())
    );

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/books/{}", id))
                .method("DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(state.session.current().selected_book_id, None);

    // Deleting again is a 404, not a crash.
    let response = app
        .oneshot(
            Request::builder()
                .uri(format!("/books/{}", id))
                .method("DELETE")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn notes_round_trip_through_the_api() {
    let (app, _state) = setup_app().await;
    let id = create_book(&app, json!({ "title": "Dune", "added_by": "August" })).await;

    let response = app
        .clone()
        .oneshot(send_json(
            &format!("/books/{}/notes", id),
            "POST",
            json!({ "text": "The spice must flow", "page_number": 87, "author": "Viola" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(get(&format!("/books/{}/notes", id)))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["notes"][0]["text"], "The spice must flow");
    assert_eq!(body["notes"][0]["page_number"], 87);
    assert_eq!(body["notes"][0]["author"], "Viola");

    let response = app
        .oneshot(send_json(
            &format!("/books/{}/notes", id),
            "POST",
            json!({ "text": "anchored nowhere", "page_number": 0, "author": "Viola" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn stats_count_finished_books() {
    let (app, _state) = setup_app().await;
    let id = create_book(&app, json!({ "title": "Dune", "added_by": "August" })).await;
    for reader in ["August", "Viola"] {
        let response = app
            .clone()
            .oneshot(send_json(
                &format!("/books/{}/progress/{}", id, reader),
                "PUT",
                json!({ "status": "finished", "rating": 5 }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(get("/stats")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["stats"]["august_finished"], 1);
    assert_eq!(body["stats"]["viola_finished"], 1);
    assert_eq!(body["stats"]["finished_together"], 1);
}

#[tokio::test]
async fn session_state_round_trips() {
    let (app, _state) = setup_app().await;

    let response = app.clone().oneshot(get("/session")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["active_participant"], "August");
    assert_eq!(body["active_view"], "library");
    assert_eq!(body["selected_book_id"], Value::Null);

    let response = app
        .clone()
        .oneshot(send_json(
            "/session",
            "PUT",
            json!({ "active_participant": "Viola", "active_view": "wishlist", "add_book_open": true }),
        ))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["active_participant"], "Viola");
    assert_eq!(body["active_view"], "wishlist");
    assert_eq!(body["add_book_open"], true);

    // Absent fields keep their value.
    let response = app.oneshot(get("/session")).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["active_participant"], "Viola");
}

#[tokio::test]
async fn cover_search_maps_cover_ids_and_isbn_fallbacks() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "docs": [
                { "cover_i": 8739161 },
                { "isbn": ["0451526538", "9780451526533"] },
                { "title": "no cover at all" }
            ]
        })))
        .mount(&server)
        .await;

    let db = setup_db().await;
    let state = AppState::new(db, &test_config(&server.uri()));
    let app = api::api_router(state);

    let response = app
        .oneshot(get("/covers/search?title=dune&author=herbert"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let covers = body["covers"].as_array().unwrap();
    assert_eq!(covers.len(), 2);
    assert_eq!(covers[0], "https://covers.openlibrary.org/b/id/8739161-L.jpg");
    assert_eq!(
        covers[1],
        "https://covers.openlibrary.org/b/isbn/0451526538-L.jpg"
    );
}

#[tokio::test]
async fn cover_search_failure_is_non_fatal() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/search.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let db = setup_db().await;
    let state = AppState::new(db, &test_config(&server.uri()));
    let app = api::api_router(state);

    let response = app
        .clone()
        .oneshot(get("/covers/search?title=dune"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["covers"], json!([]));

    // A blank title is the caller's mistake, though.
    let response = app
        .oneshot(get("/covers/search?title=%20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
