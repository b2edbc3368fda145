use std::sync::Arc;

use axum::http::{header, HeaderValue, StatusCode};
use axum_test::{TestRequest, TestServer};
use serde_json::{json, Value};

use cinematch_api::{
    config::Config,
    create_router,
    db::MemoryStore,
    services::{ai::ProviderChain, metadata::MetadataService},
    AppState,
};

/// Server with the in-memory store and no API keys, so every AI and
/// metadata call takes the offline fallback path
fn create_test_server() -> TestServer {
    let config = Config::default();
    let http_client = reqwest::Client::new();
    let state = AppState::new(
        Arc::new(MemoryStore::new()),
        ProviderChain::from_config(&config, http_client.clone()),
        MetadataService::from_config(&config, http_client, None),
        config,
    );
    TestServer::new(create_router(state)).unwrap()
}

async fn sign_in(server: &TestServer, email: &str) -> String {
    let response = server
        .post("/api/auth/signin")
        .json(&json!({ "email": email, "name": "Test Viewer" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    body["token"].as_str().unwrap().to_string()
}

fn authed(request: TestRequest, token: &str) -> TestRequest {
    request.add_header(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    )
}

async fn add_movie(server: &TestServer, token: &str, title: &str, status: &str) -> Value {
    let response = authed(server.post("/api/user-movies"), token)
        .json(&json!({ "movieTitle": title, "status": status }))
        .await;
    response.assert_status_ok();
    response.json()
}

#[tokio::test]
async fn test_health_check() {
    let server = create_test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_protected_routes_require_session() {
    let server = create_test_server();

    server
        .get("/api/user-movies")
        .await
        .assert_status(StatusCode::UNAUTHORIZED);

    let response = authed(server.post("/api/recommend"), &uuid::Uuid::new_v4().to_string()).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
    let body: Value = response.json();
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn test_sign_in_is_idempotent_per_email() {
    let server = create_test_server();
    let first = sign_in(&server, "viewer@example.com").await;
    let second = sign_in(&server, "Viewer@Example.com").await;
    assert_ne!(first, second);

    let me_first: Value = authed(server.get("/api/me"), &first).await.json();
    let me_second: Value = authed(server.get("/api/me"), &second).await.json();
    assert_eq!(me_first["user"]["id"], me_second["user"]["id"]);
    assert_eq!(me_first["user"]["onboardingStep"], "NEEDS_INITIAL_SURVEY");

    server
        .post("/api/auth/signin")
        .json(&json!({ "email": "not-an-email" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_onboarding_flow() {
    let server = create_test_server();
    let token = sign_in(&server, "flow@example.com").await;

    let questions: Vec<Value> = server.get("/api/onboarding/casual-questions").await.json();
    assert_eq!(questions.len(), 3);

    // Ratings before the survey are out of order
    authed(server.post("/api/onboarding/ratings"), &token)
        .json(&json!({ "ratings": { "Heat": 5 } }))
        .await
        .assert_status(StatusCode::CONFLICT);

    let response = authed(server.post("/api/onboarding/survey"), &token)
        .json(&json!({
            "favoriteGenre": "Drama",
            "favoriteDirector": "Martin Scorsese",
            "mood": "reflective"
        }))
        .await;
    response.assert_status_ok();
    let survey: Value = response.json();
    assert_eq!(survey["success"], true);
    assert_eq!(survey["source"], "static");
    assert_eq!(survey["movies"].as_array().unwrap().len(), 10);
    assert!(survey["aiError"].as_str().unwrap().contains("gemini"));

    // A second survey is rejected
    authed(server.post("/api/onboarding/survey"), &token)
        .json(&json!({ "favoriteGenre": "Comedy" }))
        .await
        .assert_status(StatusCode::CONFLICT);

    // Out-of-range rating
    authed(server.post("/api/onboarding/ratings"), &token)
        .json(&json!({ "ratings": { "The Godfather": 9 } }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);

    let response = authed(server.post("/api/onboarding/ratings"), &token)
        .json(&json!({ "ratings": { "The Godfather": 5, "Pulp Fiction": "2" } }))
        .await;
    response.assert_status_ok();
    let step: Value = response.json();
    assert_eq!(step["onboardingStep"], "NEEDS_CASUAL_QUESTIONS");

    let response = authed(server.post("/api/onboarding/casual-questions"), &token)
        .json(&json!({ "answers": ["Hidden gems", "Character-driven stories"] }))
        .await;
    response.assert_status_ok();
    let step: Value = response.json();
    assert_eq!(step["onboardingStep"], "ONBOARDING_COMPLETE");

    let me: Value = authed(server.get("/api/me"), &token).await.json();
    assert_eq!(me["user"]["movieRatings"]["Pulp Fiction"], 2);
    assert_eq!(me["user"]["preferences"]["favoriteDirector"], "Martin Scorsese");
}

#[tokio::test]
async fn test_user_movie_upsert_is_idempotent() {
    let server = create_test_server();
    let token = sign_in(&server, "lists@example.com").await;

    let first = add_movie(&server, &token, "Heat", "watchlist").await;
    let second = add_movie(&server, &token, "Heat", "watchlist").await;
    assert_eq!(first["id"], second["id"]);
    assert_eq!(first["order"], second["order"]);

    let liked = add_movie(&server, &token, "Heat", "liked").await;
    assert_eq!(liked["id"], first["id"]);
    assert_eq!(liked["status"], "liked");

    let movies: Vec<Value> = authed(server.get("/api/user-movies"), &token).await.json();
    assert_eq!(movies.len(), 1);
}

#[tokio::test]
async fn test_upsert_accepts_uppercase_status() {
    let server = create_test_server();
    let token = sign_in(&server, "caps@example.com").await;

    let movie = add_movie(&server, &token, "Heat", "WATCHLIST").await;
    assert_eq!(movie["status"], "watchlist");

    let movie = add_movie(&server, &token, "Heat", "Watched").await;
    assert_eq!(movie["status"], "watched");

    authed(server.post("/api/user-movies"), &token)
        .json(&json!({ "movieTitle": "Heat", "status": "SEEN" }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_movie_id_is_a_json_error() {
    let server = create_test_server();
    let token = sign_in(&server, "badid@example.com").await;

    let response = authed(server.patch("/api/user-movies/not-a-uuid"), &token)
        .json(&json!({ "status": "watched" }))
        .await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let content_type = response.headers().get(header::CONTENT_TYPE).unwrap();
    assert_eq!(content_type, "application/json");
    let body: Value = response.json();
    assert!(!body["error"].as_str().unwrap().is_empty());

    let response = authed(server.delete("/api/user-movies/42"), &token).await;
    response.assert_status(StatusCode::BAD_REQUEST);
    let body: Value = response.json();
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_reorder_and_ownership() {
    let server = create_test_server();
    let token = sign_in(&server, "order@example.com").await;
    let other = sign_in(&server, "other@example.com").await;

    let a = add_movie(&server, &token, "Alien", "watchlist").await;
    let b = add_movie(&server, &token, "Brazil", "watchlist").await;
    let c = add_movie(&server, &token, "Casablanca", "watched").await;

    authed(server.post("/api/user-movies/order"), &token)
        .json(&json!({ "order": [c["id"], a["id"], b["id"]] }))
        .await
        .assert_status_ok();

    let movies: Vec<Value> = authed(server.get("/api/user-movies"), &token).await.json();
    let titles: Vec<&str> = movies.iter().map(|m| m["movieTitle"].as_str().unwrap()).collect();
    assert_eq!(titles, vec!["Casablanca", "Alien", "Brazil"]);
    for (index, movie) in movies.iter().enumerate() {
        assert_eq!(movie["order"], index);
    }

    // Another user cannot reorder, update or delete these rows
    authed(server.post("/api/user-movies/order"), &other)
        .json(&json!({ "order": [a["id"]] }))
        .await
        .assert_status(StatusCode::NOT_FOUND);

    let id = a["id"].as_str().unwrap();
    authed(server.patch(&format!("/api/user-movies/{id}")), &other)
        .json(&json!({ "status": "dismissed" }))
        .await
        .assert_status(StatusCode::NOT_FOUND);
    authed(server.delete(&format!("/api/user-movies/{id}")), &other)
        .await
        .assert_status(StatusCode::NOT_FOUND);

    // The owner can
    let response = authed(server.patch(&format!("/api/user-movies/{id}")), &token)
        .json(&json!({ "status": "dismissed" }))
        .await;
    response.assert_status_ok();
    let updated: Value = response.json();
    assert_eq!(updated["status"], "dismissed");

    authed(server.delete(&format!("/api/user-movies/{id}")), &token)
        .await
        .assert_status(StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_add_to_watched_reports_count() {
    let server = create_test_server();
    let token = sign_in(&server, "watched@example.com").await;

    let response = authed(server.post("/api/user-movies/watched"), &token)
        .json(&json!({ "movieTitle": "Heat" }))
        .await;
    response.assert_status_ok();
    let body: Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["watchedCount"], 1);
}

#[tokio::test]
async fn test_search_movies() {
    let server = create_test_server();

    let body: Value = server
        .get("/api/search-movies")
        .add_query_param("q", "matrix")
        .await
        .json();
    assert_eq!(body["movies"], json!(["The Matrix"]));
    assert_eq!(body["totalFound"], 1);

    let body: Value = server
        .get("/api/search-movies")
        .add_query_param("q", "m")
        .await
        .json();
    assert_eq!(body["movies"], json!([]));
}

#[tokio::test]
async fn test_recommendations_fall_back_and_exclude_lists() {
    let server = create_test_server();
    let token = sign_in(&server, "recs@example.com").await;

    authed(server.post("/api/onboarding/survey"), &token)
        .json(&json!({ "favoriteGenre": "Horror" }))
        .await
        .assert_status_ok();
    authed(server.post("/api/onboarding/ratings"), &token)
        .json(&json!({ "ratings": { "Hereditary": 4 } }))
        .await
        .assert_status_ok();
    add_movie(&server, &token, "Get Out", "watched").await;

    let response = authed(server.post("/api/recommend"), &token).await;
    response.assert_status_ok();
    let body: Value = response.json();

    assert_eq!(body["source"], "static");
    let titles: Vec<&str> = body["recommendations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles.len(), 5);
    assert!(!titles.contains(&"Get Out"));
    assert!(!titles.contains(&"Hereditary"));
    assert_eq!(body["recommendations"][0]["posterUrl"], "/fallback-poster.png");
    assert_eq!(body["userMovies"][0]["movieTitle"], "Get Out");
}

#[tokio::test]
async fn test_poster_lookup_without_keys() {
    let server = create_test_server();

    let body: Value = server
        .post("/api/tmdb")
        .json(&json!({ "title": "Inception" }))
        .await
        .json();
    assert_eq!(body, json!({ "posterUrl": "/fallback-poster.png", "genres": [] }));

    server
        .post("/api/tmdb")
        .json(&json!({ "title": "  " }))
        .await
        .assert_status(StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_chat_and_insights() {
    let server = create_test_server();
    let token = sign_in(&server, "chat@example.com").await;

    let response = authed(server.post("/api/chat"), &token)
        .json(&json!({ "messages": [{ "role": "user", "content": "Something cozy" }] }))
        .await;
    response.assert_status_ok();
    let reply: Value = response.json();
    assert_eq!(reply["source"], "static");
    assert!(!reply["reply"].as_str().unwrap().is_empty());

    add_movie(&server, &token, "Up", "watchlist").await;
    let insights: Value = authed(server.get("/api/insights"), &token).await.json();
    assert_eq!(insights["lists"]["watchlist"], 1);
    assert_eq!(insights["excludedTitles"], json!(["up"]));
    assert_eq!(insights["progress"]["hasWatchlist"], true);
}
