use axum::{
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    middleware::{make_span_with_request_id, request_id_middleware},
    state::AppState,
};

pub mod auth;
pub mod chat;
pub mod extract;
pub mod insights;
pub mod movies;
pub mod onboarding;
pub mod recommendations;
pub mod user_movies;

/// Creates the application router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
        .layer(CorsLayer::permissive())
        // Outermost, so the trace span can read the id
        .layer(middleware::from_fn(request_id_middleware))
}

/// Routes under /api
fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signin", post(auth::sign_in))
        .route("/me", get(auth::me))
        .route(
            "/onboarding/casual-questions",
            get(onboarding::casual_questions).post(onboarding::casual_answers),
        )
        .route("/onboarding/survey", post(onboarding::survey))
        .route("/onboarding/ratings", post(onboarding::ratings))
        .route("/recommend", post(recommendations::recommend))
        .route("/user-movies", get(user_movies::list).post(user_movies::upsert))
        .route("/user-movies/watched", post(user_movies::add_watched))
        .route("/user-movies/order", post(user_movies::reorder))
        .route(
            "/user-movies/:id",
            patch(user_movies::update_status).delete(user_movies::delete),
        )
        .route("/search-movies", get(movies::search))
        .route("/tmdb", post(movies::poster))
        .route("/chat", post(chat::chat))
        .route("/insights", get(insights::insights))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
