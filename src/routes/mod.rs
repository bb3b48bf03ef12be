use std::sync::Arc;

use axum::{
    http::StatusCode,
    middleware,
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{make_span_with_request_id, request_id_middleware};

pub mod extract;
pub mod friends;
pub mod movies;
pub mod recommendations;
pub mod state;
pub mod users;

pub use state::{AppState, Settings};

/// Creates the application router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .nest("/api", api_routes())
        .with_state(state)
        .layer(
            // Outermost first: the request id exists before the trace span opens
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_id_middleware))
                .layer(TraceLayer::new_for_http().make_span_with(make_span_with_request_id))
                .layer(CorsLayer::permissive()),
        )
}

/// API routes under /api
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        // Users
        .route("/users", post(users::create))
        .route("/users/me", get(users::me).put(users::update_me))
        .route("/users/search", get(users::search))
        .route("/users/me/watchlist", post(users::add_to_watchlist))
        .route(
            "/users/me/watchlist/:movie_id",
            delete(users::remove_from_watchlist),
        )
        .route("/users/me/favorites", post(users::add_to_favorites))
        .route(
            "/users/me/favorites/:movie_id",
            delete(users::remove_from_favorites),
        )
        .route("/users/:identifier", get(users::profile))
        // Friends
        .route("/friends", get(friends::list))
        .route("/friends/requests", get(friends::requests))
        .route("/friends/request", post(friends::send_request))
        .route("/friends/accept/:id", post(friends::accept))
        .route("/friends/:friend_id", delete(friends::remove))
        // Movies
        .route("/movies", get(movies::list))
        .route("/movies/:id", get(movies::detail))
        .route("/movies/:id/rate", post(movies::rate))
        // Recommendations
        .route("/recommendations/:model", get(recommendations::recommend))
}

/// Health check endpoint
async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}
