pub mod auth;
pub mod db;
pub mod error;
pub mod lifecycle;
pub mod routes;
pub mod stats;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, Next},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

#[derive(Clone)]
pub struct AppState {
    pub db: db::Db,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/me", get(auth::me))
        .route(
            "/api/donations",
            get(routes::donations::list_donations).post(routes::donations::create_donation),
        )
        .route(
            "/api/donations/{id}/accept",
            put(routes::donations::accept_donation),
        )
        .route(
            "/api/donations/{id}/distribute",
            put(routes::donations::distribute_donation),
        )
        .route("/api/users/{id}", put(auth::update_profile))
        .route("/api/users/{id}/stats", get(routes::users::user_stats))
        .layer(from_fn(require_auth))
        .with_state(state)
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_check() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn require_auth(req: Request<Body>, next: Next) -> impl IntoResponse {
    // Guard only API endpoints; registration and login stay open.
    let path = req.uri().path();
    if req.method() == axum::http::Method::OPTIONS
        || !path.starts_with("/api/")
        || path.starts_with("/api/auth/")
    {
        return next.run(req).await;
    }

    if let Some(token) = auth::extract_token_from_headers(req.headers()) {
        if auth::validate_token_str(&token).is_ok() {
            return next.run(req).await;
        }
    }

    (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
}
