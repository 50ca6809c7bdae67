pub mod assessments;
pub mod auth;
pub mod profile;
pub mod session;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/profile", profile::router(state.clone()))
        .nest("/api/assessments", assessments::router(state))
}
