pub mod auth;
pub mod dashboard;
pub mod session;
pub mod survey;

use crate::state::SharedState;
use axum::{routing::get, Router};

async fn health() -> &'static str {
    "OK"
}

pub fn routes(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api/auth", auth::router(state.clone()))
        .nest("/api/survey", survey::router(state.clone()))
        .nest("/api/dashboard", dashboard::router(state))
}
