mod analytics;
mod domain;
mod export;
mod middleware;
mod services;
mod state;
mod store;
mod web;

use crate::middleware::RateLimiter;
use crate::state::{AppState, SharedState};
use crate::store::{DraftCache, MemoryStore, RecordStore};
use axum::{routing::get_service, Router};
use base64::{engine::general_purpose, Engine as _};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_cron_scheduler::{Job, JobScheduler};
use tower_http::{services::ServeDir, services::ServeFile, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let session_key_b64 = std::env::var("SESSION_KEY").expect("SESSION_KEY missing");
    let session_key = general_purpose::STANDARD
        .decode(session_key_b64)
        .expect("SESSION_KEY must be base64");
    let admin_email = std::env::var("ADMIN_EMAIL").expect("ADMIN_EMAIL missing");
    let admin_password_hash =
        std::env::var("ADMIN_PASSWORD_HASH").expect("ADMIN_PASSWORD_HASH missing");

    // The store boundary is a trait; this binary ships the in-process
    // implementation, a managed realtime database plugs in behind the same
    // contract.
    let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

    let shared: SharedState = Arc::new(AppState {
        store,
        drafts: DraftCache::new(),
        responses: RwLock::new(Vec::new()),
        feed_error: RwLock::new(None),
        session_key,
        admin_email,
        admin_password_hash,
        survey_limiter: RateLimiter::new(10, 60),
        login_limiter: RateLimiter::new(5, 60),
    });

    // Single owner of the submissions subscription; the only writer of the
    // cached snapshot.
    tokio::spawn(web::dashboard::run_snapshot_listener(shared.clone()));

    // Hourly cleanup so idle rate-limiter entries do not pile up.
    let scheduler = JobScheduler::new().await?;
    let shared_for_cleanup = shared.clone();
    scheduler
        .add(Job::new_async("0 0 * * * *", move |_uuid, _l| {
            let state = shared_for_cleanup.clone();
            Box::pin(async move {
                state.survey_limiter.cleanup().await;
                state.login_limiter.cleanup().await;
            })
        })?)
        .await?;
    scheduler.start().await?;
    tracing::info!("Scheduler started: rate limiter cleanup hourly");

    let static_handler = ServeDir::new("static").not_found_service(ServeFile::new("static/index.html"));

    let app = Router::new()
        .merge(web::routes(shared.clone()))
        .fallback_service(get_service(static_handler))
        .layer(TraceLayer::new_for_http());

    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| {
        let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
        format!("0.0.0.0:{}", port)
    });
    tracing::info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
