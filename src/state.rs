use crate::domain::models::SurveyResponse;
use crate::middleware::RateLimiter;
use crate::store::{DraftCache, RecordStore};
use std::sync::Arc;
use tokio::sync::RwLock;

pub struct AppState {
    pub store: Arc<dyn RecordStore>,
    pub drafts: DraftCache,
    /// Latest parsed snapshot of the submissions collection. Replaced
    /// wholesale by the single listener task; everything else only reads.
    pub responses: RwLock<Vec<SurveyResponse>>,
    /// Set when the store subscription is lost, cleared on the next good
    /// snapshot. Dashboard views surface this as one "failed to load".
    pub feed_error: RwLock<Option<String>>,
    pub session_key: Vec<u8>,
    pub admin_email: String,
    pub admin_password_hash: String,
    pub survey_limiter: RateLimiter,
    pub login_limiter: RateLimiter,
}

pub type SharedState = Arc<AppState>;
