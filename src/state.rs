use crate::domain::scoring::ScoringRules;
use crate::middleware::RateLimiter;
use sqlx::PgPool;
use std::sync::Arc;

pub struct AppState {
    pub pool: PgPool,
    pub session_key: Vec<u8>,
    pub login_limiter: RateLimiter,
    /// Fixed question rule tables, built once at startup.
    pub rules: ScoringRules,
}

pub type SharedState = Arc<AppState>;
