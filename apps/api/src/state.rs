use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use sqlx::PgPool;

use crate::config::Config;
use crate::okr::insights::InsightProvider;
use crate::okr::repository::OkrRepository;

/// Shared state handed to every route handler.
#[derive(Clone)]
pub struct AppState {
    /// Used directly for the read-only performance queries.
    pub db: PgPool,
    pub okrs: Arc<dyn OkrRepository>,
    /// Pluggable analysis backend. Default: `LlmInsightProvider`.
    pub insights: Arc<dyn InsightProvider>,
    pub s3: S3Client,
    pub config: Config,
}
