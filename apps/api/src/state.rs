use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::render::cache::RenderCache;
use crate::template::artifacts::ArtifactStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Shared render cache. Redis in production, in-memory fakes in tests.
    pub cache: Arc<dyn RenderCache>,
    /// Compiled template artifact store. S3/MinIO in production.
    pub artifacts: Arc<dyn ArtifactStore>,
    pub config: Config,
}
