//! Shared render cache.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;

/// Rendered HTML lives this long unless explicitly invalidated.
pub const RENDER_TTL: Duration = Duration::from_secs(15 * 60);

/// Cache for rendered CV HTML, keyed by content fingerprint.
///
/// Implementations must be safe for concurrent access from multiple service
/// instances; no client-side locking. Two concurrent renders of the same CV
/// may both miss and both write — last write wins, renders are deterministic.
/// No negative caching: a miss always re-renders.
#[async_trait]
pub trait RenderCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError>;

    async fn put(&self, key: &str, html: &str, ttl: Duration) -> Result<(), AppError>;

    /// Deletes every cached render for one CV (`rendered:cv:{cv_id}:*`).
    /// A pattern scan — the fingerprint half of the key is unknown to callers.
    async fn invalidate_cv(&self, cv_id: Uuid) -> Result<u64, AppError>;

    /// Wipes the whole rendered-CV keyspace. Used after template update or
    /// delete, since the fingerprint does not cover the template version.
    async fn invalidate_all(&self) -> Result<u64, AppError>;
}

/// Redis-backed implementation, shared across service instances.
pub struct RedisRenderCache {
    client: redis::Client,
}

impl RedisRenderCache {
    pub fn new(client: redis::Client) -> Self {
        Self { client }
    }

    async fn delete_by_pattern(&self, pattern: &str) -> Result<u64, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let keys: Vec<String> = {
            let mut iter: redis::AsyncIter<String> = conn.scan_match(pattern).await?;
            let mut keys = Vec::new();
            while let Some(key) = iter.next_item().await {
                keys.push(key);
            }
            keys
        };

        if keys.is_empty() {
            return Ok(0);
        }

        let deleted: u64 = conn.del(keys).await?;
        info!("Invalidated {deleted} cached renders matching {pattern}");
        Ok(deleted)
    }
}

#[async_trait]
impl RenderCache for RedisRenderCache {
    async fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        Ok(conn.get(key).await?)
    }

    async fn put(&self, key: &str, html: &str, ttl: Duration) -> Result<(), AppError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: () = conn.set_ex(key, html, ttl.as_secs()).await?;
        Ok(())
    }

    async fn invalidate_cv(&self, cv_id: Uuid) -> Result<u64, AppError> {
        self.delete_by_pattern(&format!("rendered:cv:{cv_id}:*"))
            .await
    }

    async fn invalidate_all(&self) -> Result<u64, AppError> {
        self.delete_by_pattern("rendered:cv:*").await
    }
}
