use std::collections::HashMap;

use async_trait::async_trait;
use deadpool_redis::{Config, Connection, Pool, Runtime};
use ::redis::AsyncCommands;
use uuid::Uuid;

use crate::cache::{post_key, CachedPost, PostCache};
use crate::{AppError, Result};

/// Post cache backed by a deadpool-managed Redis pool.
#[derive(Clone)]
pub struct RedisPostCache {
    pool: Pool,
}

impl RedisPostCache {
    pub fn new(url: &str, max_connections: usize) -> Result<Self> {
        let pool = Config::from_url(url)
            .builder()
            .map_err(|e| AppError::CacheError(format!("Failed to create Redis pool: {}", e)))?
            .max_size(max_connections)
            .runtime(Runtime::Tokio1)
            .build()
            .map_err(|e| AppError::CacheError(format!("Failed to create Redis pool: {}", e)))?;

        // Credentials stay out of the log
        let safe_url = url.split('@').next_back().unwrap_or(url);
        tracing::info!(url = %safe_url, max_connections, "Redis pool created");

        Ok(Self { pool })
    }

    async fn connection(&self) -> Result<Connection> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl PostCache for RedisPostCache {
    async fn set_post(&self, post: &CachedPost) -> Result<()> {
        let fields = post.to_fields()?;
        let mut conn = self.connection().await?;
        conn.hset_multiple::<_, _, _, ()>(post_key(post.id), &fields).await?;
        tracing::debug!(post_id = %post.id, "cached post summary");
        Ok(())
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<CachedPost>> {
        let mut conn = self.connection().await?;
        let fields: HashMap<String, String> = conn.hgetall(post_key(post_id)).await?;
        CachedPost::from_fields(&fields)
    }

    async fn health_check(&self) -> Result<()> {
        let mut conn = self.connection().await?;
        ::redis::cmd("PING").query_async::<String>(&mut conn).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}
