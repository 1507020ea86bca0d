//! Denormalized post summaries kept in a hash per post (`post:{id}`).
//!
//! Entries are written when a vote pushes a post's score to the configured
//! threshold and are never expired or invalidated.

pub mod memory;
pub mod redis;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::config::CacheBackend;
use crate::models::VoteType;
use crate::{AppError, Result};

pub use self::memory::MemoryPostCache;
pub use self::redis::RedisPostCache;

pub fn post_key(post_id: Uuid) -> String {
    format!("post:{}", post_id)
}

#[derive(Debug, Clone, PartialEq)]
pub struct CachedPost {
    pub id: Uuid,
    pub title: String,
    pub author_username: String,
    pub content: serde_json::Value,
    /// Vote type of the request that triggered the write.
    pub current_vote: Option<VoteType>,
    pub created_at: DateTime<Utc>,
}

impl CachedPost {
    /// Hash fields as stored. `content` is the JSON document serialized to a string.
    pub fn to_fields(&self) -> Result<Vec<(&'static str, String)>> {
        let content = serde_json::to_string(&self.content)
            .map_err(|e| AppError::CacheError(format!("Failed to serialize post content: {}", e)))?;

        Ok(vec![
            ("id", self.id.to_string()),
            ("title", self.title.clone()),
            ("authorUsername", self.author_username.clone()),
            ("content", content),
            ("currentVote", self.current_vote.map(|v| v.as_str().to_string()).unwrap_or_default()),
            ("createdAt", self.created_at.to_rfc3339()),
        ])
    }

    /// An empty hash is a miss.
    pub fn from_fields(fields: &HashMap<String, String>) -> Result<Option<Self>> {
        if fields.is_empty() {
            return Ok(None);
        }

        let field = |name: &str| {
            fields
                .get(name)
                .ok_or_else(|| AppError::CacheError(format!("Cached post is missing field {}", name)))
        };

        let id = Uuid::parse_str(field("id")?)
            .map_err(|e| AppError::CacheError(format!("Invalid cached post id: {}", e)))?;
        let content = serde_json::from_str(field("content")?)
            .map_err(|e| AppError::CacheError(format!("Invalid cached post content: {}", e)))?;
        let created_at = DateTime::parse_from_rfc3339(field("createdAt")?)
            .map_err(|e| AppError::CacheError(format!("Invalid cached post timestamp: {}", e)))?
            .with_timezone(&Utc);
        let current_vote = match fields.get("currentVote").map(String::as_str) {
            None | Some("") => None,
            Some(raw) => Some(raw.parse().map_err(AppError::CacheError)?),
        };

        Ok(Some(Self {
            id,
            title: field("title")?.clone(),
            author_username: field("authorUsername")?.clone(),
            content,
            current_vote,
            created_at,
        }))
    }
}

#[async_trait]
pub trait PostCache: Send + Sync {
    /// Writes every field in one command, replacing any previous summary.
    async fn set_post(&self, post: &CachedPost) -> Result<()>;
    async fn get_post(&self, post_id: Uuid) -> Result<Option<CachedPost>>;
    async fn health_check(&self) -> Result<()>;
    fn backend(&self) -> &'static str;
}

pub fn connect(config: &CacheBackend) -> Result<Arc<dyn PostCache>> {
    match config {
        CacheBackend::Redis { url, max_connections } => {
            Ok(Arc::new(RedisPostCache::new(url, *max_connections)?))
        }
        CacheBackend::InMemory => {
            tracing::warn!("REDIS_URL not set, using in-memory post cache");
            Ok(Arc::new(MemoryPostCache::new()))
        }
    }
}
