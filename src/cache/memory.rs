use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use crate::cache::{post_key, CachedPost, PostCache};
use crate::{AppError, Result};

/// Process-local stand-in for Redis. Entries are stored as field maps, the
/// same shape `HGETALL` returns.
#[derive(Clone, Default)]
pub struct MemoryPostCache {
    hashes: Arc<Mutex<HashMap<String, HashMap<String, String>>>>,
}

impl MemoryPostCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.hashes.lock().map(|h| h.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned() -> AppError {
    AppError::CacheError("In-memory cache lock poisoned".to_string())
}

#[async_trait]
impl PostCache for MemoryPostCache {
    async fn set_post(&self, post: &CachedPost) -> Result<()> {
        let fields = post.to_fields()?;
        let mut hashes = self.hashes.lock().map_err(|_| poisoned())?;
        let hash = hashes.entry(post_key(post.id)).or_default();
        for (name, value) in fields {
            hash.insert(name.to_string(), value);
        }
        Ok(())
    }

    async fn get_post(&self, post_id: Uuid) -> Result<Option<CachedPost>> {
        let hashes = self.hashes.lock().map_err(|_| poisoned())?;
        match hashes.get(&post_key(post_id)) {
            Some(fields) => CachedPost::from_fields(fields),
            None => Ok(None),
        }
    }

    async fn health_check(&self) -> Result<()> {
        self.hashes.lock().map(|_| ()).map_err(|_| poisoned())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// A cache whose server is down: every call fails.
#[cfg(test)]
pub(crate) struct UnreachablePostCache;

#[cfg(test)]
#[async_trait]
impl PostCache for UnreachablePostCache {
    async fn set_post(&self, _post: &CachedPost) -> Result<()> {
        Err(AppError::CacheError("Connection refused".to_string()))
    }

    async fn get_post(&self, _post_id: Uuid) -> Result<Option<CachedPost>> {
        Err(AppError::CacheError("Connection refused".to_string()))
    }

    async fn health_check(&self) -> Result<()> {
        Err(AppError::CacheError("Connection refused".to_string()))
    }

    fn backend(&self) -> &'static str {
        "unreachable"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VoteType;
    use chrono::Utc;

    #[tokio::test]
    async fn test_set_then_get_replaces_fields() {
        let cache = MemoryPostCache::new();
        let mut post = CachedPost {
            id: Uuid::new_v4(),
            title: "First".to_string(),
            author_username: "bob".to_string(),
            content: serde_json::Value::Null,
            current_vote: Some(VoteType::Up),
            created_at: Utc::now(),
        };

        assert!(cache.get_post(post.id).await.unwrap().is_none());

        cache.set_post(&post).await.unwrap();
        post.current_vote = Some(VoteType::Down);
        cache.set_post(&post).await.unwrap();

        let cached = cache.get_post(post.id).await.unwrap().unwrap();
        assert_eq!(cached.current_vote, Some(VoteType::Down));
        assert_eq!(cache.len(), 1);
    }
}
