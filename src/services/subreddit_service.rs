use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::db::repository::{PostRepository, SubredditRepository};
use crate::models::subreddit::{SubredditPage, SubredditSearchResult};
use crate::models::{FeedFilter, Subreddit, Subscription};
use crate::{AppError, Result};

/// Search results returned per query.
pub const SEARCH_LIMIT: u32 = 5;

pub struct SubredditService {
    subreddit_repo: Arc<dyn SubredditRepository>,
    post_repo: Arc<dyn PostRepository>,
}

impl SubredditService {
    pub fn new(subreddit_repo: Arc<dyn SubredditRepository>, post_repo: Arc<dyn PostRepository>) -> Self {
        Self { subreddit_repo, post_repo }
    }

    /// Creates the subreddit and subscribes its creator to it.
    pub async fn create_subreddit(&self, creator_id: Uuid, name: &str) -> Result<Subreddit> {
        if self.subreddit_repo.get_subreddit_by_name(name).await?.is_some() {
            return Err(AppError::Conflict("Subreddit already exists".to_string()));
        }

        let now = Utc::now();
        let subreddit = self
            .subreddit_repo
            .create_subreddit(&Subreddit {
                id: Uuid::new_v4(),
                name: name.to_string(),
                creator_id: Some(creator_id),
                created_at: now,
                updated_at: now,
            })
            .await?;

        self.subreddit_repo
            .create_subscription(&Subscription { user_id: creator_id, subreddit_id: subreddit.id })
            .await?;

        tracing::info!(subreddit = %subreddit.name, creator_id = %creator_id, "created subreddit");
        Ok(subreddit)
    }

    pub async fn subscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Uuid> {
        if self.subreddit_repo.get_subreddit_by_id(subreddit_id).await?.is_none() {
            return Err(AppError::NotFound("Subreddit not found".to_string()));
        }
        if self.subreddit_repo.get_subscription(user_id, subreddit_id).await?.is_some() {
            return Err(AppError::BadRequest(
                "You are already subscribed to this subreddit".to_string(),
            ));
        }

        self.subreddit_repo
            .create_subscription(&Subscription { user_id, subreddit_id })
            .await?;
        Ok(subreddit_id)
    }

    /// Creators cannot leave their own subreddit.
    pub async fn unsubscribe(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Uuid> {
        if self.subreddit_repo.get_subscription(user_id, subreddit_id).await?.is_none() {
            return Err(AppError::BadRequest("Not subscribed".to_string()));
        }

        let subreddit = self.subreddit_repo.get_subreddit_by_id(subreddit_id).await?;
        if subreddit.is_some_and(|s| s.creator_id == Some(user_id)) {
            return Err(AppError::BadRequest("Cannot unsubscribe from own subreddit".to_string()));
        }

        self.subreddit_repo.delete_subscription(user_id, subreddit_id).await?;
        Ok(subreddit_id)
    }

    pub async fn search(&self, query: Option<&str>) -> Result<Vec<SubredditSearchResult>> {
        match query {
            Some(q) if !q.is_empty() => self.subreddit_repo.search_by_prefix(q, SEARCH_LIMIT).await,
            _ => Err(AppError::BadRequest("Invalid query".to_string())),
        }
    }

    pub async fn get_page(&self, name: &str, viewer: Option<Uuid>, first_page_size: u32) -> Result<SubredditPage> {
        let subreddit = self
            .subreddit_repo
            .get_subreddit_by_name(name)
            .await?
            .ok_or_else(|| AppError::NotFound("Subreddit not found".to_string()))?;

        let member_count = self.subreddit_repo.count_subscribers(subreddit.id).await?;
        let is_subscribed = match viewer {
            Some(user_id) => self.subreddit_repo.get_subscription(user_id, subreddit.id).await?.is_some(),
            None => false,
        };
        let is_creator = viewer.is_some() && subreddit.creator_id == viewer;

        let posts = self
            .post_repo
            .get_feed(&FeedFilter::Subreddit(subreddit.name.clone()), first_page_size, 0)
            .await?;

        Ok(SubredditPage { subreddit, member_count, is_subscribed, is_creator, posts })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{InMemoryRepository, UserRepository};
    use crate::models::User;

    async fn setup() -> (SubredditService, User, User) {
        let repo = Arc::new(InMemoryRepository::new());
        let mut users = Vec::new();
        for name in ["owner", "member"] {
            let user = repo
                .create_user(&User {
                    id: Uuid::new_v4(),
                    username: name.to_string(),
                    email: format!("{}@example.com", name),
                    password_hash: String::new(),
                    created_at: Utc::now(),
                    updated_at: Utc::now(),
                })
                .await
                .unwrap();
            users.push(user);
        }
        let member = users.pop().unwrap();
        let owner = users.pop().unwrap();
        (SubredditService::new(repo.clone(), repo), owner, member)
    }

    #[tokio::test]
    async fn test_create_subscribes_creator() {
        let (service, owner, _) = setup().await;
        let subreddit = service.create_subreddit(owner.id, "rustlang").await.unwrap();

        let page = service.get_page("rustlang", Some(owner.id), 2).await.unwrap();
        assert_eq!(page.member_count, 1);
        assert!(page.is_subscribed);
        assert!(page.is_creator);
        assert_eq!(page.subreddit.id, subreddit.id);

        let again = service.create_subreddit(owner.id, "rustlang").await;
        assert!(matches!(again, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_subscription_rules() {
        let (service, owner, member) = setup().await;
        let subreddit = service.create_subreddit(owner.id, "rustlang").await.unwrap();

        let not_yet = service.unsubscribe(member.id, subreddit.id).await;
        assert!(matches!(not_yet, Err(AppError::BadRequest(msg)) if msg == "Not subscribed"));

        assert_eq!(service.subscribe(member.id, subreddit.id).await.unwrap(), subreddit.id);
        assert!(matches!(service.subscribe(member.id, subreddit.id).await, Err(AppError::BadRequest(_))));
        assert_eq!(service.unsubscribe(member.id, subreddit.id).await.unwrap(), subreddit.id);

        let own = service.unsubscribe(owner.id, subreddit.id).await;
        assert!(matches!(own, Err(AppError::BadRequest(msg)) if msg == "Cannot unsubscribe from own subreddit"));

        let unknown = service.subscribe(member.id, Uuid::new_v4()).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_limits_results() {
        let (service, owner, _) = setup().await;
        for i in 0..7 {
            service.create_subreddit(owner.id, &format!("gaming{}", i)).await.unwrap();
        }
        service.create_subreddit(owner.id, "cooking").await.unwrap();

        let results = service.search(Some("gam")).await.unwrap();
        assert_eq!(results.len(), 5);
        assert!(results.iter().all(|r| r.subreddit.name.starts_with("gam")));

        assert!(matches!(service.search(Some("")).await, Err(AppError::BadRequest(_))));
        assert!(matches!(service.search(None).await, Err(AppError::BadRequest(_))));
    }
}
