use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::cache::PostCache;
use crate::db::repository::{PostRepository, SubredditRepository, VoteRepository};
use crate::models::post::{CreatePostRequest, PostDetail, PostSource};
use crate::models::{current_vote, tally, FeedFilter, FeedPost, PageRequest, Post};
use crate::{AppError, Result};

pub struct PostService {
    post_repo: Arc<dyn PostRepository>,
    subreddit_repo: Arc<dyn SubredditRepository>,
    vote_repo: Arc<dyn VoteRepository>,
    cache: Arc<dyn PostCache>,
}

impl PostService {
    pub fn new(
        post_repo: Arc<dyn PostRepository>,
        subreddit_repo: Arc<dyn SubredditRepository>,
        vote_repo: Arc<dyn VoteRepository>,
        cache: Arc<dyn PostCache>,
    ) -> Self {
        Self { post_repo, subreddit_repo, vote_repo, cache }
    }

    /// Only subscribers may post to a subreddit.
    pub async fn create_post(&self, author_id: Uuid, request: CreatePostRequest) -> Result<Post> {
        if self
            .subreddit_repo
            .get_subscription(author_id, request.subreddit_id)
            .await?
            .is_none()
        {
            return Err(AppError::Forbidden("Subscribe to post".to_string()));
        }

        let now = Utc::now();
        let post = Post {
            id: Uuid::new_v4(),
            title: request.title,
            content: request.content,
            subreddit_id: request.subreddit_id,
            author_id,
            created_at: now,
            updated_at: now,
        };

        let created = self.post_repo.create_post(&post).await?;
        tracing::info!(post_id = %created.id, subreddit_id = %created.subreddit_id, "created post");
        Ok(created)
    }

    /// A named subreddit wins over the viewer's follows. Anonymous viewers
    /// without a subreddit see every post.
    pub async fn get_feed(&self, viewer: Option<Uuid>, subreddit_name: Option<&str>, page: PageRequest) -> Result<Vec<FeedPost>> {
        let followed = match (viewer, subreddit_name) {
            (Some(user_id), None) | (Some(user_id), Some("")) => {
                Some(self.subreddit_repo.get_subscribed_subreddit_ids(user_id).await?)
            }
            _ => None,
        };

        let filter = FeedFilter::build(subreddit_name, followed);
        tracing::debug!(?filter, limit = page.limit, page = page.page, "loading feed");
        self.post_repo.get_feed(&filter, page.limit, page.offset()).await
    }

    /// Reads the summary from the cache first, falling back to the store.
    /// The score and the viewer's vote always come from the store.
    pub async fn get_post_detail(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<PostDetail> {
        let cached = match self.cache.get_post(post_id).await {
            Ok(hit) => hit,
            Err(e) => {
                tracing::warn!(post_id = %post_id, error = %e, "post cache read failed, using database");
                None
            }
        };

        let mut detail = match cached {
            Some(post) => PostDetail {
                id: post.id,
                title: post.title,
                content: post.content,
                author_username: post.author_username,
                created_at: post.created_at,
                votes_amount: 0,
                current_vote: None,
                source: PostSource::Cache,
            },
            None => {
                let found = self
                    .post_repo
                    .get_post_with_author(post_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;
                PostDetail {
                    id: found.post.id,
                    title: found.post.title,
                    content: found.post.content,
                    author_username: found.author.username,
                    created_at: found.post.created_at,
                    votes_amount: 0,
                    current_vote: None,
                    source: PostSource::Database,
                }
            }
        };

        let votes = self.vote_repo.get_post_votes(post_id).await?;
        detail.votes_amount = tally(&votes);
        detail.current_vote = current_vote(&votes, viewer);
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::memory::UnreachablePostCache;
    use crate::cache::{CachedPost, MemoryPostCache};
    use crate::db::repository::{InMemoryRepository, UserRepository};
    use crate::models::{Subreddit, Subscription, User};

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        cache: Arc<MemoryPostCache>,
        service: PostService,
        user: User,
        subreddit: Subreddit,
    }

    async fn fixture() -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let cache = Arc::new(MemoryPostCache::new());
        let user = repo
            .create_user(&User {
                id: Uuid::new_v4(),
                username: "poster".to_string(),
                email: "poster@example.com".to_string(),
                password_hash: String::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let subreddit = repo
            .create_subreddit(&Subreddit {
                id: Uuid::new_v4(),
                name: "news".to_string(),
                creator_id: Some(user.id),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = PostService::new(repo.clone(), repo.clone(), repo.clone(), cache.clone());
        Fixture { repo, cache, service, user, subreddit }
    }

    fn request(subreddit_id: Uuid) -> CreatePostRequest {
        CreatePostRequest {
            title: "Breaking".to_string(),
            content: serde_json::json!({"blocks": []}),
            subreddit_id,
        }
    }

    #[tokio::test]
    async fn test_create_requires_subscription() {
        let f = fixture().await;
        let denied = f.service.create_post(f.user.id, request(f.subreddit.id)).await;
        assert!(matches!(denied, Err(AppError::Forbidden(_))));

        f.repo
            .create_subscription(&Subscription { user_id: f.user.id, subreddit_id: f.subreddit.id })
            .await
            .unwrap();
        let post = f.service.create_post(f.user.id, request(f.subreddit.id)).await.unwrap();
        assert_eq!(post.author_id, f.user.id);
    }

    #[tokio::test]
    async fn test_feed_for_viewer_without_follows_is_empty() {
        let f = fixture().await;
        f.repo
            .create_subscription(&Subscription { user_id: f.user.id, subreddit_id: f.subreddit.id })
            .await
            .unwrap();
        f.service.create_post(f.user.id, request(f.subreddit.id)).await.unwrap();
        let page = PageRequest { limit: 10, page: 1 };

        assert_eq!(f.service.get_feed(None, None, page).await.unwrap().len(), 1);
        assert_eq!(f.service.get_feed(Some(f.user.id), None, page).await.unwrap().len(), 1);

        let stranger = Uuid::new_v4();
        assert!(f.service.get_feed(Some(stranger), None, page).await.unwrap().is_empty());
        assert_eq!(f.service.get_feed(Some(stranger), Some("news"), page).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_detail_prefers_cache() {
        let f = fixture().await;
        f.repo
            .create_subscription(&Subscription { user_id: f.user.id, subreddit_id: f.subreddit.id })
            .await
            .unwrap();
        let post = f.service.create_post(f.user.id, request(f.subreddit.id)).await.unwrap();

        let from_db = f.service.get_post_detail(post.id, None).await.unwrap();
        assert_eq!(from_db.source, PostSource::Database);
        assert_eq!(from_db.author_username, "poster");

        f.cache
            .set_post(&CachedPost {
                id: post.id,
                title: "Cached title".to_string(),
                author_username: "poster".to_string(),
                content: post.content.clone(),
                current_vote: None,
                created_at: post.created_at,
            })
            .await
            .unwrap();
        let from_cache = f.service.get_post_detail(post.id, None).await.unwrap();
        assert_eq!(from_cache.source, PostSource::Cache);
        assert_eq!(from_cache.title, "Cached title");

        let missing = f.service.get_post_detail(Uuid::new_v4(), None).await;
        assert!(matches!(missing, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_detail_falls_back_when_cache_is_down() {
        let f = fixture().await;
        f.repo
            .create_subscription(&Subscription { user_id: f.user.id, subreddit_id: f.subreddit.id })
            .await
            .unwrap();
        let post = f.service.create_post(f.user.id, request(f.subreddit.id)).await.unwrap();

        let service = PostService::new(f.repo.clone(), f.repo.clone(), f.repo.clone(), Arc::new(UnreachablePostCache));
        let detail = service.get_post_detail(post.id, None).await.unwrap();
        assert_eq!(detail.source, PostSource::Database);
        assert_eq!(detail.title, "Breaking");
    }
}
