use std::sync::Arc;
use uuid::Uuid;

use crate::cache::{CachedPost, PostCache};
use crate::db::repository::{CommentRepository, PostRepository, VoteRepository};
use crate::models::vote::{CommentVoteRequest, PostVoteRequest};
use crate::models::{tally, CommentVote, PostWithAuthor, Vote, VoteOutcome, VoteType};
use crate::{AppError, Result};

/// Voting the stored type again removes the vote, any other type replaces it.
pub fn toggle(existing: Option<VoteType>, requested: VoteType) -> VoteOutcome {
    match existing {
        Some(current) if current == requested => VoteOutcome::Deleted,
        Some(_) => VoteOutcome::Updated,
        None => VoteOutcome::Created,
    }
}

/// Service for up/down votes on posts and comments
pub struct VoteService {
    vote_repo: Arc<dyn VoteRepository>,
    post_repo: Arc<dyn PostRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    cache: Arc<dyn PostCache>,
    cache_after_upvotes: i64,
}

impl VoteService {
    pub fn new(
        vote_repo: Arc<dyn VoteRepository>,
        post_repo: Arc<dyn PostRepository>,
        comment_repo: Arc<dyn CommentRepository>,
        cache: Arc<dyn PostCache>,
        cache_after_upvotes: i64,
    ) -> Self {
        Self { vote_repo, post_repo, comment_repo, cache, cache_after_upvotes }
    }

    pub async fn vote_on_post(&self, user_id: Uuid, request: PostVoteRequest) -> Result<VoteOutcome> {
        let post = self
            .post_repo
            .get_post_with_author(request.post_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Post not found".to_string()))?;

        let existing = self.vote_repo.get_post_vote(user_id, request.post_id).await?;
        let outcome = toggle(existing.map(|v| v.vote_type), request.vote_type);

        match outcome {
            VoteOutcome::Deleted => {
                self.vote_repo.delete_post_vote(user_id, request.post_id).await?;
                return Ok(outcome);
            }
            VoteOutcome::Updated => {
                self.vote_repo
                    .update_post_vote(user_id, request.post_id, request.vote_type)
                    .await?;
            }
            VoteOutcome::Created => {
                self.vote_repo
                    .create_post_vote(&Vote { user_id, post_id: request.post_id, vote_type: request.vote_type })
                    .await?;
            }
        }

        let votes = self.vote_repo.get_post_votes(request.post_id).await?;
        let score = tally(&votes);
        if score >= self.cache_after_upvotes {
            self.cache_summary(&post, request.vote_type).await;
        }

        tracing::debug!(post_id = %request.post_id, user_id = %user_id, ?outcome, score, "post vote");
        Ok(outcome)
    }

    pub async fn vote_on_comment(&self, user_id: Uuid, request: CommentVoteRequest) -> Result<VoteOutcome> {
        if self.comment_repo.get_comment_by_id(request.comment_id).await?.is_none() {
            return Err(AppError::NotFound("Comment not found".to_string()));
        }

        let existing = self.vote_repo.get_comment_vote(user_id, request.comment_id).await?;
        let outcome = toggle(existing.map(|v| v.vote_type), request.vote_type);

        match outcome {
            VoteOutcome::Deleted => {
                self.vote_repo.delete_comment_vote(user_id, request.comment_id).await?
            }
            VoteOutcome::Updated => {
                self.vote_repo
                    .update_comment_vote(user_id, request.comment_id, request.vote_type)
                    .await?
            }
            VoteOutcome::Created => {
                self.vote_repo
                    .create_comment_vote(&CommentVote {
                        user_id,
                        comment_id: request.comment_id,
                        vote_type: request.vote_type,
                    })
                    .await?
            }
        }

        Ok(outcome)
    }

    // The vote is already stored; a failed cache write only costs a cache miss later.
    async fn cache_summary(&self, post: &PostWithAuthor, vote_type: VoteType) {
        let summary = CachedPost {
            id: post.post.id,
            title: post.post.title.clone(),
            author_username: post.author.username.clone(),
            content: post.post.content.clone(),
            current_vote: Some(vote_type),
            created_at: post.post.created_at,
        };

        if let Err(e) = self.cache.set_post(&summary).await {
            tracing::warn!(post_id = %post.post.id, error = %e, "failed to cache post summary");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use crate::cache::memory::UnreachablePostCache;
    use crate::cache::MemoryPostCache;
    use crate::db::repository::{InMemoryRepository, SubredditRepository, UserRepository};
    use crate::models::{Comment, Post, Subreddit, User};

    struct Fixture {
        repo: Arc<InMemoryRepository>,
        cache: Arc<MemoryPostCache>,
        service: VoteService,
        post: Post,
    }

    async fn user(repo: &InMemoryRepository, name: &str) -> User {
        repo.create_user(&User {
            id: Uuid::new_v4(),
            username: name.to_string(),
            email: format!("{}@example.com", name),
            password_hash: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
        .await
        .unwrap()
    }

    async fn fixture(threshold: i64) -> Fixture {
        let repo = Arc::new(InMemoryRepository::new());
        let cache = Arc::new(MemoryPostCache::new());
        let author = user(&repo, "author").await;
        let subreddit = repo
            .create_subreddit(&Subreddit {
                id: Uuid::new_v4(),
                name: "votes".to_string(),
                creator_id: Some(author.id),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let post = repo
            .create_post(&Post {
                id: Uuid::new_v4(),
                title: "Vote on me".to_string(),
                content: serde_json::json!({"blocks": []}),
                subreddit_id: subreddit.id,
                author_id: author.id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = VoteService::new(repo.clone(), repo.clone(), repo.clone(), cache.clone(), threshold);
        Fixture { repo, cache, service, post }
    }

    fn up(post_id: Uuid) -> PostVoteRequest {
        PostVoteRequest { post_id, vote_type: VoteType::Up }
    }

    fn down(post_id: Uuid) -> PostVoteRequest {
        PostVoteRequest { post_id, vote_type: VoteType::Down }
    }

    #[test]
    fn test_toggle() {
        assert_eq!(toggle(None, VoteType::Up), VoteOutcome::Created);
        assert_eq!(toggle(Some(VoteType::Up), VoteType::Up), VoteOutcome::Deleted);
        assert_eq!(toggle(Some(VoteType::Up), VoteType::Down), VoteOutcome::Updated);
    }

    #[tokio::test]
    async fn test_same_vote_twice_removes_it() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;

        assert_eq!(f.service.vote_on_post(voter.id, up(f.post.id)).await.unwrap(), VoteOutcome::Created);
        assert_eq!(f.service.vote_on_post(voter.id, up(f.post.id)).await.unwrap(), VoteOutcome::Deleted);
        assert!(f.repo.get_post_votes(f.post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_switching_vote_keeps_one_record() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;

        f.service.vote_on_post(voter.id, up(f.post.id)).await.unwrap();
        assert_eq!(f.service.vote_on_post(voter.id, down(f.post.id)).await.unwrap(), VoteOutcome::Updated);

        let votes = f.repo.get_post_votes(f.post.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].vote_type, VoteType::Down);
    }

    #[tokio::test]
    async fn test_cache_written_at_threshold() {
        let f = fixture(2).await;
        let first = user(&f.repo, "first").await;
        let second = user(&f.repo, "second").await;

        f.service.vote_on_post(first.id, up(f.post.id)).await.unwrap();
        assert!(f.cache.is_empty());

        f.service.vote_on_post(second.id, up(f.post.id)).await.unwrap();
        let cached = f.cache.get_post(f.post.id).await.unwrap().unwrap();
        assert_eq!(cached.author_username, "author");
        assert_eq!(cached.current_vote, Some(VoteType::Up));
    }

    #[tokio::test]
    async fn test_downvote_does_not_cache() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;
        f.service.vote_on_post(voter.id, down(f.post.id)).await.unwrap();
        assert!(f.cache.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_targets_are_not_found() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;

        let post = f.service.vote_on_post(voter.id, up(Uuid::new_v4())).await;
        assert!(matches!(post, Err(AppError::NotFound(_))));

        let comment = f
            .service
            .vote_on_comment(voter.id, CommentVoteRequest { comment_id: Uuid::new_v4(), vote_type: VoteType::Up })
            .await;
        assert!(matches!(comment, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_comment_vote_toggle() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;
        let comment = f
            .repo
            .create_comment(&Comment {
                id: Uuid::new_v4(),
                text: "nice".to_string(),
                post_id: f.post.id,
                author_id: voter.id,
                reply_to_id: None,
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        let request = |vote_type| CommentVoteRequest { comment_id: comment.id, vote_type };

        assert_eq!(f.service.vote_on_comment(voter.id, request(VoteType::Down)).await.unwrap(), VoteOutcome::Created);
        assert_eq!(f.service.vote_on_comment(voter.id, request(VoteType::Up)).await.unwrap(), VoteOutcome::Updated);
        assert_eq!(f.service.vote_on_comment(voter.id, request(VoteType::Up)).await.unwrap(), VoteOutcome::Deleted);
        assert!(f.repo.get_comment_votes_for_post(f.post.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_vote_stored_when_cache_write_fails() {
        let f = fixture(1).await;
        let voter = user(&f.repo, "voter").await;
        let service = VoteService::new(f.repo.clone(), f.repo.clone(), f.repo.clone(), Arc::new(UnreachablePostCache), 1);

        assert_eq!(service.vote_on_post(voter.id, up(f.post.id)).await.unwrap(), VoteOutcome::Created);
        let votes = f.repo.get_post_votes(f.post.id).await.unwrap();
        assert_eq!(votes.len(), 1);
        assert_eq!(votes[0].user_id, voter.id);
    }
}
