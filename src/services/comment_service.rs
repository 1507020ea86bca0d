use std::collections::HashMap;
use std::sync::Arc;
use chrono::Utc;
use uuid::Uuid;

use crate::db::repository::{CommentRepository, PostRepository, VoteRepository};
use crate::models::comment::{CommentResponse, CommentThread, CreateCommentRequest};
use crate::models::{current_vote, tally, Comment, CommentVote, CommentWithAuthor};
use crate::{AppError, Result};

pub struct CommentService {
    comment_repo: Arc<dyn CommentRepository>,
    post_repo: Arc<dyn PostRepository>,
    vote_repo: Arc<dyn VoteRepository>,
}

impl CommentService {
    pub fn new(
        comment_repo: Arc<dyn CommentRepository>,
        post_repo: Arc<dyn PostRepository>,
        vote_repo: Arc<dyn VoteRepository>,
    ) -> Self {
        Self { comment_repo, post_repo, vote_repo }
    }

    pub async fn create_comment(&self, author_id: Uuid, request: CreateCommentRequest) -> Result<Comment> {
        if self.post_repo.get_post_by_id(request.post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        if let Some(reply_to_id) = request.reply_to_id {
            let parent = self.comment_repo.get_comment_by_id(reply_to_id).await?;
            if !parent.is_some_and(|c| c.post_id == request.post_id) {
                return Err(AppError::NotFound("Comment to reply to not found".to_string()));
            }
        }

        let comment = Comment {
            id: Uuid::new_v4(),
            text: request.text,
            post_id: request.post_id,
            author_id,
            reply_to_id: request.reply_to_id,
            created_at: Utc::now(),
        };

        let created = self.comment_repo.create_comment(&comment).await?;
        tracing::debug!(comment_id = %created.id, post_id = %created.post_id, "created comment");
        Ok(created)
    }

    /// Top-level comments oldest first, each with its direct replies ordered
    /// by how many votes they received.
    pub async fn get_threads(&self, post_id: Uuid, viewer: Option<Uuid>) -> Result<Vec<CommentThread>> {
        if self.post_repo.get_post_by_id(post_id).await?.is_none() {
            return Err(AppError::NotFound("Post not found".to_string()));
        }

        let comments = self.comment_repo.get_comments_by_post_id(post_id).await?;
        let votes = self.vote_repo.get_comment_votes_for_post(post_id).await?;
        Ok(build_threads(comments, &votes, viewer))
    }
}

fn respond(entry: CommentWithAuthor, votes: &[&CommentVote], viewer: Option<Uuid>) -> CommentResponse {
    CommentResponse {
        votes_amount: tally(votes.iter().copied()),
        vote_count: votes.len(),
        current_vote: current_vote(votes.iter().copied(), viewer),
        comment: entry.comment,
        author: entry.author,
    }
}

fn votes_for<'a, 'v>(by_comment: &'a HashMap<Uuid, Vec<&'v CommentVote>>, id: &Uuid) -> &'a [&'v CommentVote] {
    by_comment.get(id).map(Vec::as_slice).unwrap_or(&[])
}

fn build_threads(comments: Vec<CommentWithAuthor>, votes: &[CommentVote], viewer: Option<Uuid>) -> Vec<CommentThread> {
    let mut votes_by_comment: HashMap<Uuid, Vec<&CommentVote>> = HashMap::new();
    for vote in votes {
        votes_by_comment.entry(vote.comment_id).or_default().push(vote);
    }

    let (top_level, replies): (Vec<_>, Vec<_>) =
        comments.into_iter().partition(|c| c.comment.reply_to_id.is_none());

    let mut replies_by_parent: HashMap<Uuid, Vec<CommentResponse>> = HashMap::new();
    for reply in replies {
        if let Some(parent) = reply.comment.reply_to_id {
            let id = reply.comment.id;
            let response = respond(reply, votes_for(&votes_by_comment, &id), viewer);
            replies_by_parent.entry(parent).or_default().push(response);
        }
    }

    top_level
        .into_iter()
        .map(|entry| {
            let mut replies = replies_by_parent.remove(&entry.comment.id).unwrap_or_default();
            // Stable, so equal vote counts keep creation order
            replies.sort_by(|a, b| b.vote_count.cmp(&a.vote_count));
            let id = entry.comment.id;
            CommentThread { comment: respond(entry, votes_for(&votes_by_comment, &id), viewer), replies }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::{InMemoryRepository, SubredditRepository, UserRepository};
    use crate::models::{Author, Post, Subreddit, User, VoteType};
    use chrono::Duration;

    fn entry(id: Uuid, reply_to_id: Option<Uuid>, minutes_ago: i64) -> CommentWithAuthor {
        CommentWithAuthor {
            comment: Comment {
                id,
                text: format!("comment {}", minutes_ago),
                post_id: Uuid::nil(),
                author_id: Uuid::nil(),
                reply_to_id,
                created_at: Utc::now() - Duration::minutes(minutes_ago),
            },
            author: Author { id: Uuid::nil(), username: "someone".to_string() },
        }
    }

    fn vote(comment_id: Uuid, user_id: Uuid, vote_type: VoteType) -> CommentVote {
        CommentVote { user_id, comment_id, vote_type }
    }

    #[test]
    fn test_replies_sorted_by_vote_count() {
        let root = Uuid::new_v4();
        let quiet = Uuid::new_v4();
        let popular = Uuid::new_v4();
        let viewer = Uuid::new_v4();

        let comments = vec![entry(root, None, 30), entry(quiet, Some(root), 20), entry(popular, Some(root), 10)];
        let votes = vec![
            vote(popular, Uuid::new_v4(), VoteType::Down),
            vote(popular, viewer, VoteType::Down),
            vote(quiet, Uuid::new_v4(), VoteType::Up),
            vote(root, viewer, VoteType::Up),
        ];

        let threads = build_threads(comments, &votes, Some(viewer));
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].comment.votes_amount, 1);
        assert_eq!(threads[0].comment.current_vote, Some(VoteType::Up));

        let replies = &threads[0].replies;
        assert_eq!(replies[0].comment.id, popular);
        assert_eq!(replies[0].votes_amount, -2);
        assert_eq!(replies[0].current_vote, Some(VoteType::Down));
        assert_eq!(replies[1].comment.id, quiet);
        assert_eq!(replies[1].current_vote, None);
    }

    #[tokio::test]
    async fn test_reply_target_must_exist_on_post() {
        let repo = Arc::new(InMemoryRepository::new());
        let user = repo
            .create_user(&User {
                id: Uuid::new_v4(),
                username: "commenter".to_string(),
                email: "commenter@example.com".to_string(),
                password_hash: String::new(),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let subreddit = repo
            .create_subreddit(&Subreddit {
                id: Uuid::new_v4(),
                name: "talk".to_string(),
                creator_id: Some(user.id),
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let post = repo
            .create_post(&Post {
                id: Uuid::new_v4(),
                title: "Discuss".to_string(),
                content: serde_json::Value::Null,
                subreddit_id: subreddit.id,
                author_id: user.id,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            })
            .await
            .unwrap();
        let service = CommentService::new(repo.clone(), repo.clone(), repo);

        let request = |reply_to_id| CreateCommentRequest { post_id: post.id, text: "hi".to_string(), reply_to_id };
        let root = service.create_comment(user.id, request(None)).await.unwrap();
        service.create_comment(user.id, request(Some(root.id))).await.unwrap();

        let orphan = service.create_comment(user.id, request(Some(Uuid::new_v4()))).await;
        assert!(matches!(orphan, Err(AppError::NotFound(_))));

        let unknown_post = service
            .create_comment(user.id, CreateCommentRequest { post_id: Uuid::new_v4(), text: "hi".to_string(), reply_to_id: None })
            .await;
        assert!(matches!(unknown_post, Err(AppError::NotFound(_))));

        let threads = service.get_threads(post.id, None).await.unwrap();
        assert_eq!(threads.len(), 1);
        assert_eq!(threads[0].replies.len(), 1);
    }
}
