// Repository trait abstractions for database operations
use crate::models::subreddit::{SubredditCounts, SubredditSearchResult};
use crate::models::{
    Author, Comment, CommentVote, CommentWithAuthor, FeedFilter, FeedPost, Post, PostWithAuthor,
    Subreddit, Subscription, User, Vote, VoteType,
};
use crate::models::post::SubredditRef;
use crate::{AppError, Result};
use uuid::Uuid;
use async_trait::async_trait;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create_user(&self, user: &User) -> Result<User>;
    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    async fn update_username(&self, id: Uuid, username: &str) -> Result<User>;
}

#[async_trait]
pub trait SubredditRepository: Send + Sync {
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit>;
    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>>;
    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>>;
    async fn search_by_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<SubredditSearchResult>>;
    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64>;
    async fn get_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Option<Subscription>>;
    async fn create_subscription(&self, subscription: &Subscription) -> Result<()>;
    async fn delete_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<()>;
    async fn get_subscribed_subreddit_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>>;
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn create_post(&self, post: &Post) -> Result<Post>;
    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>>;
    async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>>;
    /// Newest first, `LIMIT limit OFFSET offset`.
    async fn get_feed(&self, filter: &FeedFilter, limit: u32, offset: u32) -> Result<Vec<FeedPost>>;
}

#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment>;
    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>>;
    /// Oldest first.
    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>>;
}

#[async_trait]
pub trait VoteRepository: Send + Sync {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>>;
    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<Vote>>;
    async fn create_post_vote(&self, vote: &Vote) -> Result<()>;
    async fn update_post_vote(&self, user_id: Uuid, post_id: Uuid, vote_type: VoteType) -> Result<()>;
    async fn delete_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()>;

    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>>;
    /// Votes on every comment of `post_id`.
    async fn get_comment_votes_for_post(&self, post_id: Uuid) -> Result<Vec<CommentVote>>;
    async fn create_comment_vote(&self, vote: &CommentVote) -> Result<()>;
    async fn update_comment_vote(&self, user_id: Uuid, comment_id: Uuid, vote_type: VoteType) -> Result<()>;
    async fn delete_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()>;
}

// In-memory implementation for development and tests (no DATABASE_URL)
use std::sync::{Arc, Mutex, MutexGuard};
use std::collections::HashMap;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    subreddits: HashMap<Uuid, Subreddit>,
    subscriptions: Vec<Subscription>,
    posts: Vec<Post>,
    comments: Vec<Comment>,
    votes: Vec<Vote>,
    comment_votes: Vec<CommentVote>,
}

impl Tables {
    fn author(&self, user_id: Uuid) -> Result<Author> {
        self.users
            .get(&user_id)
            .map(Author::from)
            .ok_or_else(|| AppError::DatabaseError(format!("Dangling author reference {}", user_id)))
    }
}

/// All tables behind one lock, so multi-table reads see a consistent snapshot.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::InternalError("In-memory store lock poisoned".to_string()))
    }
}

fn unique_violation(what: &str) -> AppError {
    AppError::Conflict(format!("{} already exists", what))
}

#[async_trait]
impl UserRepository for InMemoryRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.username == user.username) {
            return Err(unique_violation("Username"));
        }
        if tables.users.values().any(|u| u.email == user.email) {
            return Err(unique_violation("Email"));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.tables()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self.tables()?.users.values().find(|u| u.username == username).cloned())
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<User> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|u| u.username == username && u.id != id) {
            return Err(unique_violation("Username"));
        }
        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.username = username.to_string();
        user.updated_at = chrono::Utc::now();
        Ok(user.clone())
    }
}

#[async_trait]
impl SubredditRepository for InMemoryRepository {
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit> {
        let mut tables = self.tables()?;
        if tables.subreddits.values().any(|s| s.name == subreddit.name) {
            return Err(unique_violation("Subreddit"));
        }
        tables.subreddits.insert(subreddit.id, subreddit.clone());
        Ok(subreddit.clone())
    }

    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>> {
        Ok(self.tables()?.subreddits.get(&id).cloned())
    }

    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>> {
        Ok(self.tables()?.subreddits.values().find(|s| s.name == name).cloned())
    }

    async fn search_by_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<SubredditSearchResult>> {
        let tables = self.tables()?;
        let mut matches: Vec<&Subreddit> = tables
            .subreddits
            .values()
            .filter(|s| s.name.starts_with(prefix))
            .collect();
        matches.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(matches
            .into_iter()
            .take(limit as usize)
            .map(|s| SubredditSearchResult {
                subreddit: s.clone(),
                count: SubredditCounts {
                    posts: tables.posts.iter().filter(|p| p.subreddit_id == s.id).count() as i64,
                    subscribers: tables.subscriptions.iter().filter(|sub| sub.subreddit_id == s.id).count() as i64,
                },
            })
            .collect())
    }

    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64> {
        let tables = self.tables()?;
        Ok(tables.subscriptions.iter().filter(|s| s.subreddit_id == subreddit_id).count() as i64)
    }

    async fn get_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Option<Subscription>> {
        let tables = self.tables()?;
        Ok(tables
            .subscriptions
            .iter()
            .find(|s| s.user_id == user_id && s.subreddit_id == subreddit_id)
            .cloned())
    }

    async fn create_subscription(&self, subscription: &Subscription) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.subscriptions.contains(subscription) {
            return Err(unique_violation("Subscription"));
        }
        tables.subscriptions.push(subscription.clone());
        Ok(())
    }

    async fn delete_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        tables
            .subscriptions
            .retain(|s| !(s.user_id == user_id && s.subreddit_id == subreddit_id));
        Ok(())
    }

    async fn get_subscribed_subreddit_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let tables = self.tables()?;
        Ok(tables
            .subscriptions
            .iter()
            .filter(|s| s.user_id == user_id)
            .map(|s| s.subreddit_id)
            .collect())
    }
}

#[async_trait]
impl PostRepository for InMemoryRepository {
    async fn create_post(&self, post: &Post) -> Result<Post> {
        let mut tables = self.tables()?;
        tables.posts.push(post.clone());
        Ok(post.clone())
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        Ok(self.tables()?.posts.iter().find(|p| p.id == id).cloned())
    }

    async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
        let tables = self.tables()?;
        match tables.posts.iter().find(|p| p.id == id) {
            Some(post) => Ok(Some(PostWithAuthor {
                post: post.clone(),
                author: tables.author(post.author_id)?,
            })),
            None => Ok(None),
        }
    }

    async fn get_feed(&self, filter: &FeedFilter, limit: u32, offset: u32) -> Result<Vec<FeedPost>> {
        let tables = self.tables()?;

        let mut posts: Vec<&Post> = tables
            .posts
            .iter()
            .filter(|post| match filter {
                FeedFilter::All => true,
                FeedFilter::Subreddit(name) => tables
                    .subreddits
                    .get(&post.subreddit_id)
                    .is_some_and(|s| &s.name == name),
                FeedFilter::Subreddits(ids) => ids.contains(&post.subreddit_id),
            })
            .collect();

        // Sort by created_at descending (newest first)
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        posts
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .map(|post| -> Result<FeedPost> {
                let subreddit = tables.subreddits.get(&post.subreddit_id).ok_or_else(|| {
                    AppError::DatabaseError(format!("Dangling subreddit reference {}", post.subreddit_id))
                })?;
                Ok(FeedPost {
                    post: post.clone(),
                    author: tables.author(post.author_id)?,
                    subreddit: SubredditRef { id: subreddit.id, name: subreddit.name.clone() },
                    votes: tables.votes.iter().filter(|v| v.post_id == post.id).cloned().collect(),
                    comment_count: tables.comments.iter().filter(|c| c.post_id == post.id).count() as i64,
                })
            })
            .collect()
    }
}

#[async_trait]
impl CommentRepository for InMemoryRepository {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        let mut tables = self.tables()?;
        tables.comments.push(comment.clone());
        Ok(comment.clone())
    }

    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        Ok(self.tables()?.comments.iter().find(|c| c.id == id).cloned())
    }

    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let tables = self.tables()?;
        let mut comments: Vec<&Comment> = tables.comments.iter().filter(|c| c.post_id == post_id).collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));

        comments
            .into_iter()
            .map(|comment| -> Result<CommentWithAuthor> {
                Ok(CommentWithAuthor {
                    comment: comment.clone(),
                    author: tables.author(comment.author_id)?,
                })
            })
            .collect()
    }
}

#[async_trait]
impl VoteRepository for InMemoryRepository {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>> {
        let tables = self.tables()?;
        Ok(tables.votes.iter().find(|v| v.user_id == user_id && v.post_id == post_id).cloned())
    }

    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<Vote>> {
        let tables = self.tables()?;
        Ok(tables.votes.iter().filter(|v| v.post_id == post_id).cloned().collect())
    }

    async fn create_post_vote(&self, vote: &Vote) -> Result<()> {
        let mut tables = self.tables()?;
        if tables.votes.iter().any(|v| v.user_id == vote.user_id && v.post_id == vote.post_id) {
            return Err(unique_violation("Vote"));
        }
        tables.votes.push(vote.clone());
        Ok(())
    }

    async fn update_post_vote(&self, user_id: Uuid, post_id: Uuid, vote_type: VoteType) -> Result<()> {
        let mut tables = self.tables()?;
        let vote = tables
            .votes
            .iter_mut()
            .find(|v| v.user_id == user_id && v.post_id == post_id)
            .ok_or_else(|| AppError::NotFound("Vote not found".to_string()))?;
        vote.vote_type = vote_type;
        Ok(())
    }

    async fn delete_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        tables.votes.retain(|v| !(v.user_id == user_id && v.post_id == post_id));
        Ok(())
    }

    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>> {
        let tables = self.tables()?;
        Ok(tables
            .comment_votes
            .iter()
            .find(|v| v.user_id == user_id && v.comment_id == comment_id)
            .cloned())
    }

    async fn get_comment_votes_for_post(&self, post_id: Uuid) -> Result<Vec<CommentVote>> {
        let tables = self.tables()?;
        let comment_ids: Vec<Uuid> = tables
            .comments
            .iter()
            .filter(|c| c.post_id == post_id)
            .map(|c| c.id)
            .collect();
        Ok(tables
            .comment_votes
            .iter()
            .filter(|v| comment_ids.contains(&v.comment_id))
            .cloned()
            .collect())
    }

    async fn create_comment_vote(&self, vote: &CommentVote) -> Result<()> {
        let mut tables = self.tables()?;
        if tables
            .comment_votes
            .iter()
            .any(|v| v.user_id == vote.user_id && v.comment_id == vote.comment_id)
        {
            return Err(unique_violation("Comment vote"));
        }
        tables.comment_votes.push(vote.clone());
        Ok(())
    }

    async fn update_comment_vote(&self, user_id: Uuid, comment_id: Uuid, vote_type: VoteType) -> Result<()> {
        let mut tables = self.tables()?;
        let vote = tables
            .comment_votes
            .iter_mut()
            .find(|v| v.user_id == user_id && v.comment_id == comment_id)
            .ok_or_else(|| AppError::NotFound("Comment vote not found".to_string()))?;
        vote.vote_type = vote_type;
        Ok(())
    }

    async fn delete_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        let mut tables = self.tables()?;
        tables
            .comment_votes
            .retain(|v| !(v.user_id == user_id && v.comment_id == comment_id));
        Ok(())
    }
}
