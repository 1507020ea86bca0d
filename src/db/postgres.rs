// PostgreSQL repository implementations using sqlx
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::FromRow;
use uuid::Uuid;
use std::time::Duration;
use crate::{Result, AppError};
use crate::models::post::SubredditRef;
use crate::models::subreddit::{SubredditCounts, SubredditSearchResult};
use crate::models::{
    Author, Comment, CommentVote, CommentWithAuthor, FeedFilter, FeedPost, Post, PostWithAuthor,
    Subreddit, Subscription, User, Vote, VoteType,
};
use crate::db::repository::{
    CommentRepository, PostRepository, SubredditRepository, UserRepository, VoteRepository,
};

// PostgreSQL connection pool wrapper
#[derive(Clone)]
pub struct PostgresDatabase {
    pub pool: PgPool,
}

impl PostgresDatabase {
    pub async fn new(database_url: &str) -> Result<Self> {
        tracing::info!(
            max_connections = 20,
            acquire_timeout_secs = 30,
            idle_timeout_secs = 600,
            "Configuring database connection pool"
        );

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(3600))
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "Failed to create connection pool");
                AppError::DatabaseError(format!("Failed to connect to PostgreSQL: {}", e))
            })?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::DatabaseError(format!("Failed to run migrations: {}", e)))?;

        tracing::info!("Database connection pool ready, migrations applied");

        Ok(Self { pool })
    }

    pub fn repository(&self) -> PostgresRepository {
        PostgresRepository { pool: self.pool.clone() }
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// Implements every repository trait over one pool.
#[derive(Clone)]
pub struct PostgresRepository {
    pool: PgPool,
}

#[derive(FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(r: UserRow) -> Self {
        User {
            id: r.id,
            username: r.username,
            email: r.email,
            password_hash: r.password_hash,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SubredditRow {
    id: Uuid,
    name: String,
    creator_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<SubredditRow> for Subreddit {
    fn from(r: SubredditRow) -> Self {
        Subreddit {
            id: r.id,
            name: r.name,
            creator_id: r.creator_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct SearchRow {
    id: Uuid,
    name: String,
    creator_id: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    post_count: i64,
    subscriber_count: i64,
}

#[derive(FromRow)]
struct PostRow {
    id: Uuid,
    title: String,
    content: Option<serde_json::Value>,
    subreddit_id: Uuid,
    author_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PostRow> for Post {
    fn from(r: PostRow) -> Self {
        Post {
            id: r.id,
            title: r.title,
            content: r.content.unwrap_or(serde_json::Value::Null),
            subreddit_id: r.subreddit_id,
            author_id: r.author_id,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(FromRow)]
struct FeedRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
    subreddit_name: String,
    comment_count: i64,
}

#[derive(FromRow)]
struct PostWithAuthorRow {
    #[sqlx(flatten)]
    post: PostRow,
    author_username: String,
}

#[derive(FromRow)]
struct CommentRow {
    id: Uuid,
    text: String,
    post_id: Uuid,
    author_id: Uuid,
    reply_to_id: Option<Uuid>,
    created_at: DateTime<Utc>,
}

impl From<CommentRow> for Comment {
    fn from(r: CommentRow) -> Self {
        Comment {
            id: r.id,
            text: r.text,
            post_id: r.post_id,
            author_id: r.author_id,
            reply_to_id: r.reply_to_id,
            created_at: r.created_at,
        }
    }
}

#[derive(FromRow)]
struct CommentWithAuthorRow {
    #[sqlx(flatten)]
    comment: CommentRow,
    author_username: String,
}

#[derive(FromRow)]
struct VoteRow {
    user_id: Uuid,
    post_id: Uuid,
    vote_type: String,
}

impl TryFrom<VoteRow> for Vote {
    type Error = AppError;

    fn try_from(r: VoteRow) -> Result<Self> {
        Ok(Vote { user_id: r.user_id, post_id: r.post_id, vote_type: parse_vote_type(&r.vote_type)? })
    }
}

#[derive(FromRow)]
struct CommentVoteRow {
    user_id: Uuid,
    comment_id: Uuid,
    vote_type: String,
}

impl TryFrom<CommentVoteRow> for CommentVote {
    type Error = AppError;

    fn try_from(r: CommentVoteRow) -> Result<Self> {
        Ok(CommentVote {
            user_id: r.user_id,
            comment_id: r.comment_id,
            vote_type: parse_vote_type(&r.vote_type)?,
        })
    }
}

fn parse_vote_type(raw: &str) -> Result<VoteType> {
    raw.parse().map_err(AppError::DatabaseError)
}

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, updated_at";
const SUBREDDIT_COLUMNS: &str = "id, name, creator_id, created_at, updated_at";

#[async_trait]
impl UserRepository for PostgresRepository {
    async fn create_user(&self, user: &User) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_user_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(&format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1"))
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(User::from))
    }

    async fn update_username(&self, id: Uuid, username: &str) -> Result<User> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "UPDATE users SET username = $2, updated_at = NOW() WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        row.map(User::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}

#[async_trait]
impl SubredditRepository for PostgresRepository {
    async fn create_subreddit(&self, subreddit: &Subreddit) -> Result<Subreddit> {
        let row = sqlx::query_as::<_, SubredditRow>(&format!(
            r#"
            INSERT INTO subreddits (id, name, creator_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SUBREDDIT_COLUMNS}
            "#
        ))
        .bind(subreddit.id)
        .bind(&subreddit.name)
        .bind(subreddit.creator_id)
        .bind(subreddit.created_at)
        .bind(subreddit.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_subreddit_by_id(&self, id: Uuid) -> Result<Option<Subreddit>> {
        let row = sqlx::query_as::<_, SubredditRow>(&format!(
            "SELECT {SUBREDDIT_COLUMNS} FROM subreddits WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Subreddit::from))
    }

    async fn get_subreddit_by_name(&self, name: &str) -> Result<Option<Subreddit>> {
        let row = sqlx::query_as::<_, SubredditRow>(&format!(
            "SELECT {SUBREDDIT_COLUMNS} FROM subreddits WHERE name = $1"
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Subreddit::from))
    }

    async fn search_by_prefix(&self, prefix: &str, limit: u32) -> Result<Vec<SubredditSearchResult>> {
        // LIKE metacharacters in user input are matched literally
        let pattern = format!(
            "{}%",
            prefix.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
        );

        let rows = sqlx::query_as::<_, SearchRow>(
            r#"
            SELECT s.id, s.name, s.creator_id, s.created_at, s.updated_at,
                   (SELECT COUNT(*) FROM posts p WHERE p.subreddit_id = s.id) AS post_count,
                   (SELECT COUNT(*) FROM subscriptions sub WHERE sub.subreddit_id = s.id) AS subscriber_count
            FROM subreddits s
            WHERE s.name LIKE $1
            ORDER BY s.name
            LIMIT $2
            "#,
        )
        .bind(pattern)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| SubredditSearchResult {
                subreddit: Subreddit {
                    id: r.id,
                    name: r.name,
                    creator_id: r.creator_id,
                    created_at: r.created_at,
                    updated_at: r.updated_at,
                },
                count: SubredditCounts { posts: r.post_count, subscribers: r.subscriber_count },
            })
            .collect())
    }

    async fn count_subscribers(&self, subreddit_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM subscriptions WHERE subreddit_id = $1")
            .bind(subreddit_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn get_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<Option<Subscription>> {
        let found = sqlx::query_scalar::<_, Uuid>(
            "SELECT subreddit_id FROM subscriptions WHERE user_id = $1 AND subreddit_id = $2",
        )
        .bind(user_id)
        .bind(subreddit_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(found.map(|subreddit_id| Subscription { user_id, subreddit_id }))
    }

    async fn create_subscription(&self, subscription: &Subscription) -> Result<()> {
        sqlx::query("INSERT INTO subscriptions (user_id, subreddit_id) VALUES ($1, $2)")
            .bind(subscription.user_id)
            .bind(subscription.subreddit_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_subscription(&self, user_id: Uuid, subreddit_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND subreddit_id = $2")
            .bind(user_id)
            .bind(subreddit_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_subscribed_subreddit_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>> {
        let ids = sqlx::query_scalar::<_, Uuid>("SELECT subreddit_id FROM subscriptions WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(ids)
    }
}

#[async_trait]
impl PostRepository for PostgresRepository {
    async fn create_post(&self, post: &Post) -> Result<Post> {
        let row = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (id, title, content, subreddit_id, author_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, content, subreddit_id, author_id, created_at, updated_at
            "#,
        )
        .bind(post.id)
        .bind(&post.title)
        .bind(&post.content)
        .bind(post.subreddit_id)
        .bind(post.author_id)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_post_by_id(&self, id: Uuid) -> Result<Option<Post>> {
        let row = sqlx::query_as::<_, PostRow>(
            "SELECT id, title, content, subreddit_id, author_id, created_at, updated_at FROM posts WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Post::from))
    }

    async fn get_post_with_author(&self, id: Uuid) -> Result<Option<PostWithAuthor>> {
        let row = sqlx::query_as::<_, PostWithAuthorRow>(
            r#"
            SELECT p.id, p.title, p.content, p.subreddit_id, p.author_id, p.created_at, p.updated_at,
                   u.username AS author_username
            FROM posts p
            JOIN users u ON p.author_id = u.id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| {
            let author = Author { id: r.post.author_id, username: r.author_username };
            PostWithAuthor { post: r.post.into(), author }
        }))
    }

    async fn get_feed(&self, filter: &FeedFilter, limit: u32, offset: u32) -> Result<Vec<FeedPost>> {
        let (subreddit_name, subreddit_ids): (Option<&str>, Option<&[Uuid]>) = match filter {
            FeedFilter::All => (None, None),
            FeedFilter::Subreddit(name) => (Some(name.as_str()), None),
            FeedFilter::Subreddits(ids) => (None, Some(ids.as_slice())),
        };

        let rows = sqlx::query_as::<_, FeedRow>(
            r#"
            SELECT p.id, p.title, p.content, p.subreddit_id, p.author_id, p.created_at, p.updated_at,
                   u.username AS author_username,
                   s.name AS subreddit_name,
                   (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count
            FROM posts p
            JOIN users u ON p.author_id = u.id
            JOIN subreddits s ON p.subreddit_id = s.id
            WHERE ($1::text IS NULL OR s.name = $1)
              AND ($2::uuid[] IS NULL OR p.subreddit_id = ANY($2))
            ORDER BY p.created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(subreddit_name)
        .bind(subreddit_ids)
        .bind(i64::from(limit))
        .bind(i64::from(offset))
        .fetch_all(&self.pool)
        .await?;

        let post_ids: Vec<Uuid> = rows.iter().map(|r| r.post.id).collect();
        let votes = sqlx::query_as::<_, VoteRow>(
            "SELECT user_id, post_id, type AS vote_type FROM votes WHERE post_id = ANY($1)",
        )
        .bind(&post_ids)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(Vote::try_from)
        .collect::<Result<Vec<_>>>()?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let post: Post = r.post.into();
                FeedPost {
                    author: Author { id: post.author_id, username: r.author_username },
                    subreddit: SubredditRef { id: post.subreddit_id, name: r.subreddit_name },
                    votes: votes.iter().filter(|v| v.post_id == post.id).cloned().collect(),
                    comment_count: r.comment_count,
                    post,
                }
            })
            .collect())
    }
}

#[async_trait]
impl CommentRepository for PostgresRepository {
    async fn create_comment(&self, comment: &Comment) -> Result<Comment> {
        let row = sqlx::query_as::<_, CommentRow>(
            r#"
            INSERT INTO comments (id, text, post_id, author_id, reply_to_id, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, text, post_id, author_id, reply_to_id, created_at
            "#,
        )
        .bind(comment.id)
        .bind(&comment.text)
        .bind(comment.post_id)
        .bind(comment.author_id)
        .bind(comment.reply_to_id)
        .bind(comment.created_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.into())
    }

    async fn get_comment_by_id(&self, id: Uuid) -> Result<Option<Comment>> {
        let row = sqlx::query_as::<_, CommentRow>(
            "SELECT id, text, post_id, author_id, reply_to_id, created_at FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Comment::from))
    }

    async fn get_comments_by_post_id(&self, post_id: Uuid) -> Result<Vec<CommentWithAuthor>> {
        let rows = sqlx::query_as::<_, CommentWithAuthorRow>(
            r#"
            SELECT c.id, c.text, c.post_id, c.author_id, c.reply_to_id, c.created_at,
                   u.username AS author_username
            FROM comments c
            JOIN users u ON c.author_id = u.id
            WHERE c.post_id = $1
            ORDER BY c.created_at ASC
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let author = Author { id: r.comment.author_id, username: r.author_username };
                CommentWithAuthor { comment: r.comment.into(), author }
            })
            .collect())
    }
}

#[async_trait]
impl VoteRepository for PostgresRepository {
    async fn get_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<Option<Vote>> {
        sqlx::query_as::<_, VoteRow>(
            "SELECT user_id, post_id, type AS vote_type FROM votes WHERE user_id = $1 AND post_id = $2",
        )
        .bind(user_id)
        .bind(post_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Vote::try_from)
        .transpose()
    }

    async fn get_post_votes(&self, post_id: Uuid) -> Result<Vec<Vote>> {
        sqlx::query_as::<_, VoteRow>("SELECT user_id, post_id, type AS vote_type FROM votes WHERE post_id = $1")
            .bind(post_id)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Vote::try_from)
            .collect()
    }

    async fn create_post_vote(&self, vote: &Vote) -> Result<()> {
        sqlx::query("INSERT INTO votes (user_id, post_id, type) VALUES ($1, $2, $3)")
            .bind(vote.user_id)
            .bind(vote.post_id)
            .bind(vote.vote_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_post_vote(&self, user_id: Uuid, post_id: Uuid, vote_type: VoteType) -> Result<()> {
        sqlx::query("UPDATE votes SET type = $3 WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .bind(vote_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_post_vote(&self, user_id: Uuid, post_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM votes WHERE user_id = $1 AND post_id = $2")
            .bind(user_id)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<Option<CommentVote>> {
        sqlx::query_as::<_, CommentVoteRow>(
            "SELECT user_id, comment_id, type AS vote_type FROM comment_votes WHERE user_id = $1 AND comment_id = $2",
        )
        .bind(user_id)
        .bind(comment_id)
        .fetch_optional(&self.pool)
        .await?
        .map(CommentVote::try_from)
        .transpose()
    }

    async fn get_comment_votes_for_post(&self, post_id: Uuid) -> Result<Vec<CommentVote>> {
        sqlx::query_as::<_, CommentVoteRow>(
            r#"
            SELECT cv.user_id, cv.comment_id, cv.type AS vote_type
            FROM comment_votes cv
            JOIN comments c ON cv.comment_id = c.id
            WHERE c.post_id = $1
            "#,
        )
        .bind(post_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CommentVote::try_from)
        .collect()
    }

    async fn create_comment_vote(&self, vote: &CommentVote) -> Result<()> {
        sqlx::query("INSERT INTO comment_votes (user_id, comment_id, type) VALUES ($1, $2, $3)")
            .bind(vote.user_id)
            .bind(vote.comment_id)
            .bind(vote.vote_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn update_comment_vote(&self, user_id: Uuid, comment_id: Uuid, vote_type: VoteType) -> Result<()> {
        sqlx::query("UPDATE comment_votes SET type = $3 WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .bind(vote_type.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_comment_vote(&self, user_id: Uuid, comment_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM comment_votes WHERE user_id = $1 AND comment_id = $2")
            .bind(user_id)
            .bind(comment_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
