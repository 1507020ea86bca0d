// Library modules for the link aggregator backend
pub mod config;
pub mod models;
pub mod db;
pub mod cache;
pub mod routes;
pub mod services;
pub mod auth;
pub mod error;
pub mod utils;

use std::sync::Arc;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use config::AppConfig;

use crate::cache::PostCache;
use crate::utils::retry::{retry, RetryPolicy};

// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: db::DatabaseClient,
    pub cache: Arc<dyn PostCache>,
    pub auth_service: Arc<auth::AuthService>,
    pub user_service: Arc<services::UserService>,
    pub subreddit_service: Arc<services::SubredditService>,
    pub post_service: Arc<services::PostService>,
    pub comment_service: Arc<services::CommentService>,
    pub vote_service: Arc<services::VoteService>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let policy = RetryPolicy::new(config.startup_retries);

        let db = retry("postgres", policy, || db::DatabaseClient::new(&config)).await?;

        let cache = cache::connect(&config.cache)?;
        // Reads fall back to the database, so a missing cache is not fatal
        if let Err(e) = retry("redis", policy, || cache.health_check()).await {
            tracing::warn!(error = %e, "post cache unreachable, continuing without it");
        }

        Ok(Self::with_backends(config, db, cache))
    }

    /// Wires services over already-connected backends.
    pub fn with_backends(config: AppConfig, db: db::DatabaseClient, cache: Arc<dyn PostCache>) -> Self {
        let auth_service = Arc::new(auth::AuthService::new(&config.jwt_secret, config.jwt_expiry_hours));
        let user_service = Arc::new(services::UserService::new(db.user_repo.clone()));
        let subreddit_service = Arc::new(services::SubredditService::new(
            db.subreddit_repo.clone(),
            db.post_repo.clone(),
        ));
        let post_service = Arc::new(services::PostService::new(
            db.post_repo.clone(),
            db.subreddit_repo.clone(),
            db.vote_repo.clone(),
            cache.clone(),
        ));
        let comment_service = Arc::new(services::CommentService::new(
            db.comment_repo.clone(),
            db.post_repo.clone(),
            db.vote_repo.clone(),
        ));
        let vote_service = Arc::new(services::VoteService::new(
            db.vote_repo.clone(),
            db.post_repo.clone(),
            db.comment_repo.clone(),
            cache.clone(),
            config.cache_after_upvotes,
        ));

        Self {
            config,
            db,
            cache,
            auth_service,
            user_service,
            subreddit_service,
            post_service,
            comment_service,
            vote_service,
        }
    }
}
