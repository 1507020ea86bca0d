pub mod postgres;
pub mod repository;

// Database connection and state management
use std::sync::Arc;
use crate::config::{AppConfig, StorageBackend};
use crate::db::postgres::PostgresDatabase;
use crate::db::repository::{
    CommentRepository, InMemoryRepository, PostRepository, SubredditRepository, UserRepository,
    VoteRepository,
};
use crate::Result;

#[derive(Clone)]
pub struct DatabaseClient {
    pub user_repo: Arc<dyn UserRepository>,
    pub subreddit_repo: Arc<dyn SubredditRepository>,
    pub post_repo: Arc<dyn PostRepository>,
    pub comment_repo: Arc<dyn CommentRepository>,
    pub vote_repo: Arc<dyn VoteRepository>,
    postgres: Option<PostgresDatabase>,
}

impl DatabaseClient {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        match &config.storage {
            StorageBackend::Postgres { database_url } => {
                tracing::info!("Connecting to PostgreSQL");
                let database = PostgresDatabase::new(database_url).await?;
                let repo = Arc::new(database.repository());
                Ok(Self {
                    user_repo: repo.clone(),
                    subreddit_repo: repo.clone(),
                    post_repo: repo.clone(),
                    comment_repo: repo.clone(),
                    vote_repo: repo,
                    postgres: Some(database),
                })
            }
            StorageBackend::InMemory => {
                tracing::warn!("DATABASE_URL not set, using in-memory storage");
                Ok(Self::in_memory())
            }
        }
    }

    pub fn in_memory() -> Self {
        let repo = Arc::new(InMemoryRepository::new());
        Self {
            user_repo: repo.clone(),
            subreddit_repo: repo.clone(),
            post_repo: repo.clone(),
            comment_repo: repo.clone(),
            vote_repo: repo,
            postgres: None,
        }
    }

    pub fn backend(&self) -> &'static str {
        if self.postgres.is_some() {
            "postgres"
        } else {
            "memory"
        }
    }

    pub async fn health_check(&self) -> Result<()> {
        if let Some(postgres) = &self.postgres {
            postgres.health_check().await?;
        }
        Ok(())
    }
}
