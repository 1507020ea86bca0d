use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::user::Author;
use crate::models::vote::{Vote, VoteType};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: Uuid,
    pub title: String,
    /// Rich-text editor document, stored as-is.
    pub content: serde_json::Value,
    pub subreddit_id: Uuid,
    pub author_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePostRequest {
    #[validate(length(min = 3, max = 128, message = "Title must be 3-128 characters"))]
    pub title: String,
    #[serde(default)]
    pub content: serde_json::Value,
    pub subreddit_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubredditRef {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct PostWithAuthor {
    pub post: Post,
    pub author: Author,
}

/// A post as it appears in a feed, with its relations loaded.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPost {
    #[serde(flatten)]
    pub post: Post,
    pub author: Author,
    pub subreddit: SubredditRef,
    pub votes: Vec<Vote>,
    pub comment_count: i64,
}

/// Which posts a feed query may return.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedFilter {
    All,
    Subreddit(String),
    /// Posts from any of these subreddits. Empty matches nothing.
    Subreddits(Vec<Uuid>),
}

impl FeedFilter {
    /// A named subreddit wins, then the viewer's follows, then everything.
    pub fn build(subreddit_name: Option<&str>, followed: Option<Vec<Uuid>>) -> Self {
        match (subreddit_name, followed) {
            (Some(name), _) if !name.is_empty() => FeedFilter::Subreddit(name.to_string()),
            (_, Some(ids)) => FeedFilter::Subreddits(ids),
            _ => FeedFilter::All,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub limit: u32,
    pub page: u32,
}

impl PageRequest {
    pub fn offset(&self) -> u32 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Where a post detail response was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostSource {
    Cache,
    Database,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDetail {
    pub id: Uuid,
    pub title: String,
    pub content: serde_json::Value,
    pub author_username: String,
    pub created_at: DateTime<Utc>,
    pub votes_amount: i64,
    pub current_vote: Option<VoteType>,
    pub source: PostSource,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_filter_precedence() {
        let followed = vec![Uuid::new_v4()];
        assert_eq!(
            FeedFilter::build(Some("rust"), Some(followed.clone())),
            FeedFilter::Subreddit("rust".into())
        );
        assert_eq!(
            FeedFilter::build(None, Some(followed.clone())),
            FeedFilter::Subreddits(followed)
        );
        assert_eq!(FeedFilter::build(None, Some(vec![])), FeedFilter::Subreddits(vec![]));
        assert_eq!(FeedFilter::build(None, None), FeedFilter::All);
        assert_eq!(FeedFilter::build(Some(""), None), FeedFilter::All);
    }

    #[test]
    fn test_page_offset() {
        assert_eq!(PageRequest { limit: 10, page: 1 }.offset(), 0);
        assert_eq!(PageRequest { limit: 10, page: 3 }.offset(), 20);
        assert_eq!(PageRequest { limit: 5, page: 0 }.offset(), 0);
    }
}
