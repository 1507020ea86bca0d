use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::post::FeedPost;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subreddit {
    pub id: Uuid,
    pub name: String,
    pub creator_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's follow of a subreddit. One per (user, subreddit).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub user_id: Uuid,
    pub subreddit_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubredditRequest {
    #[validate(length(min = 3, max = 21, message = "Subreddit name must be 3-21 characters"))]
    pub name: String,
}

/// Body of the subscribe and unsubscribe endpoints.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SubredditSubscriptionRequest {
    pub subreddit_id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubredditCounts {
    pub posts: i64,
    pub subscribers: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubredditSearchResult {
    #[serde(flatten)]
    pub subreddit: Subreddit,
    #[serde(rename = "_count")]
    pub count: SubredditCounts,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubredditPage {
    pub subreddit: Subreddit,
    pub member_count: i64,
    pub is_subscribed: bool,
    pub is_creator: bool,
    pub posts: Vec<FeedPost>,
}
