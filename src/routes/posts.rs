use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Deserialize;
use uuid::Uuid;
use crate::auth::{AuthUser, OptionalAuthUser};
use crate::models::post::{CreatePostRequest, PostDetail};
use crate::models::{FeedPost, PageRequest, Post};
use crate::routes::extract::ValidatedJson;
use crate::{AppError, AppState, Result};

/// Query string of `GET /api/posts`. Numbers arrive as strings and are
/// checked here so bad input gets a 422 rather than a generic rejection.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedParams {
    pub limit: Option<String>,
    pub page: Option<String>,
    pub subreddit_name: Option<String>,
}

// Validation constants
const MIN_LIMIT: u32 = 1;
const MAX_LIMIT: u32 = 50;

impl FeedParams {
    pub fn page_request(&self) -> Result<PageRequest> {
        let limit = parse_number("limit", self.limit.as_deref())?;
        let page = parse_number("page", self.page.as_deref())?;

        if !(MIN_LIMIT..=MAX_LIMIT).contains(&limit) {
            return Err(AppError::ValidationError(format!(
                "Invalid limit. Must be between {} and {}", MIN_LIMIT, MAX_LIMIT
            )));
        }
        if page < 1 {
            return Err(AppError::ValidationError("Invalid page. Pages start at 1".to_string()));
        }

        Ok(PageRequest { limit, page })
    }
}

fn parse_number(name: &str, raw: Option<&str>) -> Result<u32> {
    let raw = raw.ok_or_else(|| AppError::ValidationError(format!("{} is required", name)))?;
    raw.trim()
        .parse()
        .map_err(|_| AppError::ValidationError(format!("{} must be a non-negative integer", name)))
}

pub async fn get_posts(
    State(app_state): State<AppState>,
    viewer: OptionalAuthUser,
    Query(params): Query<FeedParams>,
) -> Result<ResponseJson<Vec<FeedPost>>> {
    let page = params.page_request()?;
    let posts = app_state
        .post_service
        .get_feed(viewer.user_id(), params.subreddit_name.as_deref(), page)
        .await?;
    Ok(ResponseJson(posts))
}

pub async fn get_post(
    State(app_state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<ResponseJson<PostDetail>> {
    let detail = app_state.post_service.get_post_detail(post_id, viewer.user_id()).await?;
    Ok(ResponseJson(detail))
}

pub async fn create_post(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreatePostRequest>,
) -> Result<(StatusCode, ResponseJson<Post>)> {
    let post = app_state.post_service.create_post(user.user_id, request).await?;
    Ok((StatusCode::CREATED, ResponseJson(post)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(limit: Option<&str>, page: Option<&str>) -> FeedParams {
        FeedParams {
            limit: limit.map(str::to_string),
            page: page.map(str::to_string),
            subreddit_name: None,
        }
    }

    #[test]
    fn test_page_request_parsing() {
        assert_eq!(params(Some("10"), Some("2")).page_request().unwrap(), PageRequest { limit: 10, page: 2 });
        assert!(params(None, Some("1")).page_request().is_err());
        assert!(params(Some("abc"), Some("1")).page_request().is_err());
        assert!(params(Some("0"), Some("1")).page_request().is_err());
        assert!(params(Some("51"), Some("1")).page_request().is_err());
        assert!(params(Some("10"), Some("0")).page_request().is_err());
    }
}
