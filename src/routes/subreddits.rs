use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::{AuthUser, OptionalAuthUser};
use crate::models::subreddit::{
    CreateSubredditRequest, SubredditPage, SubredditSearchResult, SubredditSubscriptionRequest,
};
use crate::routes::extract::ValidatedJson;
use crate::{AppState, Result};

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// POST /api/subreddit, responds with the new subreddit's name
pub async fn create_subreddit(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateSubredditRequest>,
) -> Result<(StatusCode, Json<String>)> {
    let subreddit = app_state.subreddit_service.create_subreddit(user.user_id, &request.name).await?;
    Ok((StatusCode::CREATED, Json(subreddit.name)))
}

pub async fn get_subreddit(
    State(app_state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(name): Path<String>,
) -> Result<Json<SubredditPage>> {
    let page = app_state
        .subreddit_service
        .get_page(&name, viewer.user_id(), app_state.config.infinite_scroll_pagination_results)
        .await?;
    Ok(Json(page))
}

pub async fn subscribe(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<SubredditSubscriptionRequest>,
) -> Result<Json<Uuid>> {
    let id = app_state.subreddit_service.subscribe(user.user_id, request.subreddit_id).await?;
    Ok(Json(id))
}

pub async fn unsubscribe(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<SubredditSubscriptionRequest>,
) -> Result<Json<Uuid>> {
    let id = app_state.subreddit_service.unsubscribe(user.user_id, request.subreddit_id).await?;
    Ok(Json(id))
}

/// GET /api/search?q=prefix
pub async fn search(
    State(app_state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<SubredditSearchResult>>> {
    let results = app_state.subreddit_service.search(params.q.as_deref()).await?;
    Ok(Json(results))
}
