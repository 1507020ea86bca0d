use axum::{extract::State, response::Json};
use serde::Serialize;

use crate::auth::AuthUser;
use crate::models::vote::{CommentVoteRequest, PostVoteRequest};
use crate::models::VoteOutcome;
use crate::routes::extract::ValidatedJson;
use crate::{AppState, Result};

#[derive(Debug, Serialize)]
pub struct VoteResponse {
    pub outcome: VoteOutcome,
    pub message: &'static str,
}

impl From<VoteOutcome> for VoteResponse {
    fn from(outcome: VoteOutcome) -> Self {
        Self { outcome, message: outcome.message() }
    }
}

/// PATCH /api/subreddit/post/vote
pub async fn vote_on_post(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<PostVoteRequest>,
) -> Result<Json<VoteResponse>> {
    let outcome = app_state.vote_service.vote_on_post(user.user_id, request).await?;
    Ok(Json(outcome.into()))
}

/// PATCH /api/subreddit/post/comment/vote
pub async fn vote_on_comment(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CommentVoteRequest>,
) -> Result<Json<VoteResponse>> {
    let outcome = app_state.vote_service.vote_on_comment(user.user_id, request).await?;
    Ok(Json(outcome.into()))
}
