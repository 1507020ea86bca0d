use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use uuid::Uuid;

use crate::{
    auth::{AuthUser, OptionalAuthUser},
    models::comment::{CommentThread, CreateCommentRequest},
    models::Comment,
    routes::extract::ValidatedJson,
    AppState, Result,
};

/// Top-level comments of a post with their direct replies
///
/// GET /api/posts/{post_id}/comments
pub async fn get_post_comments(
    State(app_state): State<AppState>,
    viewer: OptionalAuthUser,
    Path(post_id): Path<Uuid>,
) -> Result<Json<Vec<CommentThread>>> {
    let threads = app_state.comment_service.get_threads(post_id, viewer.user_id()).await?;
    tracing::debug!(post_id = %post_id, threads = threads.len(), "loaded comments");
    Ok(Json(threads))
}

/// POST /api/subreddit/post/comment
pub async fn create_comment(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>)> {
    let comment = app_state.comment_service.create_comment(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}
