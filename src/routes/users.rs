use axum::{extract::State, response::Json as ResponseJson};
use crate::auth::AuthUser;
use crate::models::user::{UserResponse, UsernameRequest};
use crate::routes::extract::ValidatedJson;
use crate::{AppState, Result};

pub async fn get_current_user(
    State(app_state): State<AppState>,
    user: AuthUser,
) -> Result<ResponseJson<UserResponse>> {
    Ok(ResponseJson(app_state.user_service.get_user(user.user_id).await?))
}

pub async fn update_username(
    State(app_state): State<AppState>,
    user: AuthUser,
    ValidatedJson(request): ValidatedJson<UsernameRequest>,
) -> Result<ResponseJson<UserResponse>> {
    let updated = app_state.user_service.update_username(user.user_id, &request.name).await?;
    tracing::info!(user_id = %user.user_id, from = %user.username, to = %updated.username, "username changed");
    Ok(ResponseJson(updated))
}
