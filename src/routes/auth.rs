use axum::{
    extract::State,
    http::StatusCode,
    response::Json as ResponseJson,
};
use serde::Serialize;
use crate::{AppState, Result};
use crate::models::user::{CreateUserRequest, LoginRequest, UserResponse};
use crate::routes::extract::ValidatedJson;

#[derive(Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

pub async fn register(
    State(app_state): State<AppState>,
    ValidatedJson(request): ValidatedJson<CreateUserRequest>,
) -> Result<(StatusCode, ResponseJson<AuthResponse>)> {
    let (user, token) = app_state.user_service.register(request, &app_state.auth_service).await?;
    Ok((StatusCode::CREATED, ResponseJson(AuthResponse { token, user })))
}

pub async fn login(
    State(app_state): State<AppState>,
    ValidatedJson(request): ValidatedJson<LoginRequest>,
) -> Result<ResponseJson<AuthResponse>> {
    let (user, token) = app_state.user_service.authenticate_user(
        &request.email,
        &request.password,
        &app_state.auth_service
    ).await?;

    Ok(ResponseJson(AuthResponse { token, user }))
}
