// Bearer-token extractors for authenticated and optionally-authenticated routes
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;
use crate::{AppError, AppState};

/// The caller of a route that requires a session. Rejects with 401.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub username: String,
}

/// The caller, if a valid session was presented. Bad tokens read as anonymous.
#[derive(Debug, Clone)]
pub struct OptionalAuthUser(pub Option<AuthUser>);

impl OptionalAuthUser {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|user| user.user_id)
    }
}

fn bearer_token(parts: &Parts) -> Result<Option<&str>, AppError> {
    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AppError::AuthError("Invalid authorization header format".to_string()))?;

    auth_str
        .strip_prefix("Bearer ")
        .map(Some)
        .ok_or_else(|| AppError::AuthError("Authorization header must start with 'Bearer '".to_string()))
}

fn authenticate(parts: &Parts, state: &AppState) -> Result<AuthUser, AppError> {
    let token = bearer_token(parts)?
        .ok_or_else(|| AppError::AuthError("Missing authorization header".to_string()))?;
    let claims = state.auth_service.verify_token(token)?;
    Ok(AuthUser { user_id: claims.user_id, username: claims.username })
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        authenticate(parts, state)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for OptionalAuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !parts.headers.contains_key(header::AUTHORIZATION) {
            return Ok(OptionalAuthUser(None));
        }
        match authenticate(parts, state) {
            Ok(user) => Ok(OptionalAuthUser(Some(user))),
            Err(e) => {
                tracing::debug!(error = %e, "ignoring invalid session on public route");
                Ok(OptionalAuthUser(None))
            }
        }
    }
}
