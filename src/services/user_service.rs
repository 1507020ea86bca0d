use crate::models::User;
use crate::models::user::{CreateUserRequest, UserResponse};
use crate::db::repository::UserRepository;
use crate::auth::AuthService;
use crate::{AppError, Result};
use uuid::Uuid;
use std::sync::Arc;
use chrono::Utc;

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(user_repo: Arc<dyn UserRepository>) -> Self {
        Self { user_repo }
    }

    pub async fn get_user(&self, user_id: Uuid) -> Result<UserResponse> {
        self.user_repo
            .get_user_by_id(user_id)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    /// Creates the account and returns it with a fresh session token.
    pub async fn register(&self, request: CreateUserRequest, auth_service: &AuthService) -> Result<(UserResponse, String)> {
        if self.user_repo.get_user_by_username(&request.username).await?.is_some() {
            return Err(AppError::Conflict("Username is taken".to_string()));
        }
        if self.user_repo.get_user_by_email(&request.email).await?.is_some() {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }

        // Hash the password before storing
        let password_hash = auth_service.hash_password(&request.password)?;

        let user = User {
            id: Uuid::new_v4(),
            username: request.username,
            email: request.email,
            password_hash,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let created_user = self.user_repo.create_user(&user).await?;
        let token = auth_service.generate_token(created_user.id, &created_user.username)?;
        tracing::info!(user_id = %created_user.id, "registered user");

        Ok((UserResponse::from(created_user), token))
    }

    pub async fn authenticate_user(&self, email: &str, password: &str, auth_service: &AuthService) -> Result<(UserResponse, String)> {
        let user = self.user_repo.get_user_by_email(email).await?
            .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

        if !auth_service.verify_password(password, &user.password_hash)? {
            return Err(AppError::AuthError("Invalid email or password".to_string()));
        }

        let token = auth_service.generate_token(user.id, &user.username)?;
        Ok((UserResponse::from(user), token))
    }

    pub async fn update_username(&self, user_id: Uuid, name: &str) -> Result<UserResponse> {
        if let Some(existing) = self.user_repo.get_user_by_username(name).await? {
            if existing.id != user_id {
                return Err(AppError::Conflict("Username is taken".to_string()));
            }
        }

        let user = self.user_repo.update_username(user_id, name).await?;
        Ok(UserResponse::from(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::InMemoryRepository;

    fn service() -> (UserService, AuthService) {
        (UserService::new(Arc::new(InMemoryRepository::new())), AuthService::new("test-secret", 1))
    }

    fn request(username: &str, email: &str) -> CreateUserRequest {
        CreateUserRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: "password123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_and_login() {
        let (users, auth) = service();
        let (user, token) = users.register(request("alice", "alice@example.com"), &auth).await.unwrap();
        assert_eq!(auth.verify_token(&token).unwrap().user_id, user.id);

        let (logged_in, _) = users.authenticate_user("alice@example.com", "password123", &auth).await.unwrap();
        assert_eq!(logged_in.id, user.id);

        let wrong = users.authenticate_user("alice@example.com", "nope-nope", &auth).await;
        assert!(matches!(wrong, Err(AppError::AuthError(_))));
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let (users, auth) = service();
        users.register(request("alice", "alice@example.com"), &auth).await.unwrap();

        let same_name = users.register(request("alice", "other@example.com"), &auth).await;
        assert!(matches!(same_name, Err(AppError::Conflict(_))));

        let same_email = users.register(request("alicia", "alice@example.com"), &auth).await;
        assert!(matches!(same_email, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_update_username() {
        let (users, auth) = service();
        let (alice, _) = users.register(request("alice", "alice@example.com"), &auth).await.unwrap();
        let (bob, _) = users.register(request("bob", "bob@example.com"), &auth).await.unwrap();

        let taken = users.update_username(bob.id, "alice").await;
        assert!(matches!(taken, Err(AppError::Conflict(_))));

        // Keeping your own name is not a conflict
        assert_eq!(users.update_username(alice.id, "alice").await.unwrap().username, "alice");
        assert_eq!(users.update_username(bob.id, "robert").await.unwrap().username, "robert");
    }

    #[tokio::test]
    async fn test_get_user() {
        let (users, auth) = service();
        let (alice, _) = users.register(request("alice", "alice@example.com"), &auth).await.unwrap();

        assert_eq!(users.get_user(alice.id).await.unwrap().email, "alice@example.com");
        assert!(matches!(users.get_user(Uuid::new_v4()).await, Err(AppError::NotFound(_))));
    }
}
