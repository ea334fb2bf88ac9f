//! User service
//!
//! Registration, login, and session handling for the admin back office.
//! The first registered account becomes the admin; later accounts are
//! staff until promoted by hand.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::session::Session;
use crate::models::user::{User, UserRole};
use crate::services::password::{hash_password, verify_password};
use anyhow::Context;
use chrono::Utc;
use std::sync::Arc;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Username already exists
    #[error("Username already exists: {0}")]
    DuplicateUsername(String),

    /// Email already exists
    #[error("Email already exists: {0}")]
    DuplicateEmail(String),

    /// Invalid credentials
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Session missing or expired
    #[error("Session is invalid or expired")]
    InvalidSession,

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Input for registering a new user
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// User service
pub struct UserService {
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, sessions: Arc<dyn SessionRepository>) -> Self {
        Self { users, sessions }
    }

    /// Register a new user.
    ///
    /// The first account in the system is created as admin.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .users
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::DuplicateUsername(input.username));
        }

        if self
            .users
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::DuplicateEmail(input.email));
        }

        let count = self.users.count().await.context("Failed to count users")?;
        let role = if count == 0 {
            UserRole::Admin
        } else {
            UserRole::Staff
        };

        let password_hash = hash_password(&input.password)?;

        let user = User {
            id: 0,
            username: input.username,
            email: input.email,
            password_hash,
            role,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let created = self
            .users
            .create(&user)
            .await
            .context("Failed to create user")?;

        tracing::info!(username = %created.username, role = %created.role.as_str(), "User registered");

        Ok(created)
    }

    /// Log in with username and password, creating a session.
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(User, Session), UserServiceError> {
        let user = self
            .users
            .get_by_username(username)
            .await
            .context("Failed to look up user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }

        let session = Session::new(user.id);
        self.sessions
            .create(&session)
            .await
            .context("Failed to create session")?;

        Ok((user, session))
    }

    /// Resolve a session token to its user.
    ///
    /// Expired sessions are deleted on sight.
    pub async fn validate_session(&self, token: &str) -> Result<User, UserServiceError> {
        let session = self
            .sessions
            .get(token)
            .await
            .context("Failed to look up session")?
            .ok_or(UserServiceError::InvalidSession)?;

        if session.is_expired() {
            let _ = self.sessions.delete(token).await;
            return Err(UserServiceError::InvalidSession);
        }

        self.users
            .get_by_id(session.user_id)
            .await
            .context("Failed to load session user")?
            .ok_or(UserServiceError::InvalidSession)
    }

    /// Log out, deleting the session.
    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.sessions
            .delete(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Change a user's password.
    pub async fn change_password(
        &self,
        user_id: i64,
        current: &str,
        new: &str,
    ) -> Result<(), UserServiceError> {
        if new.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let user = self
            .users
            .get_by_id(user_id)
            .await
            .context("Failed to load user")?
            .ok_or(UserServiceError::InvalidCredentials)?;

        if !verify_password(current, &user.password_hash)? {
            return Err(UserServiceError::InvalidCredentials);
        }

        let hash = hash_password(new)?;
        self.users
            .update_password(user_id, &hash)
            .await
            .context("Failed to update password")?;

        // Force re-login everywhere
        self.sessions
            .delete_for_user(user_id)
            .await
            .context("Failed to clear sessions")?;

        Ok(())
    }

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email address".to_string(),
            ));
        }
        if input.password.len() < 8 {
            return Err(UserServiceError::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migrations::run_migrations;
    use crate::db::pool::create_test_pool;
    use crate::db::repositories::{SqlxSessionRepository, SqlxUserRepository};

    async fn setup() -> UserService {
        let pool = create_test_pool().await.expect("Failed to create pool");
        run_migrations(&pool).await.expect("Migrations failed");
        UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool),
        )
    }

    fn input(username: &str) -> RegisterInput {
        RegisterInput {
            username: username.to_string(),
            email: format!("{}@example.id", username),
            password: "rahasia-panjang".to_string(),
        }
    }

    #[tokio::test]
    async fn test_first_user_becomes_admin() {
        let service = setup().await;

        let first = service.register(input("pemilik")).await.unwrap();
        assert_eq!(first.role, UserRole::Admin);

        let second = service.register(input("karyawan")).await.unwrap();
        assert_eq!(second.role, UserRole::Staff);
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let service = setup().await;

        service.register(input("tani")).await.unwrap();
        let result = service.register(input("tani")).await;
        assert!(matches!(result, Err(UserServiceError::DuplicateUsername(_))));
    }

    #[tokio::test]
    async fn test_short_password_rejected() {
        let service = setup().await;

        let mut bad = input("tani");
        bad.password = "pendek".to_string();
        let result = service.register(bad).await;
        assert!(matches!(result, Err(UserServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_login_and_session_validation() {
        let service = setup().await;
        service.register(input("tani")).await.unwrap();

        let (user, session) = service.login("tani", "rahasia-panjang").await.unwrap();
        assert_eq!(user.username, "tani");

        let validated = service.validate_session(&session.id).await.unwrap();
        assert_eq!(validated.id, user.id);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let service = setup().await;
        service.register(input("tani")).await.unwrap();

        let result = service.login("tani", "salah-semua").await;
        assert!(matches!(result, Err(UserServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_logout_invalidates_session() {
        let service = setup().await;
        service.register(input("tani")).await.unwrap();

        let (_, session) = service.login("tani", "rahasia-panjang").await.unwrap();
        service.logout(&session.id).await.unwrap();

        let result = service.validate_session(&session.id).await;
        assert!(matches!(result, Err(UserServiceError::InvalidSession)));
    }

    #[tokio::test]
    async fn test_change_password_clears_sessions() {
        let service = setup().await;
        let user = service.register(input("tani")).await.unwrap();

        let (_, session) = service.login("tani", "rahasia-panjang").await.unwrap();

        service
            .change_password(user.id, "rahasia-panjang", "rahasia-baru-99")
            .await
            .unwrap();

        assert!(service.validate_session(&session.id).await.is_err());
        assert!(service.login("tani", "rahasia-baru-99").await.is_ok());
    }
}
