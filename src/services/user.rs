//! User service
//!
//! Admin accounts and cookie sessions:
//! - account creation with password confirmation
//! - login with a per-username failure limit
//! - session lookup and logout
//! - seeding the configured admin at startup

use crate::models::{CreateUserInput, FieldError, NewUser, Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::services::rate_limiter::RateLimiter;
use crate::storage::{DynStorage, StorageError};
use anyhow::Context;
use serde::Deserialize;
use std::sync::Arc;

const MIN_PASSWORD_CHARS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Too many login attempts. Please try again later.")]
    RateLimited,

    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("User already exists: {0}")]
    UserExists(String),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// `POST /api/auth/login` body
#[derive(Debug, Clone, Deserialize)]
pub struct LoginInput {
    pub username: String,
    pub password: String,
}

pub struct UserService {
    storage: DynStorage,
    login_limiter: Arc<RateLimiter>,
}

impl UserService {
    pub fn new(storage: DynStorage, login_limiter: Arc<RateLimiter>) -> Self {
        Self {
            storage,
            login_limiter,
        }
    }

    pub fn login_limiter(&self) -> &Arc<RateLimiter> {
        &self.login_limiter
    }

    pub async fn create_user(&self, input: CreateUserInput) -> Result<User, UserServiceError> {
        validate_new_user(&input).map_err(UserServiceError::Validation)?;

        let password_hash = hash_password(&input.password)?;
        let username = input.username.trim().to_string();

        self.storage
            .create_user(NewUser {
                username: username.clone(),
                password_hash,
                role: input.role.unwrap_or_default(),
            })
            .await
            .map_err(|e| match StorageError::find(&e) {
                Some(StorageError::Conflict { .. }) => UserServiceError::UserExists(username),
                _ => UserServiceError::InternalError(e.context("Failed to create user")),
            })
    }

    /// Create the admin account unless a user with that name already exists.
    /// Returns whether an account was created.
    pub async fn ensure_admin(&self, username: &str, password: &str) -> Result<bool, UserServiceError> {
        if self
            .storage
            .get_user_by_username(username)
            .await
            .context("Failed to look up admin")?
            .is_some()
        {
            return Ok(false);
        }

        let input = CreateUserInput {
            username: username.to_string(),
            password: password.to_string(),
            confirm_password: password.to_string(),
            role: Some(UserRole::Admin),
        };
        match self.create_user(input).await {
            Ok(user) => {
                tracing::info!("Seeded admin account '{}'", user.username);
                Ok(true)
            }
            // Another instance seeded it first
            Err(UserServiceError::UserExists(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Check credentials and open a session.
    ///
    /// Failures count against the username; a success clears the count.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let key = input.username.trim().to_lowercase();
        if self.login_limiter.is_limited(&key).await {
            tracing::warn!("Login rate limit hit for '{}'", key);
            return Err(UserServiceError::RateLimited);
        }

        let user = self
            .storage
            .get_user_by_username(input.username.trim())
            .await
            .context("Failed to look up user")?;

        let user = match user {
            Some(user) if verify_password(&input.password, &user.password_hash)? => user,
            _ => {
                self.login_limiter.record(&key).await;
                return Err(UserServiceError::InvalidCredentials);
            }
        };

        self.login_limiter.clear(&key).await;

        let session = Session::issue(user.id);
        self.storage
            .create_session(&session)
            .await
            .context("Failed to create session")?;

        tracing::info!(user_id = user.id, "User '{}' logged in", user.username);
        Ok((user, session))
    }

    pub async fn logout(&self, token: &str) -> Result<(), UserServiceError> {
        self.storage
            .delete_session(token)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// The user behind a live session token. Expired sessions are removed.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        let Some(session) = self
            .storage
            .get_session(token)
            .await
            .context("Failed to get session")?
        else {
            return Ok(None);
        };

        if session.is_expired() {
            if let Err(e) = self.storage.delete_session(token).await {
                tracing::warn!("Failed to delete expired session: {}", e);
            }
            return Ok(None);
        }

        Ok(self
            .storage
            .get_user(session.user_id)
            .await
            .context("Failed to get user")?)
    }

    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        Ok(self
            .storage
            .delete_expired_sessions()
            .await
            .context("Failed to delete expired sessions")?)
    }
}

fn validate_new_user(input: &CreateUserInput) -> Result<(), Vec<FieldError>> {
    let mut errors = Vec::new();
    let mut push = |field: &str, message: &str| {
        errors.push(FieldError {
            field: field.to_string(),
            message: message.to_string(),
        })
    };

    if input.username.trim().is_empty() {
        push("username", "Username is required");
    }
    if input.password.chars().count() < MIN_PASSWORD_CHARS {
        push("password", "Password must be at least 8 characters");
    }
    if input.password != input.confirm_password {
        push("confirmPassword", "Passwords don't match");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
