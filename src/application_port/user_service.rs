use crate::application_port::Principal;
use crate::domain_model::{UserId, UserProfile, UsernameError};

#[derive(Debug, thiserror::Error)]
pub enum UserError {
    #[error("user not found")]
    NotFound,
    #[error(transparent)]
    InvalidUsername(#[from] UsernameError),
    #[error("username already taken")]
    UsernameTaken,
    #[error("store error: {0}")]
    Store(String),
}

#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    async fn resolve_username(&self, username: &str) -> Result<UserId, UserError>;
    async fn current_user(&self, user_id: UserId) -> Result<UserProfile, UserError>;
    /// Creates or refreshes the profile described by the principal's claims.
    async fn sync_principal(&self, principal: &Principal) -> Result<UserProfile, UserError>;
}
