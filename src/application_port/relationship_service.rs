use crate::application_port::UserError;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("store error: {0}")]
    Store(String),
}

impl From<UserError> for RelationError {
    fn from(error: UserError) -> Self {
        match error {
            UserError::NotFound => RelationError::NotFound("user"),
            UserError::InvalidUsername(e) => RelationError::InvalidArgument(e.to_string()),
            UserError::UsernameTaken => RelationError::Conflict("username already taken".to_owned()),
            UserError::Store(e) => RelationError::Store(e),
        }
    }
}

impl From<InvalidTransition> for RelationError {
    fn from(error: InvalidTransition) -> Self {
        RelationError::InvalidState(error.to_string())
    }
}

impl RelationError {
    /// The pair already has an active request in `status`.
    pub fn already_active(status: FriendRequestStatus) -> Self {
        match status {
            FriendRequestStatus::Accepted => RelationError::Conflict("already friends".to_owned()),
            _ => RelationError::Conflict("friend request already pending".to_owned()),
        }
    }
}

#[async_trait::async_trait]
pub trait RelationshipService: Send + Sync {
    /// Creates a pending request from `requester` to the user named `recipient_username`.
    async fn send_request(
        &self,
        requester: UserId,
        recipient_username: &str,
    ) -> Result<FriendRequest, RelationError>;
    async fn accept_request(
        &self,
        recipient: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError>;
    /// The rejected request is kept; only active requests block a new one.
    async fn reject_request(
        &self,
        recipient: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError>;
    /// Either party may remove an accepted friendship.
    async fn remove_friend(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError>;
    async fn open_direct_conversation(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<ConversationId, RelationError>;
    /// Incoming pending requests, oldest first.
    async fn list_pending(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError>;
    /// Outgoing pending requests, oldest first.
    async fn list_outgoing(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError>;
    /// Accepted friendships, most recently accepted first.
    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError>;
}
