use crate::domain_model::{UserId, UserPair, UserProfile};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct FriendRequestId(pub uuid::Uuid);

impl FriendRequestId {
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }
}

impl fmt::Display for FriendRequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FriendRequestId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        uuid::Uuid::from_str(s).map(FriendRequestId)
    }
}

#[derive(
    Debug, Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(transparent)]
pub struct ConversationId(pub uuid::Uuid);

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendRequestStatus {
    Pending,
    Accepted,
    Rejected,
    Removed,
}

impl FriendRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FriendRequestStatus::Pending => "pending",
            FriendRequestStatus::Accepted => "accepted",
            FriendRequestStatus::Rejected => "rejected",
            FriendRequestStatus::Removed => "removed",
        }
    }

    /// Pending and accepted requests count toward the one-per-pair limit.
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            FriendRequestStatus::Pending | FriendRequestStatus::Accepted
        )
    }

    pub fn apply(self, action: FriendAction) -> Result<FriendRequestStatus, InvalidTransition> {
        use FriendAction::*;
        use FriendRequestStatus::*;

        match (self, action) {
            (Pending, Accept) => Ok(Accepted),
            (Pending, Reject) => Ok(Rejected),
            (Accepted, Remove) => Ok(Removed),
            (status, action) => Err(InvalidTransition { status, action }),
        }
    }
}

impl fmt::Display for FriendRequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FriendRequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(FriendRequestStatus::Pending),
            "accepted" => Ok(FriendRequestStatus::Accepted),
            "rejected" => Ok(FriendRequestStatus::Rejected),
            "removed" => Ok(FriendRequestStatus::Removed),
            other => Err(format!("unknown friend request status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FriendAction {
    Accept,
    Reject,
    Remove,
}

impl fmt::Display for FriendAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FriendAction::Accept => "accept",
            FriendAction::Reject => "reject",
            FriendAction::Remove => "remove",
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
#[error("cannot {action} a {status} friend request")]
pub struct InvalidTransition {
    pub status: FriendRequestStatus,
    pub action: FriendAction,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct FriendRequest {
    pub request_id: FriendRequestId,
    pub requester: UserId,
    pub recipient: UserId,
    pub status: FriendRequestStatus,
    pub conversation_id: Option<ConversationId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FriendRequest {
    pub fn new_pending(requester: UserId, recipient: UserId, now: DateTime<Utc>) -> Self {
        Self {
            request_id: FriendRequestId::new(),
            requester,
            recipient,
            status: FriendRequestStatus::Pending,
            conversation_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn pair(&self) -> UserPair {
        UserPair::new(self.requester, self.recipient)
    }

    pub fn involves(&self, user_id: UserId) -> bool {
        self.requester == user_id || self.recipient == user_id
    }

    /// The party that is not `user_id`.
    pub fn other_party(&self, user_id: UserId) -> UserId {
        if self.requester == user_id {
            self.recipient
        } else {
            self.requester
        }
    }

    pub fn direction_for(&self, user_id: UserId) -> Direction {
        if self.requester == user_id {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

/// A friend request seen from one of its parties: `friend` is the other one.
#[derive(Debug, Clone, Serialize)]
pub struct FriendEntry {
    pub request_id: FriendRequestId,
    pub status: FriendRequestStatus,
    pub direction: Direction,
    pub friend: UserProfile,
    pub since: DateTime<Utc>,
    pub conversation_id: Option<ConversationId>,
}

impl FriendEntry {
    pub fn from_request(request: &FriendRequest, viewer: UserId, friend: UserProfile) -> Self {
        let since = match request.status {
            FriendRequestStatus::Pending => request.created_at,
            _ => request.updated_at,
        };
        Self {
            request_id: request.request_id,
            status: request.status,
            direction: request.direction_for(viewer),
            friend,
            since,
            conversation_id: request.conversation_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use FriendAction::*;
    use FriendRequestStatus::*;

    #[test]
    fn pending_can_be_accepted_or_rejected() {
        assert_eq!(Pending.apply(Accept), Ok(Accepted));
        assert_eq!(Pending.apply(Reject), Ok(Rejected));
        assert_eq!(
            Pending.apply(Remove),
            Err(InvalidTransition {
                status: Pending,
                action: Remove
            })
        );
    }

    #[test]
    fn accepted_can_only_be_removed() {
        assert_eq!(Accepted.apply(Remove), Ok(Removed));
        assert!(Accepted.apply(Accept).is_err());
        assert!(Accepted.apply(Reject).is_err());
    }

    #[test]
    fn terminal_states_reject_everything() {
        for status in [Rejected, Removed] {
            for action in [Accept, Reject, Remove] {
                assert_eq!(status.apply(action), Err(InvalidTransition { status, action }));
            }
        }
    }

    #[test]
    fn only_pending_and_accepted_are_active() {
        assert!(Pending.is_active());
        assert!(Accepted.is_active());
        assert!(!Rejected.is_active());
        assert!(!Removed.is_active());
    }

    #[test]
    fn status_string_form_parses_back() {
        for status in [Pending, Accepted, Rejected, Removed] {
            assert_eq!(status.as_str().parse::<FriendRequestStatus>(), Ok(status));
        }
        assert!("blocked".parse::<FriendRequestStatus>().is_err());
    }

    #[test]
    fn parties_seen_from_each_side() {
        let a = UserId(uuid::Uuid::from_u128(1));
        let b = UserId(uuid::Uuid::from_u128(2));
        let request = FriendRequest::new_pending(a, b, Utc::now());

        assert_eq!(request.other_party(a), b);
        assert_eq!(request.other_party(b), a);
        assert_eq!(request.direction_for(a), Direction::Outgoing);
        assert_eq!(request.direction_for(b), Direction::Incoming);
        assert!(!request.involves(UserId(uuid::Uuid::from_u128(3))));
    }

    #[test]
    fn invalid_transition_message_names_both_sides() {
        let err = Removed.apply(Remove).unwrap_err();
        assert_eq!(err.to_string(), "cannot remove a removed friend request");
    }
}
