use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct RealRelationshipService {
    user_repo: Arc<dyn UserRepo>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    tx_manager: Arc<dyn TxManager>,
}

/// Who may apply an action to a request.
#[derive(Debug, Clone, Copy)]
enum Party {
    Recipient,
    Either,
}

impl Party {
    fn allows(self, request: &FriendRequest, actor: UserId) -> bool {
        match self {
            Party::Recipient => request.recipient == actor,
            Party::Either => request.involves(actor),
        }
    }
}

impl RealRelationshipService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        friend_request_repo: Arc<dyn FriendRequestRepo>,
        tx_manager: Arc<dyn TxManager>,
    ) -> Self {
        Self {
            user_repo,
            friend_request_repo,
            tx_manager,
        }
    }

    async fn transition(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
        action: FriendAction,
        party: Party,
    ) -> Result<FriendRequest, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        // A request the actor may not touch is indistinguishable from a missing one.
        let current = self
            .friend_request_repo
            .get_for_update_in_tx(&mut *tx, request_id)
            .await?
            .filter(|request| party.allows(request, actor))
            .ok_or(RelationError::NotFound("friend request"))?;

        let expected = current.status;
        let mut next = current;
        next.status = expected.apply(action)?;
        next.updated_at = Utc::now();
        if next.status == FriendRequestStatus::Accepted {
            next.conversation_id = Some(ConversationId(Uuid::new_v4()));
        }

        if !self
            .friend_request_repo
            .update_in_tx(&mut *tx, &next, expected)
            .await?
        {
            // Another writer got there first; report against what it left behind.
            let status = self
                .friend_request_repo
                .get_for_update_in_tx(&mut *tx, request_id)
                .await?
                .map(|request| request.status)
                .unwrap_or(expected);
            return Err(InvalidTransition { status, action }.into());
        }

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        info!(
            request_id = %request_id,
            actor = %actor,
            from = %expected,
            to = %next.status,
            "friend request transitioned"
        );
        Ok(next)
    }
}

#[async_trait::async_trait]
impl RelationshipService for RealRelationshipService {
    async fn send_request(
        &self,
        requester: UserId,
        recipient_username: &str,
    ) -> Result<FriendRequest, RelationError> {
        let username = Username::parse(recipient_username)
            .map_err(|e| RelationError::InvalidArgument(e.to_string()))?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        // Lists show the requester's profile, so it has to exist.
        self.user_repo
            .get_profile_in_tx(&mut *tx, requester)
            .await?;
        let recipient = self
            .user_repo
            .get_id_by_username_in_tx(&mut *tx, &username)
            .await?;
        if recipient == requester {
            return Err(RelationError::InvalidArgument(
                "cannot send a friend request to yourself".to_string(),
            ));
        }

        if let Some(active) = self
            .friend_request_repo
            .find_active_by_pair_in_tx(&mut *tx, UserPair::new(requester, recipient))
            .await?
        {
            return Err(RelationError::already_active(active.status));
        }

        let request = FriendRequest::new_pending(requester, recipient, Utc::now());
        self.friend_request_repo
            .insert_pending_in_tx(&mut *tx, &request)
            .await?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        info!(
            request_id = %request.request_id,
            requester = %requester,
            recipient = %recipient,
            "friend request sent"
        );
        Ok(request)
    }

    async fn accept_request(
        &self,
        recipient: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        self.transition(recipient, request_id, FriendAction::Accept, Party::Recipient)
            .await
    }

    async fn reject_request(
        &self,
        recipient: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        self.transition(recipient, request_id, FriendAction::Reject, Party::Recipient)
            .await
    }

    async fn remove_friend(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<FriendRequest, RelationError> {
        self.transition(actor, request_id, FriendAction::Remove, Party::Either)
            .await
    }

    async fn open_direct_conversation(
        &self,
        actor: UserId,
        request_id: FriendRequestId,
    ) -> Result<ConversationId, RelationError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        let request = self
            .friend_request_repo
            .get_for_update_in_tx(&mut *tx, request_id)
            .await?
            .filter(|request| request.involves(actor))
            .ok_or(RelationError::NotFound("friend request"))?;

        tx.commit()
            .await
            .map_err(|e| RelationError::Store(e.to_string()))?;

        match (request.status, request.conversation_id) {
            (FriendRequestStatus::Accepted, Some(conversation_id)) => Ok(conversation_id),
            (FriendRequestStatus::Accepted, None) => Err(RelationError::Store(format!(
                "accepted friend request {request_id} has no conversation"
            ))),
            (status, _) => Err(RelationError::InvalidState(format!(
                "cannot open a conversation on a {status} friend request"
            ))),
        }
    }

    async fn list_pending(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError> {
        self.friend_request_repo.list_incoming_pending(user_id).await
    }

    async fn list_outgoing(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError> {
        self.friend_request_repo.list_outgoing_pending(user_id).await
    }

    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError> {
        self.friend_request_repo.list_accepted(user_id).await
    }
}
