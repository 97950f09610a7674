use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait FriendRequestRepo: Send + Sync {
    /// Fails with `Conflict` when the pair already has an active request.
    async fn insert_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError>;

    async fn find_active_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError>;

    /// Reads the request and holds it against concurrent writers until the
    /// transaction ends.
    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError>;

    /// Writes `request` only if the stored status still equals `expected`.
    /// Returns whether the write happened.
    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
        expected: FriendRequestStatus,
    ) -> Result<bool, RelationError>;

    /// Pending requests addressed to `user_id`, by creation time ascending.
    async fn list_incoming_pending(&self, user_id: UserId)
    -> Result<Vec<FriendEntry>, RelationError>;

    /// Pending requests sent by `user_id`, by creation time ascending.
    async fn list_outgoing_pending(&self, user_id: UserId)
    -> Result<Vec<FriendEntry>, RelationError>;

    /// Accepted requests involving `user_id`, by last transition descending.
    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError>;
}
