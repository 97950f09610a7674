use super::repo_tx_memory::{MemoryState, MemoryStore, downcast};
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

pub struct MemoryFriendRequestRepo {
    store: MemoryStore,
}

impl MemoryFriendRequestRepo {
    pub fn new(store: MemoryStore) -> Self {
        Self { store }
    }
}

fn store_err(e: anyhow::Error) -> RelationError {
    RelationError::Store(e.to_string())
}

/// Joins each request with the viewer's counterpart. Requests whose
/// counterpart has no profile are left out.
fn project<'a>(
    state: &MemoryState,
    viewer: UserId,
    requests: impl Iterator<Item = &'a FriendRequest>,
) -> Vec<FriendEntry> {
    requests
        .filter_map(|request| {
            let friend = state.users.get(&request.other_party(viewer))?;
            Some(FriendEntry::from_request(request, viewer, friend.clone()))
        })
        .collect()
}

#[async_trait::async_trait]
impl FriendRequestRepo for MemoryFriendRequestRepo {
    async fn insert_pending_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
    ) -> Result<(), RelationError> {
        let state = downcast(tx).map_err(store_err)?.state();

        let pair = request.pair();
        if let Some(active) = state
            .requests
            .iter()
            .find(|r| r.status.is_active() && r.pair() == pair)
        {
            return Err(RelationError::already_active(active.status));
        }

        state.requests.push(request.clone());
        Ok(())
    }

    async fn find_active_by_pair_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        pair: UserPair,
    ) -> Result<Option<FriendRequest>, RelationError> {
        let state = downcast(tx).map_err(store_err)?.state();
        Ok(state
            .requests
            .iter()
            .find(|r| r.status.is_active() && r.pair() == pair)
            .cloned())
    }

    async fn get_for_update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request_id: FriendRequestId,
    ) -> Result<Option<FriendRequest>, RelationError> {
        // The transaction already holds the store exclusively.
        let state = downcast(tx).map_err(store_err)?.state();
        Ok(state
            .requests
            .iter()
            .find(|r| r.request_id == request_id)
            .cloned())
    }

    async fn update_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        request: &FriendRequest,
        expected: FriendRequestStatus,
    ) -> Result<bool, RelationError> {
        let state = downcast(tx).map_err(store_err)?.state();
        match state
            .requests
            .iter_mut()
            .find(|r| r.request_id == request.request_id)
        {
            Some(stored) if stored.status == expected => {
                *stored = request.clone();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_incoming_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FriendEntry>, RelationError> {
        let state = self.store.read().await;
        let mut requests: Vec<&FriendRequest> = state
            .requests
            .iter()
            .filter(|r| r.recipient == user_id && r.status == FriendRequestStatus::Pending)
            .collect();
        requests.sort_by_key(|r| r.created_at);

        Ok(project(&state, user_id, requests.into_iter()))
    }

    async fn list_outgoing_pending(
        &self,
        user_id: UserId,
    ) -> Result<Vec<FriendEntry>, RelationError> {
        let state = self.store.read().await;
        let mut requests: Vec<&FriendRequest> = state
            .requests
            .iter()
            .filter(|r| r.requester == user_id && r.status == FriendRequestStatus::Pending)
            .collect();
        requests.sort_by_key(|r| r.created_at);

        Ok(project(&state, user_id, requests.into_iter()))
    }

    async fn list_accepted(&self, user_id: UserId) -> Result<Vec<FriendEntry>, RelationError> {
        let state = self.store.read().await;
        let mut requests: Vec<&FriendRequest> = state
            .requests
            .iter()
            .rev()
            .filter(|r| r.involves(user_id) && r.status == FriendRequestStatus::Accepted)
            .collect();
        // stable: equal timestamps stay newest-inserted first
        requests.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(project(&state, user_id, requests.into_iter()))
    }
}
