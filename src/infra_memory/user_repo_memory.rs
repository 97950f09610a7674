use super::repo_tx_memory::downcast;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;

#[derive(Default)]
pub struct MemoryUserRepo;

impl MemoryUserRepo {
    pub fn new() -> Self {
        MemoryUserRepo
    }
}

fn store_err(e: anyhow::Error) -> UserError {
    UserError::Store(e.to_string())
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        profile: &UserProfile,
    ) -> Result<(), UserError> {
        let state = downcast(tx).map_err(store_err)?.state();

        let key = profile.username.key();
        if let Some(owner) = state.usernames.get(key) {
            if *owner != profile.user_id {
                return Err(UserError::UsernameTaken);
            }
        }

        let old_key = state
            .users
            .get(&profile.user_id)
            .map(|old| old.username.key().to_owned());
        if let Some(old_key) = old_key {
            state.usernames.remove(&old_key);
        }
        state.usernames.insert(key.to_owned(), profile.user_id);
        state.users.insert(profile.user_id, profile.clone());

        Ok(())
    }

    async fn get_profile_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<UserProfile, UserError> {
        let state = downcast(tx).map_err(store_err)?.state();
        state.users.get(&user_id).cloned().ok_or(UserError::NotFound)
    }

    async fn get_id_by_username_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &Username,
    ) -> Result<UserId, UserError> {
        let state = downcast(tx).map_err(store_err)?.state();
        state
            .usernames
            .get(username.key())
            .copied()
            .ok_or(UserError::NotFound)
    }
}
