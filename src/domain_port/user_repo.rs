use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::repo_tx::StorageTx;

#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    /// Inserts or replaces the profile keyed by `user_id`.
    /// Fails with `UsernameTaken` if another user holds the same username key.
    async fn upsert_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        profile: &UserProfile,
    ) -> Result<(), UserError>;

    async fn get_profile_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        user_id: UserId,
    ) -> Result<UserProfile, UserError>;

    async fn get_id_by_username_in_tx(
        &self,
        tx: &mut dyn StorageTx,
        username: &Username,
    ) -> Result<UserId, UserError>;
}
