use crate::application_port::{Principal, UserError, UserService};
use crate::domain_model::{UserId, UserProfile, Username};
use crate::domain_port::{TxManager, UserRepo};
use crate::logger::*;
use std::sync::Arc;

pub struct RealUserService {
    user_repo: Arc<dyn UserRepo>,
    tx_manager: Arc<dyn TxManager>,
}

impl RealUserService {
    pub fn new(user_repo: Arc<dyn UserRepo>, tx_manager: Arc<dyn TxManager>) -> RealUserService {
        RealUserService {
            user_repo,
            tx_manager,
        }
    }
}

#[async_trait::async_trait]
impl UserService for RealUserService {
    async fn resolve_username(&self, username: &str) -> Result<UserId, UserError> {
        let username = Username::parse(username)?;

        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        let user_id = self
            .user_repo
            .get_id_by_username_in_tx(&mut *tx, &username)
            .await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(user_id)
    }

    async fn current_user(&self, user_id: UserId) -> Result<UserProfile, UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        let profile = self.user_repo.get_profile_in_tx(&mut *tx, user_id).await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        Ok(profile)
    }

    async fn sync_principal(&self, principal: &Principal) -> Result<UserProfile, UserError> {
        let mut tx = self
            .tx_manager
            .begin()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        // Tokens without a username claim can only refresh an existing profile.
        let username = match principal.username.as_deref() {
            Some(raw) => Username::parse(raw)?,
            None => {
                self.user_repo
                    .get_profile_in_tx(&mut *tx, principal.user_id)
                    .await?
                    .username
            }
        };

        let profile = UserProfile {
            user_id: principal.user_id,
            username,
            image: principal.image.clone(),
        };
        self.user_repo.upsert_in_tx(&mut *tx, &profile).await?;

        tx.commit()
            .await
            .map_err(|e| UserError::Store(e.to_string()))?;

        debug!(user_id = %profile.user_id, username = %profile.username, "profile synced");
        Ok(profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::*;

    fn service() -> RealUserService {
        let store = MemoryStore::new();
        RealUserService::new(
            Arc::new(MemoryUserRepo::new()),
            Arc::new(MemoryTxManager::new(store)),
        )
    }

    fn principal(n: u128, username: Option<&str>) -> Principal {
        Principal {
            user_id: UserId(uuid::Uuid::from_u128(n)),
            username: username.map(str::to_string),
            image: None,
        }
    }

    #[tokio::test]
    async fn sync_then_resolve_case_insensitively() {
        let users = service();
        let alice = users.sync_principal(&principal(1, Some("Alice"))).await.unwrap();

        assert_eq!(users.resolve_username("ALICE").await.unwrap(), alice.user_id);
        assert_eq!(users.current_user(alice.user_id).await.unwrap(), alice);
    }

    #[tokio::test]
    async fn renaming_frees_the_old_username() {
        let users = service();
        users.sync_principal(&principal(1, Some("alice"))).await.unwrap();
        users.sync_principal(&principal(1, Some("alicia"))).await.unwrap();

        assert!(matches!(
            users.resolve_username("alice").await,
            Err(UserError::NotFound)
        ));
        users.sync_principal(&principal(2, Some("alice"))).await.unwrap();
    }

    #[tokio::test]
    async fn username_owned_by_someone_else_is_taken() {
        let users = service();
        users.sync_principal(&principal(1, Some("alice"))).await.unwrap();

        let err = users
            .sync_principal(&principal(2, Some("ALICE")))
            .await
            .unwrap_err();
        assert!(matches!(err, UserError::UsernameTaken));
    }

    #[tokio::test]
    async fn missing_username_claim_needs_existing_profile() {
        let users = service();
        let err = users.sync_principal(&principal(1, None)).await.unwrap_err();
        assert!(matches!(err, UserError::NotFound));

        users.sync_principal(&principal(1, Some("alice"))).await.unwrap();
        let mut with_image = principal(1, None);
        with_image.image = Some("https://img.test/a.png".to_string());
        let profile = users.sync_principal(&with_image).await.unwrap();
        assert_eq!(profile.username.as_str(), "alice");
        assert_eq!(profile.image.as_deref(), Some("https://img.test/a.png"));
    }

    #[tokio::test]
    async fn malformed_username_is_rejected() {
        let users = service();
        assert!(matches!(
            users.sync_principal(&principal(1, Some("no spaces"))).await,
            Err(UserError::InvalidUsername(_))
        ));
        assert!(matches!(
            users.resolve_username("x").await,
            Err(UserError::InvalidUsername(_))
        ));
    }
}
