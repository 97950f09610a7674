use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::logger::*;
use crate::settings::{SeedUser, Settings};
use anyhow::anyhow;
use nanoid::nanoid;
use sqlx::MySqlPool;
use std::sync::Arc;

/// Every service the HTTP layer needs, wired from settings.
pub struct Server {
    pub user_service: Arc<dyn UserService>,
    pub relationship_service: Arc<dyn RelationshipService>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pool: Option<MySqlPool>,
}

struct Repos {
    tx_manager: Arc<dyn TxManager>,
    user_repo: Arc<dyn UserRepo>,
    friend_request_repo: Arc<dyn FriendRequestRepo>,
    pool: Option<MySqlPool>,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let alphabet: [char; 16] = [
            '1', '2', '3', '4', '5', '6', '7', '8', '9', '0', 'a', 'b', 'c', 'd', 'e', 'f',
        ];
        let run_id = nanoid!(10, &alphabet);

        // Seed ids come from the fake provider and would squat real usernames.
        if !settings.user.seed.is_empty() && settings.identity.backend != "fake" {
            return Err(anyhow!(
                "user.seed requires the fake identity backend, not {}",
                settings.identity.backend
            ));
        }

        let repos = match settings.store.backend.as_str() {
            "memory" => Self::memory_repos(),
            "mysql" => {
                let dsn = settings
                    .store
                    .dsn
                    .as_deref()
                    .ok_or_else(|| anyhow!("store.dsn is required for the mysql backend"))?;
                let pool = connect_mysql(dsn, settings.store.max_connections).await?;
                Repos {
                    tx_manager: Arc::new(MySqlTxManager::new(pool.clone())),
                    user_repo: Arc::new(MySqlUserRepo::new()),
                    friend_request_repo: Arc::new(MySqlFriendRequestRepo::new(pool.clone())),
                    pool: Some(pool),
                }
            }
            other => return Err(anyhow!("Unknown store backend: {}", other)),
        };

        let identity_provider: Arc<dyn IdentityProvider> =
            match settings.identity.backend.as_str() {
                "fake" => Arc::new(FakeIdentityProvider::new()),
                "jwt" => {
                    let key = std::env::var(&settings.identity.signing_key_env).map_err(|_| {
                        anyhow!(
                            "signing key variable {} is not set",
                            settings.identity.signing_key_env
                        )
                    })?;
                    Arc::new(JwtIdentityProvider::new(JwtConfig {
                        issuer: settings.identity.issuer.clone(),
                        audience: settings.identity.audience.clone(),
                        signing_key: key.into_bytes(),
                    }))
                }
                other => return Err(anyhow!("Unknown identity backend: {}", other)),
            };

        let server = Self::assemble(repos, identity_provider);
        server.seed_users(&settings.user.seed).await?;

        info!(
            %run_id,
            store = %settings.store.backend,
            identity = %settings.identity.backend,
            "server started"
        );
        Ok(server)
    }

    /// A memory-backed server with the fake identity provider.
    pub fn in_memory() -> Self {
        Self::assemble(Self::memory_repos(), Arc::new(FakeIdentityProvider::new()))
    }

    fn memory_repos() -> Repos {
        let store = MemoryStore::new();
        Repos {
            tx_manager: Arc::new(MemoryTxManager::new(store.clone())),
            user_repo: Arc::new(MemoryUserRepo::new()),
            friend_request_repo: Arc::new(MemoryFriendRequestRepo::new(store)),
            pool: None,
        }
    }

    fn assemble(repos: Repos, identity_provider: Arc<dyn IdentityProvider>) -> Self {
        let user_service: Arc<dyn UserService> = Arc::new(RealUserService::new(
            repos.user_repo.clone(),
            repos.tx_manager.clone(),
        ));
        let relationship_service: Arc<dyn RelationshipService> =
            Arc::new(RealRelationshipService::new(
                repos.user_repo,
                repos.friend_request_repo,
                repos.tx_manager,
            ));

        Self {
            user_service,
            relationship_service,
            identity_provider,
            pool: repos.pool,
        }
    }

    /// Seed profiles use the ids the fake identity provider derives, so a
    /// dev server can be driven with `fake-access-token:<username>`.
    pub async fn seed_users(&self, seed: &[SeedUser]) -> anyhow::Result<()> {
        for user in seed {
            let principal = Principal {
                user_id: FakeIdentityProvider::user_id_for(&user.username),
                username: Some(user.username.clone()),
                image: user.image.clone(),
            };
            self.user_service
                .sync_principal(&principal)
                .await
                .map_err(|e| anyhow!("seeding {}: {}", user.username, e))?;
        }
        if !seed.is_empty() {
            debug!(count = seed.len(), "seeded users");
        }
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        if let Some(pool) = &self.pool {
            pool.close().await;
            info!("mysql pool closed");
        }
    }
}
