use crate::application_port::*;
use crate::domain_model::UserId;

const TOKEN_PREFIX: &str = "fake-access-token:";

/// Accepts `fake-access-token:<username>` and derives a stable id from the
/// lowercased username. Development and tests only.
#[derive(Debug, Default)]
pub struct FakeIdentityProvider;

impl FakeIdentityProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn user_id_for(username: &str) -> UserId {
        UserId(uuid::Uuid::new_v5(
            &uuid::Uuid::NAMESPACE_OID,
            username.to_ascii_lowercase().as_bytes(),
        ))
    }

    pub fn token_for(username: &str) -> String {
        format!("{TOKEN_PREFIX}{username}")
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn verify(&self, token: &str) -> Result<Principal, IdentityError> {
        match token.strip_prefix(TOKEN_PREFIX) {
            Some(username) if !username.is_empty() => Ok(Principal {
                user_id: Self::user_id_for(username),
                username: Some(username.to_string()),
                image: None,
            }),
            _ => Err(IdentityError::TokenInvalid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn derives_same_id_regardless_of_case() {
        let provider = FakeIdentityProvider::new();
        let a = provider.verify("fake-access-token:Alice").await.unwrap();
        let b = provider.verify("fake-access-token:alice").await.unwrap();

        assert_eq!(a.user_id, b.user_id);
        assert_eq!(a.username.as_deref(), Some("Alice"));
    }

    #[tokio::test]
    async fn rejects_other_tokens() {
        let provider = FakeIdentityProvider::new();
        assert!(provider.verify("fake-access-token:").await.is_err());
        assert!(provider.verify("Bearer alice").await.is_err());
    }
}
