use crate::application_port::*;
use crate::domain_model::UserId;

const FAKE_TOKEN_PREFIX: &str = "fake-access-token:";

/// Accepts `fake-access-token:<user uuid>` so local clients and tests can act
/// as any user without an identity provider.
#[derive(Debug, Default)]
pub struct FakeTokenVerifier;

impl FakeTokenVerifier {
    pub fn new() -> Self {
        Self
    }

    pub fn token_for(user_id: UserId) -> String {
        format!("{FAKE_TOKEN_PREFIX}{user_id}")
    }
}

#[async_trait::async_trait]
impl TokenVerifier for FakeTokenVerifier {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        token
            .strip_prefix(FAKE_TOKEN_PREFIX)
            .and_then(|id| id.parse::<UserId>().ok())
            .ok_or(AuthError::TokenInvalid)
    }
}
