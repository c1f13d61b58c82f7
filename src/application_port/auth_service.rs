use crate::domain_model::UserId;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("internal error: {0}")]
    InternalError(String),
}

/// Resolves the per-request credential to the acting user. Issuing
/// credentials happens elsewhere.
#[async_trait::async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
}
