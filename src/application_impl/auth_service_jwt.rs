use crate::application_port::*;
use crate::domain_model::UserId;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub signing_key: Vec<u8>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String, // user id as string
    exp: i64,
    iat: i64,
    iss: String,
    aud: String,
}

/// Verifies HS256 access tokens minted by the identity service.
pub struct JwtHs256Verifier {
    cfg: JwtConfig,
}

impl JwtHs256Verifier {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Verifier { cfg }
    }

    fn decode_access(&self, token: &str) -> Result<AccessClaims, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.set_audience(&[self.cfg.audience.clone()]);
        v.set_issuer(&[self.cfg.issuer.clone()]);
        let data = decode::<AccessClaims>(token, &DecodingKey::from_secret(&self.cfg.signing_key), &v)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::TokenInvalid,
            })?;
        Ok(data.claims)
    }
}

#[async_trait::async_trait]
impl TokenVerifier for JwtHs256Verifier {
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        let claims = self.decode_access(token)?;
        claims.sub.parse::<UserId>().map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use jsonwebtoken::{EncodingKey, Header, encode};

    fn config() -> JwtConfig {
        JwtConfig {
            issuer: "tradepost.auth".to_owned(),
            audience: "tradepost-app".to_owned(),
            signing_key: b"test-signing-key".to_vec(),
        }
    }

    fn mint(cfg: &JwtConfig, sub: String, exp_offset_secs: i64) -> String {
        let now = Utc::now().timestamp();
        let claims = AccessClaims {
            sub,
            exp: now + exp_offset_secs,
            iat: now,
            iss: cfg.issuer.clone(),
            aud: cfg.audience.clone(),
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&cfg.signing_key),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let cfg = config();
        let user = UserId::new_v4();
        let token = mint(&cfg, user.to_string(), 3600);
        let verifier = JwtHs256Verifier::new(cfg);
        assert_eq!(verifier.verify_token(&token).await.unwrap(), user);
    }

    #[tokio::test]
    async fn expired_token_is_reported_as_expired() {
        let cfg = config();
        let token = mint(&cfg, UserId::new_v4().to_string(), -3600);
        let verifier = JwtHs256Verifier::new(cfg);
        assert!(matches!(
            verifier.verify_token(&token).await,
            Err(AuthError::TokenExpired)
        ));
    }

    #[tokio::test]
    async fn wrong_key_is_invalid() {
        let cfg = config();
        let token = mint(&cfg, UserId::new_v4().to_string(), 3600);
        let verifier = JwtHs256Verifier::new(JwtConfig {
            signing_key: b"another-key".to_vec(),
            ..config()
        });
        assert!(matches!(
            verifier.verify_token(&token).await,
            Err(AuthError::TokenInvalid)
        ));
    }
}
