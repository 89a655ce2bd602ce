use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::debug;

use crate::{auth::repo::{Role, User}, config::JwtConfig, error::ApiError, state::AppState};

/// Token type used to distinguish Access and Refresh JWTs.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,        // user ID
    pub role: Role,      // role at issuance; current role is re-read from the store
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // access or refresh
}

/// Holds JWT signing and verification keys with config data.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        let JwtConfig {
            secret,
            issuer,
            audience,
            access_ttl_minutes,
            refresh_ttl_minutes,
            ..
        } = state.config.jwt.clone();
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            issuer,
            audience,
            access_ttl: Duration::from_secs((access_ttl_minutes as u64) * 60),
            refresh_ttl: Duration::from_secs((refresh_ttl_minutes as u64) * 60),
        }
    }
}

impl JwtKeys {
    fn sign_with_kind(&self, user: &User, kind: TokenKind) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let ttl = match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        };
        let exp = now + TimeDuration::seconds(ttl.as_secs() as i64);
        let claims = Claims {
            sub: user.id,
            role: user.role,
            iat: now.unix_timestamp() as usize,
            exp: exp.unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(user_id = user.id, kind = ?kind, "jwt signed");
        Ok(token)
    }

    pub fn sign_access(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Access)
    }
    pub fn sign_refresh(&self, user: &User) -> anyhow::Result<String> {
        self.sign_with_kind(user, TokenKind::Refresh)
    }

    /// Issues the access/refresh pair returned by login and refresh.
    pub fn sign_pair(&self, user: &User) -> anyhow::Result<(String, String)> {
        Ok((self.sign_access(user)?, self.sign_refresh(user)?))
    }

    /// Checks signature, issuer/audience, expiry and token kind. An access
    /// token never passes where a refresh token is expected and vice versa.
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, ApiError> {
        let mut validation = Validation::default();
        // A token is valid strictly before its expiry instant.
        validation.leeway = 0;
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => ApiError::ExpiredToken,
                _ => ApiError::InvalidToken,
            }
        })?;
        if data.claims.kind != expected {
            return Err(ApiError::InvalidToken);
        }
        debug!(user_id = data.claims.sub, kind = ?data.claims.kind, "jwt verified");
        Ok(data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_keys() -> JwtKeys {
        JwtKeys::from_ref(&AppState::fake())
    }

    fn make_user(id: i64, role: Role) -> User {
        User {
            id,
            username: format!("user{id}"),
            email: format!("user{id}@example.com"),
            password_hash: "x".into(),
            role,
            pelanggan_id: None,
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn sign_and_verify_access_token() {
        let keys = make_keys();
        let user = make_user(42, Role::Admin);
        let token = keys.sign_access(&user).expect("sign access");
        let claims = keys.verify(&token, TokenKind::Access).expect("verify token");
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.iss, "test-issuer");
        assert_eq!(claims.aud, "test-aud");
        assert_eq!(claims.kind, TokenKind::Access);
    }

    #[tokio::test]
    async fn access_and_refresh_are_not_interchangeable() {
        let keys = make_keys();
        let user = make_user(7, Role::User);
        let access = keys.sign_access(&user).expect("sign access");
        let refresh = keys.sign_refresh(&user).expect("sign refresh");

        assert!(matches!(
            keys.verify(&access, TokenKind::Refresh),
            Err(ApiError::InvalidToken)
        ));
        assert!(matches!(
            keys.verify(&refresh, TokenKind::Access),
            Err(ApiError::InvalidToken)
        ));
        assert!(keys.verify(&refresh, TokenKind::Refresh).is_ok());
    }

    #[tokio::test]
    async fn verify_rejects_expired_token_with_expiry_error() {
        let keys = make_keys();
        let now = OffsetDateTime::now_utc().unix_timestamp() as usize;
        let claims = Claims {
            sub: 1,
            role: Role::User,
            iat: now - 120,
            exp: now - 60,
            iss: "test-issuer".into(),
            aud: "test-aud".into(),
            kind: TokenKind::Access,
        };
        let token = encode(&Header::default(), &claims, &keys.encoding).expect("encode");
        assert!(matches!(
            keys.verify(&token, TokenKind::Access),
            Err(ApiError::ExpiredToken)
        ));
    }

    #[tokio::test]
    async fn verify_accepts_token_before_expiry() {
        let keys = make_keys();
        let user = make_user(3, Role::User);
        let token = keys.sign_access(&user).expect("sign access");
        assert!(keys.verify(&token, TokenKind::Access).is_ok());
    }

    #[tokio::test]
    async fn verify_rejects_tampered_signature() {
        let keys = make_keys();
        let user = make_user(5, Role::User);
        let token = keys.sign_refresh(&user).expect("sign refresh");

        let (payload, signature) = token.rsplit_once('.').expect("jwt has a signature");
        let flipped = if signature.ends_with('A') { "B" } else { "A" };
        let tampered = format!("{payload}.{}{}", &signature[..signature.len() - 1], flipped);

        assert!(matches!(
            keys.verify(&tampered, TokenKind::Refresh),
            Err(ApiError::InvalidToken)
        ));
    }

    #[tokio::test]
    async fn verify_rejects_token_from_another_secret() {
        let keys = make_keys();
        let mut other = make_keys();
        other.encoding = EncodingKey::from_secret(b"other-secret");
        let token = other.sign_access(&make_user(9, Role::User)).expect("sign");
        assert!(matches!(
            keys.verify(&token, TokenKind::Access),
            Err(ApiError::InvalidToken)
        ));
    }
}
