use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::auth::repo::{Role, User};
use crate::error::ApiError;
use crate::ids::IdCodec;

/// Request body for user registration. Role defaults to USER.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: Option<Role>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// Request body for password change.
#[derive(Debug, Deserialize)]
pub struct PasswordChangeRequest {
    pub old_password: String,
    pub new_password: String,
}

/// Request body for requesting a password reset.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for redeeming a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Token pair returned by login and refresh.
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
}

impl TokenResponse {
    pub fn bearer(access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            token_type: "bearer",
        }
    }
}

/// Generic success body for message-only endpoints.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Public part of the user returned to the client. Row ids cross the
/// boundary as opaque strings, never as raw integers.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub pelanggan_id: Option<String>,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl PublicUser {
    pub fn from_user(user: &User, codec: &IdCodec) -> Result<Self, ApiError> {
        let pelanggan_id = user
            .pelanggan_id
            .map(|id| codec.encode(id))
            .transpose()
            .map_err(|e| ApiError::Internal(e.into()))?;
        Ok(Self {
            id: codec
                .encode(user.id)
                .map_err(|e| ApiError::Internal(e.into()))?,
            username: user.username.clone(),
            email: user.email.clone(),
            role: user.role,
            pelanggan_id,
            is_active: user.is_active,
            created_at: user.created_at,
            updated_at: user.updated_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SqidsConfig;

    #[test]
    fn public_user_hides_hash_and_encodes_ids() {
        let codec = IdCodec::new(&SqidsConfig {
            alphabet: "k3G7QAe51FCsPW92uEOyq4Bg6Sp8YzVTmnU0liwDdHXLajZrfxNhobJIRcMvKt".into(),
            min_length: 8,
        })
        .expect("codec builds");
        let user = User {
            id: 12,
            username: "siti".into(),
            email: "siti@example.com".into(),
            password_hash: "hash".into(),
            role: Role::User,
            pelanggan_id: Some(7),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
            updated_at: OffsetDateTime::now_utc(),
        };
        let public = PublicUser::from_user(&user, &codec).expect("map");
        assert_eq!(codec.decode(&public.id), Ok(12));
        assert_eq!(codec.decode(public.pelanggan_id.as_ref().unwrap()), Ok(7));
        let json = serde_json::to_string(&public).unwrap();
        assert!(!json.contains("hash"));
        assert!(json.contains("\"role\":\"USER\""));
    }
}
