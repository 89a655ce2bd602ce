use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use time::Duration;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{
            ForgotPasswordRequest, LoginRequest, MessageResponse, PasswordChangeRequest,
            PublicUser, RefreshRequest, RegisterRequest, ResetPasswordRequest, TokenResponse,
        },
        extractors::CurrentUser,
        jwt::{JwtKeys, TokenKind},
        password::{hash_password, verify_password},
        repo::{self, Role, User},
    },
    error::ApiError,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/me", get(me))
        .route("/auth/change-password", post(change_password))
        .route("/auth/forgot-password", post(forgot_password))
        .route("/auth/reset-password", post(reset_password))
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

const MIN_PASSWORD_LEN: usize = 6;

fn check_password(password: &str) -> Result<(), ApiError> {
    if password.len() < MIN_PASSWORD_LEN {
        return Err(ApiError::Validation("Password too short".into()));
    }
    Ok(())
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    payload.email = payload.email.trim().to_lowercase();
    payload.username = payload.username.trim().to_string();

    if payload.username.chars().count() < 3 {
        return Err(ApiError::Validation("Username too short".into()));
    }
    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    check_password(&payload.password)?;

    if User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(username = %payload.username, "username already registered");
        return Err(ApiError::DuplicateIdentity);
    }
    if User::find_by_email(&state.db, &payload.email)
        .await
        .map_err(ApiError::Internal)?
        .is_some()
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::DuplicateIdentity);
    }

    let hash = hash_password(&payload.password).map_err(ApiError::Internal)?;
    let role = payload.role.unwrap_or(Role::User);
    let user = User::create(&state.db, &payload.username, &payload.email, &hash, role)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, username = %user.username, "user registered");
    Ok((
        StatusCode::CREATED,
        Json(PublicUser::from_user(&user, &state.codec)?),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    // Unknown username and wrong password fail identically so the endpoint
    // cannot be used to enumerate accounts.
    let user = User::find_by_username(&state.db, &payload.username)
        .await
        .map_err(ApiError::Internal)?
        .ok_or_else(|| {
            warn!(username = %payload.username, "login unknown username");
            ApiError::InvalidCredentials
        })?;

    let ok = verify_password(&payload.password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    if !user.is_active {
        return Err(ApiError::Validation("Inactive user".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let (access, refresh) = keys.sign_pair(&user).map_err(ApiError::Internal)?;
    info!(user_id = user.id, "user logged in");
    Ok(Json(TokenResponse::bearer(access, refresh)))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify(&payload.refresh_token, TokenKind::Refresh)?;

    // The subject must still exist and be active before a new pair goes out.
    let user = User::find_by_id(&state.db, claims.sub)
        .await
        .map_err(ApiError::Internal)?
        .filter(|u| u.is_active)
        .ok_or(ApiError::InvalidToken)?;

    let (access, refresh) = keys.sign_pair(&user).map_err(ApiError::Internal)?;
    Ok(Json(TokenResponse::bearer(access, refresh)))
}

#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<PublicUser>, ApiError> {
    Ok(Json(PublicUser::from_user(&user, &state.codec)?))
}

#[instrument(skip(state, user, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<PasswordChangeRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_password(&payload.new_password)?;

    let ok = verify_password(&payload.old_password, &user.password_hash)
        .map_err(ApiError::Internal)?;
    if !ok {
        warn!(user_id = user.id, "change-password wrong old password");
        return Err(ApiError::InvalidCredentials);
    }

    let hash = hash_password(&payload.new_password).map_err(ApiError::Internal)?;
    User::update_password(&state.db, user.id, &hash)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id = user.id, "password changed");
    Ok(Json(MessageResponse {
        message: "Password changed successfully".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let email = payload.email.trim().to_lowercase();

    // The response is identical whether or not the email matches an account.
    if let Some(user) = User::find_by_email(&state.db, &email)
        .await
        .map_err(ApiError::Internal)?
        .filter(|u| u.is_active)
    {
        let token = Uuid::new_v4().to_string();
        let expires_at = time::OffsetDateTime::now_utc()
            + Duration::minutes(state.config.jwt.reset_ttl_minutes);
        repo::insert_reset_token(&state.db, user.id, &token, expires_at)
            .await
            .map_err(ApiError::Internal)?;
        // Delivery is an email concern; until that exists the token is only
        // visible in debug logs.
        debug!(user_id = user.id, %token, "reset token issued");
    }

    Ok(Json(MessageResponse {
        message: "If the email exists, a reset token has been sent".into(),
    }))
}

#[instrument(skip(state, payload))]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    check_password(&payload.new_password)?;

    let user_id = repo::consume_reset_token(&state.db, &payload.token)
        .await
        .map_err(ApiError::Internal)?
        .ok_or(ApiError::InvalidOrExpiredToken)?;

    let hash = hash_password(&payload.new_password).map_err(ApiError::Internal)?;
    User::update_password(&state.db, user_id, &hash)
        .await
        .map_err(ApiError::Internal)?;

    info!(user_id, "password reset");
    Ok(Json(MessageResponse {
        message: "Password reset successfully".into(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_regex_accepts_and_rejects() {
        assert!(is_valid_email("budi@example.com"));
        assert!(is_valid_email("a.b+c@sub.domain.co.id"));
        assert!(!is_valid_email("invalid-email"));
        assert!(!is_valid_email("no spaces@example.com"));
        assert!(!is_valid_email("@example.com"));
    }

    #[test]
    fn password_length_floor() {
        assert!(check_password("12345").is_err());
        assert!(check_password("123456").is_ok());
    }

    #[test]
    fn token_response_is_bearer_shaped() {
        let body = TokenResponse::bearer("a".into(), "r".into());
        let json = serde_json::to_string(&body).unwrap();
        assert!(json.contains("\"token_type\":\"bearer\""));
        assert!(json.contains("access_token"));
        assert!(json.contains("refresh_token"));
    }
}
