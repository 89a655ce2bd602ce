use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// Request-level error taxonomy. Every variant maps to a fixed status code;
/// internal failures are logged and surfaced with a generic body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Username or email already registered")]
    DuplicateIdentity,
    #[error("Incorrect username or password")]
    InvalidCredentials,
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    ExpiredToken,
    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,
    #[error("Admin access required")]
    InsufficientRole,
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::DuplicateIdentity => StatusCode::CONFLICT,
            ApiError::InvalidCredentials
            | ApiError::InvalidToken
            | ApiError::ExpiredToken => StatusCode::UNAUTHORIZED,
            ApiError::InvalidOrExpiredToken | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::InsufficientRole => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        ApiError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_match_taxonomy() {
        assert_eq!(ApiError::DuplicateIdentity.status(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::InvalidToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::ExpiredToken.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            ApiError::InvalidOrExpiredToken.status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ApiError::InsufficientRole.status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::NotFound("tagihan").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn unknown_user_and_wrong_password_share_one_shape() {
        // Both login failure paths funnel into this single variant, so the
        // response body cannot reveal whether the username exists.
        let a = ApiError::InvalidCredentials.to_string();
        let b = ApiError::InvalidCredentials.to_string();
        assert_eq!(a, b);
        assert_eq!(a, "Incorrect username or password");
    }
}
