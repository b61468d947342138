use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Auth-subsystem error taxonomy, mapped to HTTP at the handler boundary.
///
/// The refresh and reset variants are deliberately undifferentiated: a
/// bad signature, an expired token, a missing user and a rotation mismatch
/// all surface as the same message so the endpoint cannot be used as an
/// oracle.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    #[error("Incorrect password !")]
    InvalidCredential,

    #[error("Invalid or expired refresh token")]
    InvalidOrExpiredToken,

    #[error("Invalid or expired link")]
    InvalidOrExpiredLink,

    #[error("{0}")]
    NotFound(&'static str),

    #[error("User with this email exist")]
    EmailTaken,

    #[error("Access denied")]
    Forbidden,

    #[error("Invalid or missing access token")]
    Unauthenticated,

    #[error("Too many attempts. Try again in a few minutes.")]
    TooManyRequests,

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    pub fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingField(_) => StatusCode::BAD_REQUEST,
            AuthError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredential => StatusCode::BAD_REQUEST,
            AuthError::InvalidOrExpiredToken => StatusCode::FORBIDDEN,
            AuthError::InvalidOrExpiredLink => StatusCode::BAD_REQUEST,
            AuthError::NotFound(_) => StatusCode::NOT_FOUND,
            AuthError::EmailTaken => StatusCode::FORBIDDEN,
            AuthError::Forbidden => StatusCode::FORBIDDEN,
            AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            AuthError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            // Store/network detail stays server-side.
            AuthError::Internal(e) => {
                tracing::error!("internal error: {e:#}");
                "An unexpected error occurred".to_string()
            }
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Internal(anyhow::Error::from(e))
    }
}

impl From<redis::RedisError> for AuthError {
    fn from(e: redis::RedisError) -> Self {
        AuthError::Internal(anyhow::Error::from(e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_match_the_boundary_contract() {
        assert_eq!(AuthError::MissingField("email").status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidCredential.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::InvalidOrExpiredToken.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::InvalidOrExpiredLink.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AuthError::NotFound("User not found").status(), StatusCode::NOT_FOUND);
        assert_eq!(AuthError::Forbidden.status(), StatusCode::FORBIDDEN);
        assert_eq!(AuthError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn missing_field_names_the_field() {
        assert_eq!(AuthError::MissingField("email").to_string(), "Missing email");
        assert_eq!(
            AuthError::MissingField("refreshToken").to_string(),
            "Missing refreshToken"
        );
    }

    #[test]
    fn refresh_failures_share_one_message() {
        // Signature, expiry and rotation mismatch must be indistinguishable.
        assert_eq!(
            AuthError::InvalidOrExpiredToken.to_string(),
            "Invalid or expired refresh token"
        );
    }
}
