use axum::{
    body::Body,
    extract::State,
    http::{header, StatusCode},
    response::Response,
    Json,
};
use serde_json::{json, Value};

use crate::{
    errors::AuthError,
    middleware::rate_limit::check_rate_limit,
    models::user::{RefreshTokenRequest, SignInRequest},
    services::auth::AuthService,
    AppState,
};

/// Attributes for the refresh-token cookie. HttpOnly + strict same-site;
/// Secure only in production so local development over http keeps working.
fn refresh_cookie(token: &str, max_age_seconds: i64, secure: bool) -> String {
    let mut cookie = format!(
        "refreshToken={token}; HttpOnly; SameSite=Strict; Path=/; Max-Age={max_age_seconds}"
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// POST /api/v1/auth/signin
pub async fn sign_in(
    State(state): State<AppState>,
    Json(body): Json<SignInRequest>,
) -> Result<Response, AuthError> {
    let email = body.email.as_deref().ok_or(AuthError::MissingField("email"))?;
    let password = body
        .password
        .as_deref()
        .ok_or(AuthError::MissingField("password"))?;

    // 5 attempts per 15 min per email
    let rate_key = format!("rate:signin:{}", email.to_lowercase());
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 5, 900).await?;

    let res = AuthService::sign_in(&state.db, &state.tokens, email, password).await?;

    let cookie = refresh_cookie(
        &res.refresh_token,
        state.config.refresh_token_ttl_seconds,
        state.config.is_production(),
    );
    let body = serde_json::to_string(&res)
        .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::SET_COOKIE, cookie)
        .body(Body::from(body))
        .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))
}

/// POST /api/v1/auth/newToken
pub async fn new_token(
    State(state): State<AppState>,
    Json(body): Json<RefreshTokenRequest>,
) -> Result<Json<Value>, AuthError> {
    let refresh_token = body
        .refresh_token
        .as_deref()
        .ok_or(AuthError::MissingField("refreshToken"))?;

    let access_token = AuthService::refresh(&state.db, &state.tokens, refresh_token).await?;

    Ok(Json(json!({ "accessToken": access_token })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_the_hardening_attributes() {
        let cookie = refresh_cookie("tok.en.value", 86400, false);
        assert!(cookie.starts_with("refreshToken=tok.en.value;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Strict"));
        assert!(cookie.contains("Max-Age=86400"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn cookie_is_secure_in_production() {
        let cookie = refresh_cookie("t", 86400, true);
        assert!(cookie.ends_with("; Secure"));
    }
}
