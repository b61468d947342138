use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::{
    errors::AuthError,
    middleware::{
        auth::RequireAdmin,
        rate_limit::check_rate_limit,
    },
    models::{
        auth::AuthenticatedUser,
        user::{
            CreateUserRequest, ForgotPasswordRequest, ListUsersQuery, ResetPasswordRequest,
            UpdateUserRequest,
        },
    },
    services::{auth::AuthService, users::UserStore},
    AppState,
};

/// POST /api/v1/user/request-password-reset
pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    let email = body.email.as_deref().ok_or(AuthError::MissingField("email"))?;

    // 3 attempts per 30 min per email
    let rate_key = format!("rate:forgot:{}", email.to_lowercase());
    let mut redis = state.redis.clone();
    check_rate_limit(&mut redis, &rate_key, 3, 1800).await?;

    AuthService::forgot_password(
        &state.db,
        &state.passcodes,
        state.email.as_deref(),
        email,
        &state.config.reset_url,
    )
    .await?;

    Ok(Json(
        json!({ "message": "Password reset link has been sent to your email" }),
    ))
}

/// POST /api/v1/user/password-reset
pub async fn password_reset(
    State(state): State<AppState>,
    Json(body): Json<ResetPasswordRequest>,
) -> Result<Json<Value>, AuthError> {
    let password = body
        .password
        .as_deref()
        .ok_or(AuthError::MissingField("password"))?;
    let passcode = body
        .passcode
        .as_deref()
        .ok_or(AuthError::MissingField("passcode"))?;

    AuthService::reset_password(&state.db, &state.passcodes, passcode, password).await?;

    Ok(Json(json!({ "message": "Password reset successful" })))
}

/// POST /api/v1/user — admin only.
pub async fn create_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>), AuthError> {
    if UserStore::email_exists(&state.db, &body.email, None).await? {
        return Err(AuthError::BadRequest("Email already exists"));
    }

    let password_hash = UserStore::hash_password(&body.password).await?;
    let user = UserStore::create(&state.db, &body, &password_hash).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "New user created successfully", "user": user })),
    ))
}

/// GET /api/v1/user?page=&pageSize=&searchText=
pub async fn list_users(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Value>, AuthError> {
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(5).max(1);
    let search_text = query.search_text.unwrap_or_default();

    let (users, total) = UserStore::list(&state.db, page, page_size, &search_text).await?;
    let page_count = (total as f64 / page_size as f64).ceil() as i64;

    Ok(Json(json!({
        "message": "All users",
        "data": users,
        "pageCount": page_count,
        "totalRecords": total,
    })))
}

/// GET /api/v1/user/{id}
pub async fn get_user(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AuthError> {
    let user = UserStore::find_by_id(&state.db, id)
        .await?
        .ok_or(AuthError::NotFound("User not found"))?;

    Ok(Json(json!({
        "message": "User details",
        "data": crate::models::user::UserProfile::from(user),
    })))
}

/// PATCH /api/v1/user/{id} — admin only.
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<Value>, AuthError> {
    let nothing_to_update = body.firstname.is_none()
        && body.lastname.is_none()
        && body.email.is_none()
        && body.phone.is_none()
        && body.role.is_none()
        && body.password.is_none();
    if nothing_to_update {
        return Err(AuthError::BadRequest("No fields provided for update"));
    }

    if let Some(email) = body.email.as_deref() {
        if UserStore::email_exists(&state.db, email, Some(id)).await? {
            return Err(AuthError::EmailTaken);
        }
    }

    let password_hash = match body.password.as_deref() {
        Some(pw) => Some(UserStore::hash_password(pw).await?),
        None => None,
    };

    let updated = UserStore::update(&state.db, id, &body, password_hash.as_deref())
        .await?
        .ok_or(AuthError::NotFound("User not found"))?;

    Ok(Json(json!({
        "message": "User details updated successfully",
        "data": updated,
    })))
}

/// DELETE /api/v1/user/{id} — admin only.
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AuthError> {
    let deleted = UserStore::delete(&state.db, id)
        .await?
        .ok_or(AuthError::NotFound("User not found"))?;

    Ok(Json(json!({
        "message": "User deleted successfully",
        "data": deleted,
    })))
}
