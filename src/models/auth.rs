use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::UserRole;

/// Identity claims carried by both token kinds. Access and refresh tokens
/// share the claim set and differ only in secret and TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: String,
    pub role: UserRole,
    pub email: String,
    pub phone: String,
    pub iat: i64,
    pub exp: i64,
}

/// Extracted from a validated access token — available via axum extractors.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    pub user_id: Uuid,
    pub role: UserRole,
}
