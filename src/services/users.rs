use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    errors::AuthError,
    models::user::{CreateUserRequest, UpdateUserRequest, User, UserProfile, UserRole},
};

const USER_COLUMNS: &str = "id, firstname, lastname, email, phone, role, password_hash, \
     refresh_token, created_at, updated_at";

/// Reads and writes the User row: credential lookups, the single-slot
/// refresh token, and the user CRUD surface.
pub struct UserStore;

impl UserStore {
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user)
    }

    /// Bcrypt comparison on a blocking thread — never on the request runtime,
    /// and the hash is never logged or returned.
    pub async fn verify_password(user: &User, password: &str) -> Result<bool, AuthError> {
        let password = password.to_string();
        let hash = user.password_hash.clone();
        let valid = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))?
            .unwrap_or(false);
        Ok(valid)
    }

    pub async fn hash_password(password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        tokio::task::spawn_blocking(move || bcrypt::hash(password, 12))
            .await
            .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))?
            .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))
    }

    /// Overwrite the single refresh-token slot. `None` revokes.
    pub async fn set_refresh_token(
        pool: &PgPool,
        user_id: Uuid,
        token: Option<&str>,
    ) -> Result<(), AuthError> {
        sqlx::query("UPDATE users SET refresh_token = $1, updated_at = NOW() WHERE id = $2")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Compare-and-swap rotation: replaces the slot only if it still holds
    /// the presented token. Returns false when the slot held something else
    /// (prior rotation, concurrent refresh, or reset) — the caller must treat
    /// that the same as a bad token.
    pub async fn rotate_refresh_token(
        pool: &PgPool,
        user_id: Uuid,
        presented: &str,
        next: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $1, updated_at = NOW()
             WHERE id = $2 AND refresh_token = $3",
        )
        .bind(next)
        .bind(user_id)
        .bind(presented)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    /// Set a new password hash and clear the refresh-token slot in one
    /// statement: a reset revokes every outstanding session, with no window
    /// where the new password coexists with an old token.
    pub async fn update_password(
        pool: &PgPool,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = $1, refresh_token = NULL, updated_at = NOW()
             WHERE id = $2",
        )
        .bind(password_hash)
        .bind(user_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn email_exists(
        pool: &PgPool,
        email: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, AuthError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1 AND ($2::uuid IS NULL OR id != $2))",
        )
        .bind(email)
        .bind(exclude)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn create(
        pool: &PgPool,
        body: &CreateUserRequest,
        password_hash: &str,
    ) -> Result<UserProfile, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (firstname, lastname, email, phone, role, password_hash)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(&body.firstname)
        .bind(&body.lastname)
        .bind(&body.email)
        .bind(&body.phone)
        .bind(body.role.to_string())
        .bind(password_hash)
        .fetch_one(pool)
        .await?;
        Ok(user.into())
    }

    /// Paginated listing with an optional free-text search across the
    /// identity columns. Returns (profiles, total record count).
    pub async fn list(
        pool: &PgPool,
        page: u32,
        page_size: u32,
        search_text: &str,
    ) -> Result<(Vec<UserProfile>, i64), AuthError> {
        let pattern = format!("%{search_text}%");
        let offset = (page.max(1) - 1) as i64 * page_size as i64;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM users
             WHERE $1 = '' OR firstname ILIKE $2 OR lastname ILIKE $2
                OR email ILIKE $2 OR role ILIKE $2 OR phone ILIKE $2",
        )
        .bind(search_text)
        .bind(&pattern)
        .fetch_one(pool)
        .await?;

        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE $1 = '' OR firstname ILIKE $2 OR lastname ILIKE $2
                OR email ILIKE $2 OR role ILIKE $2 OR phone ILIKE $2
             ORDER BY created_at DESC
             LIMIT $3 OFFSET $4"
        ))
        .bind(search_text)
        .bind(&pattern)
        .bind(page_size as i64)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok((users.into_iter().map(UserProfile::from).collect(), total))
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        body: &UpdateUserRequest,
        password_hash: Option<&str>,
    ) -> Result<Option<UserProfile>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET
                firstname = COALESCE($1, firstname),
                lastname = COALESCE($2, lastname),
                email = COALESCE($3, email),
                phone = COALESCE($4, phone),
                role = COALESCE($5, role),
                password_hash = COALESCE($6, password_hash),
                updated_at = NOW()
             WHERE id = $7
             RETURNING {USER_COLUMNS}"
        ))
        .bind(body.firstname.as_deref())
        .bind(body.lastname.as_deref())
        .bind(body.email.as_deref())
        .bind(body.phone.as_deref())
        .bind(body.role.map(|r| r.to_string()))
        .bind(password_hash)
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user.map(UserProfile::from))
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<Option<UserProfile>, AuthError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;
        Ok(user.map(UserProfile::from))
    }
}

/// Pure role policy over the closed {USER, ADMIN} set.
pub fn only_permit(allowed: &[UserRole], role: UserRole) -> bool {
    allowed.contains(&role)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_is_an_allow_list() {
        assert!(only_permit(&[UserRole::Admin], UserRole::Admin));
        assert!(!only_permit(&[UserRole::Admin], UserRole::User));
        assert!(only_permit(&[UserRole::User, UserRole::Admin], UserRole::User));
        assert!(!only_permit(&[], UserRole::Admin));
    }

    #[tokio::test]
    async fn password_verification_matches_bcrypt() {
        let hash = UserStore::hash_password("correct-pw").await.unwrap();
        let user = crate::models::user::User {
            id: uuid::Uuid::new_v4(),
            firstname: "Alice".into(),
            lastname: "Doe".into(),
            email: "alice@example.com".into(),
            phone: "+2347000000000".into(),
            role: "USER".into(),
            password_hash: hash,
            refresh_token: None,
            created_at: chrono::Utc::now(),
            updated_at: chrono::Utc::now(),
        };

        assert!(UserStore::verify_password(&user, "correct-pw").await.unwrap());
        assert!(!UserStore::verify_password(&user, "wrong-pw").await.unwrap());
    }
}
