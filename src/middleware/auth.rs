use axum::{extract::FromRequestParts, http::request::Parts};

use crate::{
    errors::AuthError,
    models::{auth::AuthenticatedUser, user::UserRole},
    services::{tokens::TokenService, users::only_permit},
};

/// Pull the bearer token out of the Authorization header.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get("Authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AuthError::Unauthenticated)?;

        let tokens = parts
            .extensions
            .get::<TokenService>()
            .ok_or_else(|| AuthError::Internal(anyhow::anyhow!("TokenService not installed")))?;

        let claims = tokens.verify_access(token)?;

        Ok(AuthenticatedUser {
            user_id: claims.id,
            role: claims.role,
        })
    }
}

/// Extractor gating a route to ADMIN. Authenticates first, then applies the
/// role allow-list.
#[derive(Debug)]
pub struct RequireAdmin(pub AuthenticatedUser);

impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthenticatedUser::from_request_parts(parts, state).await?;
        if !only_permit(&[UserRole::Admin], user.role) {
            return Err(AuthError::Forbidden);
        }
        Ok(RequireAdmin(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_auth(value: &str) -> Parts {
        let (parts, _) = Request::builder()
            .header("Authorization", value)
            .body(())
            .unwrap()
            .into_parts();
        parts
    }

    #[test]
    fn bearer_token_requires_the_scheme_prefix() {
        let parts = parts_with_auth("Bearer abc.def.ghi");
        assert_eq!(bearer_token(&parts), Some("abc.def.ghi"));

        let parts = parts_with_auth("Basic abc");
        assert_eq!(bearer_token(&parts), None);

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&parts), None);
    }

    #[tokio::test]
    async fn missing_or_garbled_token_is_unauthenticated() {
        let svc = TokenService::new("a".into(), "r".into(), 3600, 86400);

        let mut parts = parts_with_auth("Bearer not-a-jwt");
        parts.extensions.insert(svc.clone());
        let err = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));

        let (mut parts, _) = Request::builder().body(()).unwrap().into_parts();
        parts.extensions.insert(svc);
        let err = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Unauthenticated));
    }

    #[tokio::test]
    async fn admin_gate_rejects_plain_users() {
        use chrono::Utc;
        use uuid::Uuid;

        let svc = TokenService::new("a".into(), "r".into(), 3600, 86400);
        let user = crate::models::user::User {
            id: Uuid::new_v4(),
            firstname: "Bob".into(),
            lastname: "Doe".into(),
            email: "bob@example.com".into(),
            phone: "+2347000000001".into(),
            role: "USER".into(),
            password_hash: "irrelevant".into(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let token = svc.issue_access_token(&user).unwrap();

        let mut parts = parts_with_auth(&format!("Bearer {token}"));
        parts.extensions.insert(svc);

        // Authenticates fine...
        let authed = AuthenticatedUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(authed.role, UserRole::User);

        // ...but is not an admin.
        let err = RequireAdmin::from_request_parts(&mut parts, &())
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Forbidden));
    }
}
