use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::{
    errors::AuthError,
    models::{auth::Claims, user::User},
};

/// Issues and verifies the two token kinds. Access and refresh tokens are
/// signed with distinct secrets so a leaked access token cannot forge a
/// refresh token, and vice versa.
#[derive(Clone)]
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
    access_ttl_seconds: i64,
    refresh_ttl_seconds: i64,
}

impl TokenService {
    pub fn new(
        access_secret: String,
        refresh_secret: String,
        access_ttl_seconds: i64,
        refresh_ttl_seconds: i64,
    ) -> Self {
        Self {
            access_secret,
            refresh_secret,
            access_ttl_seconds,
            refresh_ttl_seconds,
        }
    }

    pub fn issue_access_token(&self, user: &User) -> Result<String, AuthError> {
        sign(user, &self.access_secret, self.access_ttl_seconds)
    }

    pub fn issue_refresh_token(&self, user: &User) -> Result<String, AuthError> {
        sign(user, &self.refresh_secret, self.refresh_ttl_seconds)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.access_secret).ok_or(AuthError::Unauthenticated)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        verify(token, &self.refresh_secret).ok_or(AuthError::InvalidOrExpiredToken)
    }
}

fn sign(user: &User, secret: &str, ttl_seconds: i64) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        id: user.id,
        firstname: user.firstname.clone(),
        lastname: user.lastname.clone(),
        role: user.role(),
        email: user.email.clone(),
        phone: user.phone.clone(),
        iat: now,
        exp: now + ttl_seconds,
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(anyhow::Error::from(e)))
}

fn verify(token: &str, secret: &str) -> Option<Claims> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::new(Algorithm::HS256);
    // No leeway: expiry is exact, matching the TTLs we advertise.
    validation.leeway = 0;
    decode::<Claims>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn alice() -> User {
        User {
            id: Uuid::new_v4(),
            firstname: "Alice".into(),
            lastname: "Doe".into(),
            email: "alice@example.com".into(),
            phone: "+2347000000000".into(),
            role: "ADMIN".into(),
            password_hash: "irrelevant".into(),
            refresh_token: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn service() -> TokenService {
        TokenService::new("access-secret".into(), "refresh-secret".into(), 3600, 86400)
    }

    #[test]
    fn access_token_round_trips_identity_claims() {
        let svc = service();
        let user = alice();
        let token = svc.issue_access_token(&user).unwrap();

        let claims = svc.verify_access(&token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.role, crate::models::user::UserRole::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn refresh_token_round_trips_identity_claims() {
        let svc = service();
        let user = alice();
        let token = svc.issue_refresh_token(&user).unwrap();

        let claims = svc.verify_refresh(&token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.exp - claims.iat, 86400);
    }

    #[test]
    fn cross_signature_presentation_is_rejected() {
        let svc = service();
        let user = alice();

        let access = svc.issue_access_token(&user).unwrap();
        let refresh = svc.issue_refresh_token(&user).unwrap();

        // An access token is not a refresh token and vice versa.
        assert!(svc.verify_refresh(&access).is_err());
        assert!(svc.verify_access(&refresh).is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        let svc = TokenService::new("access-secret".into(), "refresh-secret".into(), -10, -10);
        let user = alice();

        let access = svc.issue_access_token(&user).unwrap();
        let refresh = svc.issue_refresh_token(&user).unwrap();

        assert!(svc.verify_access(&access).is_err());
        assert!(svc.verify_refresh(&refresh).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let svc = service();
        assert!(svc.verify_access("not-a-jwt").is_err());
        assert!(svc.verify_refresh("a.b.c").is_err());
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let svc = service();
        let other = TokenService::new("other".into(), "other".into(), 3600, 86400);
        let token = other.issue_access_token(&alice()).unwrap();
        assert!(svc.verify_access(&token).is_err());
    }
}
