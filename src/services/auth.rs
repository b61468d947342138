use rand::Rng;
use sqlx::PgPool;

use crate::{
    errors::AuthError,
    models::user::SignInResponse,
    services::{
        email::EmailService, passcodes::PasscodeStore, tokens::TokenService, users::UserStore,
    },
};

/// Build the reset link the email carries. The passcode rides as a query
/// parameter on the externally supplied base URL.
fn build_reset_url(base_url: &str, passcode: &str) -> String {
    let base = base_url.trim_end_matches('/');
    format!("{base}?passcode={passcode}")
}

/// 48 alphanumeric chars, unguessable by construction.
fn generate_passcode() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

pub struct AuthService;

impl AuthService {
    /// Verify credentials, issue the token pair, persist the refresh token
    /// into the single slot (evicting whatever was there).
    pub async fn sign_in(
        pool: &PgPool,
        tokens: &TokenService,
        email: &str,
        password: &str,
    ) -> Result<SignInResponse, AuthError> {
        let user = UserStore::find_by_email(pool, email)
            .await?
            .ok_or(AuthError::BadRequest("Email does not exist !"))?;

        if !UserStore::verify_password(&user, password).await? {
            return Err(AuthError::InvalidCredential);
        }

        let access_token = tokens.issue_access_token(&user)?;
        let refresh_token = tokens.issue_refresh_token(&user)?;

        UserStore::set_refresh_token(pool, user.id, Some(&refresh_token)).await?;

        Ok(SignInResponse {
            access_token,
            refresh_token,
            user: user.into(),
        })
    }

    /// Token-rotation protocol. Every failure mode — bad signature, expiry,
    /// deleted user, slot mismatch, lost rotation race — collapses into
    /// `InvalidOrExpiredToken` so the endpoint reveals nothing.
    ///
    /// The new refresh token is written with a compare-and-swap against the
    /// presented one; a token that was already rotated past cannot win.
    pub async fn refresh(
        pool: &PgPool,
        tokens: &TokenService,
        refresh_token: &str,
    ) -> Result<String, AuthError> {
        let claims = tokens.verify_refresh(refresh_token)?;

        let user = UserStore::find_by_id(pool, claims.id)
            .await?
            .ok_or(AuthError::InvalidOrExpiredToken)?;

        if user.refresh_token.as_deref() != Some(refresh_token) {
            return Err(AuthError::InvalidOrExpiredToken);
        }

        let access_token = tokens.issue_access_token(&user)?;
        let new_refresh_token = tokens.issue_refresh_token(&user)?;

        let rotated =
            UserStore::rotate_refresh_token(pool, user.id, refresh_token, &new_refresh_token)
                .await?;
        if !rotated {
            // Slot changed between verification and the swap.
            return Err(AuthError::InvalidOrExpiredToken);
        }

        Ok(access_token)
    }

    /// Generate a passcode, park it in the expiring store, and hand the
    /// reset link to the mailer. Delivery is best-effort: a send failure is
    /// logged, the request still succeeds.
    pub async fn forgot_password(
        pool: &PgPool,
        passcodes: &PasscodeStore,
        email_svc: Option<&EmailService>,
        email: &str,
        reset_base_url: &str,
    ) -> Result<(), AuthError> {
        let user = UserStore::find_by_email(pool, email)
            .await?
            .ok_or(AuthError::NotFound("Email does not exist !"))?;

        let passcode = generate_passcode();
        passcodes.save(&passcode, &user.email).await?;

        let reset_url = build_reset_url(reset_base_url, &passcode);
        match email_svc {
            Some(svc) => {
                if let Err(e) = svc.send_password_reset(&user.email, &reset_url).await {
                    tracing::error!("failed to send reset email to {}: {e:#}", user.email);
                }
            }
            None => tracing::warn!("SMTP not configured — reset email not sent"),
        }

        Ok(())
    }

    /// Redeem a passcode and set the new password. The passcode is consumed
    /// atomically (single GETDEL) so it is single-use even under concurrent
    /// attempts; the password update clears the refresh-token slot, forcing
    /// re-authentication everywhere.
    pub async fn reset_password(
        pool: &PgPool,
        passcodes: &PasscodeStore,
        passcode: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        let email = passcodes
            .take(passcode)
            .await?
            .ok_or(AuthError::InvalidOrExpiredLink)?;

        let user = UserStore::find_by_email(pool, &email)
            .await?
            .ok_or(AuthError::NotFound("User not found"))?;

        let password_hash = UserStore::hash_password(new_password).await?;
        if !UserStore::update_password(pool, user.id, &password_hash).await? {
            return Err(AuthError::NotFound("User not found"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_url_embeds_the_passcode() {
        assert_eq!(
            build_reset_url("http://localhost:5173/reset-password", "abc123"),
            "http://localhost:5173/reset-password?passcode=abc123"
        );
        // Trailing slash on the base does not double up.
        assert_eq!(
            build_reset_url("https://fraud.example.com/reset/", "xyz"),
            "https://fraud.example.com/reset?passcode=xyz"
        );
    }

    #[test]
    fn passcodes_are_long_alphanumeric_and_unique() {
        let a = generate_passcode();
        let b = generate_passcode();
        assert_eq!(a.len(), 48);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
