use std::sync::Arc;

use prep_core::Clock;
use prep_core::model::{Email, UserRecord};
use sha2::{Digest, Sha256};
use storage::repository::{IdentityRepository, StorageError};
use tracing::info;

use crate::error::AuthError;

/// Sign-up, login and the active-session pointer.
#[derive(Clone)]
pub struct AuthService {
    clock: Clock,
    identity: Arc<dyn IdentityRepository>,
}

impl AuthService {
    #[must_use]
    pub fn new(clock: Clock, identity: Arc<dyn IdentityRepository>) -> Self {
        Self { clock, identity }
    }

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidInput` for a blank name or password,
    /// `AuthError::InvalidEmail` for a malformed email, `AuthError::EmailTaken`
    /// if the email is registered, or `AuthError::Storage` on backend failures.
    pub async fn signup(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<UserRecord, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::InvalidInput("name"));
        }
        if password.is_empty() {
            return Err(AuthError::InvalidInput("password"));
        }
        let email = Email::parse(email)?;

        let record = UserRecord {
            name: name.to_string(),
            password_digest: password_digest(&email, password),
            email,
            created_at: self.clock.now(),
        };
        match self.identity.create_user(&record).await {
            Ok(()) => {}
            Err(StorageError::Conflict) => return Err(AuthError::EmailTaken),
            Err(err) => return Err(err.into()),
        }
        self.identity.set_active_session(&record.email).await?;
        info!(email = %record.email, "account created");
        Ok(record)
    }

    /// Verify credentials and sign the user in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email or wrong
    /// password, or `AuthError::Storage` on backend failures.
    pub async fn login(&self, email: &str, password: &str) -> Result<UserRecord, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
        let record = self
            .identity
            .lookup_user(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;
        if record.password_digest != password_digest(&email, password) {
            return Err(AuthError::InvalidCredentials);
        }
        self.identity.set_active_session(&email).await?;
        info!(email = %email, "signed in");
        Ok(record)
    }

    /// # Errors
    ///
    /// Returns `AuthError::Storage` if the session pointer cannot be cleared.
    pub async fn logout(&self) -> Result<(), AuthError> {
        self.identity.clear_session().await?;
        Ok(())
    }

    /// The signed-in user, if the session pointer refers to a known account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Storage` on backend failures.
    pub async fn current_user(&self) -> Result<Option<UserRecord>, AuthError> {
        let Some(email) = self.identity.active_session().await? else {
            return Ok(None);
        };
        Ok(self.identity.lookup_user(&email).await?)
    }
}

fn password_digest(email: &Email, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(email.as_str().as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prep_core::time::fixed_clock;
    use storage::repository::Storage;

    fn service() -> AuthService {
        AuthService::new(fixed_clock(), Storage::in_memory().identity)
    }

    #[tokio::test]
    async fn signup_signs_in_and_hides_password() {
        let auth = service();
        let record = auth
            .signup("Meera", "Meera@Example.com", "hunter2")
            .await
            .unwrap();

        assert_eq!(record.email.as_str(), "meera@example.com");
        assert_ne!(record.password_digest, "hunter2");
        assert_eq!(auth.current_user().await.unwrap(), Some(record));
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let auth = service();
        auth.signup("Meera", "m@example.com", "pw").await.unwrap();
        let err = auth.signup("Other", "M@example.com", "pw2").await.unwrap_err();
        assert!(matches!(err, AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn signup_validates_input() {
        let auth = service();
        assert!(matches!(
            auth.signup(" ", "m@example.com", "pw").await.unwrap_err(),
            AuthError::InvalidInput("name")
        ));
        assert!(matches!(
            auth.signup("Meera", "not-an-email", "pw").await.unwrap_err(),
            AuthError::InvalidEmail(_)
        ));
    }

    #[tokio::test]
    async fn login_checks_password() {
        let auth = service();
        auth.signup("Meera", "m@example.com", "pw").await.unwrap();
        auth.logout().await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), None);

        assert!(matches!(
            auth.login("m@example.com", "wrong").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));
        assert!(matches!(
            auth.login("ghost@example.com", "pw").await.unwrap_err(),
            AuthError::InvalidCredentials
        ));

        let record = auth.login("M@EXAMPLE.com", "pw").await.unwrap();
        assert_eq!(auth.current_user().await.unwrap(), Some(record));
    }
}
