//! Sign In Use Case
//!
//! Authenticates a user by email and password and creates a session.

use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::domain::entity::{AuthSession, User};
use crate::domain::repository::{AuthSessionRepository, CredentialsRepository, UserRepository};
use crate::domain::value_object::{Email, RawPassword};
use crate::error::{UsersError, UsersResult};

/// Re-export ClientFingerprint from platform
pub use platform::client::ClientFingerprint;

/// Sign in input
pub struct SignInInput {
    pub email: String,
    pub password: String,
    pub remember_me: bool,
}

/// Sign in output
pub struct SignInOutput {
    /// Signed session token for the cookie
    pub session_token: String,
    /// Cookie max-age in seconds
    pub max_age_secs: u64,
    pub user: User,
}

/// Sign in use case
pub struct SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialsRepository,
    S: AuthSessionRepository,
{
    user_repo: Arc<U>,
    credentials_repo: Arc<C>,
    session_repo: Arc<S>,
    config: Arc<UsersConfig>,
}

impl<U, C, S> SignInUseCase<U, C, S>
where
    U: UserRepository,
    C: CredentialsRepository,
    S: AuthSessionRepository,
{
    pub fn new(
        user_repo: Arc<U>,
        credentials_repo: Arc<C>,
        session_repo: Arc<S>,
        config: Arc<UsersConfig>,
    ) -> Self {
        Self {
            user_repo,
            credentials_repo,
            session_repo,
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: ClientFingerprint,
    ) -> UsersResult<SignInOutput> {
        let email = Email::new(&input.email).map_err(|_| UsersError::InvalidCredentials)?;

        let mut user = self
            .user_repo
            .find_by_email(&email)
            .await?
            .ok_or(UsersError::InvalidCredentials)?;

        let mut credentials = self
            .credentials_repo
            .find_by_user_id(&user.user_id)
            .await?
            .ok_or_else(|| UsersError::Internal("Credentials not found".to_string()))?;

        if credentials.is_locked() {
            return Err(UsersError::AccountLocked);
        }

        let raw_password =
            RawPassword::new(input.password).map_err(|_| UsersError::InvalidCredentials)?;

        if !credentials
            .password_hash
            .verify(&raw_password, self.config.pepper())
        {
            credentials.record_failure();
            self.credentials_repo.update(&credentials).await?;
            return Err(UsersError::InvalidCredentials);
        }

        // Only reported once the password is proven
        if !user.is_active {
            return Err(UsersError::AccountInactive);
        }

        credentials.reset_failures();
        self.credentials_repo.update(&credentials).await?;

        user.record_login();
        self.user_repo.update(&user).await?;

        let ttl = if input.remember_me {
            self.config.session_ttl_long
        } else {
            self.config.session_ttl_short
        };
        let chrono_ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| UsersError::Internal(format!("Invalid session TTL: {e}")))?;

        let session = AuthSession::new(user.user_id, input.remember_me, &fingerprint, chrono_ttl);
        self.session_repo.create(&session).await?;

        let session_token = self.config.session_token(session.session_id);

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            remember_me = input.remember_me,
            "User signed in"
        );

        Ok(SignInOutput {
            session_token,
            max_age_secs: ttl.as_secs(),
            user,
        })
    }
}
