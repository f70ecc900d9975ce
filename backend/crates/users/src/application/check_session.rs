//! Check Session Use Case
//!
//! Resolves a session cookie to its live session.

use std::sync::Arc;

use crate::application::config::UsersConfig;
use crate::domain::entity::AuthSession;
use crate::domain::repository::AuthSessionRepository;
use crate::error::{UsersError, UsersResult};

/// Check session use case
pub struct CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Send + Sync + 'static,
{
    session_repo: Arc<S>,
    config: Arc<UsersConfig>,
}

impl<S> CheckSessionUseCase<S>
where
    S: AuthSessionRepository + Send + Sync + 'static,
{
    pub fn new(session_repo: Arc<S>, config: Arc<UsersConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Get session and update last activity
    pub async fn get_session(
        &self,
        session_token: &str,
        fingerprint_hash: &[u8],
    ) -> UsersResult<AuthSession> {
        let session_id = self.config.parse_session_token(session_token)?;

        let mut session = self
            .session_repo
            .find_by_id(session_id, fingerprint_hash)
            .await?
            .ok_or(UsersError::SessionInvalid)?;

        if session.is_expired() {
            self.session_repo.delete(session_id).await?;
            return Err(UsersError::SessionInvalid);
        }

        session.touch();

        let ttl_long = chrono::Duration::from_std(self.config.session_ttl_long)
            .map_err(|e| UsersError::Internal(format!("Invalid session TTL: {e}")))?;
        session.extend_if_needed(ttl_long);

        // Update in background
        let session_clone = session.clone();
        let repo = self.session_repo.clone();
        tokio::spawn(async move {
            if let Err(e) = repo.update(&session_clone).await {
                tracing::warn!(error = %e, "Failed to update session activity");
            }
        });

        Ok(session)
    }
}
