//! Auth Session Entity
//!
//! Server-side session referenced by the signed session cookie.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::client::ClientFingerprint;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub session_id: Uuid,
    pub user_id: UserId,
    /// Session expiration (Unix timestamp ms)
    pub expires_at_ms: i64,
    pub remember_me: bool,
    /// SHA-256 of the User-Agent that created the session
    pub client_fingerprint_hash: Vec<u8>,
    pub client_ip: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl AuthSession {
    /// Create a session bound to the client fingerprint
    pub fn new(
        user_id: UserId,
        remember_me: bool,
        fingerprint: &ClientFingerprint,
        ttl: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            session_id: Uuid::new_v4(),
            user_id,
            expires_at_ms: (now + ttl).timestamp_millis(),
            remember_me,
            client_fingerprint_hash: fingerprint.hash_vec(),
            client_ip: fingerprint.ip_string(),
            user_agent: fingerprint.user_agent.clone(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }

    pub fn touch(&mut self) {
        self.last_activity_at = Utc::now();
    }

    /// Slide a remember-me session to `now + ttl_long` once less than half remains
    pub fn extend_if_needed(&mut self, ttl_long: Duration) {
        if !self.remember_me {
            return;
        }

        let now = Utc::now();
        if self.expires_at_ms < (now + (ttl_long / 2)).timestamp_millis() {
            self.expires_at_ms = (now + ttl_long).timestamp_millis();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fingerprint() -> ClientFingerprint {
        ClientFingerprint::from_user_agent("test-agent", None)
    }

    #[test]
    fn test_new_session_not_expired() {
        let session = AuthSession::new(UserId::new(), false, &fingerprint(), Duration::hours(1));
        assert!(!session.is_expired());
        assert_eq!(session.user_agent.as_deref(), Some("test-agent"));
        assert_eq!(session.client_fingerprint_hash, fingerprint().hash_vec());
    }

    #[test]
    fn test_extend_only_remember_me() {
        let ttl = Duration::days(7);

        let mut short = AuthSession::new(UserId::new(), false, &fingerprint(), Duration::hours(1));
        let before = short.expires_at_ms;
        short.extend_if_needed(ttl);
        assert_eq!(short.expires_at_ms, before);

        let mut long = AuthSession::new(UserId::new(), true, &fingerprint(), Duration::hours(1));
        long.extend_if_needed(ttl);
        assert!(long.expires_at_ms > before);
    }
}
