//! Activation Token Service
//!
//! Stateless account activation tokens, `{timestamp_b36}-{hmac_b64url}`.
//! The HMAC binds the user id, email, last login and issue time, so a token
//! dies when any of those change or when it ages past the TTL.

use chrono::{DateTime, Duration, Utc};
use kernel::id::UserId;
use platform::crypto::{from_base64url, hmac_sha256, to_base64url, verify_hmac_sha256};

use crate::domain::entity::User;

#[derive(Clone)]
pub struct ActivationTokenGenerator {
    secret: [u8; 32],
    ttl: Duration,
}

impl ActivationTokenGenerator {
    pub fn new(secret: [u8; 32], ttl: Duration) -> Self {
        Self { secret, ttl }
    }

    pub fn make_token(&self, user: &User) -> String {
        self.make_token_at(user, Utc::now())
    }

    pub fn make_token_at(&self, user: &User, now: DateTime<Utc>) -> String {
        let timestamp = now.timestamp().max(0) as u64;
        let tag = hmac_sha256(&self.secret, self.message(user, timestamp).as_bytes());
        format!("{}-{}", to_base36(timestamp), to_base64url(&tag))
    }

    pub fn check_token(&self, user: &User, token: &str) -> bool {
        self.check_token_at(user, token, Utc::now())
    }

    pub fn check_token_at(&self, user: &User, token: &str, now: DateTime<Utc>) -> bool {
        let Some((ts, tag)) = token.split_once('-') else {
            return false;
        };
        let Some(timestamp) = from_base36(ts) else {
            return false;
        };
        let Ok(tag) = from_base64url(tag) else {
            return false;
        };

        if !verify_hmac_sha256(&self.secret, self.message(user, timestamp).as_bytes(), &tag) {
            return false;
        }

        let age = now.timestamp() - timestamp as i64;
        age <= self.ttl.num_seconds()
    }

    fn message(&self, user: &User, timestamp: u64) -> String {
        let last_login = user
            .last_login_at
            .map(|at| at.timestamp().to_string())
            .unwrap_or_default();
        format!(
            "activation:{}:{}:{}:{}",
            user.user_id, user.email, last_login, timestamp
        )
    }
}

impl std::fmt::Debug for ActivationTokenGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationTokenGenerator")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

/// URL-safe base64 of the user id, as carried in activation links
pub fn encode_uid(user_id: &UserId) -> String {
    to_base64url(user_id.to_string().as_bytes())
}

pub fn decode_uid(uid: &str) -> Option<UserId> {
    let bytes = from_base64url(uid).ok()?;
    let text = std::str::from_utf8(&bytes).ok()?;
    UserId::parse_str(text)
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

fn from_base36(s: &str) -> Option<u64> {
    if s.is_empty() || s.len() > 13 {
        return None;
    }
    u64::from_str_radix(s, 36).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::NewUser;
    use crate::domain::value_object::Email;

    fn generator() -> ActivationTokenGenerator {
        ActivationTokenGenerator::new([7u8; 32], Duration::days(3))
    }

    fn user() -> User {
        User::new(Email::new("a@a.com").unwrap(), NewUser::default())
    }

    #[test]
    fn test_token_roundtrip_and_expiry() {
        let generator = generator();
        let user = user();
        let issued = Utc::now();

        let token = generator.make_token_at(&user, issued);
        assert!(generator.check_token_at(&user, &token, issued));
        assert!(generator.check_token_at(&user, &token, issued + Duration::days(3)));
        assert!(!generator.check_token_at(&user, &token, issued + Duration::days(3) + Duration::seconds(1)));
    }

    #[test]
    fn test_token_bound_to_user_state() {
        let generator = generator();
        let mut user = user();
        let token = generator.make_token(&user);

        let other = self::user();
        assert!(!generator.check_token(&other, &token));

        user.record_login();
        assert!(!generator.check_token(&user, &token));
    }

    #[test]
    fn test_token_survives_activation() {
        let generator = generator();
        let mut user = user();
        let token = generator.make_token(&user);

        user.activate();
        assert!(generator.check_token(&user, &token));
    }

    #[test]
    fn test_malformed_tokens() {
        let generator = generator();
        let user = user();
        for token in ["", "1", "abc-", "-abc", "!!-abc", "zzzzzzzzzzzzzz-abc"] {
            assert!(!generator.check_token(&user, token), "{token}");
        }
        let other = ActivationTokenGenerator::new([8u8; 32], Duration::days(3));
        assert!(!generator.check_token(&user, &other.make_token(&user)));
    }

    #[test]
    fn test_uid_encoding() {
        let user_id = UserId::new();
        let uid = encode_uid(&user_id);
        assert_eq!(decode_uid(&uid), Some(user_id));
        assert_eq!(decode_uid("1"), None);
        assert_eq!(decode_uid("not-base64!"), None);
    }

    #[test]
    fn test_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(from_base36(&to_base36(1_700_000_000)), Some(1_700_000_000));
    }
}
