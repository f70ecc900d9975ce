//! In-Memory Repository
//!
//! Map-backed store with the same uniqueness rules as the Postgres schema.
//! Used by the HTTP tests and for running the API without a database.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use kernel::id::UserId;
use kernel::validation::{ErrorDetail, ValidationErrors};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::application::registration::{EMAIL_TAKEN_MESSAGE, PHONE_TAKEN_MESSAGE};
use crate::domain::entity::{AuthSession, Credentials, EmailAddress, User};
use crate::domain::repository::{
    AuthSessionRepository, CredentialsRepository, EmailAddressRepository, UserRepository,
};
use crate::domain::value_object::{Email, PhoneNumber};
use crate::error::{UsersError, UsersResult};

#[derive(Default)]
struct MemoryState {
    users: HashMap<UserId, User>,
    credentials: HashMap<UserId, Credentials>,
    email_addresses: Vec<EmailAddress>,
    sessions: HashMap<Uuid, AuthSession>,
}

impl MemoryState {
    fn unique_violation(&self, user: &User) -> Option<ValidationErrors> {
        let others = || self.users.values().filter(|u| u.user_id != user.user_id);

        if others().any(|u| u.email == user.email) {
            return Some(ValidationErrors::single(
                "email",
                ErrorDetail::unique(EMAIL_TAKEN_MESSAGE),
            ));
        }
        if let Some(phone) = &user.phone_number {
            if others().any(|u| u.phone_number.as_ref() == Some(phone)) {
                return Some(ValidationErrors::single(
                    "phone_number",
                    ErrorDetail::unique(PHONE_TAKEN_MESSAGE),
                ));
            }
        }
        None
    }
}

#[derive(Clone, Default)]
pub struct MemoryUsersRepository {
    state: Arc<RwLock<MemoryState>>,
}

impl MemoryUsersRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user directly (seeding)
    pub async fn insert_user(&self, user: User) {
        self.state.write().await.users.insert(user.user_id, user);
    }

    /// Every stored email address record
    pub async fn email_addresses(&self) -> Vec<EmailAddress> {
        self.state.read().await.email_addresses.clone()
    }

    pub async fn session_count(&self) -> usize {
        self.state.read().await.sessions.len()
    }
}

// ============================================================================
// User Repository Implementation
// ============================================================================

impl UserRepository for MemoryUsersRepository {
    async fn register(
        &self,
        user: &User,
        credentials: &Credentials,
        email_address: &EmailAddress,
    ) -> UsersResult<()> {
        let mut state = self.state.write().await;
        if let Some(errors) = state.unique_violation(user) {
            return Err(errors.into());
        }

        state.users.insert(user.user_id, user.clone());
        state
            .credentials
            .insert(credentials.user_id, credentials.clone());
        state.email_addresses.push(email_address.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> UsersResult<Option<User>> {
        Ok(self.state.read().await.users.get(user_id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> UsersResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<Option<User>> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .find(|u| u.phone_number.as_ref() == Some(phone))
            .cloned())
    }

    async fn exists_by_email(&self, email: &Email) -> UsersResult<bool> {
        let state = self.state.read().await;
        Ok(state.users.values().any(|u| &u.email == email))
    }

    async fn exists_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<bool> {
        let state = self.state.read().await;
        Ok(state
            .users
            .values()
            .any(|u| u.phone_number.as_ref() == Some(phone)))
    }

    async fn update(&self, user: &User) -> UsersResult<()> {
        let mut state = self.state.write().await;
        if let Some(errors) = state.unique_violation(user) {
            return Err(errors.into());
        }
        state.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn list(&self) -> UsersResult<Vec<User>> {
        let state = self.state.read().await;
        let mut users: Vec<User> = state.users.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

// ============================================================================
// Credentials Repository Implementation
// ============================================================================

impl CredentialsRepository for MemoryUsersRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> UsersResult<Option<Credentials>> {
        Ok(self.state.read().await.credentials.get(user_id).cloned())
    }

    async fn update(&self, credentials: &Credentials) -> UsersResult<()> {
        self.state
            .write()
            .await
            .credentials
            .insert(credentials.user_id, credentials.clone());
        Ok(())
    }
}

// ============================================================================
// Email Address Repository Implementation
// ============================================================================

impl EmailAddressRepository for MemoryUsersRepository {
    async fn find_primary(&self, user_id: &UserId) -> UsersResult<Option<EmailAddress>> {
        let state = self.state.read().await;
        Ok(state
            .email_addresses
            .iter()
            .find(|a| a.user_id == *user_id && a.primary)
            .cloned())
    }

    async fn update(&self, email_address: &EmailAddress) -> UsersResult<()> {
        let mut state = self.state.write().await;
        let stored = state
            .email_addresses
            .iter_mut()
            .find(|a| a.id == email_address.id)
            .ok_or_else(|| UsersError::Internal("Email address record not found".to_string()))?;
        *stored = email_address.clone();
        Ok(())
    }
}

// ============================================================================
// Auth Session Repository Implementation
// ============================================================================

impl AuthSessionRepository for MemoryUsersRepository {
    async fn create(&self, session: &AuthSession) -> UsersResult<()> {
        self.state
            .write()
            .await
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> UsersResult<Option<AuthSession>> {
        let state = self.state.read().await;
        match state.sessions.get(&session_id) {
            Some(session) if session.is_expired() => Ok(None),
            Some(session) if session.client_fingerprint_hash != fingerprint_hash => {
                tracing::warn!(session_id = %session_id, "Auth session fingerprint mismatch");
                Err(UsersError::SessionFingerprintMismatch)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn update(&self, session: &AuthSession) -> UsersResult<()> {
        let mut state = self.state.write().await;
        if let Some(stored) = state.sessions.get_mut(&session.session_id) {
            stored.expires_at_ms = session.expires_at_ms;
            stored.last_activity_at = session.last_activity_at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: Uuid) -> UsersResult<()> {
        self.state.write().await.sessions.remove(&session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> UsersResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.state.write().await;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| s.expires_at_ms >= now_ms);
        Ok((before - state.sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entity::NewUser;
    use crate::domain::value_object::{RawPassword, UserPassword, UserType};

    fn registration(email: &str, phone: Option<&str>) -> (User, Credentials, EmailAddress) {
        let user = User::new(
            Email::new(email).unwrap(),
            NewUser {
                phone_number: phone.map(|p| PhoneNumber::parse(p).unwrap()),
                user_type: UserType::Vendor,
                ..NewUser::default()
            },
        );
        let raw = RawPassword::new("Password0978".to_string()).unwrap();
        let credentials = Credentials::new(user.user_id, UserPassword::from_raw(&raw, None).unwrap());
        let address = EmailAddress::new_primary(user.user_id, user.email.clone());
        (user, credentials, address)
    }

    #[tokio::test]
    async fn test_register_enforces_unique_email_and_phone() {
        let repo = MemoryUsersRepository::new();

        let (user, creds, addr) = registration("a@a.com", Some("+12125552368"));
        repo.register(&user, &creds, &addr).await.unwrap();

        let (dup, creds, addr) = registration("a@a.com", None);
        match repo.register(&dup, &creds, &addr).await {
            Err(UsersError::Validation(errors)) => assert_eq!(errors.codes("email"), vec!["unique"]),
            other => panic!("unexpected: {other:?}"),
        }

        let (dup, creds, addr) = registration("b@a.com", Some("+12125552368"));
        match repo.register(&dup, &creds, &addr).await {
            Err(UsersError::Validation(errors)) => {
                assert_eq!(errors.codes("phone_number"), vec!["unique"])
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_phone_numbers_never_collide() {
        let repo = MemoryUsersRepository::new();
        for email in ["a@a.com", "b@a.com"] {
            let (user, creds, addr) = registration(email, None);
            repo.register(&user, &creds, &addr).await.unwrap();
        }
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }
}
