//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the infra layer.

use kernel::id::UserId;
use uuid::Uuid;

use crate::domain::entity::{AuthSession, Credentials, EmailAddress, User};
use crate::domain::value_object::{Email, PhoneNumber};
use crate::error::UsersResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Persist a new account with its credentials and primary email record
    ///
    /// All three rows are written atomically. A unique-constraint collision
    /// on email or phone number is reported as a field validation error.
    async fn register(
        &self,
        user: &User,
        credentials: &Credentials,
        email_address: &EmailAddress,
    ) -> UsersResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> UsersResult<Option<User>>;

    async fn find_by_email(&self, email: &Email) -> UsersResult<Option<User>>;

    async fn find_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<Option<User>>;

    async fn exists_by_email(&self, email: &Email) -> UsersResult<bool>;

    async fn exists_by_phone_number(&self, phone: &PhoneNumber) -> UsersResult<bool>;

    async fn update(&self, user: &User) -> UsersResult<()>;

    /// Every account, oldest first
    async fn list(&self) -> UsersResult<Vec<User>>;
}

/// Credentials repository trait
#[trait_variant::make(CredentialsRepository: Send)]
pub trait LocalCredentialsRepository {
    async fn find_by_user_id(&self, user_id: &UserId) -> UsersResult<Option<Credentials>>;

    async fn update(&self, credentials: &Credentials) -> UsersResult<()>;
}

/// Email address record repository trait
#[trait_variant::make(EmailAddressRepository: Send)]
pub trait LocalEmailAddressRepository {
    async fn find_primary(&self, user_id: &UserId) -> UsersResult<Option<EmailAddress>>;

    async fn update(&self, email_address: &EmailAddress) -> UsersResult<()>;
}

/// Auth session repository trait
#[trait_variant::make(AuthSessionRepository: Send)]
pub trait LocalAuthSessionRepository {
    async fn create(&self, session: &AuthSession) -> UsersResult<()>;

    /// Find session by ID, matching the client fingerprint
    async fn find_by_id(
        &self,
        session_id: Uuid,
        fingerprint_hash: &[u8],
    ) -> UsersResult<Option<AuthSession>>;

    /// Update session (e.g., last activity)
    async fn update(&self, session: &AuthSession) -> UsersResult<()>;

    async fn delete(&self, session_id: Uuid) -> UsersResult<()>;

    /// Clean up expired sessions
    async fn cleanup_expired(&self) -> UsersResult<u64>;
}

/// Every repository the accounts use cases need, behind one handle
pub trait UsersStore:
    UserRepository
    + CredentialsRepository
    + EmailAddressRepository
    + AuthSessionRepository
    + Send
    + Sync
    + 'static
{
}

impl<T> UsersStore for T where
    T: UserRepository
        + CredentialsRepository
        + EmailAddressRepository
        + AuthSessionRepository
        + Send
        + Sync
        + 'static
{
}
