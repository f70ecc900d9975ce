//! Email Address Entity
//!
//! Verification record of an account's address. One primary record is
//! created per registration and verified when the activation link is used.

use chrono::{DateTime, Utc};
use kernel::id::{EmailAddressId, UserId};

use crate::domain::value_object::Email;

#[derive(Debug, Clone)]
pub struct EmailAddress {
    pub id: EmailAddressId,
    pub user_id: UserId,
    pub email: Email,
    pub verified: bool,
    pub primary: bool,
    pub created_at: DateTime<Utc>,
}

impl EmailAddress {
    /// Unverified primary address for a freshly registered account
    pub fn new_primary(user_id: UserId, email: Email) -> Self {
        Self {
            id: EmailAddressId::new(),
            user_id,
            email,
            verified: false,
            primary: true,
            created_at: Utc::now(),
        }
    }

    pub fn mark_verified(&mut self) {
        self.verified = true;
    }
}
