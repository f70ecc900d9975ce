//! User Entity
//!
//! Account profile. Credentials live in [`Credentials`](super::credentials::Credentials)
//! so the profile can be passed around without the password hash.

use chrono::{DateTime, Utc};
use kernel::id::UserId;

use crate::domain::value_object::{Email, PhoneNumber, UserType, VerificationId};

/// User entity
#[derive(Debug, Clone)]
pub struct User {
    pub user_id: UserId,
    /// Login identifier, unique and lowercase
    pub email: Email,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    /// Unique when present
    pub phone_number: Option<PhoneNumber>,
    pub business_name: String,
    pub user_type: UserType,
    /// Id issued by the 2FA provider once the phone is confirmed
    pub verification_id: Option<VerificationId>,
    pub is_active: bool,
    pub is_staff: bool,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated profile data for a new account
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone_number: Option<PhoneNumber>,
    pub business_name: String,
    pub user_type: UserType,
}

impl User {
    /// Create a new, inactive account
    pub fn new(email: Email, profile: NewUser) -> Self {
        let now = Utc::now();

        Self {
            user_id: UserId::new(),
            email,
            name: profile.name,
            first_name: profile.first_name,
            last_name: profile.last_name,
            address: profile.address,
            phone_number: profile.phone_number,
            business_name: profile.business_name,
            user_type: profile.user_type,
            verification_id: None,
            is_active: false,
            is_staff: false,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_customer(&self) -> bool {
        self.user_type == UserType::Customer
    }

    pub fn is_vendor(&self) -> bool {
        self.user_type == UserType::Vendor
    }

    pub fn is_phone_verified(&self) -> bool {
        self.verification_id.is_some()
    }

    /// Store the provider id and activate the account
    pub fn mark_phone_verified(&mut self, verification_id: VerificationId) {
        self.verification_id = Some(verification_id);
        self.activate();
    }

    pub fn activate(&mut self) {
        self.is_active = true;
        self.updated_at = Utc::now();
    }

    /// Record successful login
    pub fn record_login(&mut self) {
        let now = Utc::now();
        self.last_login_at = Some(now);
        self.updated_at = now;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vendor() -> User {
        User::new(
            Email::new("shop@example.com").unwrap(),
            NewUser {
                phone_number: Some(PhoneNumber::parse("+12125552368").unwrap()),
                user_type: UserType::Vendor,
                ..NewUser::default()
            },
        )
    }

    #[test]
    fn test_new_user_is_inactive() {
        let user = vendor();
        assert!(!user.is_active);
        assert!(!user.is_staff);
        assert!(user.is_vendor());
        assert!(!user.is_phone_verified());
    }

    #[test]
    fn test_mark_phone_verified_activates() {
        let mut user = vendor();
        user.mark_phone_verified(VerificationId::new("98765").unwrap());
        assert!(user.is_active);
        assert!(user.is_phone_verified());
    }
}
