//! User Password Value Object
//!
//! Domain wrapper over `platform::password`. Policy violations are turned
//! into field-level error details so they can be reported under `password`.

use kernel::validation::ErrorDetail;
use platform::password::{
    ClearTextPassword, EmptyPassword, HashedPassword, PasswordHashError, PasswordPolicy,
};
use std::fmt;

use crate::error::{UsersError, UsersResult};

// ============================================================================
// Raw Password (User Input)
// ============================================================================

/// Raw password from user input, zeroized when dropped
pub struct RawPassword(ClearTextPassword);

impl RawPassword {
    pub fn new(raw: String) -> Result<Self, EmptyPassword> {
        ClearTextPassword::new(raw).map(Self)
    }

    /// Every policy violation, as field error details
    ///
    /// `user_attributes` feed the similarity rule, e.g.
    /// `[("email address", "jane@example.com")]`.
    pub fn policy_violations(
        &self,
        policy: &PasswordPolicy,
        user_attributes: &[(&str, &str)],
    ) -> Vec<ErrorDetail> {
        policy
            .check(&self.0, user_attributes)
            .into_iter()
            .map(|violation| ErrorDetail::new(violation.code(), violation.to_string()))
            .collect()
    }
}

impl fmt::Debug for RawPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RawPassword").field(&"[REDACTED]").finish()
    }
}

// ============================================================================
// User Password (Hashed, for storage)
// ============================================================================

/// Argon2id password hash (PHC string), safe to store
#[derive(Clone, PartialEq, Eq)]
pub struct UserPassword(HashedPassword);

impl UserPassword {
    pub fn from_raw(raw: &RawPassword, pepper: Option<&[u8]>) -> UsersResult<Self> {
        raw.0.hash(pepper).map(Self).map_err(|e| match e {
            PasswordHashError::HashingFailed(msg) => {
                UsersError::Internal(format!("Password hashing failed: {msg}"))
            }
            PasswordHashError::InvalidHashFormat => {
                UsersError::Internal("Unexpected error during password hashing".to_string())
            }
        })
    }

    pub fn from_phc_string(phc_string: impl Into<String>) -> UsersResult<Self> {
        HashedPassword::from_phc_string(phc_string)
            .map(Self)
            .map_err(|_| UsersError::Internal("Invalid password hash in database".to_string()))
    }

    pub fn as_phc_string(&self) -> &str {
        self.0.as_phc_string()
    }

    pub fn verify(&self, raw: &RawPassword, pepper: Option<&[u8]>) -> bool {
        self.0.verify(&raw.0, pepper)
    }
}

impl fmt::Debug for UserPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_violations_as_details() {
        let raw = RawPassword::new("a@a.com-1".to_string()).unwrap();
        assert!(raw.policy_violations(&PasswordPolicy::default(), &[]).is_empty());

        let raw = RawPassword::new("1234".to_string()).unwrap();
        let codes: Vec<String> = raw
            .policy_violations(&PasswordPolicy::default(), &[])
            .iter()
            .map(|d| d.code().to_string())
            .collect();
        assert_eq!(
            codes,
            vec![
                "password_too_short",
                "password_too_common",
                "password_entirely_numeric"
            ]
        );
    }

    #[test]
    fn test_similarity_uses_attribute_label() {
        let raw = RawPassword::new("vendorshop2024".to_string()).unwrap();
        let details = raw.policy_violations(
            &PasswordPolicy::default(),
            &[("email address", "vendorshop@example.com")],
        );
        assert_eq!(details.len(), 1);
        assert_eq!(
            details[0].message(),
            "The password is too similar to the email address."
        );
    }

    #[test]
    fn test_hash_and_verify() {
        let raw = RawPassword::new("Password0978".to_string()).unwrap();
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        assert!(hashed.verify(&raw, None));

        let restored = UserPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&raw, None));

        let wrong = RawPassword::new("Password0979".to_string()).unwrap();
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_empty_and_debug() {
        assert!(RawPassword::new("  ".to_string()).is_err());

        let raw = RawPassword::new("SecretPassword123!".to_string()).unwrap();
        assert!(!format!("{raw:?}").contains("Secret"));
        let hashed = UserPassword::from_raw(&raw, None).unwrap();
        assert!(format!("{hashed:?}").contains("[HASH]"));
    }
}
