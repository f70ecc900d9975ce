//! Password Policy and Hashing
//!
//! - Argon2id hashing (memory-hard, recommended by OWASP)
//! - Zeroization of clear text on drop
//! - A policy that reports every violation at once, so registration forms
//!   can show the full list under the `password` field
//!
//! ## Examples
//! ```rust
//! use platform::password::{ClearTextPassword, PasswordPolicy};
//!
//! let password = ClearTextPassword::new("Password0978".to_string()).unwrap();
//! assert!(PasswordPolicy::default().check(&password, &[]).is_empty());
//! ```

use std::fmt;

use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;
use thiserror::Error;
use unicode_normalization::UnicodeNormalization;
use zeroize::{Zeroize, ZeroizeOnDrop};

// ============================================================================
// Constants
// ============================================================================

/// Minimum password length
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Maximum password length
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Shortest user attribute considered by the similarity check
const MIN_ATTRIBUTE_LENGTH: usize = 3;

// ============================================================================
// Error Types
// ============================================================================

/// Password policy violation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordPolicyError {
    #[error("This password is too short. It must contain at least {min} characters.")]
    TooShort { min: usize },

    #[error("Ensure this password has no more than {max} characters.")]
    TooLong { max: usize },

    #[error("This password is too common.")]
    TooCommon,

    #[error("This password is entirely numeric.")]
    EntirelyNumeric,

    #[error("The password is too similar to the {attribute}.")]
    TooSimilar { attribute: String },

    #[error("This password contains invalid control characters.")]
    InvalidCharacter,
}

impl PasswordPolicyError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PasswordPolicyError::TooShort { .. } => "password_too_short",
            PasswordPolicyError::TooLong { .. } => "password_too_long",
            PasswordPolicyError::TooCommon => "password_too_common",
            PasswordPolicyError::EntirelyNumeric => "password_entirely_numeric",
            PasswordPolicyError::TooSimilar { .. } => "password_too_similar",
            PasswordPolicyError::InvalidCharacter => "password_invalid_character",
        }
    }
}

/// Password hashing/verification errors
#[derive(Debug, Error)]
pub enum PasswordHashError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),

    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

// ============================================================================
// Clear Text Password (Zeroized on drop)
// ============================================================================

/// Clear text password, NFKC-normalised, zeroized on drop
///
/// Construction only rejects empty input; the strength rules live in
/// [`PasswordPolicy`] so sign-in can verify legacy passwords that predate
/// the current policy.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct ClearTextPassword(String);

/// Empty or whitespace-only password
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Password cannot be empty or contain only whitespace")]
pub struct EmptyPassword;

impl ClearTextPassword {
    pub fn new(raw: String) -> Result<Self, EmptyPassword> {
        let normalized: String = raw.nfkc().collect();
        if normalized.trim().is_empty() {
            return Err(EmptyPassword);
        }
        Ok(Self(normalized))
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }

    /// Hash with Argon2id, appending the optional application pepper
    pub fn hash(&self, pepper: Option<&[u8]>) -> Result<HashedPassword, PasswordHashError> {
        let password_bytes = peppered(self, pepper);
        let salt = SaltString::generate(OsRng);

        // OWASP defaults: m=19456 (19 MiB), t=2, p=1
        let hash = Argon2::default()
            .hash_password(&password_bytes, &salt)
            .map_err(|e| PasswordHashError::HashingFailed(e.to_string()))?;

        Ok(HashedPassword {
            hash: hash.to_string(),
        })
    }
}

impl fmt::Debug for ClearTextPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClearTextPassword")
            .field(&"[REDACTED]")
            .finish()
    }
}

fn peppered(password: &ClearTextPassword, pepper: Option<&[u8]>) -> zeroize::Zeroizing<Vec<u8>> {
    let mut bytes = password.as_str().as_bytes().to_vec();
    if let Some(p) = pepper {
        bytes.extend_from_slice(p);
    }
    zeroize::Zeroizing::new(bytes)
}

// ============================================================================
// Policy
// ============================================================================

/// Password strength rules
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub max_length: usize,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: MIN_PASSWORD_LENGTH,
            max_length: MAX_PASSWORD_LENGTH,
        }
    }
}

impl PasswordPolicy {
    /// Every rule the password violates, in a stable order
    ///
    /// `user_attributes` are `(label, value)` pairs such as
    /// `("email address", "jane@example.com")`; a password containing one of
    /// them (case-insensitive) is rejected as too similar.
    pub fn check(
        &self,
        password: &ClearTextPassword,
        user_attributes: &[(&str, &str)],
    ) -> Vec<PasswordPolicyError> {
        let value = password.as_str();
        let lower = value.to_lowercase();
        let char_count = value.chars().count();
        let mut errors = Vec::new();

        if let Some(attribute) = similar_attribute(&lower, user_attributes) {
            errors.push(PasswordPolicyError::TooSimilar {
                attribute: attribute.to_string(),
            });
        }

        if char_count < self.min_length {
            errors.push(PasswordPolicyError::TooShort {
                min: self.min_length,
            });
        }
        if char_count > self.max_length {
            errors.push(PasswordPolicyError::TooLong {
                max: self.max_length,
            });
        }

        if is_common_pattern(&lower) {
            errors.push(PasswordPolicyError::TooCommon);
        }

        if value.chars().all(|c| c.is_ascii_digit()) {
            errors.push(PasswordPolicyError::EntirelyNumeric);
        }

        if value
            .chars()
            .any(|ch| ch.is_control() && ch != '\t' && ch != '\n')
        {
            errors.push(PasswordPolicyError::InvalidCharacter);
        }

        errors
    }
}

fn similar_attribute<'a>(lower: &str, user_attributes: &[(&'a str, &str)]) -> Option<&'a str> {
    user_attributes.iter().find_map(|(label, value)| {
        let value = value.trim().to_lowercase();
        // Email addresses are compared by their local part as well
        let local = value.split('@').next().unwrap_or_default().to_string();
        [value, local]
            .into_iter()
            .filter(|candidate| candidate.chars().count() >= MIN_ATTRIBUTE_LENGTH)
            .any(|candidate| lower.contains(&candidate))
            .then_some(*label)
    })
}

// ============================================================================
// Hashed Password (Safe to store)
// ============================================================================

/// Argon2id hash in PHC string format
#[derive(Clone, PartialEq, Eq)]
pub struct HashedPassword {
    hash: String,
}

impl HashedPassword {
    /// Create from PHC string (e.g., from database)
    pub fn from_phc_string(s: impl Into<String>) -> Result<Self, PasswordHashError> {
        let hash = s.into();
        PasswordHash::new(&hash).map_err(|_| PasswordHashError::InvalidHashFormat)?;
        Ok(Self { hash })
    }

    pub fn as_phc_string(&self) -> &str {
        &self.hash
    }

    /// Verify a password against this hash (constant-time inside argon2)
    pub fn verify(&self, password: &ClearTextPassword, pepper: Option<&[u8]>) -> bool {
        let parsed_hash = match PasswordHash::new(&self.hash) {
            Ok(h) => h,
            Err(_) => return false,
        };

        Argon2::default()
            .verify_password(&peppered(password, pepper), &parsed_hash)
            .is_ok()
    }
}

impl fmt::Debug for HashedPassword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashedPassword")
            .field("hash", &"[HASH]")
            .finish()
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Check for common weak patterns (input must be lowercase)
fn is_common_pattern(lower: &str) -> bool {
    let chars: Vec<char> = lower.chars().collect();
    if chars.len() >= 3 && chars.iter().all(|&c| c == chars[0]) {
        return true;
    }

    if is_sequential_numbers(lower) {
        return true;
    }

    const KEYBOARD_PATTERNS: &[&str] = &[
        "qwerty",
        "asdfgh",
        "zxcvbn",
        "qazwsx",
        "1qaz2wsx",
    ];
    if KEYBOARD_PATTERNS.iter().any(|p| lower.contains(p)) {
        return true;
    }

    const COMMON_PASSWORDS: &[&str] = &[
        "password",
        "password1",
        "password123",
        "12345678",
        "123456789",
        "1234567890",
        "abcdefgh",
        "letmein",
        "welcome",
        "admin123",
        "iloveyou",
        "sunshine",
        "princess",
        "football",
        "baseball",
        "trustno1",
    ];
    COMMON_PASSWORDS.contains(&lower)
}

/// Whole-string ascending or descending digit runs (e.g. "12345678")
fn is_sequential_numbers(s: &str) -> bool {
    if !s.chars().all(|c| c.is_ascii_digit()) {
        return false;
    }
    let digits: Vec<u32> = s.chars().filter_map(|c| c.to_digit(10)).collect();
    if digits.len() < 4 {
        return false;
    }

    let is_ascending = digits.windows(2).all(|w| w[1] == (w[0] + 1) % 10);
    let is_descending = digits.windows(2).all(|w| w[0] == (w[1] + 1) % 10);

    is_ascending || is_descending
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(raw: &str) -> Vec<PasswordPolicyError> {
        let password = ClearTextPassword::new(raw.to_string()).unwrap();
        PasswordPolicy::default().check(&password, &[])
    }

    #[test]
    fn test_empty_rejected_at_construction() {
        assert_eq!(ClearTextPassword::new("".to_string()).unwrap_err(), EmptyPassword);
        assert!(ClearTextPassword::new("   ".to_string()).is_err());
    }

    #[test]
    fn test_valid_password() {
        assert!(check("Password0978").is_empty());
        assert!(check("MySecure#Pass2024!").is_empty());
        assert!(check("パスワード安全です!").is_empty());
    }

    #[test]
    fn test_reports_every_violation() {
        let errors = check("1234");
        assert!(errors.contains(&PasswordPolicyError::TooShort { min: 8 }));
        assert!(errors.contains(&PasswordPolicyError::TooCommon));
        assert!(errors.contains(&PasswordPolicyError::EntirelyNumeric));
    }

    #[test]
    fn test_too_long() {
        let errors = check(&"ab".repeat(MAX_PASSWORD_LENGTH));
        assert_eq!(errors, vec![PasswordPolicyError::TooLong { max: 128 }]);
    }

    #[test]
    fn test_common_patterns() {
        assert_eq!(check("password123"), vec![PasswordPolicyError::TooCommon]);
        assert_eq!(check("myqwertykey"), vec![PasswordPolicyError::TooCommon]);
        assert!(check("98765432").contains(&PasswordPolicyError::TooCommon));
    }

    #[test]
    fn test_similar_to_user_attribute() {
        let password = ClearTextPassword::new("janedoe-rocks".to_string()).unwrap();
        let errors =
            PasswordPolicy::default().check(&password, &[("email address", "JaneDoe@example.com")]);
        assert_eq!(
            errors,
            vec![PasswordPolicyError::TooSimilar {
                attribute: "email address".to_string()
            }]
        );
        assert_eq!(
            errors[0].to_string(),
            "The password is too similar to the email address."
        );
        assert_eq!(errors[0].code(), "password_too_similar");

        // Attributes shorter than three characters are ignored
        let errors = PasswordPolicy::default().check(&password, &[("first name", "ja")]);
        assert!(errors.is_empty());
    }

    #[test]
    fn test_hash_and_verify() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash(None).unwrap();
        assert!(hashed.verify(&password, None));

        let wrong = ClearTextPassword::new("WrongPassword123!".to_string()).unwrap();
        assert!(!hashed.verify(&wrong, None));
    }

    #[test]
    fn test_hash_with_pepper() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let pepper = b"my_secret_pepper";
        let hashed = password.hash(Some(pepper)).unwrap();

        assert!(hashed.verify(&password, Some(pepper)));
        assert!(!hashed.verify(&password, None));
        assert!(!hashed.verify(&password, Some(b"wrong_pepper")));
    }

    #[test]
    fn test_phc_string_restore() {
        let password = ClearTextPassword::new("TestPassword123!".to_string()).unwrap();
        let hashed = password.hash(None).unwrap();
        let restored = HashedPassword::from_phc_string(hashed.as_phc_string()).unwrap();
        assert!(restored.verify(&password, None));

        assert!(HashedPassword::from_phc_string("not_a_valid_hash").is_err());
    }

    #[test]
    fn test_debug_redaction() {
        let password = ClearTextPassword::new("secret-value".to_string()).unwrap();
        let debug_output = format!("{:?}", password);
        assert!(debug_output.contains("REDACTED"));
        assert!(!debug_output.contains("secret"));
    }
}
