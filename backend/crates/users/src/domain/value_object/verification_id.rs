//! External Verification Id
//!
//! Opaque user id issued by the 2FA provider once a phone is registered.

use derive_more::Display;

const MAX_LENGTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Display)]
pub struct VerificationId(String);

impl VerificationId {
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let value = value.into();
        let value = value.trim();
        (!value.is_empty() && value.chars().count() <= MAX_LENGTH).then(|| Self(value.to_string()))
    }

    pub fn from_db(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_bounds() {
        assert_eq!(VerificationId::new("123456").unwrap().as_str(), "123456");
        assert!(VerificationId::new("").is_none());
        assert!(VerificationId::new("1234567890123").is_none());
    }
}
