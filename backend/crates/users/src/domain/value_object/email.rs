//! Email Value Object
//!
//! Login identifier of every account. Format checks are structural only;
//! ownership is proven by the activation link.

use kernel::validation::ErrorDetail;
use serde::{Deserialize, Serialize};

/// Maximum email length (per RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

pub const INVALID_EMAIL_MESSAGE: &str = "Enter a valid email address.";

/// Email address value object, stored lowercase
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Email(String);

impl Email {
    /// Normalise and validate user input
    pub fn new(email: impl AsRef<str>) -> Result<Self, ErrorDetail> {
        let email = email.as_ref().trim().to_lowercase();

        if email.is_empty() {
            return Err(ErrorDetail::blank());
        }
        if email.chars().count() > EMAIL_MAX_LENGTH {
            return Err(ErrorDetail::max_length(EMAIL_MAX_LENGTH));
        }
        if !Self::is_valid_format(&email) {
            return Err(ErrorDetail::invalid(INVALID_EMAIL_MESSAGE));
        }

        Ok(Self(email))
    }

    fn is_valid_format(email: &str) -> bool {
        let Some((local, domain)) = email.split_once('@') else {
            return false;
        };

        if local.is_empty() || local.len() > 64 || domain.contains('@') {
            return false;
        }
        if local.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return false;
        }

        // Dotted domain of alphanumeric/hyphen labels
        let labels: Vec<&str> = domain.split('.').collect();
        labels.len() >= 2
            && labels.iter().all(|label| {
                !label.is_empty()
                    && !label.starts_with('-')
                    && !label.ends_with('-')
                    && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
            })
    }

    /// Create from database value (assumed already validated)
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }
}

impl std::fmt::Display for Email {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_email_valid() {
        assert!(Email::new("a@a.com").is_ok());
        assert!(Email::new("user.name@example.co.jp").is_ok());
        assert!(Email::new("user+tag@example.com").is_ok());
    }

    #[test]
    fn test_email_invalid() {
        for input in [
            "userexample.com",
            "user@",
            "@example.com",
            "user@@example.com",
            "user@example",
            "user@.example.com",
            "user@-example.com",
            "us er@example.com",
        ] {
            let err = Email::new(input).unwrap_err();
            assert_eq!(err.code(), "invalid", "{input}");
            assert_eq!(err.message(), INVALID_EMAIL_MESSAGE);
        }
    }

    #[test]
    fn test_email_blank_and_too_long() {
        assert_eq!(Email::new("   ").unwrap_err().code(), "blank");

        let long = format!("{}@example.com", "a".repeat(250));
        assert_eq!(Email::new(long).unwrap_err().code(), "max_length");
    }

    #[test]
    fn test_email_case_normalization() {
        let email = Email::new("  Vendor@Example.COM ").unwrap();
        assert_eq!(email.as_str(), "vendor@example.com");
        assert_eq!(email.local_part(), "vendor");
    }
}
