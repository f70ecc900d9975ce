//! User Type Value Object

use derive_more::Display;
use kernel::validation::ErrorDetail;
use serde::{Deserialize, Serialize};

/// Account role, selecting the onboarding workflow
///
/// - `Customer`: activated through the emailed link
/// - `Vendor`: activated through the SMS code exchange
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    #[default]
    #[display("customer")]
    Customer,
    #[display("vendor")]
    Vendor,
}

impl UserType {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::Vendor => "vendor",
        }
    }

    /// Parse a submitted choice
    pub fn parse(value: &str) -> Result<Self, ErrorDetail> {
        match value {
            "customer" => Ok(UserType::Customer),
            "vendor" => Ok(UserType::Vendor),
            other => Err(ErrorDetail::new(
                "invalid_choice",
                format!("\"{other}\" is not a valid choice."),
            )),
        }
    }

    /// Create from database value
    pub fn from_db(value: &str) -> Self {
        Self::parse(value).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(UserType::parse("vendor").unwrap(), UserType::Vendor);
        assert_eq!(UserType::parse("customer").unwrap(), UserType::Customer);

        let err = UserType::parse("admin").unwrap_err();
        assert_eq!(err.code(), "invalid_choice");
        assert_eq!(err.message(), "\"admin\" is not a valid choice.");
    }

    #[test]
    fn test_display_and_serde() {
        assert_eq!(UserType::Vendor.to_string(), "vendor");
        assert_eq!(UserType::default(), UserType::Customer);
        assert_eq!(serde_json::to_string(&UserType::Vendor).unwrap(), "\"vendor\"");
    }
}
