//! Gateway Traits
//!
//! Outbound collaborators of the use cases: the SMS verification provider,
//! the mailer, and the HTTP activation endpoint used by the link proxy.

use serde::Serialize;

use crate::domain::value_object::{Email, PhoneNumber, VerificationId};
use crate::error::UsersResult;

/// Error payload returned by the verification provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProviderRejection {
    pub message: String,
    pub error_code: Option<String>,
}

impl ProviderRejection {
    pub fn new(message: impl Into<String>, error_code: Option<String>) -> Self {
        Self {
            message: message.into(),
            error_code,
        }
    }
}

impl std::fmt::Display for ProviderRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.error_code {
            Some(code) => write!(f, "{} ({code})", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// SMS phone verification provider
#[trait_variant::make(VerificationProvider: Send)]
pub trait LocalVerificationProvider {
    /// Send an SMS challenge to `phone`
    async fn start_verification(&self, phone: &PhoneNumber) -> UsersResult<()>;

    /// Check the code the user received
    async fn check_verification(&self, phone: &PhoneNumber, code: &str) -> UsersResult<()>;

    /// Register the account with the provider and return its id
    async fn register_user(&self, email: &Email, phone: &PhoneNumber)
    -> UsersResult<VerificationId>;
}

/// Activation email contents
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivationEmail {
    pub to: Email,
    pub recipient_name: String,
    pub activation_url: String,
    pub site_name: String,
}

#[trait_variant::make(Mailer: Send)]
pub trait LocalMailer {
    async fn send_activation(&self, email: &ActivationEmail) -> UsersResult<()>;
}

/// Result of forwarding an activation to the HTTP endpoint
#[derive(Debug, Clone, PartialEq)]
pub enum ActivationOutcome {
    Activated,
    /// Non-2xx response or transport failure, with whatever body was received
    Failed { upstream: serde_json::Value },
}

/// Client of the POST activation endpoint
#[trait_variant::make(ActivationGateway: Send)]
pub trait LocalActivationGateway {
    async fn activate(&self, base_url: &str, uid: &str, token: &str) -> ActivationOutcome;
}
