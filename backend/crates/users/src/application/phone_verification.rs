//! Phone Verification Use Cases
//!
//! Vendor onboarding: an SMS challenge is requested for the number given at
//! signup, then the received code is confirmed, which registers the account
//! with the provider and activates it.

use std::sync::Arc;

use kernel::validation::{ErrorDetail, Field, ValidationErrors};
use serde::Deserialize;

use crate::application::registration::clean_phone_number;
use crate::domain::entity::User;
use crate::domain::gateway::VerificationProvider;
use crate::domain::repository::UserRepository;
use crate::domain::value_object::PhoneNumber;
use crate::error::UsersResult;

pub const UNKNOWN_PHONE_MESSAGE: &str = "No account is registered with this phone number.";
pub const VENDOR_ONLY_MESSAGE: &str = "Phone verification is only available for vendor accounts.";

/// `phone_number` in E.164, or national digits with `country_code`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhoneVerifyForm {
    pub phone_number: Field<String>,
    pub country_code: Field<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PhoneRegisterForm {
    pub phone_number: Field<String>,
    pub country_code: Field<String>,
    pub verification_code: Field<String>,
}

fn clean_phone(
    phone_number: Field<String>,
    country_code: Field<String>,
    errors: &mut ValidationErrors,
) -> Option<PhoneNumber> {
    let raw = phone_number.required("phone_number", errors)?;
    let code = country_code.into_option();
    clean_phone_number(&raw, code.as_deref(), errors)
}

/// Start phone verification use case
pub struct StartPhoneVerificationUseCase<P>
where
    P: VerificationProvider,
{
    provider: Arc<P>,
}

impl<P> StartPhoneVerificationUseCase<P>
where
    P: VerificationProvider,
{
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }

    pub async fn execute(&self, form: PhoneVerifyForm) -> UsersResult<PhoneNumber> {
        let mut errors = ValidationErrors::new();
        let Some(phone) = clean_phone(form.phone_number, form.country_code, &mut errors) else {
            return Err(errors.into());
        };

        self.provider.start_verification(&phone).await?;

        tracing::info!(country_code = phone.country_code(), "Phone verification started");
        Ok(phone)
    }
}

/// Confirm phone verification use case
pub struct ConfirmPhoneVerificationUseCase<U, P>
where
    U: UserRepository,
    P: VerificationProvider,
{
    user_repo: Arc<U>,
    provider: Arc<P>,
}

impl<U, P> ConfirmPhoneVerificationUseCase<U, P>
where
    U: UserRepository,
    P: VerificationProvider,
{
    pub fn new(user_repo: Arc<U>, provider: Arc<P>) -> Self {
        Self {
            user_repo,
            provider,
        }
    }

    pub async fn execute(&self, form: PhoneRegisterForm) -> UsersResult<User> {
        let mut errors = ValidationErrors::new();
        let phone = clean_phone(form.phone_number, form.country_code, &mut errors);
        let code = form.verification_code.required("verification_code", &mut errors);
        let (Some(phone), Some(code)) = (phone, code) else {
            return Err(errors.into());
        };

        self.provider.check_verification(&phone, &code).await?;

        let mut user = self
            .user_repo
            .find_by_phone_number(&phone)
            .await?
            .ok_or_else(|| {
                ValidationErrors::single(
                    "phone_number",
                    ErrorDetail::new("not_found", UNKNOWN_PHONE_MESSAGE),
                )
            })?;

        // Customers activate through the emailed link only
        if !user.is_vendor() {
            tracing::warn!(user_id = %user.user_id, "Phone confirmation refused for customer");
            return Err(ValidationErrors::single(
                "phone_number",
                ErrorDetail::new("invalid", VENDOR_ONLY_MESSAGE),
            )
            .into());
        }

        if user.is_phone_verified() {
            tracing::debug!(user_id = %user.user_id, "Phone already verified");
            return Ok(user);
        }

        let verification_id = self.provider.register_user(&user.email, &phone).await?;
        user.mark_phone_verified(verification_id);
        self.user_repo.update(&user).await?;

        tracing::info!(
            user_id = %user.user_id,
            user_type = %user.user_type,
            "Phone verified, account activated"
        );
        Ok(user)
    }
}
