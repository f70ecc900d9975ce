//! Account Activation Use Cases
//!
//! Consumes the emailed `{uid, token}` pair, and re-sends the link to
//! customers that lost it.

use std::sync::Arc;

use kernel::validation::{ErrorDetail, Field, ValidationErrors};
use serde::Deserialize;

use crate::application::config::UsersConfig;
use crate::application::register::send_activation_email;
use crate::domain::activation_token::decode_uid;
use crate::domain::entity::User;
use crate::domain::gateway::Mailer;
use crate::domain::repository::{EmailAddressRepository, UserRepository};
use crate::domain::value_object::Email;
use crate::error::{UsersError, UsersResult};

pub const INVALID_UID_MESSAGE: &str = "Invalid user id or user doesn't exist.";
pub const INVALID_TOKEN_MESSAGE: &str = "Invalid token for given user.";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivationForm {
    pub uid: Field<String>,
    pub token: Field<String>,
}

/// Activate user use case
pub struct ActivateUserUseCase<U, E>
where
    U: UserRepository,
    E: EmailAddressRepository,
{
    user_repo: Arc<U>,
    email_repo: Arc<E>,
    config: Arc<UsersConfig>,
}

impl<U, E> ActivateUserUseCase<U, E>
where
    U: UserRepository,
    E: EmailAddressRepository,
{
    pub fn new(user_repo: Arc<U>, email_repo: Arc<E>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            email_repo,
            config,
        }
    }

    pub async fn execute(&self, form: ActivationForm) -> UsersResult<User> {
        let mut errors = ValidationErrors::new();
        let uid = form.uid.required("uid", &mut errors);
        let token = form.token.required("token", &mut errors);
        let (Some(uid), Some(token)) = (uid, token) else {
            return Err(errors.into());
        };

        let mut user = match decode_uid(&uid) {
            Some(user_id) => self.user_repo.find_by_id(&user_id).await?,
            None => None,
        }
        .ok_or_else(|| {
            ValidationErrors::single("uid", ErrorDetail::new("invalid_uid", INVALID_UID_MESSAGE))
        })?;

        if !self.config.token_generator()?.check_token(&user, &token) {
            return Err(ValidationErrors::single(
                "token",
                ErrorDetail::new("invalid_token", INVALID_TOKEN_MESSAGE),
            )
            .into());
        }

        if user.is_active {
            return Err(UsersError::StaleToken);
        }

        user.activate();
        self.user_repo.update(&user).await?;

        if let Some(mut address) = self.email_repo.find_primary(&user.user_id).await? {
            if address.email == user.email && !address.verified {
                address.mark_verified();
                self.email_repo.update(&address).await?;
            }
        }

        tracing::info!(user_id = %user.user_id, "User activated by email link");
        Ok(user)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ResendActivationForm {
    pub email: Field<String>,
}

/// Resend activation use case
///
/// Succeeds whether or not the address belongs to a pending customer.
pub struct ResendActivationUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<UsersConfig>,
}

impl<U, M> ResendActivationUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    pub fn new(user_repo: Arc<U>, mailer: Arc<M>, config: Arc<UsersConfig>) -> Self {
        Self {
            user_repo,
            mailer,
            config,
        }
    }

    pub async fn execute(
        &self,
        form: ResendActivationForm,
        request_host: Option<&str>,
    ) -> UsersResult<()> {
        let mut errors = ValidationErrors::new();
        let email = form
            .email
            .required("email", &mut errors)
            .and_then(|raw| match Email::new(raw) {
                Ok(email) => Some(email),
                Err(detail) => {
                    errors.add("email", detail);
                    None
                }
            });
        let Some(email) = email else {
            return Err(errors.into());
        };

        if !self.config.send_activation_email {
            return Err(ValidationErrors::non_field(ErrorDetail::new(
                "activation_disabled",
                "Account activation emails are disabled.",
            ))
            .into());
        }

        match self.user_repo.find_by_email(&email).await? {
            Some(user) if !user.is_active && user.is_customer() => {
                send_activation_email(self.mailer.as_ref(), &self.config, &user, request_host)
                    .await?;
            }
            _ => {
                tracing::debug!("Activation resend skipped");
            }
        }

        Ok(())
    }
}
