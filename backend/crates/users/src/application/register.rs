//! Register Use Case
//!
//! Creates an inactive account, then applies the onboarding policy of its
//! type: customers are emailed an activation link, vendors wait for the
//! phone code exchange.

use std::sync::Arc;

use kernel::validation::{ErrorDetail, ValidationErrors};

use crate::application::config::UsersConfig;
use crate::application::registration::{
    EMAIL_TAKEN_MESSAGE, PHONE_TAKEN_MESSAGE, RegistrationForm, RegistrationKind,
};
use crate::domain::entity::{Credentials, EmailAddress, User};
use crate::domain::gateway::{ActivationEmail, Mailer};
use crate::domain::repository::UserRepository;
use crate::domain::value_object::UserPassword;
use crate::error::UsersResult;

/// Register use case
pub struct RegisterUseCase<U, M>
where
    U: UserRepository,
    M: Mailer,
{
    user_repo: Arc<U>,
    mailer: Arc<M>,
    config: Arc<UsersConfig>,
}

impl<U, M> RegisterUseCase<U, M>
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

    /// Validate and persist a signup
    ///
    /// `request_host` is the `Host` header, used for activation links when
    /// no activation domain is configured and the host is allowed.
    pub async fn execute(
        &self,
        form: RegistrationForm,
        kind: RegistrationKind,
        request_host: Option<&str>,
    ) -> UsersResult<User> {
        let mut errors = ValidationErrors::new();
        let fields = form.clean_fields(kind, &mut errors);

        if let Some(email) = &fields.email {
            if self.user_repo.exists_by_email(email).await? {
                errors.add("email", ErrorDetail::unique(EMAIL_TAKEN_MESSAGE));
            }
        }
        if let Some(phone) = &fields.profile.phone_number {
            if self.user_repo.exists_by_phone_number(phone).await? {
                errors.add("phone_number", ErrorDetail::unique(PHONE_TAKEN_MESSAGE));
            }
        }

        let cleaned = fields.validate(errors, &self.config.password_policy)?;

        let password_hash = UserPassword::from_raw(&cleaned.password, self.config.pepper())?;
        let user = User::new(cleaned.email, cleaned.profile);
        let credentials = Credentials::new(user.user_id, password_hash);
        let email_address = EmailAddress::new_primary(user.user_id, user.email.clone());

        self.user_repo
            .register(&user, &credentials, &email_address)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            user_type = %user.user_type,
            "User registered"
        );

        // The account is committed; a failed email is retried via resend_activation
        if user.is_customer() && self.config.send_activation_email {
            if let Err(e) =
                send_activation_email(self.mailer.as_ref(), &self.config, &user, request_host).await
            {
                tracing::error!(
                    user_id = %user.user_id,
                    error = %e,
                    "Activation email delivery failed after registration"
                );
            }
        }

        Ok(user)
    }
}

/// Email `user` a fresh activation link
pub(crate) async fn send_activation_email<M: Mailer>(
    mailer: &M,
    config: &UsersConfig,
    user: &User,
    request_host: Option<&str>,
) -> UsersResult<()> {
    let email = ActivationEmail {
        to: user.email.clone(),
        recipient_name: display_name(user),
        activation_url: config.activation_link(user, request_host)?,
        site_name: config.site_name.clone(),
    };
    mailer.send_activation(&email).await?;

    tracing::info!(user_id = %user.user_id, "Activation email sent");
    Ok(())
}

/// Greeting name: full name, else first/last, else the email local part
pub(crate) fn display_name(user: &User) -> String {
    if !user.name.is_empty() {
        return user.name.clone();
    }
    let full = format!("{} {}", user.first_name, user.last_name);
    let full = full.trim();
    if full.is_empty() {
        user.email.local_part().to_string()
    } else {
        full.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::Email;
    use crate::error::UsersError;
    use crate::infra::MemoryUsersRepository;
    use serde_json::json;

    struct FailingMailer;

    impl Mailer for FailingMailer {
        async fn send_activation(&self, _email: &ActivationEmail) -> UsersResult<()> {
            Err(UsersError::Mail("connection refused".to_string()))
        }
    }

    fn customer_form() -> RegistrationForm {
        serde_json::from_value(json!({
            "first_name": "Aaa",
            "last_name": "Aaa",
            "email": "a@a.com",
            "password": "Password0978",
            "re_password": "Password0978",
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_mail_failure_keeps_registration() {
        let repo = Arc::new(MemoryUsersRepository::new());
        let use_case = RegisterUseCase::new(
            repo.clone(),
            Arc::new(FailingMailer),
            Arc::new(UsersConfig::development()),
        );

        let user = use_case
            .execute(customer_form(), RegistrationKind::Base, None)
            .await
            .unwrap();
        assert!(!user.is_active);

        let stored = repo
            .find_by_email(&Email::new("a@a.com").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.user_id, user.user_id);

        // Second attempt is a duplicate, not a retry
        let err = use_case
            .execute(customer_form(), RegistrationKind::Base, None)
            .await
            .unwrap_err();
        assert!(matches!(err, UsersError::Validation(_)));
    }
}
