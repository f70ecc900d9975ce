//! Registration Form
//!
//! Two-stage validation of signup payloads. Field rules run first and every
//! failing field contributes exactly one error; uniqueness checks are added
//! by the use case; object-level rules (password policy, then the
//! confirmation match) run only once every field is clean.

use kernel::validation::{ErrorDetail, Field, ValidationErrors};
use platform::password::PasswordPolicy;
use serde::Deserialize;

use crate::domain::entity::NewUser;
use crate::domain::value_object::{Email, PhoneNumber, RawPassword, UserType};

pub const PASSWORD_MISMATCH_MESSAGE: &str = "The two password fields didn't match.";
pub const EMAIL_TAKEN_MESSAGE: &str = "user with this email address already exists.";
pub const PHONE_TAKEN_MESSAGE: &str = "user with this phone number already exists.";

const FIRST_NAME_MAX: usize = 150;
const LAST_NAME_MAX: usize = 150;
const NAME_MAX: usize = 255;
const ADDRESS_MAX: usize = 200;
const BUSINESS_NAME_MAX: usize = 100;

/// Which signup endpoint received the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationKind {
    /// `POST /users`: customer by default, phone optional
    Base,
    /// `POST /users/vendor`: phone required, type forced to vendor
    Vendor,
}

/// Raw signup payload
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegistrationForm {
    pub email: Field<String>,
    pub password: Field<String>,
    pub re_password: Field<String>,
    pub first_name: Field<String>,
    pub last_name: Field<String>,
    pub name: Field<String>,
    pub address: Field<String>,
    pub business_name: Field<String>,
    pub user_type: Field<String>,
    pub country_code: Field<String>,
    pub phone_number: Field<String>,
}

/// Output of the field stage; `None` marks a field that already failed
#[derive(Debug)]
pub struct RegistrationFields {
    pub email: Option<Email>,
    password: Option<String>,
    re_password: Option<String>,
    pub profile: NewUser,
}

/// Fully validated registration
#[derive(Debug)]
pub struct CleanedRegistration {
    pub email: Email,
    pub password: RawPassword,
    pub profile: NewUser,
}

impl RegistrationForm {
    /// Run the per-field rules, recording failures in `errors`
    pub fn clean_fields(
        self,
        kind: RegistrationKind,
        errors: &mut ValidationErrors,
    ) -> RegistrationFields {
        let email = self
            .email
            .required("email", errors)
            .and_then(|raw| match Email::new(raw) {
                Ok(email) => Some(email),
                Err(detail) => {
                    errors.add("email", detail);
                    None
                }
            });

        let password = self.password.required_raw("password", errors);
        let re_password = self.re_password.required_raw("re_password", errors);

        let user_type = match kind {
            RegistrationKind::Vendor => UserType::Vendor,
            RegistrationKind::Base => match self.user_type {
                Field::Present(raw) if !raw.trim().is_empty() => {
                    UserType::parse(raw.trim()).unwrap_or_else(|detail| {
                        errors.add("user_type", detail);
                        UserType::default()
                    })
                }
                _ => UserType::default(),
            },
        };

        let phone_number = match kind {
            RegistrationKind::Vendor => {
                let country_code = self.country_code.required("country_code", errors);
                let digits = self.phone_number.required("phone_number", errors);
                match (country_code, digits) {
                    (Some(code), Some(digits)) => {
                        clean_phone_number(&digits, Some(&code), errors)
                    }
                    _ => None,
                }
            }
            RegistrationKind::Base => match self.phone_number.into_option() {
                Some(raw) if !raw.trim().is_empty() => {
                    let code = self.country_code.into_option();
                    clean_phone_number(&raw, code.as_deref(), errors)
                }
                _ => None,
            },
        };

        let profile = NewUser {
            name: self.name.optional("name", NAME_MAX, errors),
            first_name: self.first_name.optional("first_name", FIRST_NAME_MAX, errors),
            last_name: self.last_name.optional("last_name", LAST_NAME_MAX, errors),
            address: self.address.optional("address", ADDRESS_MAX, errors),
            business_name: self
                .business_name
                .optional("business_name", BUSINESS_NAME_MAX, errors),
            phone_number,
            user_type,
        };

        RegistrationFields {
            email,
            password,
            re_password,
            profile,
        }
    }
}

impl RegistrationFields {
    /// Object-level rules; runs only when the field stage left no errors
    pub fn validate(
        self,
        errors: ValidationErrors,
        policy: &PasswordPolicy,
    ) -> Result<CleanedRegistration, ValidationErrors> {
        if !errors.is_empty() {
            return Err(errors);
        }
        let (Some(email), Some(password), Some(re_password)) =
            (self.email, self.password, self.re_password)
        else {
            return Err(errors);
        };

        let raw = RawPassword::new(password.clone())
            .map_err(|_| ValidationErrors::single("password", ErrorDetail::blank()))?;

        let profile = self.profile;
        let attributes = [
            ("email address", email.as_str()),
            ("first name", profile.first_name.as_str()),
            ("last name", profile.last_name.as_str()),
            ("name", profile.name.as_str()),
        ];
        let violations = raw.policy_violations(policy, &attributes);
        if !violations.is_empty() {
            let mut errors = ValidationErrors::new();
            for detail in violations {
                errors.add("password", detail);
            }
            return Err(errors);
        }

        if password != re_password {
            return Err(ValidationErrors::non_field(ErrorDetail::new(
                "password_mismatch",
                PASSWORD_MISMATCH_MESSAGE,
            )));
        }

        Ok(CleanedRegistration {
            email,
            password: raw,
            profile,
        })
    }
}

/// Parse a submitted phone number, reporting failures under `phone_number`
pub fn clean_phone_number(
    phone_number: &str,
    country_code: Option<&str>,
    errors: &mut ValidationErrors,
) -> Option<PhoneNumber> {
    let country_code = country_code.filter(|code| !code.trim().is_empty());
    match PhoneNumber::from_parts(phone_number, country_code) {
        Ok(phone) => Some(phone),
        Err(detail) => {
            errors.add("phone_number", detail);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn form(value: serde_json::Value) -> RegistrationForm {
        serde_json::from_value(value).unwrap()
    }

    fn run(
        value: serde_json::Value,
        kind: RegistrationKind,
    ) -> Result<CleanedRegistration, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let fields = form(value).clean_fields(kind, &mut errors);
        fields.validate(errors, &PasswordPolicy::default())
    }

    fn customer_payload() -> serde_json::Value {
        json!({
            "first_name": "Aaa",
            "last_name": "Aaa",
            "email": "a@a.com",
            "password": "Password0978",
            "re_password": "Password0978",
        })
    }

    #[test]
    fn test_valid_customer() {
        let cleaned = run(customer_payload(), RegistrationKind::Base).unwrap();
        assert_eq!(cleaned.email.as_str(), "a@a.com");
        assert_eq!(cleaned.profile.user_type, UserType::Customer);
        assert_eq!(cleaned.profile.first_name, "Aaa");
        assert!(cleaned.profile.phone_number.is_none());
    }

    #[test]
    fn test_valid_vendor_composes_phone() {
        let mut payload = customer_payload();
        payload["user_type"] = json!("vendor");
        payload["country_code"] = json!("+12");
        payload["phone_number"] = json!("125552368");

        let cleaned = run(payload, RegistrationKind::Vendor).unwrap();
        assert_eq!(cleaned.profile.user_type, UserType::Vendor);
        assert_eq!(
            cleaned.profile.phone_number.unwrap().as_str(),
            "+12125552368"
        );
    }

    #[test]
    fn test_blank_and_null_fields_one_error_each() {
        let errors = run(
            json!({ "email": "", "password": null, "re_password": "   " }),
            RegistrationKind::Base,
        )
        .unwrap_err();

        assert_eq!(errors.codes("email"), vec!["blank"]);
        assert_eq!(errors.codes("password"), vec!["null"]);
        assert_eq!(errors.codes("re_password"), vec!["blank"]);
        assert!(!errors.has_field("non_field_errors"));
    }

    #[test]
    fn test_missing_fields_are_required() {
        let errors = run(json!({}), RegistrationKind::Base).unwrap_err();
        for field in ["email", "password", "re_password"] {
            assert_eq!(errors.codes(field), vec!["required"], "{field}");
        }
    }

    #[test]
    fn test_invalid_email() {
        let mut payload = customer_payload();
        payload["email"] = json!("not-an-email");
        let errors = run(payload, RegistrationKind::Base).unwrap_err();
        assert_eq!(errors.get("email")[0].message(), "Enter a valid email address.");
    }

    #[test]
    fn test_password_mismatch() {
        let mut payload = customer_payload();
        payload["re_password"] = json!("Password0979");
        let errors = run(payload, RegistrationKind::Base).unwrap_err();
        assert_eq!(errors.codes("non_field_errors"), vec!["password_mismatch"]);
        assert_eq!(
            errors.get("non_field_errors")[0].message(),
            PASSWORD_MISMATCH_MESSAGE
        );
    }

    #[test]
    fn test_policy_errors_before_mismatch() {
        let mut payload = customer_payload();
        payload["password"] = json!("1234");
        payload["re_password"] = json!("5678");
        let errors = run(payload, RegistrationKind::Base).unwrap_err();
        assert!(errors.codes("password").contains(&"password_too_short"));
        assert!(!errors.has_field("non_field_errors"));
    }

    #[test]
    fn test_field_errors_suppress_object_checks() {
        let mut payload = customer_payload();
        payload["email"] = json!("");
        payload["re_password"] = json!("different");
        let errors = run(payload, RegistrationKind::Base).unwrap_err();
        assert!(errors.has_field("email"));
        assert!(!errors.has_field("non_field_errors"));
    }

    #[test]
    fn test_vendor_requires_phone_fields() {
        let errors = run(customer_payload(), RegistrationKind::Vendor).unwrap_err();
        assert_eq!(errors.codes("country_code"), vec!["required"]);
        assert_eq!(errors.codes("phone_number"), vec!["required"]);
    }

    #[test]
    fn test_vendor_invalid_phone() {
        let mut payload = customer_payload();
        payload["country_code"] = json!("+1");
        payload["phone_number"] = json!("12");
        let errors = run(payload, RegistrationKind::Vendor).unwrap_err();
        assert_eq!(
            errors.get("phone_number")[0].message(),
            "Enter a valid phone number."
        );
        assert_eq!(errors.codes("phone_number"), vec!["invalid"]);
    }

    #[test]
    fn test_vendor_type_is_forced() {
        let mut payload = customer_payload();
        payload["user_type"] = json!("customer");
        payload["country_code"] = json!("1");
        payload["phone_number"] = json!("2125552368");
        let cleaned = run(payload, RegistrationKind::Vendor).unwrap();
        assert_eq!(cleaned.profile.user_type, UserType::Vendor);
    }

    #[test]
    fn test_invalid_user_type_and_long_names() {
        let mut payload = customer_payload();
        payload["user_type"] = json!("admin");
        payload["business_name"] = json!("x".repeat(101));
        let errors = run(payload, RegistrationKind::Base).unwrap_err();
        assert_eq!(errors.codes("user_type"), vec!["invalid_choice"]);
        assert_eq!(errors.codes("business_name"), vec!["max_length"]);
    }
}
