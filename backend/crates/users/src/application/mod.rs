//! Application Layer
//!
//! Use cases and application services.

pub mod activation;
pub mod check_session;
pub mod config;
pub mod phone_verification;
pub mod register;
pub mod registration;
pub mod sign_in;
pub mod sign_out;
pub mod users_query;

// Re-exports
pub use activation::{
    ActivateUserUseCase, ActivationForm, ResendActivationForm, ResendActivationUseCase,
};
pub use check_session::CheckSessionUseCase;
pub use config::UsersConfig;
pub use phone_verification::{
    ConfirmPhoneVerificationUseCase, PhoneRegisterForm, PhoneVerifyForm,
    StartPhoneVerificationUseCase,
};
pub use register::RegisterUseCase;
pub use registration::{RegistrationForm, RegistrationKind};
pub use sign_in::{ClientFingerprint, SignInInput, SignInOutput, SignInUseCase};
pub use sign_out::SignOutUseCase;
pub use users_query::UsersQueryUseCase;
