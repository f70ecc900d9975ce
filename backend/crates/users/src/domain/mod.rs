//! Domain Layer
//!
//! Entities, value objects, repository and gateway traits, and the
//! activation token service.

pub mod activation_token;
pub mod entity;
pub mod gateway;
pub mod repository;
pub mod value_object;

// Re-exports
pub use activation_token::ActivationTokenGenerator;
pub use entity::{AuthSession, Credentials, EmailAddress, NewUser, User};
pub use gateway::{ActivationGateway, Mailer, VerificationProvider};
pub use repository::{
    AuthSessionRepository, CredentialsRepository, EmailAddressRepository, UserRepository,
    UsersStore,
};
