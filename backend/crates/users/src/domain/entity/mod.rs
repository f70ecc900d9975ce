//! Entity Module

pub mod auth_session;
pub mod credentials;
pub mod email_address;
pub mod user;

pub use auth_session::AuthSession;
pub use credentials::Credentials;
pub use email_address::EmailAddress;
pub use user::{NewUser, User};
