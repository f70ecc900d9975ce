//! Value Object Module

pub mod email;
pub mod phone_number;
pub mod user_password;
pub mod user_type;
pub mod verification_id;

pub use email::Email;
pub use phone_number::PhoneNumber;
pub use user_password::{RawPassword, UserPassword};
pub use user_type::UserType;
pub use verification_id::VerificationId;
