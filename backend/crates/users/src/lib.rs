//! Users (Marketplace Accounts) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository and gateway traits
//! - `application/` - Use cases and registration forms
//! - `infra/` - Postgres/in-memory stores, Authy client, mailers
//! - `presentation/` - HTTP handlers, DTOs, session guard, router
//!
//! ## Features
//! - Customer signup activated by an emailed link
//! - Vendor signup activated by an SMS code (Authy Phone Verification)
//! - Email + password sign-in with server-side sessions
//! - Staff-aware user listing
//!
//! ## Security Model
//! - Passwords hashed with Argon2id
//! - Activation tokens are HMAC-SHA256 over the account state, time limited
//! - Sessions bound to client fingerprint (User-Agent)
//! - Automatic lockout after failed login attempts

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::UsersConfig;
pub use error::{UsersError, UsersResult};
pub use infra::postgres::PgUsersRepository;
pub use presentation::router::{
    PgServices, accounts_router, auth_router, trim_trailing_slash, users_router,
};
pub use presentation::{UsersAppState, UsersServices};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}
