//! Presentation Layer
//!
//! HTTP handlers, DTOs, session guard, and router.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::{UsersAppState, UsersServices};
pub use middleware::CurrentUser;
pub use router::{PgServices, accounts_router, auth_router, trim_trailing_slash, users_router};
