//! Infrastructure Layer
//!
//! Database implementations and external service integrations.

pub mod activation_gateway;
pub mod authy;
pub mod mailer;
pub mod memory;
pub mod postgres;

pub use activation_gateway::HttpActivationGateway;
pub use authy::AuthyClient;
pub use mailer::{AppMailer, LogMailer, OutboxMailer, SmtpMailer, SmtpSettings};
pub use memory::MemoryUsersRepository;
pub use postgres::PgUsersRepository;
