//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC-signed tokens, Base64)
//! - Password policy and hashing (Argon2id)
//! - Cookie management
//! - Client fingerprinting

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
