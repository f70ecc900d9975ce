//! API DTOs (Data Transfer Objects)
//!
//! Signup, activation and phone payloads deserialize straight into the
//! application-layer forms; this module holds the remaining shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entity::User;
use crate::domain::value_object::UserType;

// ============================================================================
// Registration
// ============================================================================

/// Registration response (never includes the password)
#[derive(Debug, Clone, Serialize)]
pub struct UserCreatedResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub user_type: UserType,
    pub phone_number: Option<String>,
}

impl From<&User> for UserCreatedResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.into_uuid(),
            email: user.email.to_string(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            user_type: user.user_type,
            phone_number: user.phone_number.as_ref().map(ToString::to_string),
        }
    }
}

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone_number: Option<String>,
    pub business_name: String,
    pub user_type: UserType,
    pub is_active: bool,
    pub is_phone_verified: bool,
    pub date_joined: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.user_id.into_uuid(),
            email: user.email.to_string(),
            name: user.name.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            address: user.address.clone(),
            phone_number: user.phone_number.as_ref().map(ToString::to_string),
            business_name: user.business_name.clone(),
            user_type: user.user_type,
            is_active: user.is_active,
            is_phone_verified: user.is_phone_verified(),
            date_joined: user.created_at,
            last_login: user.last_login_at,
        }
    }
}

// ============================================================================
// Sign In
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SignInRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SignInResponse {
    pub user: UserResponse,
}
