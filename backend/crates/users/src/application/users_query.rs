//! User Read Use Cases
//!
//! Staff see every account; everyone else only their own.

use std::sync::Arc;

use kernel::id::UserId;

use crate::domain::entity::User;
use crate::domain::repository::UserRepository;
use crate::error::{UsersError, UsersResult};

pub struct UsersQueryUseCase<U>
where
    U: UserRepository,
{
    user_repo: Arc<U>,
}

impl<U> UsersQueryUseCase<U>
where
    U: UserRepository,
{
    pub fn new(user_repo: Arc<U>) -> Self {
        Self { user_repo }
    }

    /// The account behind a session
    pub async fn current(&self, user_id: &UserId) -> UsersResult<User> {
        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UsersError::SessionInvalid)
    }

    pub async fn list(&self, viewer: &User) -> UsersResult<Vec<User>> {
        if viewer.is_staff {
            self.user_repo.list().await
        } else {
            Ok(vec![viewer.clone()])
        }
    }

    pub async fn get(&self, viewer: &User, user_id: &UserId) -> UsersResult<User> {
        if !viewer.is_staff {
            return if viewer.user_id == *user_id {
                Ok(viewer.clone())
            } else {
                Err(UsersError::NotFound)
            };
        }

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(UsersError::NotFound)
    }
}
