use std::sync::Arc;

use async_trait::async_trait;

use splitledger_core::UserId;
use splitledger_expenses::{NewUser, User};

use crate::error::StoreError;

/// Registered users, keyed by id and by (normalized) email.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// Register a user. A taken email is a `Conflict`.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    async fn get_user(&self, id: UserId) -> Result<User, StoreError>;

    /// `email` is normalized before the lookup.
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError>;

    /// Batch lookup; unknown emails are simply absent from the result.
    async fn users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError>;

    /// Batch lookup; unknown ids are simply absent from the result.
    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError>;
}

#[async_trait]
impl<S> UserDirectory for Arc<S>
where
    S: UserDirectory + ?Sized,
{
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        (**self).create_user(user).await
    }

    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        (**self).get_user(id).await
    }

    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        (**self).get_user_by_email(email).await
    }

    async fn users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError> {
        (**self).users_by_emails(emails).await
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        (**self).users_by_ids(ids).await
    }
}
