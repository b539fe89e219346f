use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::{instrument, Span};

use splitledger_core::UserId;
use splitledger_expenses::{normalize_email, NewUser, User};

use super::r#trait::UserDirectory;
use crate::error::{is_unique_violation, map_sqlx_error, StoreError};

/// Postgres-backed user directory. Emails are stored normalized and unique.
#[derive(Debug, Clone)]
pub struct PostgresUserDirectory {
    pool: Arc<PgPool>,
}

impl PostgresUserDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl UserDirectory for PostgresUserDirectory {
    #[instrument(skip(self, user), fields(email = %user.email(), operation = tracing::field::Empty), err)]
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        Span::current().record("operation", "create_user");

        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email
            "#,
        )
        .bind(user.name())
        .bind(user.email())
        .fetch_one(&*self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Conflict(format!("user with email {} already exists", user.email()))
            } else {
                map_sqlx_error("create_user", e)
            }
        })?;

        user_from_row(&row)
    }

    #[instrument(skip(self), fields(user_id = %id, operation = tracing::field::Empty), err)]
    async fn get_user(&self, id: UserId) -> Result<User, StoreError> {
        Span::current().record("operation", "get_user");

        let row = sqlx::query("SELECT id, name, email FROM users WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(StoreError::NotFound(format!("user {id} not found"))),
        }
    }

    #[instrument(skip(self), fields(operation = tracing::field::Empty), err)]
    async fn get_user_by_email(&self, email: &str) -> Result<User, StoreError> {
        Span::current().record("operation", "get_user_by_email");
        let email = normalize_email(email);

        let row = sqlx::query("SELECT id, name, email FROM users WHERE email = $1")
            .bind(&email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user_by_email", e))?;

        match row {
            Some(row) => user_from_row(&row),
            None => Err(StoreError::NotFound(format!("user with email {email} not found"))),
        }
    }

    #[instrument(
        skip(self, emails),
        fields(requested = emails.len(), operation = tracing::field::Empty, found = tracing::field::Empty),
        err
    )]
    async fn users_by_emails(&self, emails: &[String]) -> Result<Vec<User>, StoreError> {
        let span = Span::current();
        span.record("operation", "users_by_emails");
        if emails.is_empty() {
            return Ok(Vec::new());
        }

        let normalized = emails.iter().map(|e| normalize_email(e)).collect::<Vec<_>>();
        let rows = sqlx::query("SELECT id, name, email FROM users WHERE email = ANY($1) ORDER BY id")
            .bind(&normalized)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("users_by_emails", e))?;

        let users = rows.iter().map(user_from_row).collect::<Result<Vec<_>, _>>()?;
        span.record("found", users.len());
        Ok(users)
    }

    #[instrument(
        skip(self, ids),
        fields(requested = ids.len(), operation = tracing::field::Empty, found = tracing::field::Empty),
        err
    )]
    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>, StoreError> {
        let span = Span::current();
        span.record("operation", "users_by_ids");
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let raw_ids = ids.iter().map(|id| id.get()).collect::<Vec<i64>>();
        let rows = sqlx::query("SELECT id, name, email FROM users WHERE id = ANY($1) ORDER BY id")
            .bind(&raw_ids)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("users_by_ids", e))?;

        let users = rows.iter().map(user_from_row).collect::<Result<Vec<_>, _>>()?;
        span.record("found", users.len());
        Ok(users)
    }
}

fn user_from_row(row: &sqlx::postgres::PgRow) -> Result<User, StoreError> {
    let read = |e: sqlx::Error| StoreError::Storage(format!("failed to deserialize user row: {e}"));
    Ok(User {
        id: UserId::new(row.try_get("id").map_err(read)?),
        name: row.try_get("name").map_err(read)?,
        email: row.try_get("email").map_err(read)?,
    })
}
