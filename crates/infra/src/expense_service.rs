//! Orchestration: request → resolution → split strategy → ledger entry → store.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, instrument};

use splitledger_core::{DomainError, UserId};
use splitledger_expenses::{
    calculate_splits, normalize_email, ExpenseRequest, LedgerEntry, NewUser, RecordedExpense,
    User, UserExpenseView,
};

use crate::balance_reader::{BalanceReader, UserBalanceView};
use crate::error::StoreError;
use crate::ledger_store::LedgerStore;
use crate::user_directory::UserDirectory;

/// Errors surfaced to callers of the service layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Invariant(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Storage(String),
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::Invariant(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Domain(e) => e.into(),
            StoreError::NotFound(msg) => ServiceError::NotFound(msg),
            StoreError::Conflict(msg) => ServiceError::Conflict(msg),
            StoreError::Storage(msg) => ServiceError::Storage(msg),
        }
    }
}

/// Application service for users, expenses, and balances.
#[derive(Debug, Clone)]
pub struct ExpenseService<L, U> {
    ledger: L,
    users: U,
    balances: BalanceReader<L, U>,
}

impl<L, U> ExpenseService<L, U>
where
    L: LedgerStore + Clone,
    U: UserDirectory + Clone,
{
    pub fn new(ledger: L, users: U) -> Self {
        let balances = BalanceReader::new(ledger.clone(), users.clone());
        Self {
            ledger,
            users,
            balances,
        }
    }

    pub async fn create_user(&self, name: &str, email: &str) -> Result<User, ServiceError> {
        let new_user = NewUser::new(name, email)?;
        let user = self.users.create_user(new_user).await?;
        info!(user_id = %user.id, "user created");
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<User, ServiceError> {
        Ok(self.users.get_user(id).await?)
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<User, ServiceError> {
        Ok(self.users.get_user_by_email(email).await?)
    }

    /// Validate, resolve, split, and commit one expense atomically.
    #[instrument(
        skip(self, request),
        fields(split_method = %request.split_method, participants = request.participants.len()),
        err
    )]
    pub async fn create_expense(&self, request: ExpenseRequest) -> Result<RecordedExpense, ServiceError> {
        if let Err(err) = request.validate() {
            debug!(error = %err, "expense request rejected");
            return Err(err.into());
        }

        let emails = request.emails().into_iter().collect::<Vec<_>>();
        let directory = self
            .users
            .users_by_emails(&emails)
            .await?
            .into_iter()
            .map(|user| (normalize_email(&user.email), user.id))
            .collect::<HashMap<_, _>>();

        let recorded = match self.prepare(&request, &directory) {
            Ok(entry) => self.ledger.create_expense(entry).await?,
            Err(err) => {
                debug!(error = %err, "expense request rejected");
                return Err(err.into());
            }
        };

        info!(
            expense_id = %recorded.expense.id,
            created_by = %recorded.expense.created_by,
            splits = recorded.splits.len(),
            "expense recorded"
        );
        Ok(recorded)
    }

    fn prepare(
        &self,
        request: &ExpenseRequest,
        directory: &HashMap<String, UserId>,
    ) -> Result<LedgerEntry, DomainError> {
        let resolved = request.resolve(directory)?;
        let splits = calculate_splits(
            resolved.method,
            resolved.expense.total_amount,
            &resolved.participants,
        )?;
        LedgerEntry::prepare(resolved.expense, splits)
    }

    pub async fn expenses_for_user(&self, email: &str) -> Result<Vec<UserExpenseView>, ServiceError> {
        let user = self.users.get_user_by_email(email).await?;
        Ok(self.ledger.expenses_for_user(user.id).await?)
    }

    pub async fn balances_for_user(&self, email: &str) -> Result<Vec<UserBalanceView>, ServiceError> {
        let user = self.users.get_user_by_email(email).await?;
        Ok(self.balances.balances_for_user(user.id).await?)
    }
}
