use std::sync::Arc;

use async_trait::async_trait;

use splitledger_core::{Money, UserId};
use splitledger_expenses::{Balance, LedgerEntry, RecordedExpense, UserExpenseView};

use crate::error::StoreError;

/// Persistence for expenses, splits, and the pairwise balance cache.
///
/// Implementations must:
/// - commit an entry's expense, splits, and balance updates atomically
/// - serialize concurrent updates to the same pair (no lost updates)
/// - stamp `created_at` / `last_updated` at write time
#[async_trait]
pub trait LedgerStore: Send + Sync {
    /// Persist a prepared entry in one transaction. Nothing is written on failure.
    async fn create_expense(&self, entry: LedgerEntry) -> Result<RecordedExpense, StoreError>;

    /// Record that `debtor` owes `creditor` an additional `amount` (may be negative).
    ///
    /// The pair is canonicalized before the upsert; the returned row is the
    /// stored state after the update.
    async fn update_balance(
        &self,
        debtor: UserId,
        creditor: UserId,
        amount: Money,
    ) -> Result<Balance, StoreError>;

    /// Every balance row the user takes part in, most recently touched first.
    async fn balances_for_user(&self, user_id: UserId) -> Result<Vec<Balance>, StoreError>;

    /// The user's expense history, newest first.
    async fn expenses_for_user(&self, user_id: UserId) -> Result<Vec<UserExpenseView>, StoreError>;
}

#[async_trait]
impl<S> LedgerStore for Arc<S>
where
    S: LedgerStore + ?Sized,
{
    async fn create_expense(&self, entry: LedgerEntry) -> Result<RecordedExpense, StoreError> {
        (**self).create_expense(entry).await
    }

    async fn update_balance(
        &self,
        debtor: UserId,
        creditor: UserId,
        amount: Money,
    ) -> Result<Balance, StoreError> {
        (**self).update_balance(debtor, creditor, amount).await
    }

    async fn balances_for_user(&self, user_id: UserId) -> Result<Vec<Balance>, StoreError> {
        (**self).balances_for_user(user_id).await
    }

    async fn expenses_for_user(&self, user_id: UserId) -> Result<Vec<UserExpenseView>, StoreError> {
        (**self).expenses_for_user(user_id).await
    }
}
