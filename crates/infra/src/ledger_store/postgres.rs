//! Postgres-backed ledger store.
//!
//! `create_expense` runs in a single transaction: expense row, split rows, then
//! one atomic upsert per balance pair. Any failure rolls the whole entry back
//! (the transaction is dropped without commit).
//!
//! Balance updates arrive sorted by pair, so concurrent writers touching
//! overlapping pairs lock rows in the same order.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::{instrument, Span};

use splitledger_core::{ExpenseId, Money, SplitId, UserId};
use splitledger_expenses::{
    Balance, Expense, ExpenseSplit, LedgerEntry, RecordedExpense, UserExpenseView, UserPair,
};

use super::r#trait::LedgerStore;
use crate::error::{map_sqlx_error, StoreError};

/// Postgres-backed ledger store.
///
/// Uses the SQLx connection pool (`Send + Sync`); every write goes through a
/// transaction.
#[derive(Debug, Clone)]
pub struct PostgresLedgerStore {
    pool: Arc<PgPool>,
}

impl PostgresLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

#[async_trait]
impl LedgerStore for PostgresLedgerStore {
    #[instrument(
        skip(self, entry),
        fields(
            created_by = %entry.expense.created_by,
            split_count = entry.splits.len(),
            balance_updates = entry.balance_updates.len(),
            operation = tracing::field::Empty,
            expense_id = tracing::field::Empty
        ),
        err
    )]
    async fn create_expense(&self, entry: LedgerEntry) -> Result<RecordedExpense, StoreError> {
        let span = Span::current();
        span.record("operation", "create_expense");

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO expenses (description, tag, total_amount, created_by)
            VALUES ($1, $2, $3, $4)
            RETURNING id, created_at
            "#,
        )
        .bind(&entry.expense.description)
        .bind(entry.expense.tag.as_deref())
        .bind(entry.expense.total_amount.cents())
        .bind(entry.expense.created_by.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_expense", e))?;

        let expense = Expense {
            id: ExpenseId::new(get(&row, "id")?),
            description: entry.expense.description,
            tag: entry.expense.tag,
            total_amount: entry.expense.total_amount,
            created_by: entry.expense.created_by,
            created_at: get(&row, "created_at")?,
        };
        span.record("expense_id", expense.id.get());

        let mut splits = Vec::with_capacity(entry.splits.len());
        for share in &entry.splits {
            let row = sqlx::query(
                r#"
                INSERT INTO expense_splits (expense_id, user_id, amount_paid, amount_owed)
                VALUES ($1, $2, $3, $4)
                RETURNING id
                "#,
            )
            .bind(expense.id.get())
            .bind(share.user_id.get())
            .bind(share.amount_paid.cents())
            .bind(share.amount_owed.cents())
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_split", e))?;

            splits.push(ExpenseSplit {
                id: SplitId::new(get(&row, "id")?),
                expense_id: expense.id,
                user_id: share.user_id,
                amount_paid: share.amount_paid,
                amount_owed: share.amount_owed,
            });
        }

        for update in &entry.balance_updates {
            upsert_balance(&mut tx, update.pair, update.amount).await?;
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(RecordedExpense { expense, splits })
    }

    #[instrument(
        skip(self),
        fields(
            debtor = %debtor,
            creditor = %creditor,
            amount = %amount,
            operation = tracing::field::Empty
        ),
        err
    )]
    async fn update_balance(
        &self,
        debtor: UserId,
        creditor: UserId,
        amount: Money,
    ) -> Result<Balance, StoreError> {
        let span = Span::current();
        span.record("operation", "update_balance");

        let (pair, amount) = UserPair::canonical(debtor, creditor, amount)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;
        let balance = upsert_balance(&mut tx, pair, amount).await?;
        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(balance)
    }

    #[instrument(
        skip(self),
        fields(
            user_id = %user_id,
            operation = tracing::field::Empty,
            balance_count = tracing::field::Empty
        ),
        err
    )]
    async fn balances_for_user(&self, user_id: UserId) -> Result<Vec<Balance>, StoreError> {
        let span = Span::current();
        span.record("operation", "balances_for_user");

        let rows = sqlx::query(
            r#"
            SELECT user1_id, user2_id, balance, last_updated
            FROM balances
            WHERE user1_id = $1 OR user2_id = $1
            ORDER BY last_updated DESC, user1_id ASC, user2_id ASC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("balances_for_user", e))?;

        let balances = rows
            .iter()
            .map(balance_from_row)
            .collect::<Result<Vec<_>, _>>()?;

        span.record("balance_count", balances.len());
        Ok(balances)
    }

    #[instrument(
        skip(self),
        fields(
            user_id = %user_id,
            operation = tracing::field::Empty,
            expense_count = tracing::field::Empty
        ),
        err
    )]
    async fn expenses_for_user(&self, user_id: UserId) -> Result<Vec<UserExpenseView>, StoreError> {
        let span = Span::current();
        span.record("operation", "expenses_for_user");

        let rows = sqlx::query(
            r#"
            SELECT
                e.id,
                e.created_at,
                e.tag,
                e.description,
                e.total_amount,
                s.amount_paid,
                s.amount_owed
            FROM expense_splits s
            JOIN expenses e ON e.id = s.expense_id
            WHERE s.user_id = $1
            ORDER BY e.created_at DESC, e.id DESC
            "#,
        )
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("expenses_for_user", e))?;

        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            let paid = Money::from_cents(get(row, "amount_paid")?);
            let owed = Money::from_cents(get(row, "amount_owed")?);
            views.push(UserExpenseView {
                expense_id: ExpenseId::new(get(row, "id")?),
                date: get(row, "created_at")?,
                tag: get(row, "tag")?,
                description: get(row, "description")?,
                total_amount: Money::from_cents(get(row, "total_amount")?),
                share: paid - owed,
            });
        }

        span.record("expense_count", views.len());
        Ok(views)
    }
}

/// Add `amount` to the canonical pair's balance, creating the row on first touch.
async fn upsert_balance(
    tx: &mut Transaction<'_, Postgres>,
    pair: UserPair,
    amount: Money,
) -> Result<Balance, StoreError> {
    let row = sqlx::query(
        r#"
        INSERT INTO balances (user1_id, user2_id, balance, last_updated)
        VALUES ($1, $2, $3, NOW())
        ON CONFLICT (user1_id, user2_id)
        DO UPDATE SET
            balance = balances.balance + EXCLUDED.balance,
            last_updated = NOW()
        RETURNING user1_id, user2_id, balance, last_updated
        "#,
    )
    .bind(pair.user1().get())
    .bind(pair.user2().get())
    .bind(amount.cents())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("upsert_balance", e))?;

    balance_from_row(&row)
}

fn balance_from_row(row: &sqlx::postgres::PgRow) -> Result<Balance, StoreError> {
    let user1 = UserId::new(get(row, "user1_id")?);
    let user2 = UserId::new(get(row, "user2_id")?);
    let last_updated: DateTime<Utc> = get(row, "last_updated")?;

    Ok(Balance {
        pair: UserPair::of(user1, user2)?,
        balance: Money::from_cents(get(row, "balance")?),
        last_updated,
    })
}

fn get<'r, T>(row: &'r sqlx::postgres::PgRow, column: &str) -> Result<T, StoreError>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(column)
        .map_err(|e| StoreError::Storage(format!("failed to read column {column}: {e}")))
}
