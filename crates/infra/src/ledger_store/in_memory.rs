use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use splitledger_core::{ExpenseId, Money, SplitId, UserId};
use splitledger_expenses::{
    Balance, Expense, ExpenseSplit, LedgerEntry, PairUpdate, RecordedExpense, UserExpenseView,
    UserPair,
};

use super::r#trait::LedgerStore;
use crate::error::StoreError;

#[derive(Debug, Clone, Copy)]
struct BalanceRow {
    balance: Money,
    last_updated: DateTime<Utc>,
    /// Monotonic touch counter; breaks `last_updated` ties when ordering.
    touched: u64,
}

#[derive(Debug, Default)]
struct LedgerState {
    last_expense_id: i64,
    last_split_id: i64,
    touches: u64,
    expenses: BTreeMap<ExpenseId, Expense>,
    splits: Vec<ExpenseSplit>,
    balances: HashMap<UserPair, BalanceRow>,
}

impl LedgerState {
    /// Compute the post-update rows without touching the table.
    ///
    /// Either every update fits or none is applied.
    fn stage(&self, updates: &[PairUpdate]) -> Result<Vec<(UserPair, Money)>, StoreError> {
        let mut staged: Vec<(UserPair, Money)> = Vec::with_capacity(updates.len());
        for update in updates {
            let current = staged
                .iter()
                .rev()
                .find(|(pair, _)| *pair == update.pair)
                .map(|(_, balance)| *balance)
                .or_else(|| self.balances.get(&update.pair).map(|row| row.balance))
                .unwrap_or(Money::ZERO);

            let next = current.checked_add(update.amount).ok_or_else(|| {
                StoreError::Storage(format!("balance overflow on pair {}", update.pair))
            })?;
            staged.push((update.pair, next));
        }
        Ok(staged)
    }

    fn apply(&mut self, staged: Vec<(UserPair, Money)>, now: DateTime<Utc>) -> Vec<Balance> {
        staged
            .into_iter()
            .map(|(pair, balance)| {
                self.touches += 1;
                self.balances.insert(
                    pair,
                    BalanceRow {
                        balance,
                        last_updated: now,
                        touched: self.touches,
                    },
                );
                Balance {
                    pair,
                    balance,
                    last_updated: now,
                }
            })
            .collect()
    }
}

/// In-memory ledger store.
///
/// Intended for tests/dev. One write lock covers the whole entry, which makes
/// every commit atomic and serializes all writers.
#[derive(Debug, Default)]
pub struct InMemoryLedgerStore {
    state: RwLock<LedgerState>,
}

impl InMemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedgerStore {
    async fn create_expense(&self, entry: LedgerEntry) -> Result<RecordedExpense, StoreError> {
        let mut state = self.state.write().map_err(|_| StoreError::poisoned())?;

        let staged = state.stage(&entry.balance_updates)?;
        let now = Utc::now();

        state.last_expense_id += 1;
        let expense = Expense {
            id: ExpenseId::new(state.last_expense_id),
            description: entry.expense.description,
            tag: entry.expense.tag,
            total_amount: entry.expense.total_amount,
            created_by: entry.expense.created_by,
            created_at: now,
        };

        let mut splits = Vec::with_capacity(entry.splits.len());
        for share in &entry.splits {
            state.last_split_id += 1;
            splits.push(ExpenseSplit {
                id: SplitId::new(state.last_split_id),
                expense_id: expense.id,
                user_id: share.user_id,
                amount_paid: share.amount_paid,
                amount_owed: share.amount_owed,
            });
        }

        state.expenses.insert(expense.id, expense.clone());
        state.splits.extend(splits.iter().copied());
        state.apply(staged, now);

        Ok(RecordedExpense { expense, splits })
    }

    async fn update_balance(
        &self,
        debtor: UserId,
        creditor: UserId,
        amount: Money,
    ) -> Result<Balance, StoreError> {
        let (pair, amount) = UserPair::canonical(debtor, creditor, amount)?;

        let mut state = self.state.write().map_err(|_| StoreError::poisoned())?;
        let staged = state.stage(&[PairUpdate { pair, amount }])?;
        state
            .apply(staged, Utc::now())
            .pop()
            .ok_or_else(|| StoreError::Storage(format!("balance for pair {pair} was not written")))
    }

    async fn balances_for_user(&self, user_id: UserId) -> Result<Vec<Balance>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;

        let mut rows = state
            .balances
            .iter()
            .filter(|(pair, _)| pair.contains(user_id))
            .map(|(pair, row)| (*pair, *row))
            .collect::<Vec<_>>();
        rows.sort_by(|(_, a), (_, b)| {
            b.last_updated
                .cmp(&a.last_updated)
                .then(b.touched.cmp(&a.touched))
        });

        Ok(rows
            .into_iter()
            .map(|(pair, row)| Balance {
                pair,
                balance: row.balance,
                last_updated: row.last_updated,
            })
            .collect())
    }

    async fn expenses_for_user(&self, user_id: UserId) -> Result<Vec<UserExpenseView>, StoreError> {
        let state = self.state.read().map_err(|_| StoreError::poisoned())?;

        let mut views = state
            .splits
            .iter()
            .filter(|split| split.user_id == user_id)
            .filter_map(|split| {
                state.expenses.get(&split.expense_id).map(|expense| UserExpenseView {
                    expense_id: expense.id,
                    date: expense.created_at,
                    tag: expense.tag.clone(),
                    description: expense.description.clone(),
                    total_amount: expense.total_amount,
                    share: split.amount_paid - split.amount_owed,
                })
            })
            .collect::<Vec<_>>();
        views.sort_by(|a, b| b.date.cmp(&a.date).then(b.expense_id.cmp(&a.expense_id)));

        Ok(views)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use splitledger_expenses::{NewExpense, SplitShare};

    fn id(n: i64) -> UserId {
        UserId::new(n)
    }

    fn cents(c: i64) -> Money {
        Money::from_cents(c)
    }

    async fn balance_of(store: &InMemoryLedgerStore, a: i64, b: i64) -> Option<Balance> {
        let pair = UserPair::of(id(a), id(b)).unwrap();
        store
            .balances_for_user(id(a))
            .await
            .unwrap()
            .into_iter()
            .find(|balance| balance.pair == pair)
    }

    #[tokio::test]
    async fn reversed_update_is_stored_negated_on_the_canonical_pair() {
        let store = InMemoryLedgerStore::new();
        let written = store.update_balance(id(5), id(3), cents(1000)).await.unwrap();

        assert_eq!((written.pair.user1(), written.pair.user2()), (id(3), id(5)));
        assert_eq!(written.balance, cents(-1000));
    }

    #[tokio::test]
    async fn opposite_updates_cancel_out() {
        let store = InMemoryLedgerStore::new();
        store.update_balance(id(5), id(3), cents(1000)).await.unwrap();
        store.update_balance(id(3), id(5), cents(1000)).await.unwrap();

        assert_eq!(balance_of(&store, 3, 5).await.unwrap().balance, Money::ZERO);
    }

    #[tokio::test]
    async fn repeated_updates_accumulate() {
        let once = InMemoryLedgerStore::new();
        once.update_balance(id(3), id(5), cents(2000)).await.unwrap();

        let twice = InMemoryLedgerStore::new();
        twice.update_balance(id(3), id(5), cents(1000)).await.unwrap();
        twice.update_balance(id(3), id(5), cents(1000)).await.unwrap();

        assert_eq!(
            balance_of(&once, 3, 5).await.unwrap().balance,
            balance_of(&twice, 3, 5).await.unwrap().balance
        );
    }

    #[tokio::test]
    async fn self_pair_update_is_rejected() {
        let store = InMemoryLedgerStore::new();
        let err = store.update_balance(id(2), id(2), cents(1)).await.unwrap_err();
        assert!(matches!(err, StoreError::Domain(_)));
    }

    #[tokio::test]
    async fn overflowing_entry_writes_nothing() {
        let store = InMemoryLedgerStore::new();
        store.update_balance(id(1), id(2), cents(i64::MAX)).await.unwrap();

        let expense = NewExpense::new("Too much", None, cents(200), id(2)).unwrap();
        let splits = vec![
            SplitShare { user_id: id(2), amount_paid: cents(200), amount_owed: cents(100) },
            SplitShare { user_id: id(1), amount_paid: Money::ZERO, amount_owed: cents(100) },
        ];
        let entry = LedgerEntry::prepare(expense, splits).unwrap();

        let err = store.create_expense(entry).await.unwrap_err();
        assert!(matches!(err, StoreError::Storage(_)));
        assert!(store.expenses_for_user(id(1)).await.unwrap().is_empty());
        assert_eq!(balance_of(&store, 1, 2).await.unwrap().balance, cents(i64::MAX));
    }

    #[tokio::test]
    async fn most_recently_touched_balance_comes_first() {
        let store = InMemoryLedgerStore::new();
        store.update_balance(id(1), id(2), cents(100)).await.unwrap();
        store.update_balance(id(1), id(3), cents(100)).await.unwrap();
        store.update_balance(id(2), id(1), cents(50)).await.unwrap();

        let counterparties = store
            .balances_for_user(id(1))
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.pair.other(id(1)).unwrap().get())
            .collect::<Vec<_>>();
        assert_eq!(counterparties, vec![2, 3]);
    }
}
