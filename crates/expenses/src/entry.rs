use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Money};

use crate::balance::UserPair;
use crate::delta::balance_deltas;
use crate::expense::{NewExpense, SplitShare};
use crate::split::checked_total;

/// A signed increment to one canonical balance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairUpdate {
    pub pair: UserPair,
    pub amount: Money,
}

/// Everything one expense writes, validated and ready to commit as a unit:
/// the expense row, its splits, and the balance increments they imply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub expense: NewExpense,
    pub splits: Vec<SplitShare>,
    pub balance_updates: Vec<PairUpdate>,
}

impl LedgerEntry {
    /// Validate the splits against the expense and derive the balance updates.
    ///
    /// Each delta "participant owes creator" is canonicalized onto its pair.
    /// Updates that land on the same pair are merged; zero results are dropped.
    pub fn prepare(expense: NewExpense, splits: Vec<SplitShare>) -> DomainResult<Self> {
        if splits.is_empty() {
            return Err(DomainError::validation("an expense needs at least one split"));
        }

        let mut seen = HashSet::with_capacity(splits.len());
        for split in &splits {
            if !seen.insert(split.user_id) {
                return Err(DomainError::validation(format!(
                    "user {} appears more than once in the splits",
                    split.user_id
                )));
            }
            if split.amount_paid.is_negative() || split.amount_owed.is_negative() {
                return Err(DomainError::validation(format!(
                    "split amounts for user {} must not be negative",
                    split.user_id
                )));
            }
        }

        let total_owed = checked_total(&splits, |s| s.amount_owed)?;
        if total_owed != expense.total_amount {
            return Err(DomainError::invariant(format!(
                "owed amounts across all splits ({total_owed}) do not match total expense amount ({})",
                expense.total_amount
            )));
        }

        let total_paid = checked_total(&splits, |s| s.amount_paid)?;
        if total_paid != expense.total_amount {
            return Err(DomainError::validation(format!(
                "paid amount mismatch: total amount paid across all splits ({total_paid}) does not match total expense amount ({})",
                expense.total_amount
            )));
        }

        let mut merged: BTreeMap<UserPair, Money> = BTreeMap::new();
        for delta in balance_deltas(&expense, &splits) {
            let (pair, amount) = UserPair::canonical(delta.user_b, delta.user_a, delta.amount)?;
            *merged.entry(pair).or_default() += amount;
        }
        let balance_updates = merged
            .into_iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(pair, amount)| PairUpdate { pair, amount })
            .collect();

        Ok(Self {
            expense,
            splits,
            balance_updates,
        })
    }
}
