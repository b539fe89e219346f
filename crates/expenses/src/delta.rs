use serde::{Deserialize, Serialize};

use splitledger_core::{Money, UserId};

use crate::expense::{NewExpense, SplitShare};

/// A directed obligation produced by one expense.
///
/// `user_b` owes `user_a` the given `amount`; `user_a` is always the expense
/// creator. A negative amount means the creator owes the participant instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceDelta {
    pub user_a: UserId,
    pub user_b: UserId,
    pub amount: Money,
}

/// Creator-centric deltas: one per non-creator participant whose net is non-zero.
///
/// The creator's own split never yields a delta, and neither do
/// participant-to-participant obligations.
pub fn balance_deltas(expense: &NewExpense, splits: &[SplitShare]) -> Vec<BalanceDelta> {
    splits
        .iter()
        .filter(|split| split.user_id != expense.created_by)
        .filter_map(|split| {
            let net = split.net();
            (!net.is_zero()).then_some(BalanceDelta {
                user_a: expense.created_by,
                user_b: split.user_id,
                amount: net,
            })
        })
        .collect()
}
