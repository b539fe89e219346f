//! Pairwise balances.
//!
//! A pair is stored once, ordered so that `user1 < user2`. A positive balance
//! means `user1` owes `user2`; a negative one means `user2` owes `user1`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Money, UserId, ValueObject};

/// A canonical (ordered) pair of distinct users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserPair {
    user1: UserId,
    user2: UserId,
}

impl ValueObject for UserPair {}

impl UserPair {
    /// Canonicalize "`debtor` owes `creditor` `amount`" into a pair and a signed amount.
    ///
    /// When the debtor already sorts first the amount is kept, otherwise the
    /// users are swapped and the amount negated.
    pub fn canonical(debtor: UserId, creditor: UserId, amount: Money) -> DomainResult<(Self, Money)> {
        if debtor == creditor {
            return Err(DomainError::validation(format!(
                "a balance needs two distinct users, got {debtor} twice"
            )));
        }
        if debtor < creditor {
            Ok((Self { user1: debtor, user2: creditor }, amount))
        } else {
            Ok((Self { user1: creditor, user2: debtor }, -amount))
        }
    }

    /// Order two distinct users without attaching an amount.
    pub fn of(a: UserId, b: UserId) -> DomainResult<Self> {
        Self::canonical(a, b, Money::ZERO).map(|(pair, _)| pair)
    }

    pub fn user1(&self) -> UserId {
        self.user1
    }

    pub fn user2(&self) -> UserId {
        self.user2
    }

    pub fn contains(&self, user: UserId) -> bool {
        self.user1 == user || self.user2 == user
    }

    /// The counterparty of `user`, if `user` is part of this pair.
    pub fn other(&self, user: UserId) -> Option<UserId> {
        if user == self.user1 {
            Some(self.user2)
        } else if user == self.user2 {
            Some(self.user1)
        } else {
            None
        }
    }
}

impl core::fmt::Display for UserPair {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "({}, {})", self.user1, self.user2)
    }
}

/// The running net obligation between two users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance {
    pub pair: UserPair,
    pub balance: Money,
    pub last_updated: DateTime<Utc>,
}

impl Balance {
    /// What `user` owes its counterparty, seen from `user`'s side.
    ///
    /// Positive means `user` owes the counterparty; negative means the
    /// counterparty owes `user`. `None` if `user` is not part of the pair.
    pub fn view_for(&self, user: UserId) -> Option<BalanceView> {
        let counterparty = self.pair.other(user)?;
        let amount = if user == self.pair.user1() { self.balance } else { -self.balance };
        Some(BalanceView {
            counterparty,
            amount,
            last_updated: self.last_updated,
        })
    }
}

/// A balance re-expressed from one user's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceView {
    pub counterparty: UserId,
    pub amount: Money,
    pub last_updated: DateTime<Utc>,
}
