//! Read side of the balance cache, expressed from one user's point of view.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use splitledger_core::{Money, UserId};
use splitledger_expenses::User;

use crate::error::StoreError;
use crate::ledger_store::LedgerStore;
use crate::user_directory::UserDirectory;

/// A balance row seen by one user.
///
/// Positive `amount` means the user owes `counterparty`; negative means the
/// counterparty owes the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserBalanceView {
    pub counterparty: User,
    pub amount: Money,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct BalanceReader<L, U> {
    ledger: L,
    users: U,
}

impl<L, U> BalanceReader<L, U>
where
    L: LedgerStore,
    U: UserDirectory,
{
    pub fn new(ledger: L, users: U) -> Self {
        Self { ledger, users }
    }

    /// Every balance the user takes part in, most recently updated first,
    /// with counterparties resolved in one batch.
    #[tracing::instrument(skip(self), fields(user_id = %user_id), err)]
    pub async fn balances_for_user(&self, user_id: UserId) -> Result<Vec<UserBalanceView>, StoreError> {
        let balances = self.ledger.balances_for_user(user_id).await?;
        let views = balances
            .iter()
            .filter_map(|balance| balance.view_for(user_id))
            .collect::<Vec<_>>();
        if views.is_empty() {
            return Ok(Vec::new());
        }

        let ids = views.iter().map(|view| view.counterparty).collect::<Vec<_>>();
        let counterparties = self
            .users
            .users_by_ids(&ids)
            .await?
            .into_iter()
            .map(|user| (user.id, user))
            .collect::<HashMap<_, _>>();

        views
            .into_iter()
            .map(|view| {
                let counterparty = counterparties.get(&view.counterparty).cloned().ok_or_else(|| {
                    StoreError::NotFound(format!(
                        "balance references unknown user {}",
                        view.counterparty
                    ))
                })?;
                Ok(UserBalanceView {
                    counterparty,
                    amount: view.amount,
                    last_updated: view.last_updated,
                })
            })
            .collect()
    }
}
