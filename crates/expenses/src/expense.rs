use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use splitledger_core::{DomainError, DomainResult, Entity, ExpenseId, Money, SplitId, UserId};

/// Policy governing how a total is divided into per-participant obligations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitMethod {
    Equal,
    Percentage,
    Manual,
}

impl SplitMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            SplitMethod::Equal => "equal",
            SplitMethod::Percentage => "percentage",
            SplitMethod::Manual => "manual",
        }
    }
}

impl core::fmt::Display for SplitMethod {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SplitMethod {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "equal" => Ok(SplitMethod::Equal),
            "percentage" => Ok(SplitMethod::Percentage),
            "manual" => Ok(SplitMethod::Manual),
            _ => Err(DomainError::validation(format!("invalid split method: {s}"))),
        }
    }
}

/// An expense that has been validated but not yet persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewExpense {
    pub description: String,
    pub tag: Option<String>,
    pub total_amount: Money,
    pub created_by: UserId,
}

impl NewExpense {
    pub fn new(
        description: impl Into<String>,
        tag: Option<String>,
        total_amount: Money,
        created_by: UserId,
    ) -> DomainResult<Self> {
        let description = description.into().trim().to_string();
        if description.is_empty() {
            return Err(DomainError::validation("expense description must not be empty"));
        }
        if !total_amount.is_positive() {
            return Err(DomainError::validation(format!(
                "total amount must be positive, got {total_amount}"
            )));
        }
        let tag = tag.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());

        Ok(Self {
            description,
            tag,
            total_amount,
            created_by,
        })
    }
}

/// A persisted expense record (immutable, append-only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub tag: Option<String>,
    pub total_amount: Money,
    pub created_by: UserId,
    pub created_at: DateTime<Utc>,
}

impl Entity for Expense {
    type Id = ExpenseId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A computed per-participant obligation, before persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitShare {
    pub user_id: UserId,
    pub amount_paid: Money,
    pub amount_owed: Money,
}

impl SplitShare {
    /// `amount_owed - amount_paid`: positive means this participant still owes.
    pub fn net(&self) -> Money {
        self.amount_owed - self.amount_paid
    }
}

/// A persisted split row (one per participant per expense).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpenseSplit {
    pub id: SplitId,
    pub expense_id: ExpenseId,
    pub user_id: UserId,
    pub amount_paid: Money,
    pub amount_owed: Money,
}

/// An expense together with the splits written in the same transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordedExpense {
    pub expense: Expense,
    pub splits: Vec<ExpenseSplit>,
}

/// One row of a user's expense history.
///
/// `share` is `amount_paid - amount_owed`: positive when others owe the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserExpenseView {
    pub expense_id: ExpenseId,
    pub date: DateTime<Utc>,
    pub tag: Option<String>,
    pub description: String,
    pub total_amount: Money,
    pub share: Money,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_method_parses_known_tags_only() {
        assert_eq!("equal".parse::<SplitMethod>().unwrap(), SplitMethod::Equal);
        assert_eq!(" Percentage ".parse::<SplitMethod>().unwrap(), SplitMethod::Percentage);
        assert_eq!("manual".parse::<SplitMethod>().unwrap(), SplitMethod::Manual);

        let err = "shares".parse::<SplitMethod>().unwrap_err();
        assert_eq!(err, DomainError::validation("invalid split method: shares"));
    }

    #[test]
    fn new_expense_requires_description_and_positive_total() {
        let creator = UserId::new(1);
        assert!(NewExpense::new("", None, Money::from_cents(100), creator).is_err());
        assert!(NewExpense::new("Dinner", None, Money::ZERO, creator).is_err());
        assert!(NewExpense::new("Dinner", None, Money::from_cents(-5), creator).is_err());

        let expense =
            NewExpense::new(" Dinner ", Some("  ".to_string()), Money::from_cents(100), creator)
                .unwrap();
        assert_eq!(expense.description, "Dinner");
        assert_eq!(expense.tag, None);
    }
}
