//! Shared-expense domain module.
//!
//! Pure domain logic only: no IO, no HTTP, no persistence concerns. The flow is
//! request → [`split`] strategies → [`delta`] calculation → [`entry::LedgerEntry`],
//! which storage adapters commit atomically.

pub mod balance;
pub mod delta;
pub mod entry;
pub mod expense;
pub mod request;
pub mod split;
pub mod user;

pub use balance::{Balance, BalanceView, UserPair};
pub use delta::{balance_deltas, BalanceDelta};
pub use entry::{LedgerEntry, PairUpdate};
pub use expense::{
    Expense, ExpenseSplit, NewExpense, RecordedExpense, SplitMethod, SplitShare, UserExpenseView,
};
pub use request::{ExpenseRequest, ParticipantRequest, ResolvedExpense};
pub use split::{
    calculate_splits, EqualSplit, ManualSplit, ParticipantShare, PercentageSplit, SplitStrategy,
};
pub use user::{normalize_email, NewUser, User};
