//! Infrastructure layer: storage adapters (in-memory and Postgres), the
//! balance read side, and the expense application service.

pub mod balance_reader;
pub mod db;
pub mod error;
pub mod expense_service;
pub mod ledger_store;
pub mod user_directory;


pub use balance_reader::{BalanceReader, UserBalanceView};
pub use error::StoreError;
pub use expense_service::{ExpenseService, ServiceError};
pub use ledger_store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};
pub use user_directory::{InMemoryUserDirectory, PostgresUserDirectory, UserDirectory};
