//! Ledger storage boundary.
//!
//! Expenses and their splits are the append-only source of truth; the pairwise
//! balance table is a cache maintained incrementally in the same transaction.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryLedgerStore;
pub use postgres::PostgresLedgerStore;
pub use r#trait::LedgerStore;
