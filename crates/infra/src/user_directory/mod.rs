//! User storage: registration and email / id lookups.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryUserDirectory;
pub use postgres::PostgresUserDirectory;
pub use r#trait::UserDirectory;
