use std::sync::Arc;

use splitledger_infra::{
    db, ExpenseService, InMemoryLedgerStore, InMemoryUserDirectory, LedgerStore,
    PostgresLedgerStore, PostgresUserDirectory, StoreError, UserDirectory,
};

use crate::config::AppConfig;

pub type SharedLedgerStore = Arc<dyn LedgerStore>;
pub type SharedUserDirectory = Arc<dyn UserDirectory>;

/// Which storage backend the process is wired to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    InMemory,
    Postgres,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::InMemory => "in_memory",
            Backend::Postgres => "postgres",
        }
    }
}

#[derive(Clone)]
pub struct AppServices {
    pub backend: Backend,
    pub expenses: ExpenseService<SharedLedgerStore, SharedUserDirectory>,
}

/// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
pub async fn build_services(config: &AppConfig) -> Result<AppServices, StoreError> {
    match &config.database_url {
        Some(url) => build_persistent_services(url, config.database_max_connections).await,
        None => {
            tracing::warn!("DATABASE_URL not set; using in-memory stores (data is lost on exit)");
            Ok(build_in_memory_services())
        }
    }
}

pub fn build_in_memory_services() -> AppServices {
    let ledger: SharedLedgerStore = Arc::new(InMemoryLedgerStore::new());
    let users: SharedUserDirectory = Arc::new(InMemoryUserDirectory::new());
    AppServices {
        backend: Backend::InMemory,
        expenses: ExpenseService::new(ledger, users),
    }
}

async fn build_persistent_services(
    database_url: &str,
    max_connections: u32,
) -> Result<AppServices, StoreError> {
    let pool = db::connect(database_url, max_connections).await?;
    db::ensure_schema(&pool).await?;

    let ledger: SharedLedgerStore = Arc::new(PostgresLedgerStore::new(pool.clone()));
    let users: SharedUserDirectory = Arc::new(PostgresUserDirectory::new(pool));
    Ok(AppServices {
        backend: Backend::Postgres,
        expenses: ExpenseService::new(ledger, users),
    })
}
