//! Stock record persistence.
//!
//! The ledger service keeps the authoritative state in memory and writes every
//! changed record through a `StockStore`. Stores only ever see whole records;
//! quantity rules live in the domain.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use stockroom_inventory::StockRecord;

use crate::config::AppConfig;

pub mod in_memory;
pub mod sqlite;

pub use in_memory::InMemoryStockStore;
pub use sqlite::SqliteStockStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("storage error: {0}")]
    Storage(String),
    /// A persisted row could not be turned back into a record.
    #[error("corrupt stock row: {0}")]
    Corrupt(String),
    /// The existing table does not have the layout this store writes.
    #[error("incompatible stock schema: {0}")]
    Schema(String),
}

/// Durable home of stock records, keyed by (part_number, location).
#[async_trait]
pub trait StockStore: Send + Sync {
    /// Every persisted record, in any order.
    async fn load_all(&self) -> Result<Vec<StockRecord>, StoreError>;

    /// Insert the record, or overwrite the one with the same (part, location).
    async fn upsert(&self, record: &StockRecord) -> Result<(), StoreError>;
}

#[async_trait]
impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    async fn load_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        (**self).load_all().await
    }

    async fn upsert(&self, record: &StockRecord) -> Result<(), StoreError> {
        (**self).upsert(record).await
    }
}

/// Open the store selected by configuration (SQLite when a database URL is set).
pub async fn open_store(config: &AppConfig) -> Result<Arc<dyn StockStore>, StoreError> {
    match &config.database_url {
        Some(url) => {
            tracing::info!(database_url = %url, "using sqlite stock store");
            let store = SqliteStockStore::connect(url).await?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("no database configured; stock is kept in memory only");
            Ok(Arc::new(InMemoryStockStore::new()))
        }
    }
}
