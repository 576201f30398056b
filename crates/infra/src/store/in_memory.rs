use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use stockroom_inventory::{StockKey, StockRecord};

use super::{StockStore, StoreError};

/// In-memory stock store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    inner: RwLock<HashMap<StockKey, StockRecord>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store with existing records (later duplicates win).
    pub fn with_records(records: impl IntoIterator<Item = StockRecord>) -> Self {
        let map = records.into_iter().map(|r| (r.key(), r)).collect();
        Self {
            inner: RwLock::new(map),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.read().map(|m| m.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl StockStore for InMemoryStockStore {
    async fn load_all(&self) -> Result<Vec<StockRecord>, StoreError> {
        let map = self
            .inner
            .read()
            .map_err(|_| StoreError::Storage("in-memory store lock poisoned".to_string()))?;
        Ok(map.values().cloned().collect())
    }

    async fn upsert(&self, record: &StockRecord) -> Result<(), StoreError> {
        let mut map = self
            .inner
            .write()
            .map_err(|_| StoreError::Storage("in-memory store lock poisoned".to_string()))?;
        map.insert(record.key(), record.clone());
        Ok(())
    }
}
