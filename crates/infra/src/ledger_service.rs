//! Ledger service: one ledger instance, serialized writes, write-through storage.
//!
//! Every mutation runs under the service's write lock as:
//!
//! ```text
//! decide (pure, against current state)
//!   ↓
//! persist the resulting record (StockStore::upsert)
//!   ↓
//! apply to the in-memory ledger
//! ```
//!
//! The quantity check and the write therefore happen as one step with respect
//! to every other caller, and a failed write leaves the ledger as it was.
//! Reads share the read lock and return owned copies.

use std::collections::BTreeMap;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::RwLock;

use stockroom_core::DomainError;
use stockroom_inventory::{
    AddStock, AvailableLocation, BatchRemoval, Ledger, Location, PartNumber, RemovalRequest,
    RemovalStep, RemoveStock, StockCommand, StockRecord, ToggleStatus,
};

use crate::store::{StockStore, StoreError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LedgerServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerServiceError {
    pub fn as_domain(&self) -> Option<&DomainError> {
        match self {
            LedgerServiceError::Domain(e) => Some(e),
            LedgerServiceError::Store(_) => None,
        }
    }
}

#[derive(Debug)]
pub struct LedgerService<S> {
    ledger: RwLock<Ledger>,
    store: S,
}

impl<S> LedgerService<S>
where
    S: StockStore,
{
    /// Load every stored record into a fresh ledger.
    pub async fn open(store: S) -> Result<Self, LedgerServiceError> {
        let records = store.load_all().await?;
        let ledger = Ledger::from_records(records)?;
        tracing::info!(records = ledger.len(), "stock ledger loaded");
        Ok(Self {
            ledger: RwLock::new(ledger),
            store,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn add_stock(
        &self,
        part_number: &PartNumber,
        location: &Location,
        quantity: u64,
    ) -> Result<StockRecord, LedgerServiceError> {
        let mut ledger = self.ledger.write().await;
        let command = StockCommand::AddStock(AddStock {
            part_number: part_number.clone(),
            location: location.clone(),
            quantity,
            occurred_at: Utc::now(),
        });
        self.commit(&mut ledger, command).await
    }

    pub async fn remove_stock(
        &self,
        part_number: &PartNumber,
        location: &Location,
        quantity: u64,
    ) -> Result<StockRecord, LedgerServiceError> {
        let mut ledger = self.ledger.write().await;
        let command = StockCommand::RemoveStock(RemoveStock {
            part_number: part_number.clone(),
            location: location.clone(),
            quantity,
            occurred_at: Utc::now(),
        });
        self.commit(&mut ledger, command).await
    }

    pub async fn toggle_status(
        &self,
        part_number: &PartNumber,
        location: &Location,
    ) -> Result<StockRecord, LedgerServiceError> {
        let mut ledger = self.ledger.write().await;
        let command = StockCommand::ToggleStatus(ToggleStatus {
            part_number: part_number.clone(),
            location: location.clone(),
            occurred_at: Utc::now(),
        });
        self.commit(&mut ledger, command).await
    }

    /// Best-effort removal across locations; see `stockroom_inventory::batch`.
    ///
    /// The whole batch runs under one write lock, but each location is
    /// persisted on its own: a failure at one location is reported in its
    /// outcome and does not undo the others.
    pub async fn remove_multiple(
        &self,
        part_number: &PartNumber,
        requests: &[RemovalRequest],
    ) -> BatchRemoval<LedgerServiceError> {
        let mut ledger = self.ledger.write().await;
        let occurred_at = Utc::now();
        let mut batch = BatchRemoval::new(part_number.clone());

        for request in requests {
            let result = match request.step(part_number, occurred_at) {
                RemovalStep::Done(result) => result,
                RemovalStep::Commit(command) => self.commit(&mut ledger, command).await.into(),
            };
            batch.push(request, result);
        }

        if !batch.any_removed() {
            tracing::warn!(part_number = %part_number, "batch removal changed nothing");
        }
        batch
    }

    pub async fn get(&self, part_number: &PartNumber, location: &Location) -> Option<StockRecord> {
        self.ledger.read().await.get(part_number, location).cloned()
    }

    pub async fn list_grouped_by_part(&self) -> BTreeMap<PartNumber, Vec<StockRecord>> {
        self.ledger.read().await.list_grouped_by_part()
    }

    pub async fn find_available_locations(&self, part_number: &PartNumber) -> Vec<AvailableLocation> {
        self.ledger.read().await.find_available_locations(part_number)
    }

    async fn commit(
        &self,
        ledger: &mut Ledger,
        command: StockCommand,
    ) -> Result<StockRecord, LedgerServiceError> {
        let key = command.key();
        let change = match ledger.decide(&command) {
            Ok(change) => change,
            Err(e) => {
                tracing::warn!(stock = %key, error = %e, "stock command rejected");
                return Err(e.into());
            }
        };

        if let Err(e) = self.store.upsert(change.record()).await {
            tracing::error!(stock = %key, error = %e, "failed to persist stock change");
            return Err(e.into());
        }

        ledger.apply(&change);
        tracing::info!(
            stock = %key,
            change = change.change_type(),
            quantity = change.record().quantity(),
            status = %change.record().status(),
            "stock updated"
        );
        Ok(change.into_record())
    }
}
