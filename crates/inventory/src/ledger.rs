//! The inventory ledger: authoritative quantity per (part, location).
//!
//! Mutations are split in two steps, mirroring command handling elsewhere in the
//! workspace:
//!
//! - **Decide**: `decide(&self, cmd)` validates a command against current state
//!   and returns the resulting `StockChange` without mutating anything.
//! - **Apply**: `apply(&mut self, change)` stores the record carried by the change.
//!
//! Callers that persist records do so between the two steps, so a failed write
//! never leaves the in-memory ledger ahead of storage. `execute` does both for
//! purely in-memory use.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockroom_core::{DomainError, DomainResult};

use crate::batch::{BatchRemoval, RemovalRequest};
use crate::record::{Location, PartNumber, StockKey, StockRecord, StockStatus};

/// Command: AddStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddStock {
    pub part_number: PartNumber,
    pub location: Location,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RemoveStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveStock {
    pub part_number: PartNumber,
    pub location: Location,
    pub quantity: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ToggleStatus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleStatus {
    pub part_number: PartNumber,
    pub location: Location,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockCommand {
    AddStock(AddStock),
    RemoveStock(RemoveStock),
    ToggleStatus(ToggleStatus),
}

impl StockCommand {
    pub fn key(&self) -> StockKey {
        match self {
            StockCommand::AddStock(c) => StockKey::new(c.part_number.clone(), c.location.clone()),
            StockCommand::RemoveStock(c) => StockKey::new(c.part_number.clone(), c.location.clone()),
            StockCommand::ToggleStatus(c) => StockKey::new(c.part_number.clone(), c.location.clone()),
        }
    }
}

/// A decided change, carrying the record as it will be after the change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StockChange {
    /// A new (part, location) pair was stocked.
    Created { record: StockRecord },
    Received { record: StockRecord, quantity: u64 },
    Issued { record: StockRecord, quantity: u64 },
    StatusToggled { record: StockRecord },
}

impl StockChange {
    pub fn change_type(&self) -> &'static str {
        match self {
            StockChange::Created { .. } => "stock.created",
            StockChange::Received { .. } => "stock.received",
            StockChange::Issued { .. } => "stock.issued",
            StockChange::StatusToggled { .. } => "stock.status_toggled",
        }
    }

    pub fn record(&self) -> &StockRecord {
        match self {
            StockChange::Created { record }
            | StockChange::Received { record, .. }
            | StockChange::Issued { record, .. }
            | StockChange::StatusToggled { record } => record,
        }
    }

    pub fn into_record(self) -> StockRecord {
        match self {
            StockChange::Created { record }
            | StockChange::Received { record, .. }
            | StockChange::Issued { record, .. }
            | StockChange::StatusToggled { record } => record,
        }
    }
}

/// Row of the "where can I pick this part from" lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailableLocation {
    pub location: Location,
    pub quantity: u64,
    pub status: StockStatus,
}

/// Owned collection of stock records keyed by (part, location).
///
/// Zero-quantity records are kept; nothing here ever deletes a record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ledger {
    records: BTreeMap<StockKey, StockRecord>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored records, rejecting duplicate identities.
    pub fn from_records(records: impl IntoIterator<Item = StockRecord>) -> DomainResult<Self> {
        let mut ledger = Self::new();
        for record in records {
            let key = record.key();
            if ledger.records.contains_key(&key) {
                return Err(DomainError::conflict(format!("duplicate stock record for {key}")));
            }
            ledger.records.insert(key, record);
        }
        Ok(ledger)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, part_number: &PartNumber, location: &Location) -> Option<&StockRecord> {
        self.records
            .get(&StockKey::new(part_number.clone(), location.clone()))
    }

    /// All records, ordered by part number then location.
    pub fn records(&self) -> impl Iterator<Item = &StockRecord> {
        self.records.values()
    }

    pub fn decide(&self, command: &StockCommand) -> DomainResult<StockChange> {
        match command {
            StockCommand::AddStock(cmd) => self.decide_add(cmd),
            StockCommand::RemoveStock(cmd) => self.decide_remove(cmd),
            StockCommand::ToggleStatus(cmd) => self.decide_toggle(cmd),
        }
    }

    pub fn apply(&mut self, change: &StockChange) {
        let record = change.record().clone();
        self.records.insert(record.key(), record);
    }

    /// Decide and apply in one step.
    pub fn execute(&mut self, command: &StockCommand) -> DomainResult<StockRecord> {
        let change = self.decide(command)?;
        self.apply(&change);
        Ok(change.into_record())
    }

    pub fn add_stock(
        &mut self,
        part_number: &PartNumber,
        location: &Location,
        quantity: u64,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<StockRecord> {
        self.execute(&StockCommand::AddStock(AddStock {
            part_number: part_number.clone(),
            location: location.clone(),
            quantity,
            occurred_at,
        }))
    }

    pub fn remove_stock(
        &mut self,
        part_number: &PartNumber,
        location: &Location,
        quantity: u64,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<StockRecord> {
        self.execute(&StockCommand::RemoveStock(RemoveStock {
            part_number: part_number.clone(),
            location: location.clone(),
            quantity,
            occurred_at,
        }))
    }

    pub fn toggle_status(
        &mut self,
        part_number: &PartNumber,
        location: &Location,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<StockRecord> {
        self.execute(&StockCommand::ToggleStatus(ToggleStatus {
            part_number: part_number.clone(),
            location: location.clone(),
            occurred_at,
        }))
    }

    /// Remove one part from several locations, each independently.
    pub fn remove_multiple(
        &mut self,
        part_number: &PartNumber,
        requests: &[RemovalRequest],
        occurred_at: DateTime<Utc>,
    ) -> BatchRemoval {
        let mut batch = BatchRemoval::new(part_number.clone());
        for request in requests {
            let result = request
                .step(part_number, occurred_at)
                .resolve(|command| self.execute(&command));
            batch.push(request, result);
        }
        batch
    }

    /// Every record grouped under its part number, both levels in ascending order.
    pub fn list_grouped_by_part(&self) -> BTreeMap<PartNumber, Vec<StockRecord>> {
        let mut grouped: BTreeMap<PartNumber, Vec<StockRecord>> = BTreeMap::new();
        for record in self.records.values() {
            grouped
                .entry(record.part_number().clone())
                .or_default()
                .push(record.clone());
        }
        grouped
    }

    /// Locations holding a positive quantity of the part, whatever their status.
    pub fn find_available_locations(&self, part_number: &PartNumber) -> Vec<AvailableLocation> {
        self.records
            .values()
            .filter(|r| r.part_number() == part_number && r.quantity() > 0)
            .map(|r| AvailableLocation {
                location: r.location().clone(),
                quantity: r.quantity(),
                status: r.status(),
            })
            .collect()
    }

    fn existing(&self, part_number: &PartNumber, location: &Location) -> DomainResult<&StockRecord> {
        self.get(part_number, location).ok_or_else(DomainError::not_found)
    }

    fn decide_add(&self, cmd: &AddStock) -> DomainResult<StockChange> {
        match self.get(&cmd.part_number, &cmd.location) {
            Some(existing) => Ok(StockChange::Received {
                record: existing.with_added(cmd.quantity, cmd.occurred_at)?,
                quantity: cmd.quantity,
            }),
            None => {
                let key = StockKey::new(cmd.part_number.clone(), cmd.location.clone());
                Ok(StockChange::Created {
                    record: StockRecord::received(key, cmd.quantity, cmd.occurred_at)?,
                })
            }
        }
    }

    fn decide_remove(&self, cmd: &RemoveStock) -> DomainResult<StockChange> {
        if cmd.quantity == 0 {
            return Err(DomainError::invalid_quantity("quantity must be positive"));
        }
        let existing = self.existing(&cmd.part_number, &cmd.location)?;
        Ok(StockChange::Issued {
            record: existing.with_removed(cmd.quantity, cmd.occurred_at)?,
            quantity: cmd.quantity,
        })
    }

    fn decide_toggle(&self, cmd: &ToggleStatus) -> DomainResult<StockChange> {
        let existing = self.existing(&cmd.part_number, &cmd.location)?;
        Ok(StockChange::StatusToggled {
            record: existing.with_status_toggled(cmd.occurred_at),
        })
    }
}
