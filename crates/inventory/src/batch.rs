//! Best-effort removal of one part from several locations.
//!
//! Each location succeeds or fails on its own; there is no rollback across the
//! batch. Callers get one outcome per requested location.

use chrono::{DateTime, Utc};

use stockroom_core::DomainError;

use crate::ledger::{RemoveStock, StockCommand};
use crate::record::{Location, PartNumber, StockRecord};

/// One requested removal, as received from the caller.
///
/// The location is kept raw so that a blank location fails only its own entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemovalRequest {
    pub location: String,
    pub quantity: i64,
}

impl RemovalRequest {
    pub fn new(location: impl Into<String>, quantity: i64) -> Self {
        Self {
            location: location.into(),
            quantity,
        }
    }

    /// Decide what this entry needs: nothing more (skipped, or rejected
    /// before reaching the ledger) or a removal command to commit.
    pub fn step<E: From<DomainError>>(
        &self,
        part_number: &PartNumber,
        occurred_at: DateTime<Utc>,
    ) -> RemovalStep<E> {
        if self.quantity <= 0 {
            return RemovalStep::Done(RemovalResult::Skipped);
        }
        match Location::parse(&self.location) {
            Ok(location) => RemovalStep::Commit(StockCommand::RemoveStock(RemoveStock {
                part_number: part_number.clone(),
                location,
                quantity: self.quantity.unsigned_abs(),
                occurred_at,
            })),
            Err(e) => RemovalStep::Done(RemovalResult::Failed(e.into())),
        }
    }
}

/// Next action for one batch entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalStep<E = DomainError> {
    Done(RemovalResult<E>),
    Commit(StockCommand),
}

impl<E> RemovalStep<E> {
    /// Resolve the step, running `commit` only when a command is pending.
    pub fn resolve(self, commit: impl FnOnce(StockCommand) -> Result<StockRecord, E>) -> RemovalResult<E> {
        match self {
            RemovalStep::Done(result) => result,
            RemovalStep::Commit(command) => commit(command).into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalResult<E = DomainError> {
    /// Stock was decremented; holds the record after the removal.
    Removed(StockRecord),
    /// Nothing requested for this location.
    Skipped,
    Failed(E),
}

impl<E> From<Result<StockRecord, E>> for RemovalResult<E> {
    fn from(result: Result<StockRecord, E>) -> Self {
        match result {
            Ok(record) => RemovalResult::Removed(record),
            Err(e) => RemovalResult::Failed(e),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocationOutcome<E = DomainError> {
    pub location: String,
    pub requested: i64,
    pub result: RemovalResult<E>,
}

/// Per-location results of a batch removal, in request order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchRemoval<E = DomainError> {
    pub part_number: PartNumber,
    pub outcomes: Vec<LocationOutcome<E>>,
}

impl<E> BatchRemoval<E> {
    pub fn new(part_number: PartNumber) -> Self {
        Self {
            part_number,
            outcomes: Vec::new(),
        }
    }

    pub fn push(&mut self, request: &RemovalRequest, result: RemovalResult<E>) {
        self.outcomes.push(LocationOutcome {
            location: request.location.clone(),
            requested: request.quantity,
            result,
        });
    }

    /// True iff at least one location was decremented.
    pub fn any_removed(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.result, RemovalResult::Removed(_)))
    }

    pub fn removed(&self) -> impl Iterator<Item = &StockRecord> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            RemovalResult::Removed(record) => Some(record),
            _ => None,
        })
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &E)> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            RemovalResult::Failed(err) => Some((o.location.as_str(), err)),
            _ => None,
        })
    }
}
