//! Inventory domain module.
//!
//! This crate contains the business rules for warehouse stock, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod batch;
pub mod ledger;
pub mod record;

pub use batch::{BatchRemoval, LocationOutcome, RemovalRequest, RemovalResult, RemovalStep};
pub use ledger::{
    AddStock, AvailableLocation, Ledger, RemoveStock, StockChange, StockCommand, ToggleStatus,
};
pub use record::{positive_quantity, Location, PartNumber, MAX_QUANTITY, StockKey, StockRecord, StockStatus};
