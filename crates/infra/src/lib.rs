//! Infrastructure layer: storage, the ledger service, export and config.

pub mod config;
pub mod export;
pub mod ledger_service;
pub mod store;

pub use config::{AppConfig, ConfigError};
pub use ledger_service::{LedgerService, LedgerServiceError};
pub use store::{InMemoryStockStore, SqliteStockStore, StockStore, StoreError};
