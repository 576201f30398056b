use std::sync::Arc;

use anyhow::Context;

use stockroom_infra::{store, AppConfig, LedgerService, StockStore};

/// Shared state behind every handler.
pub type AppServices = LedgerService<Arc<dyn StockStore>>;

/// Open the configured store and load the ledger from it.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = store::open_store(config)
        .await
        .context("failed to open stock store")?;
    LedgerService::open(store)
        .await
        .context("failed to load stock ledger")
}
