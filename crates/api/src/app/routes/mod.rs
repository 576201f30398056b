use axum::{routing::get, Router};

pub mod export;
pub mod stock;
pub mod system;

/// Router for all stock endpoints (everything except `/health`).
pub fn router() -> Router {
    Router::new()
        .nest("/stock", stock::router())
        .route("/export/csv", get(export::export_csv))
        .route("/export/excel", get(export::export_xlsx))
}
