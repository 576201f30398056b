use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{header, StatusCode},
    response::IntoResponse,
};

use stockroom_infra::export::{self, ExportError, CSV_FILE_NAME, XLSX_FILE_NAME};

use crate::app::errors;
use crate::app::services::AppServices;

const CSV_CONTENT_TYPE: &str = "text/csv; charset=utf-8";
const XLSX_CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

pub async fn export_csv(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let grouped = services.list_grouped_by_part().await;
    attachment(export::csv_bytes(&grouped), CSV_CONTENT_TYPE, CSV_FILE_NAME)
}

pub async fn export_xlsx(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let grouped = services.list_grouped_by_part().await;
    attachment(export::xlsx_bytes(&grouped), XLSX_CONTENT_TYPE, XLSX_FILE_NAME)
}

fn attachment(
    body: Result<Vec<u8>, ExportError>,
    content_type: &'static str,
    file_name: &str,
) -> axum::response::Response {
    let body = match body {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!(error = %e, file_name, "export failed");
            return errors::json_error(StatusCode::INTERNAL_SERVER_ERROR, "export_error", e.to_string());
        }
    };

    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{file_name}\""),
            ),
        ],
        body,
    )
        .into_response()
}
