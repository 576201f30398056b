use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use stockroom_core::DomainError;
use stockroom_infra::LedgerServiceError;

/// Status and machine-readable code for a domain rejection.
pub fn classify_domain_error(err: &DomainError) -> (StatusCode, &'static str) {
    match err {
        DomainError::NotFound => (StatusCode::NOT_FOUND, "not_found"),
        DomainError::InsufficientStock { .. } => {
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock")
        }
        DomainError::InvalidQuantity(_) => (StatusCode::BAD_REQUEST, "invalid_quantity"),
        DomainError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
        DomainError::InvalidId(_) => (StatusCode::BAD_REQUEST, "invalid_id"),
        DomainError::Conflict(_) => (StatusCode::CONFLICT, "conflict"),
    }
}

pub fn classify_service_error(err: &LedgerServiceError) -> (StatusCode, &'static str) {
    match err {
        LedgerServiceError::Domain(e) => classify_domain_error(e),
        LedgerServiceError::Store(_) => (StatusCode::INTERNAL_SERVER_ERROR, "store_error"),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let (status, code) = classify_domain_error(&err);
    json_error(status, code, err.to_string())
}

pub fn service_error_to_response(err: LedgerServiceError) -> axum::response::Response {
    let (status, code) = classify_service_error(&err);
    json_error(status, code, err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_infra::StoreError;

    #[test]
    fn domain_errors_map_to_client_statuses() {
        assert_eq!(
            classify_domain_error(&DomainError::insufficient_stock(5, 2)),
            (StatusCode::UNPROCESSABLE_ENTITY, "insufficient_stock")
        );
        assert_eq!(
            classify_domain_error(&DomainError::not_found()),
            (StatusCode::NOT_FOUND, "not_found")
        );
        assert_eq!(
            classify_domain_error(&DomainError::validation("part_number cannot be empty")).0,
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn store_errors_are_server_errors() {
        let err = LedgerServiceError::from(StoreError::Storage("disk full".into()));
        assert_eq!(
            classify_service_error(&err),
            (StatusCode::INTERNAL_SERVER_ERROR, "store_error")
        );
    }
}
