use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};

use crate::app::{dto, errors};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_stock))
        .route("/add", post(add_stock))
        .route("/remove", post(remove_stock))
        .route("/remove-multiple", post(remove_multiple))
        .route("/toggle-status", post(toggle_status))
        .route("/locations", get(available_locations))
}

pub async fn list_stock(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    let grouped = services.list_grouped_by_part().await;
    Json(dto::grouped_to_json(&grouped)).into_response()
}

pub async fn add_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::QuantityRequest>,
) -> axum::response::Response {
    let (part_number, location) = match dto::parse_key(&body.part_number, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let quantity = match dto::parse_quantity(&body.quantity) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.add_stock(&part_number, &location, quantity).await {
        Ok(record) => Json(serde_json::json!({
            "record": dto::record_to_json(&record),
            "message": format!("Added {quantity} of {part_number} at {location}"),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::QuantityRequest>,
) -> axum::response::Response {
    let (part_number, location) = match dto::parse_key(&body.part_number, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let quantity = match dto::parse_quantity(&body.quantity) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.remove_stock(&part_number, &location, quantity).await {
        Ok(record) => Json(serde_json::json!({
            "record": dto::record_to_json(&record),
            "message": format!("Removed {quantity} of {part_number} at {location}"),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn remove_multiple(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::RemoveMultipleRequest>,
) -> axum::response::Response {
    let part_number = match dto::parse_part_number(&body.part_number) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let requests = dto::removal_requests(&body.quantities);

    let batch = services.remove_multiple(&part_number, &requests).await;

    let mut payload = dto::batch_to_json(&batch);
    if batch.any_removed() {
        payload["message"] = format!("Removed items from {part_number}").into();
        Json(payload).into_response()
    } else {
        payload["error"] = "nothing_removed".into();
        payload["message"] = format!("No items were removed from {part_number}").into();
        (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
    }
}

pub async fn toggle_status(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::ToggleStatusRequest>,
) -> axum::response::Response {
    let (part_number, location) = match dto::parse_key(&body.part_number, &body.location) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match services.toggle_status(&part_number, &location).await {
        Ok(record) => Json(serde_json::json!({
            "message": format!("{part_number} at {location} set to {}", record.status()),
            "record": dto::record_to_json(&record),
        }))
        .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn available_locations(
    Extension(services): Extension<Arc<AppServices>>,
    Query(query): Query<dto::LocationsQuery>,
) -> axum::response::Response {
    let part_number = match dto::parse_part_number(&query.part_number) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let rows = services.find_available_locations(&part_number).await;
    Json(
        rows.iter()
            .map(dto::available_location_to_json)
            .collect::<Vec<_>>(),
    )
    .into_response()
}
