use std::collections::BTreeMap;

use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{json, Value};

use stockroom_infra::LedgerServiceError;
use stockroom_inventory::{
    positive_quantity, AvailableLocation, BatchRemoval, Location, PartNumber, RemovalRequest,
    RemovalResult, StockRecord,
};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

/// Body of `/stock/add` and `/stock/remove`.
#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub part_number: String,
    pub location: String,
    /// Integer or numeric string.
    pub quantity: Value,
}

#[derive(Debug, Deserialize)]
pub struct ToggleStatusRequest {
    pub part_number: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct RemoveMultipleRequest {
    pub part_number: String,
    /// Location -> quantity. Values that are not integers count as 0.
    #[serde(default)]
    pub quantities: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct LocationsQuery {
    #[serde(default)]
    pub part_number: String,
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_part_number(raw: &str) -> Result<PartNumber, axum::response::Response> {
    PartNumber::parse(raw).map_err(errors::domain_error_to_response)
}

pub fn parse_key(
    part_number: &str,
    location: &str,
) -> Result<(PartNumber, Location), axum::response::Response> {
    let part_number = parse_part_number(part_number)?;
    let location = Location::parse(location).map_err(errors::domain_error_to_response)?;
    Ok((part_number, location))
}

/// Strict quantity for single add/remove: must be a positive integer.
pub fn parse_quantity(raw: &Value) -> Result<u64, axum::response::Response> {
    let value = integer_value(raw).ok_or_else(|| {
        errors::json_error(
            StatusCode::BAD_REQUEST,
            "invalid_quantity",
            format!("quantity must be an integer (got {raw})"),
        )
    })?;
    positive_quantity(value).map_err(errors::domain_error_to_response)
}

/// Lenient quantity for batch removal: anything unparseable becomes 0.
pub fn lenient_quantity(raw: &Value) -> i64 {
    integer_value(raw).unwrap_or(0)
}

fn integer_value(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn removal_requests(quantities: &BTreeMap<String, Value>) -> Vec<RemovalRequest> {
    quantities
        .iter()
        .map(|(location, raw)| RemovalRequest::new(location.clone(), lenient_quantity(raw)))
        .collect()
}

// -------------------------
// Response mapping
// -------------------------

pub fn record_to_json(record: &StockRecord) -> Value {
    json!({
        "id": record.id().to_string(),
        "part_number": record.part_number().as_str(),
        "location": record.location().as_str(),
        "quantity": record.quantity(),
        "date_in": record.date_in().to_rfc3339(),
        "last_updated": record.last_updated().to_rfc3339(),
        "status": record.status().as_str(),
    })
}

pub fn grouped_to_json(grouped: &BTreeMap<PartNumber, Vec<StockRecord>>) -> Value {
    let parts: Vec<Value> = grouped
        .iter()
        .map(|(part_number, records)| {
            json!({
                "part_number": part_number.as_str(),
                "locations": records.iter().map(record_to_json).collect::<Vec<_>>(),
            })
        })
        .collect();
    json!({ "parts": parts })
}

pub fn available_location_to_json(row: &AvailableLocation) -> Value {
    json!({
        "location": row.location.as_str(),
        "quantity": row.quantity,
        "status": row.status.as_str(),
    })
}

pub fn batch_to_json(batch: &BatchRemoval<LedgerServiceError>) -> Value {
    let outcomes: Vec<Value> = batch
        .outcomes
        .iter()
        .map(|o| match &o.result {
            RemovalResult::Removed(record) => json!({
                "location": o.location,
                "requested": o.requested,
                "outcome": "removed",
                "record": record_to_json(record),
            }),
            RemovalResult::Skipped => json!({
                "location": o.location,
                "requested": o.requested,
                "outcome": "skipped",
            }),
            RemovalResult::Failed(err) => {
                let (_, code) = errors::classify_service_error(err);
                json!({
                    "location": o.location,
                    "requested": o.requested,
                    "outcome": "failed",
                    "error": code,
                    "message": err.to_string(),
                })
            }
        })
        .collect();

    json!({
        "part_number": batch.part_number.as_str(),
        "removed": batch.any_removed(),
        "outcomes": outcomes,
    })
}
