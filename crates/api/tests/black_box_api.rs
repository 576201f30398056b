use reqwest::StatusCode;
use serde_json::{json, Value};

use stockroom_infra::AppConfig;

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an in-memory store, on an ephemeral port.
        let config = AppConfig::default();
        let app = stockroom_api::app::build_app(&config)
            .await
            .expect("failed to build app");
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self
            .client
            .post(format!("{}{}", self.base_url, path))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn get_json(&self, path: &str) -> (StatusCode, Value) {
        let res = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .unwrap();
        let status = res.status();
        (status, res.json().await.unwrap())
    }

    async fn add(&self, part: &str, location: &str, quantity: i64) -> Value {
        let (status, body) = self
            .post(
                "/stock/add",
                json!({ "part_number": part, "location": location, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add failed: {body}");
        body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server
        .client
        .get(format!("{}/health", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn add_creates_then_accumulates() {
    let server = TestServer::spawn().await;

    let body = server.add("PN123", "A1-45", 10).await;
    assert_eq!(body["message"], "Added 10 of PN123 at A1-45");
    assert_eq!(body["record"]["quantity"], 10);
    assert_eq!(body["record"]["status"], "Available");
    let id = body["record"]["id"].clone();
    let date_in = body["record"]["date_in"].clone();

    let body = server.add(" PN123 ", "A1-45 ", 5).await;
    assert_eq!(body["record"]["quantity"], 15);
    assert_eq!(body["record"]["id"], id);
    assert_eq!(body["record"]["date_in"], date_in);
}

#[tokio::test]
async fn add_rejects_bad_input() {
    let server = TestServer::spawn().await;

    let (status, body) = server
        .post("/stock/add", json!({ "part_number": "PN1", "location": "A1", "quantity": 0 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");

    let (status, body) = server
        .post("/stock/add", json!({ "part_number": "  ", "location": "A1", "quantity": 3 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = server
        .post("/stock/add", json!({ "part_number": "PN1", "location": "A1", "quantity": "many" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, listing) = server.get_json("/stock").await;
    assert_eq!(listing["parts"], json!([]));
}

#[tokio::test]
async fn remove_checks_stock_and_existence() {
    let server = TestServer::spawn().await;
    server.add("PN123", "A1-45", 10).await;

    let (status, body) = server
        .post("/stock/remove", json!({ "part_number": "PN123", "location": "A1-45", "quantity": "4" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["record"]["quantity"], 6);

    let (status, body) = server
        .post("/stock/remove", json!({ "part_number": "PN123", "location": "A1-45", "quantity": 100 }))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "insufficient_stock");

    let (status, body) = server
        .post("/stock/remove", json!({ "part_number": "PN123", "location": "Z9-99", "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, locations) = server.get_json("/stock/locations?part_number=PN123").await;
    assert_eq!(locations, json!([{ "location": "A1-45", "quantity": 6, "status": "Available" }]));
}

#[tokio::test]
async fn toggle_status_flips_and_reports() {
    let server = TestServer::spawn().await;
    server.add("PN123", "A1-45", 6).await;

    let toggle = json!({ "part_number": "PN123", "location": "A1-45" });
    let (status, body) = server.post("/stock/toggle-status", toggle.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "PN123 at A1-45 set to Quarantine");
    assert_eq!(body["record"]["quantity"], 6);

    let (_, body) = server.post("/stock/toggle-status", toggle).await;
    assert_eq!(body["record"]["status"], "Available");

    let (status, body) = server
        .post("/stock/toggle-status", json!({ "part_number": "PN123", "location": "Q0" }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn remove_multiple_is_best_effort_per_location() {
    let server = TestServer::spawn().await;
    server.add("PN123", "A1-45", 6).await;
    server.add("PN123", "B2-10", 2).await;

    let (status, body) = server
        .post(
            "/stock/remove-multiple",
            json!({
                "part_number": "PN123",
                "quantities": { "A1-45": 3, "B2-10": "5", "C3-01": "", "Z9-99": 5 },
            }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
    assert_eq!(body["message"], "Removed items from PN123");

    let outcomes = body["outcomes"].as_array().unwrap();
    assert_eq!(outcomes.len(), 4);
    assert_eq!(outcomes[0]["location"], "A1-45");
    assert_eq!(outcomes[0]["outcome"], "removed");
    assert_eq!(outcomes[0]["record"]["quantity"], 3);
    assert_eq!(outcomes[1]["outcome"], "failed");
    assert_eq!(outcomes[1]["error"], "insufficient_stock");
    assert_eq!(outcomes[2]["outcome"], "skipped");
    assert_eq!(outcomes[3]["outcome"], "failed");
    assert_eq!(outcomes[3]["error"], "not_found");

    let (_, locations) = server.get_json("/stock/locations?part_number=PN123").await;
    assert_eq!(
        locations,
        json!([
            { "location": "A1-45", "quantity": 3, "status": "Available" },
            { "location": "B2-10", "quantity": 2, "status": "Available" },
        ])
    );
}

#[tokio::test]
async fn remove_multiple_with_nothing_removed_is_unprocessable() {
    let server = TestServer::spawn().await;
    server.add("PN1", "A1", 1).await;

    let (status, body) = server
        .post(
            "/stock/remove-multiple",
            json!({ "part_number": "PN1", "quantities": { "A1": "abc", "B1": 0 } }),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["removed"], false);
    assert_eq!(body["error"], "nothing_removed");
}

#[tokio::test]
async fn listing_groups_by_part_and_keeps_emptied_records() {
    let server = TestServer::spawn().await;
    server.add("PN2", "B1", 1).await;
    server.add("PN1", "Z1", 2).await;
    server.add("PN1", "A1", 3).await;
    server
        .post("/stock/remove", json!({ "part_number": "PN2", "location": "B1", "quantity": 1 }))
        .await;

    let (status, listing) = server.get_json("/stock").await;
    assert_eq!(status, StatusCode::OK);

    let parts = listing["parts"].as_array().unwrap();
    assert_eq!(parts.len(), 2);
    assert_eq!(parts[0]["part_number"], "PN1");
    let pn1_locations: Vec<&str> = parts[0]["locations"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["location"].as_str().unwrap())
        .collect();
    assert_eq!(pn1_locations, vec!["A1", "Z1"]);
    assert_eq!(parts[1]["locations"][0]["quantity"], 0);

    // Emptied records are not offered as pick locations.
    let (_, locations) = server.get_json("/stock/locations?part_number=PN2").await;
    assert_eq!(locations, json!([]));
}

#[tokio::test]
async fn csv_export_is_an_attachment_with_header() {
    let server = TestServer::spawn().await;
    server.add("PN123", "A1-45", 10).await;

    let res = server
        .client
        .get(format!("{}/export/csv", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let headers = res.headers().clone();
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/csv"));
    assert!(headers["content-disposition"]
        .to_str()
        .unwrap()
        .contains("inventory_export.csv"));

    let body = res.text().await.unwrap();
    let mut lines = body.lines();
    assert_eq!(
        lines.next(),
        Some("id,part_number,location,quantity,date_in,last_updated,status")
    );
    let row = lines.next().unwrap();
    assert!(row.contains(",PN123,A1-45,10,"));
    assert!(row.ends_with(",Available"));
    assert_eq!(lines.next(), None);
}

#[tokio::test]
async fn excel_export_is_an_xlsx_attachment() {
    let server = TestServer::spawn().await;
    server.add("PN123", "A1-45", 10).await;

    let res = server
        .client
        .get(format!("{}/export/excel", server.base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let headers = res.headers().clone();
    assert_eq!(
        headers["content-type"].to_str().unwrap(),
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
    );
    assert!(headers["content-disposition"]
        .to_str()
        .unwrap()
        .contains("inventory_export.xlsx"));

    let body = res.bytes().await.unwrap();
    assert!(body.starts_with(b"PK\x03\x04"));
}

#[tokio::test]
async fn add_past_maximum_quantity_is_a_client_error() {
    let server = TestServer::spawn().await;
    server.add("PN1", "A1", i64::MAX).await;

    let (status, body) = server
        .post("/stock/add", json!({ "part_number": "PN1", "location": "A1", "quantity": 1 }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "invalid_quantity");

    let (_, locations) = server.get_json("/stock/locations?part_number=PN1").await;
    assert_eq!(locations[0]["quantity"], i64::MAX);
}
