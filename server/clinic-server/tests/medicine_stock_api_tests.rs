//! Medicine inventory, health and routing endpoint tests

mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

fn new_medicine(name: &str, quantity: serde_json::Value) -> serde_json::Value {
    json!({
        "Name": name,
        "Dosage": "500",
        "Quantity": quantity,
        "Category": "Antibiotic",
        "Price": "120",
        "ManufacturerName": "Acme Pharma"
    })
}

#[tokio::test]
async fn create_medicine_coerces_and_rejects_duplicates() {
    let app = TestApp::new();

    let (status, body) = app
        .post("/medicinestock/add", new_medicine("Amoxicillin", json!("30")))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["medicine"]["Name"], json!("Amoxicillin"));
    assert!(body["data"]["medicine"]["medicineId"].is_string());

    let row = &app.store.rows("MedicineStock")[0];
    assert_eq!(row.get("Quantity"), Some(&json!(30)));
    assert_eq!(row.get("Price"), Some(&json!(120)));
    assert_eq!(row.get("Dosage"), Some(&json!(500.0)));
    assert!(row.get("UUID").and_then(|v| v.as_str()).is_some());

    let (status, body) = app
        .post("/medicinestock/add", new_medicine("Amoxicillin", json!(5)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], json!("Medicine with this Name already exists"));

    let (status, body) = app.post("/medicinestock/add", json!({"Quantity": 3})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Missing required field: Name"));
    assert_eq!(app.store.row_count("MedicineStock"), 1);
}

#[tokio::test]
async fn list_and_lookup_medicines() {
    let app = TestApp::new();
    app.seed_stock("Amoxicillin", 10).await;
    app.seed_stock("Cetirizine", 5).await;

    let (status, body) = app.get("/medicinestock/all").await;
    assert_eq!(status, StatusCode::OK);
    let medicines = body["data"]["medicines"].as_array().unwrap();
    assert_eq!(medicines.len(), 2);
    assert!(medicines.iter().all(|m| m["medicineId"].is_string()));
    assert_eq!(body["data"]["total"], json!(2));

    let (status, body) = app.get("/medicinestock?Name=Cetirizine").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["medicine"]["Quantity"], json!(5));

    let (_, body) = app.get("/medicinestock?name=Unknown").await;
    assert!(body["data"]["medicine"].is_null());

    let (status, body) = app.get("/medicinestock").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Missing Name query parameter"));
}

#[tokio::test]
async fn update_medicine_by_uuid() {
    let app = TestApp::new();
    app.seed_stock("Amoxicillin", 10).await;

    let (status, body) = app
        .put(
            "/medicinestock",
            json!({"UUID": "med-Amoxicillin", "Quantity": "25", "Price": "oops"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["medicineId"], json!("med-Amoxicillin"));
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(25)));
    // Unparseable numbers are dropped rather than stored
    assert_eq!(app.store.rows("MedicineStock")[0].get("Price"), None);

    let (status, body) = app
        .put("/medicinestock", json!({"UUID": "med-Amoxicillin", "Colour": "red"}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("No updatable fields provided"));

    let (status, body) = app
        .put("/medicinestock", json!({"UUID": "med-missing", "Quantity": 1}))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Medicine not found for UUID"));

    let (status, body) = app.put("/medicinestock", json!({"Quantity": 1})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Missing required field: UUID"));
}

#[tokio::test]
async fn delete_medicine_by_uuid() {
    let app = TestApp::new();
    app.seed_stock("Zinc", 4).await;

    let (status, body) = app.delete("/medicinestock").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        json!("Please provide UUID query param to delete medicine.")
    );

    let (status, body) = app.delete("/medicinestock?UUID=med-Zinc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["deletedRowIds"].as_array().unwrap().len(), 1);
    assert_eq!(app.stock_of("Zinc"), None);

    let (status, body) = app.delete("/medicinestock?UUID=med-Zinc").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("No medicine found with that UUID"));
}

#[tokio::test]
async fn health_reports_backend() {
    let app = TestApp::new();

    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], json!("healthy"));
    assert_eq!(body["data"]["datastore"], json!("memory"));
}

#[tokio::test]
async fn openapi_document_is_served() {
    let app = TestApp::new();

    let (status, body) = app.get("/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/prescription/save"].is_object());
    assert!(body["paths"]["/medicinestock"].is_object());
}

#[tokio::test]
async fn unknown_routes_get_a_json_404() {
    let app = TestApp::new();

    let (status, body) = app.get("/no/such/route").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], json!("failure"));
    assert_eq!(body["error"], json!("Route not found"));
}
