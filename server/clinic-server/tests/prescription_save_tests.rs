//! End-to-end tests for `POST /prescription/save`
//!
//! Every test drives the router over an in-memory datastore and inspects the
//! store directly afterwards: stock must only move when the whole save
//! succeeds, and a failed save must leave no header or line rows behind.

mod common;

use axum::http::StatusCode;
use common::TestApp;
use datastore_layer::WriteKind;
use serde_json::{json, Value};

const SAVE: &str = "/prescription/save";

async fn seeded() -> (TestApp, String) {
    let app = TestApp::new();
    let patient = app.seed_patient("pt-1", "9000000001").await;
    app.seed_stock("Amoxicillin", 10).await;
    app.seed_stock("Cetirizine", 5).await;
    (app, patient)
}

fn line(name: &str, frequency: &str, duration: Value) -> Value {
    json!({
        "MedicineName": name,
        "frequency": frequency,
        "Duration": duration,
        "timing": "After food"
    })
}

#[tokio::test]
async fn insufficient_stock_is_rejected_without_touching_anything() {
    let (app, patient) = seeded().await;

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "CurrentSymptoms": "Blocked nose",
                "medicines": [
                    line("Amoxicillin", "Twice daily", json!(3)),
                    line("Cetirizine", "Twice daily", json!(3))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["status"], json!("failure"));
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Insufficient stock for: Cetirizine"), "{message}");

    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(5)));
    assert_eq!(app.store.row_count("Prescription"), 0);
    assert_eq!(app.store.row_count("PrescribedMedicine"), 0);
}

#[tokio::test]
async fn create_deducts_stock_and_writes_header_and_lines() {
    let (app, patient) = seeded().await;

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "CurrentSymptoms": "Blocked nose",
                "fees": 300,
                "medicines": [
                    line("Amoxicillin", "Twice daily", json!(3)),
                    line("Cetirizine", "Twice daily", json!("2"))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    let data = &body["data"];
    let uuid = data["UUID"].as_str().unwrap().to_string();
    assert!(!uuid.is_empty());
    assert_eq!(data["PatientUUID"], json!("pt-1"));
    assert_eq!(data["medicines"].as_array().unwrap().len(), 2);
    assert_eq!(
        data["updatedMedicineStock"],
        json!([
            {"Name": "Amoxicillin", "Quantity": 4},
            {"Name": "Cetirizine", "Quantity": 1}
        ])
    );

    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(4)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(1)));

    let headers = app.store.rows("Prescription");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].get("UUID"), Some(&json!(uuid)));

    let lines = app.store.rows("PrescribedMedicine");
    assert_eq!(lines.len(), 2);
    assert!(lines
        .iter()
        .all(|line| line.get("PrescriptionUUID") == Some(&json!(uuid))));

    assert_eq!(
        app.audit.names(),
        vec![
            "started",
            "stock_validated",
            "header_written",
            "stock_deducted",
            "stock_deducted",
            "lines_reconciled",
            "completed"
        ]
    );
}

#[tokio::test]
async fn duplicate_medicine_lines_are_checked_against_their_sum() {
    let (app, patient) = seeded().await;

    // 3 + 3 exceeds the 5 on hand even though each line fits alone
    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [
                    line("Cetirizine", "Once daily", json!(3)),
                    line("Cetirizine", "Thrice daily", json!(1))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("(required 6, available 5)"));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(5)));
}

#[tokio::test]
async fn failed_line_insert_rolls_back_stock_and_rows() {
    let (app, patient) = seeded().await;
    // First line goes in, the second insert is rejected
    app.store.fail_nth("PrescribedMedicine", WriteKind::Insert, 2);

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [
                    line("Amoxicillin", "Twice daily", json!(3)),
                    line("Cetirizine", "Twice daily", json!(2))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], json!("Failed to save prescription"));
    assert!(body["details"].as_str().is_some());

    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(5)));
    assert_eq!(app.store.row_count("Prescription"), 0);
    assert_eq!(app.store.row_count("PrescribedMedicine"), 0);

    let names = app.audit.names();
    assert!(names.contains(&"failed"));
    assert!(!names.contains(&"completed"));
    assert!(!names.contains(&"compensation_failed"));
}

#[tokio::test]
async fn failure_before_any_line_is_written_removes_the_header() {
    let (app, patient) = seeded().await;
    app.store.fail_next("PrescribedMedicine", WriteKind::Insert);

    let (status, _) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [line("Amoxicillin", "Twice daily", json!(3))]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
    assert_eq!(app.store.row_count("Prescription"), 0);
    assert_eq!(app.store.row_count("PrescribedMedicine"), 0);
}

#[tokio::test]
async fn failed_stock_write_restores_earlier_deductions() {
    let (app, patient) = seeded().await;
    app.store.fail_nth("MedicineStock", WriteKind::Update, 2);

    let (status, _) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [
                    line("Amoxicillin", "Twice daily", json!(3)),
                    line("Cetirizine", "Twice daily", json!(2))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(5)));
    assert_eq!(app.store.row_count("Prescription"), 0);
}

#[tokio::test]
async fn update_reconciles_lines_and_deletes_requested_rows() {
    let (app, patient) = seeded().await;

    let (_, created) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "CurrentSymptoms": "Blocked nose",
                "medicines": [
                    line("Amoxicillin", "Once daily", json!(2)),
                    line("Cetirizine", "Once daily", json!(1))
                ]
            }),
        )
        .await;
    let uuid = created["data"]["UUID"].as_str().unwrap().to_string();
    let saved = created["data"]["medicines"].as_array().unwrap().clone();
    let kept_row = saved[0]["ROWID"].clone();
    let dropped_row = saved[1]["ROWID"].clone();
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(8)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(4)));

    let mut kept = line("Amoxicillin", "Twice daily", json!(2));
    kept["ROWID"] = kept_row.clone();
    let (status, body) = app
        .post(
            SAVE,
            json!({
                "UUID": uuid,
                "PatientUUID": patient,
                "CurrentSymptoms": "Blocked nose, fever",
                "medicines": [kept],
                "deletedMedicineRowIds": [dropped_row]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["UUID"], json!(uuid));
    assert_eq!(body["data"]["medicines"][0]["ROWID"], kept_row);

    // The update deducts the full new requirement again
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(4)));
    assert_eq!(app.stock_of("Cetirizine"), Some(json!(4)));

    let headers = app.store.rows("Prescription");
    assert_eq!(headers.len(), 1);
    assert_eq!(headers[0].get("CurrentSymptoms"), Some(&json!("Blocked nose, fever")));

    let lines = app.store.rows("PrescribedMedicine");
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].get("ROWID"), Some(&kept_row));
    assert_eq!(lines[0].get("frequency"), Some(&json!("Twice daily")));
}

#[tokio::test]
async fn repeating_an_update_deducts_again() {
    let (app, patient) = seeded().await;

    let (_, created) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [line("Amoxicillin", "Once daily", json!(2))]
            }),
        )
        .await;
    let uuid = created["data"]["UUID"].clone();
    let row_id = created["data"]["medicines"][0]["ROWID"].clone();

    let mut again = line("Amoxicillin", "Once daily", json!(2));
    again["ROWID"] = row_id;
    let update = json!({"UUID": uuid, "PatientUUID": patient, "medicines": [again]});

    assert_eq!(app.post(SAVE, update.clone()).await.0, StatusCode::OK);
    assert_eq!(app.post(SAVE, update).await.0, StatusCode::OK);

    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(4)));
    assert_eq!(app.store.row_count("PrescribedMedicine"), 1);
}

#[tokio::test]
async fn update_with_unknown_line_row_fails_and_restores_stock() {
    let (app, patient) = seeded().await;

    let (_, created) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [line("Amoxicillin", "Once daily", json!(2))]
            }),
        )
        .await;
    let uuid = created["data"]["UUID"].clone();

    let mut ghost = line("Amoxicillin", "Once daily", json!(3));
    ghost["ROWID"] = json!("9999");
    let (status, _) = app
        .post(
            SAVE,
            json!({"UUID": uuid, "PatientUUID": patient, "medicines": [ghost]}),
        )
        .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(8)));
    // The header of an update is never removed by a rollback
    assert_eq!(app.store.row_count("Prescription"), 1);
}

#[tokio::test]
async fn rejects_bad_payloads_before_any_write() {
    let (app, patient) = seeded().await;

    let cases = [
        (json!({}), "Missing required field: PatientUUID"),
        (
            json!({"PatientUUID": patient, "medicines": "Amoxicillin"}),
            "medicines must be an array",
        ),
        (
            json!({"PatientUUID": patient, "medicines": [42]}),
            "Invalid medicine entry at index 0",
        ),
        (
            json!({"PatientUUID": patient, "deletedMedicineRowIds": 7}),
            "deletedMedicineRowIds must be an array",
        ),
    ];
    for (payload, message) in cases {
        let (status, body) = app.post(SAVE, payload).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{message}");
        assert_eq!(body["error"], json!(message));
    }

    assert_eq!(app.store.row_count("Prescription"), 0);
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
}

#[tokio::test]
async fn unknown_references_map_to_their_statuses() {
    let (app, patient) = seeded().await;

    let (status, body) = app
        .post(SAVE, json!({"PatientUUID": "pt-missing", "medicines": []}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], json!("Referenced Patient not found"));

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [line("Paracetamol", "Once daily", json!(1))]
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].as_str().unwrap().contains("Paracetamol"));

    let (status, body) = app
        .post(
            SAVE,
            json!({"UUID": "rx-missing", "PatientUUID": patient, "medicines": []}),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], json!("Prescription not found for UUID"));

    assert_eq!(app.store.row_count("Prescription"), 0);
}

#[tokio::test]
async fn lines_without_a_requirement_do_not_need_stock() {
    let (app, patient) = seeded().await;

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [
                    line("Paracetamol", "As needed", Value::Null),
                    line("", "Once daily", json!(5))
                ]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["data"]["updatedMedicineStock"], json!([]));
    assert_eq!(app.store.row_count("PrescribedMedicine"), 2);
}

#[tokio::test]
async fn oversized_duration_is_rejected_as_insufficient_stock() {
    let (app, patient) = seeded().await;

    let (status, body) = app
        .post(
            SAVE,
            json!({
                "PatientUUID": patient,
                "medicines": [line("Amoxicillin", "Twice daily", json!(1e19))]
            }),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    let message = body["error"].as_str().unwrap();
    assert!(message.starts_with("Insufficient stock for: Amoxicillin"), "{message}");
    assert_eq!(app.stock_of("Amoxicillin"), Some(json!(10)));
    assert_eq!(app.store.row_count("Prescription"), 0);
}
