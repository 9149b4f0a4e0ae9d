use assert_matches::assert_matches;
use serde_json::json;
use uuid::Uuid;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_utils::test_utils::{MockStoreResponses, TestConfig};
use vitals_cell::models::{AddBpReadingRequest, UpdateBpReadingRequest, VitalsError};
use vitals_cell::services::ReadingsService;

fn readings_service(mock_server: &MockServer) -> ReadingsService {
    let config = TestConfig::with_store_url(&mock_server.uri()).to_app_config();
    ReadingsService::new(&config)
}

fn add_request(systolic: i32, diastolic: i32) -> AddBpReadingRequest {
    AddBpReadingRequest {
        systolic,
        diastolic,
        pulse: 72,
        recorded_at: None,
        notes: None,
    }
}

#[tokio::test]
async fn adding_a_reading_stores_computed_category() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let reading_id = Uuid::new_v4();

    // 145/85 lands in stage 2.
    Mock::given(method("POST"))
        .and(path("/rest/v1/bp_readings"))
        .and(body_partial_json(json!({
            "patient_id": patient_id,
            "systolic": 145,
            "diastolic": 85,
            "category": "hypertension_stage2"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": reading_id,
            "patient_id": patient_id,
            "systolic": 145,
            "diastolic": 85,
            "pulse": 72,
            "recorded_at": "2024-06-01T09:30:00Z",
            "notes": null,
            "category": "hypertension_stage2",
            "created_at": "2024-06-01T09:30:00Z",
            "updated_at": "2024-06-01T09:30:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = readings_service(&mock_server);
    let reading = service
        .add_reading(patient_id, add_request(145, 85))
        .await
        .unwrap();

    assert_eq!(reading.id, reading_id);
    assert_eq!(reading.systolic, 145);
}

#[tokio::test]
async fn out_of_range_measurements_are_rejected() {
    let mock_server = MockServer::start().await;
    let service = readings_service(&mock_server);

    let err = service
        .add_reading(Uuid::new_v4(), add_request(400, 85))
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::ValidationError(_));

    let err = service
        .add_reading(Uuid::new_v4(), add_request(120, 10))
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::ValidationError(_));
}

#[tokio::test]
async fn listing_orders_newest_first() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bp_readings"))
        .and(query_param("patient_id", format!("eq.{}", patient_id)))
        .and(query_param("order", "recorded_at.desc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::bp_reading_response(&Uuid::new_v4().to_string(), &patient_id.to_string(), 120, 80),
            MockStoreResponses::bp_reading_response(&Uuid::new_v4().to_string(), &patient_id.to_string(), 118, 78),
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = readings_service(&mock_server);
    let readings = service.list_readings(patient_id, None).await.unwrap();
    assert_eq!(readings.len(), 2);
}

#[tokio::test]
async fn listing_rejects_non_positive_window() {
    let mock_server = MockServer::start().await;
    let service = readings_service(&mock_server);

    let err = service
        .list_readings(Uuid::new_v4(), Some(0))
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::ValidationError(_));
}

#[tokio::test]
async fn update_recomputes_category_and_checks_ownership() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let reading_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bp_readings"))
        .and(query_param("id", format!("eq.{}", reading_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::bp_reading_response(&reading_id.to_string(), &patient_id.to_string(), 120, 80)
        ])))
        .mount(&mock_server)
        .await;

    // New systolic pushes the stored category up.
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/bp_readings"))
        .and(query_param("id", format!("eq.{}", reading_id)))
        .and(body_partial_json(json!({
            "systolic": 185,
            "category": "hypertensive_crisis"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
            "id": reading_id,
            "patient_id": patient_id,
            "systolic": 185,
            "diastolic": 80,
            "pulse": 72,
            "recorded_at": "2024-06-01T09:30:00Z",
            "notes": null,
            "category": "hypertensive_crisis",
            "created_at": "2024-06-01T09:30:00Z",
            "updated_at": "2024-06-02T09:30:00Z"
        }])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = readings_service(&mock_server);
    let updated = service
        .update_reading(
            patient_id,
            reading_id,
            UpdateBpReadingRequest {
                systolic: Some(185),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.systolic, 185);

    // Someone else's reading is untouchable.
    let err = service
        .update_reading(
            Uuid::new_v4(),
            reading_id,
            UpdateBpReadingRequest {
                systolic: Some(130),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::Unauthorized);
}

#[tokio::test]
async fn delete_checks_ownership() {
    let mock_server = MockServer::start().await;
    let patient_id = Uuid::new_v4();
    let reading_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/bp_readings"))
        .and(query_param("id", format!("eq.{}", reading_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::bp_reading_response(&reading_id.to_string(), &patient_id.to_string(), 120, 80)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("DELETE"))
        .and(path("/rest/v1/bp_readings"))
        .and(query_param("id", format!("eq.{}", reading_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::bp_reading_response(&reading_id.to_string(), &patient_id.to_string(), 120, 80)
        ])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = readings_service(&mock_server);

    let err = service
        .delete_reading(Uuid::new_v4(), reading_id)
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::Unauthorized);

    service.delete_reading(patient_id, reading_id).await.unwrap();
}

#[tokio::test]
async fn missing_reading_is_not_found() {
    let mock_server = MockServer::start().await;
    let service = readings_service(&mock_server);

    Mock::given(method("GET"))
        .and(path("/rest/v1/bp_readings"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&mock_server)
        .await;

    let err = service
        .update_reading(Uuid::new_v4(), Uuid::new_v4(), UpdateBpReadingRequest::default())
        .await
        .unwrap_err();
    assert_matches!(err, VitalsError::NotFound);
}
