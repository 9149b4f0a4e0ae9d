use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::router::patient_appointment_routes;
use shared_utils::test_utils::{JwtTestUtils, MockStoreResponses, TestConfig, TestUser};

const SLOT_DATE: &str = "15_08_2024";
const SLOT_TIME: &str = "10:00 AM";

fn test_app(mock_server: &MockServer) -> (Router, TestConfig) {
    let config = TestConfig::with_store_url(&mock_server.uri());
    let app = patient_appointment_routes(config.to_arc());
    (app, config)
}

fn patient_token(config: &TestConfig, patient_id: Uuid) -> String {
    let user = TestUser {
        id: patient_id.to_string(),
        email: "patient@example.com".to_string(),
        role: "patient".to_string(),
    };
    JwtTestUtils::create_test_token(&user, &config.jwt_secret, None)
}

fn book_body(doctor_id: Uuid) -> String {
    json!({
        "doctor_id": doctor_id,
        "slot_date": SLOT_DATE,
        "slot_time": SLOT_TIME
    })
    .to_string()
}

async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn booking_requires_authentication() {
    let mock_server = MockServer::start().await;
    let (app, _) = test_app(&mock_server);

    let request = Request::builder()
        .method("POST")
        .uri("/book-appointment")
        .header("content-type", "application/json")
        .body(Body::from(book_body(Uuid::new_v4())))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn doctor_token_cannot_book() {
    let mock_server = MockServer::start().await;
    let (app, config) = test_app(&mock_server);

    let doctor = TestUser::doctor("doc@example.com");
    let token = JwtTestUtils::create_test_token(&doctor, &config.jwt_secret, None);

    let request = Request::builder()
        .method("POST")
        .uri("/book-appointment")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(book_body(Uuid::new_v4())))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let mock_server = MockServer::start().await;
    let (app, config) = test_app(&mock_server);

    let patient = TestUser::patient("patient@example.com");
    let token = JwtTestUtils::create_expired_token(&patient, &config.jwt_secret);

    let request = Request::builder()
        .method("GET")
        .uri("/appointments")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn booking_through_router_succeeds() {
    let mock_server = MockServer::start().await;
    let (app, config) = test_app(&mock_server);

    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_response(&doctor_id.to_string(), "Dr. Test", "General physician", 500.0)
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/v1/patients"))
        .and(query_param("id", format!("eq.{}", patient_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::patient_response(&patient_id.to_string(), "patient@example.com", "Pat")
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("PATCH"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_response_with_slots(
                &doctor_id.to_string(),
                "Dr. Test",
                "General physician",
                500.0,
                json!({ SLOT_DATE: [SLOT_TIME] }),
            )
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{
            "id": Uuid::new_v4(),
            "patient_id": patient_id,
            "doctor_id": doctor_id,
            "slot_date": SLOT_DATE,
            "slot_time": SLOT_TIME,
            "amount": 500.0,
            "patient": {
                "id": patient_id,
                "first_name": "Pat",
                "last_name": "Tester",
                "email": "patient@example.com",
                "phone": "+353861234567",
                "date_of_birth": "1990-01-01",
                "gender": "female"
            },
            "doctor": {
                "id": doctor_id,
                "name": "Dr. Test",
                "speciality": "General physician",
                "degree": "MBBS",
                "experience": "4 Years",
                "image": null,
                "fees": 500.0,
                "address": "10 Clinic Road"
            },
            "cancelled": false,
            "completed": false,
            "created_at": "2024-08-01T10:00:00Z",
            "updated_at": "2024-08-01T10:00:00Z"
        }])))
        .mount(&mock_server)
        .await;

    let token = patient_token(&config, patient_id);
    let request = Request::builder()
        .method("POST")
        .uri("/book-appointment")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(book_body(doctor_id)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Appointment booked successfully"));
    assert_eq!(body["appointment"]["slot_time"], json!(SLOT_TIME));
}

#[tokio::test]
async fn taken_slot_returns_conflict() {
    let mock_server = MockServer::start().await;
    let (app, config) = test_app(&mock_server);

    let patient_id = Uuid::new_v4();
    let doctor_id = Uuid::new_v4();

    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", format!("eq.{}", doctor_id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockStoreResponses::doctor_response_with_slots(
                &doctor_id.to_string(),
                "Dr. Test",
                "General physician",
                500.0,
                json!({ SLOT_DATE: [SLOT_TIME] }),
            )
        ])))
        .mount(&mock_server)
        .await;

    let token = patient_token(&config, patient_id);
    let request = Request::builder()
        .method("POST")
        .uri("/book-appointment")
        .header("content-type", "application/json")
        .header("Authorization", format!("Bearer {}", token))
        .body(Body::from(book_body(doctor_id)))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let body = response_json(response).await;
    assert_eq!(body["error"], json!("Slot already booked"));
}
