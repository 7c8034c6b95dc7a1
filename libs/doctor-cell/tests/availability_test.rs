// libs/doctor-cell/tests/availability_test.rs

use assert_matches::assert_matches;
use chrono::NaiveDate;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::SlotBucket;
use doctor_cell::services::availability::{
    AvailabilityManager, AVAILABILITY_SAVED_MESSAGE, EMPTY_SELECTION_MESSAGE,
};
use shared_models::ClientError;
use shared_utils::test_utils::{test_gateway, MockApiResponses};

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

#[tokio::test]
async fn test_load_uses_server_table() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "availability": [
                MockApiResponses::availability_day("2024-06-10", true, false),
                MockApiResponses::availability_day("2024-06-11", false, true),
            ]
        }))))
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.load_availability_days(june(10)).await;

    assert_eq!(manager.days.len(), 2);
    assert!(manager.days[0].morning_available);
    assert!(manager.days[1].evening_available);
}

#[tokio::test]
async fn test_load_failure_generates_closed_week() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .respond_with(ResponseTemplate::new(500).set_body_string("<html>Internal Server Error</html>"))
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.load_availability_days(june(10)).await;

    assert_eq!(manager.days.len(), 7);
    assert_eq!(manager.days[0].date, june(10));
    assert_eq!(manager.days[0].day_name, "Monday, Jun 10");
    assert!(manager.days.iter().all(|d| !d.morning_available && !d.evening_available));
}

#[tokio::test]
async fn test_empty_server_table_generates_closed_week() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "availability": []
        }))))
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.load_availability_days(june(10)).await;

    assert_eq!(manager.days.len(), 7);
    assert!(manager.toggle(june(12), SlotBucket::Morning, true));
}

#[tokio::test]
async fn test_reload_reports_windows_left_open() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/doctor/set-slots"))
        .and(body_json(json!({
            "slots": [
                {"date": "2024-06-10", "slot_type": "morning", "is_available": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("ok")))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "availability": [
                MockApiResponses::availability_day("2024-06-10", true, false),
                MockApiResponses::availability_day("2024-06-11", true, true),
            ]
        }))))
        .mount(&mock_server)
        .await;

    let requested = vec![(june(10), vec![SlotBucket::Morning])];
    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.days = AvailabilityManager::generate_days(june(10));
    manager.toggle(june(10), SlotBucket::Morning, true);

    manager.save_availability(june(10)).await.unwrap();

    assert_eq!(
        manager.unrequested_open_windows(&requested),
        vec![(june(11), SlotBucket::Morning), (june(11), SlotBucket::Evening)]
    );
}

#[tokio::test]
async fn test_save_without_selection_is_local_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/doctor/set-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("ok")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.days = AvailabilityManager::generate_days(june(10));

    let result = manager.save_availability(june(10)).await;

    assert_matches!(result, Err(ClientError::Validation(_)));
    assert_eq!(manager.notices.error.as_deref(), Some(EMPTY_SELECTION_MESSAGE));
    assert!(!manager.notices.loading);
}

#[tokio::test]
async fn test_save_sends_open_windows_and_reloads() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/doctor/set-slots"))
        .and(body_json(json!({
            "slots": [
                {"date": "2024-06-10", "slot_type": "morning", "is_available": true}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message(
            "Availability updated successfully (1 created, 0 updated)",
        )))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/doctor/availability"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "availability": [MockApiResponses::availability_day("2024-06-10", true, false)]
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.days = AvailabilityManager::generate_days(june(10));
    assert!(manager.toggle(june(10), SlotBucket::Morning, true));

    manager.save_availability(june(10)).await.unwrap();

    assert_eq!(manager.notices.success.as_deref(), Some(AVAILABILITY_SAVED_MESSAGE));
    assert_eq!(manager.days.len(), 1);
}

#[tokio::test]
async fn test_save_rejection_keeps_table() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/doctor/set-slots"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockApiResponses::failure("Invalid date format")))
        .mount(&mock_server)
        .await;

    let mut manager = AvailabilityManager::new(test_gateway(&mock_server.uri()));
    manager.days = AvailabilityManager::generate_days(june(10));
    manager.toggle(june(12), SlotBucket::Evening, true);

    let result = manager.save_availability(june(10)).await;

    assert!(result.is_err());
    assert_eq!(manager.notices.error.as_deref(), Some("Invalid date format"));
    assert_eq!(manager.days.len(), 7);
    assert!(manager.days[2].evening_available);
}

#[test]
fn test_toggle_unknown_date() {
    let gateway = test_gateway("http://127.0.0.1:9");
    let mut manager = AvailabilityManager::new(gateway);
    manager.days = AvailabilityManager::generate_days(june(10));

    assert!(!manager.toggle(june(30), SlotBucket::Morning, true));
}
