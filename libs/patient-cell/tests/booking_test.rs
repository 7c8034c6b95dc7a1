// libs/patient-cell/tests/booking_test.rs

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{NaiveDate, NaiveTime};
use serde_json::{json, Value};
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::{SlotBucket, TransitionOutcome};
use patient_cell::models::BookingDraft;
use patient_cell::services::booking::{BOOKED_MESSAGE, PAST_DATE_MESSAGE, SLOTS_FAILED_MESSAGE};
use patient_cell::services::PatientWorkspace;
use shared_models::ClientError;
use shared_utils::test_utils::{test_gateway, MockApiResponses, ScriptedConfirm};

fn june(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
}

fn evening() -> NaiveTime {
    NaiveTime::from_hms_opt(15, 0, 0).unwrap()
}

fn departments() -> Value {
    MockApiResponses::success(json!({
        "departments": [
            MockApiResponses::department("Cardiology", vec![
                MockApiResponses::doctor(2, "Dr. House", "Cardiology"),
                MockApiResponses::doctor(5, "Dr. Wilson", "Cardiology"),
            ]),
            MockApiResponses::department("General Medicine", vec![
                MockApiResponses::doctor(9, "Dr. Cuddy", "General Medicine"),
            ]),
        ]
    }))
}

async fn mount_patient_data(mock_server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/api/patient/dashboard"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "upcoming_appointments": 1,
            "total_appointments": 4,
            "doctors_visited": 2
        }))))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/patient/departments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(departments()))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/patient/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::appointments_response(vec![
            MockApiResponses::appointment(7, 2, "2024-06-12", "09:00", "booked"),
        ])))
        .mount(mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/patient/history"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "treatments": []
        }))))
        .mount(mock_server)
        .await;
}

async fn mount_slots(mock_server: &MockServer, doctor_id: &str, date: &str, slots: Vec<Value>) {
    Mock::given(method("GET"))
        .and(path("/api/patient/available-slots"))
        .and(query_param("doctor_id", doctor_id))
        .and(query_param("date", date))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::slots_response(slots)))
        .mount(mock_server)
        .await;
}

async fn workspace(mock_server: &MockServer) -> PatientWorkspace {
    let mut workspace = PatientWorkspace::new(
        test_gateway(&mock_server.uri()),
        Arc::new(ScriptedConfirm::accepting()),
    );
    workspace.view.load_patient_data().await;
    workspace
}

#[tokio::test]
async fn test_department_change_resets_funnel() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;
    mount_slots(&mock_server, "2", "2024-06-12", vec![MockApiResponses::slot("evening", "available")]).await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    workspace.select_slot(evening()).unwrap();
    assert_eq!(workspace.booking.available_slots.len(), 1);

    workspace.select_department("General Medicine").unwrap();

    let booking = &workspace.booking;
    assert!(booking.selected_doctor.is_none());
    assert!(booking.available_slots.is_empty());
    assert_eq!(booking.draft.doctor_id, None);
    assert_eq!(booking.draft.appointment_date, None);
    assert_eq!(booking.draft.appointment_time, None);
    assert_eq!(booking.draft.specialization, "General Medicine");
}

#[tokio::test]
async fn test_doctor_without_date_does_not_resolve() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/patient/available-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::slots_response(vec![])))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(5).await.unwrap();

    assert_eq!(workspace.booking.draft.doctor_id, Some(5));
    assert!(workspace.booking.available_slots.is_empty());
}

#[tokio::test]
async fn test_changing_doctor_re_resolves_for_chosen_date() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;
    mount_slots(&mock_server, "2", "2024-06-12", vec![MockApiResponses::slot("morning", "available")]).await;
    mount_slots(&mock_server, "5", "2024-06-12", vec![
        MockApiResponses::slot("morning", "available"),
        MockApiResponses::slot("evening", "available"),
    ])
    .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    workspace.select_slot(NaiveTime::from_hms_opt(9, 0, 0).unwrap()).unwrap();

    workspace.select_doctor(5).await.unwrap();

    assert_eq!(workspace.booking.draft.appointment_time, None);
    assert_eq!(workspace.booking.draft.appointment_date, Some(june(12)));
    assert_eq!(workspace.booking.available_slots.len(), 2);
}

#[tokio::test]
async fn test_slot_failure_clears_list_and_reports() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/patient/available-slots"))
        .respond_with(ResponseTemplate::new(502).set_body_string(""))
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;

    assert!(workspace.booking.available_slots.is_empty());
    assert_eq!(workspace.view.notices.error.as_deref(), Some(SLOTS_FAILED_MESSAGE));
}

#[tokio::test]
async fn test_booking_past_date_never_reaches_server() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;

    Mock::given(method("POST"))
        .and(path("/api/patient/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("ok")))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.booking.draft.doctor_id = Some(2);
    workspace.booking.draft.appointment_date = Some(june(9));
    workspace.booking.draft.appointment_time = Some(evening());

    let result = workspace.book(june(10)).await;

    assert_matches!(result, Err(ClientError::Validation(_)));
    assert_eq!(workspace.view.notices.error.as_deref(), Some(PAST_DATE_MESSAGE));
}

#[tokio::test]
async fn test_successful_booking_resets_and_reloads() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;
    mount_slots(&mock_server, "2", "2024-06-12", vec![
        MockApiResponses::slot("morning", "booked"),
        MockApiResponses::slot("evening", "available"),
    ])
    .await;

    Mock::given(method("POST"))
        .and(path("/api/patient/appointments"))
        .and(body_json(json!({
            "specialization": "Cardiology",
            "doctor_id": 2,
            "appointment_date": "2024-06-12",
            "appointment_time": "15:00",
            "notes": "Chest pain on exertion"
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("Appointment booked successfully")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    assert_eq!(workspace.booking.available_slots[0].slot_type, SlotBucket::Evening);
    workspace.select_slot(evening()).unwrap();
    workspace.booking.set_notes("Chest pain on exertion");

    workspace.book(june(10)).await.unwrap();

    assert_eq!(workspace.view.notices.success.as_deref(), Some(BOOKED_MESSAGE));
    assert!(workspace.booking.selected_department.is_none());
    assert!(workspace.booking.available_slots.is_empty());
    assert_eq!(workspace.booking.draft, BookingDraft::default());
    assert_eq!(workspace.view.stats.total_appointments, 4);

    let requests = mock_server.received_requests().await.unwrap();
    let dashboard_loads = requests
        .iter()
        .filter(|r| r.url.path() == "/api/patient/dashboard")
        .count();
    assert_eq!(dashboard_loads, 2);
}

#[tokio::test]
async fn test_rejected_booking_keeps_draft() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;
    mount_slots(&mock_server, "2", "2024-06-12", vec![MockApiResponses::slot("evening", "available")]).await;

    Mock::given(method("POST"))
        .and(path("/api/patient/appointments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(MockApiResponses::failure("This slot is already booked")))
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    workspace.select_slot(evening()).unwrap();

    let result = workspace.book(june(10)).await;

    assert!(result.is_err());
    assert_eq!(workspace.view.notices.error.as_deref(), Some("This slot is already booked"));
    assert_eq!(workspace.booking.draft.appointment_time, Some(evening()));
    assert_eq!(workspace.booking.draft.doctor_id, Some(2));
}

#[tokio::test]
async fn test_booked_slot_disappears_on_re_resolve() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;

    Mock::given(method("GET"))
        .and(path("/api/patient/available-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::slots_response(vec![
            MockApiResponses::slot("morning", "available"),
            MockApiResponses::slot("evening", "available"),
        ])))
        .up_to_n_times(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("GET"))
        .and(path("/api/patient/available-slots"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::slots_response(vec![
            MockApiResponses::slot("morning", "available"),
            MockApiResponses::slot("evening", "booked"),
        ])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/api/patient/appointments"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("ok")))
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    assert_eq!(workspace.booking.available_slots.len(), 2);

    workspace.select_slot(evening()).unwrap();
    workspace.book(june(10)).await.unwrap();

    workspace.select_department("Cardiology").unwrap();
    workspace.select_doctor(2).await.unwrap();
    workspace.select_date(june(12)).await;
    assert_eq!(workspace.booking.available_slots.len(), 1);
}

#[tokio::test]
async fn test_doctors_by_department_encodes_name() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/patient/doctors"))
        .and(query_param("department", "General Medicine"))
        .respond_with(ResponseTemplate::new(200).set_body_json(MockApiResponses::success(json!({
            "doctors": [MockApiResponses::doctor(9, "Dr. Cuddy", "General Medicine")]
        }))))
        .expect(1)
        .mount(&mock_server)
        .await;

    let workspace = PatientWorkspace::new(
        test_gateway(&mock_server.uri()),
        Arc::new(ScriptedConfirm::accepting()),
    );
    let doctors = workspace.view.doctors_by_department("General Medicine").await.unwrap();

    assert_eq!(doctors.len(), 1);
    assert_eq!(doctors[0].name, "Dr. Cuddy");
}

#[tokio::test]
async fn test_patient_cancel_reloads_dashboard() {
    let mock_server = MockServer::start().await;
    mount_patient_data(&mock_server).await;

    Mock::given(method("DELETE"))
        .and(path("/api/patient/appointments/7"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(MockApiResponses::success_message("Appointment cancelled successfully")),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut workspace = workspace(&mock_server).await;
    let outcome = workspace.cancel(7).await.unwrap();

    assert_eq!(outcome, TransitionOutcome::Applied);
    assert_eq!(
        workspace.view.notices.success.as_deref(),
        Some("Appointment cancelled successfully")
    );
}
