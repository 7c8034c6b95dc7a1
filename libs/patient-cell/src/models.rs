use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use appointment_cell::models::{AppointmentStatus, TreatmentRecord};
use shared_models::wire::hhmm;

// ==============================================================================
// DIRECTORY MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorSummary {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub department: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub experience: Option<i64>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
}

/// A specialization and the active doctors practising it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Department {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub doctor_count: u32,
    #[serde(default)]
    pub doctors: Vec<DoctorSummary>,
}

// ==============================================================================
// DASHBOARD MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub is_blacklisted: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientStats {
    #[serde(default)]
    pub patient: Option<PatientProfile>,
    #[serde(default)]
    pub upcoming_appointments: u32,
    #[serde(default)]
    pub total_appointments: u32,
    #[serde(default)]
    pub doctors_visited: u32,
}

/// The appointment a history entry belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TreatmentVisit {
    pub id: i64,
    #[serde(default)]
    pub appointment_date: Option<NaiveDate>,
    #[serde(default, with = "hhmm::option")]
    pub appointment_time: Option<NaiveTime>,
    #[serde(default)]
    pub status: Option<AppointmentStatus>,
}

/// One entry of the patient's treatment history.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientTreatment {
    #[serde(flatten)]
    pub record: TreatmentRecord,
    #[serde(default)]
    pub appointment: Option<TreatmentVisit>,
    #[serde(default)]
    pub doctor: Option<DoctorSummary>,
}

// ==============================================================================
// BOOKING MODELS
// ==============================================================================

/// Client-held selection before submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BookingDraft {
    pub specialization: String,
    pub doctor_id: Option<i64>,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<NaiveTime>,
    pub notes: String,
}

/// Body of `POST /patient/appointments`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BookingRequest {
    pub specialization: String,
    pub doctor_id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub notes: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_history_entry_with_seconds_in_time() {
        let entry: PatientTreatment = serde_json::from_value(json!({
            "id": 11,
            "appointment_id": 7,
            "diagnosis": "Migraine",
            "prescription": "Sumatriptan",
            "visit_type": "consultation",
            "treatment_notes": "Avoid screens",
            "created_at": "2024-06-10T10:00:00",
            "appointment": {
                "id": 7,
                "appointment_date": "2024-06-10",
                "appointment_time": "09:00:00",
                "status": "completed"
            },
            "doctor": {"id": 2, "name": "Dr. Grey", "specialization": "Neurology", "department": "Neurology"}
        }))
        .unwrap();

        assert_eq!(entry.record.diagnosis.as_deref(), Some("Migraine"));
        let visit = entry.appointment.unwrap();
        assert_eq!(visit.appointment_time, NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(visit.status, Some(AppointmentStatus::Completed));
    }

    #[test]
    fn test_booking_request_wire_shape() {
        let request = BookingRequest {
            specialization: "Cardiology".to_string(),
            doctor_id: 2,
            appointment_date: NaiveDate::from_ymd_opt(2024, 6, 12).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(15, 0, 0).unwrap(),
            notes: String::new(),
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "specialization": "Cardiology",
                "doctor_id": 2,
                "appointment_date": "2024-06-12",
                "appointment_time": "15:00",
                "notes": ""
            })
        );
    }

    #[test]
    fn test_department_without_doctors() {
        let department: Department =
            serde_json::from_value(json!({"id": "dermatology", "name": "Dermatology"})).unwrap();
        assert!(department.doctors.is_empty());
        assert_eq!(department.doctor_count, 0);
    }
}
