use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, info, warn};

use appointment_cell::models::Slot;
use appointment_cell::services::{SlotRefresh, SlotResolver};
use shared_gateway::ApiGateway;
use shared_models::{ClientError, ReloadableView};

use crate::models::{BookingDraft, BookingRequest, Department, DoctorSummary};

pub const PAST_DATE_MESSAGE: &str = "Cannot book appointments for past dates";
pub const INCOMPLETE_DRAFT_MESSAGE: &str = "Please select a doctor, date and time slot";
pub const SLOT_NOT_LISTED_MESSAGE: &str = "Please select one of the available time slots";
pub const SLOTS_FAILED_MESSAGE: &str = "Failed to load available slots";
pub const BOOKED_MESSAGE: &str = "Appointment booked successfully!";

/// The department, doctor, date and time funnel behind a booking.
///
/// Every upstream selection resets what depends on it, so a draft never
/// mixes a time with a doctor or date it was not resolved for.
pub struct BookingOrchestrator {
    gateway: Arc<dyn ApiGateway>,
    slots: SlotResolver,
    pub draft: BookingDraft,
    pub selected_department: Option<Department>,
    pub selected_doctor: Option<DoctorSummary>,
    pub available_slots: Vec<Slot>,
}

impl BookingOrchestrator {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            slots: SlotResolver::new(Arc::clone(&gateway)),
            gateway,
            draft: BookingDraft::default(),
            selected_department: None,
            selected_doctor: None,
            available_slots: Vec::new(),
        }
    }

    pub fn select_department(&mut self, department: Department) {
        debug!("Department selected: {}", department.name);
        self.draft.specialization = department.name.clone();
        self.selected_department = Some(department);
        self.selected_doctor = None;
        self.available_slots.clear();
        self.draft.doctor_id = None;
        self.draft.appointment_date = None;
        self.draft.appointment_time = None;
    }

    pub async fn select_doctor(&mut self, doctor: DoctorSummary) -> SlotRefresh {
        debug!("Doctor selected: {}", doctor.id);
        self.draft.doctor_id = Some(doctor.id);
        self.selected_doctor = Some(doctor);
        self.available_slots.clear();
        self.draft.appointment_time = None;
        self.resolve_slots().await
    }

    pub async fn select_date(&mut self, date: NaiveDate) -> SlotRefresh {
        self.draft.appointment_date = Some(date);
        self.draft.appointment_time = None;
        self.resolve_slots().await
    }

    /// Pick one of the resolved slots by its booking time.
    pub fn select_slot(&mut self, time: NaiveTime) -> Result<(), ClientError> {
        if self.available_slots.iter().any(|slot| slot.appointment_time == time) {
            self.draft.appointment_time = Some(time);
            Ok(())
        } else {
            Err(ClientError::validation(SLOT_NOT_LISTED_MESSAGE))
        }
    }

    pub fn set_notes(&mut self, notes: impl Into<String>) {
        self.draft.notes = notes.into();
    }

    async fn resolve_slots(&mut self) -> SlotRefresh {
        self.slots
            .refresh(self.draft.doctor_id, self.draft.appointment_date, &mut self.available_slots)
            .await
    }

    /// Clear the draft and every funnel selection.
    pub fn reset(&mut self) {
        self.draft = BookingDraft::default();
        self.selected_department = None;
        self.selected_doctor = None;
        self.available_slots.clear();
    }

    /// Local gates run before any call: no past dates, nothing missing.
    pub fn validate(&self, today: NaiveDate) -> Result<BookingRequest, ClientError> {
        if let Some(date) = self.draft.appointment_date {
            if date < today {
                return Err(ClientError::validation(PAST_DATE_MESSAGE));
            }
        }

        match (self.draft.doctor_id, self.draft.appointment_date, self.draft.appointment_time) {
            (Some(doctor_id), Some(appointment_date), Some(appointment_time)) => Ok(BookingRequest {
                specialization: self.draft.specialization.clone(),
                doctor_id,
                appointment_date,
                appointment_time,
                notes: self.draft.notes.clone(),
            }),
            _ => Err(ClientError::validation(INCOMPLETE_DRAFT_MESSAGE)),
        }
    }

    /// Submit the draft. Success resets the funnel and reloads `view`;
    /// rejection keeps the draft for another attempt.
    pub async fn book_appointment<V>(&mut self, today: NaiveDate, view: &mut V) -> Result<(), ClientError>
    where
        V: ReloadableView + ?Sized,
    {
        view.notices().begin();

        let request = match self.validate(today) {
            Ok(request) => request,
            Err(e) => {
                warn!("Booking blocked locally: {}", e);
                view.notices().fail(&e);
                return Err(e);
            }
        };

        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::validation(format!("Invalid booking: {}", e)))?;

        match self.gateway.post("/patient/appointments", Some(body)).await {
            Ok(_) => {
                info!(
                    "Booked doctor {} on {} at {}",
                    request.doctor_id, request.appointment_date, request.appointment_time
                );
                self.reset();
                view.notices().succeed(BOOKED_MESSAGE);
                view.reload().await;
                view.notices().finish();
                Ok(())
            }
            Err(e) => {
                warn!("Booking rejected: {}", e);
                view.notices().fail(&e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_utils::test_utils::test_gateway;

    fn orchestrator() -> BookingOrchestrator {
        BookingOrchestrator::new(test_gateway("http://127.0.0.1:9"))
    }

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    #[test]
    fn test_past_date_is_rejected_before_anything_else() {
        let mut booking = orchestrator();
        booking.draft.appointment_date = Some(june(9));

        let err = booking.validate(june(10)).unwrap_err();
        assert_eq!(err.to_string(), PAST_DATE_MESSAGE);
    }

    #[test]
    fn test_today_is_bookable() {
        let mut booking = orchestrator();
        booking.draft = BookingDraft {
            specialization: "Cardiology".to_string(),
            doctor_id: Some(2),
            appointment_date: Some(june(10)),
            appointment_time: NaiveTime::from_hms_opt(15, 0, 0),
            notes: String::new(),
        };

        let request = booking.validate(june(10)).unwrap();
        assert_eq!(request.doctor_id, 2);
    }

    #[test]
    fn test_missing_time_is_incomplete() {
        let mut booking = orchestrator();
        booking.draft.doctor_id = Some(2);
        booking.draft.appointment_date = Some(june(12));

        let err = booking.validate(june(10)).unwrap_err();
        assert_eq!(err.to_string(), INCOMPLETE_DRAFT_MESSAGE);
    }

    #[test]
    fn test_select_slot_requires_resolved_slot() {
        let mut booking = orchestrator();
        assert!(booking.select_slot(NaiveTime::from_hms_opt(9, 0, 0).unwrap()).is_err());
        assert!(booking.draft.appointment_time.is_none());
    }
}
