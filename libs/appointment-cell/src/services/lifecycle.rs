// libs/appointment-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use serde_json::json;
use tracing::{debug, info, warn};

use shared_gateway::ApiGateway;
use shared_models::wire::hhmm;
use shared_models::{ApiResult, ClientError, ReloadableView};
use shared_utils::Confirm;

use crate::models::{
    Actor, Appointment, AppointmentAction, AppointmentError, AppointmentStatus, TransitionOutcome,
    TreatmentForm,
};
use crate::services::slots::SlotResolver;

pub const PATIENT_CANCEL_PROMPT: &str = "Are you sure you want to cancel this appointment?";
pub const DOCTOR_CANCEL_PROMPT: &str = "Mark this appointment as cancelled?";
pub const ADMIN_CANCEL_PROMPT: &str = "Cancel this appointment?";
pub const COMPLETE_PROMPT: &str = "Mark this appointment as completed? This action cannot be undone.";

pub const CANCELLED_MESSAGE: &str = "Appointment cancelled successfully";
pub const DOCTOR_CANCELLED_MESSAGE: &str = "Appointment marked as cancelled";
pub const COMPLETED_MESSAGE: &str = "Appointment marked as completed successfully";
pub const RESCHEDULED_MESSAGE: &str = "Appointment rescheduled successfully";

/// Drives cancel, complete and reschedule for every role.
///
/// Each action is gated locally, confirmed, sent once, and followed by a
/// full reload of the caller's view. Nothing is changed optimistically.
pub struct AppointmentLifecycleService {
    gateway: Arc<dyn ApiGateway>,
    confirm: Arc<dyn Confirm>,
    slots: SlotResolver,
}

impl AppointmentLifecycleService {
    pub fn new(gateway: Arc<dyn ApiGateway>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            slots: SlotResolver::new(Arc::clone(&gateway)),
            gateway,
            confirm,
        }
    }

    pub fn slot_resolver(&self) -> &SlotResolver {
        &self.slots
    }

    /// Actions an actor may offer on an appointment in `status`.
    pub fn allowed_actions(actor: Actor, status: AppointmentStatus) -> Vec<AppointmentAction> {
        match (actor, status) {
            (Actor::Patient, AppointmentStatus::Booked) => vec![AppointmentAction::Cancel],
            (Actor::Doctor, AppointmentStatus::Booked) => {
                vec![AppointmentAction::Complete, AppointmentAction::Cancel]
            }
            (Actor::Admin, AppointmentStatus::Booked) => {
                vec![AppointmentAction::Cancel, AppointmentAction::Reschedule]
            }
            _ => vec![],
        }
    }

    pub fn validate_action(
        actor: Actor,
        action: AppointmentAction,
        appointment: &Appointment,
    ) -> Result<(), AppointmentError> {
        if Self::allowed_actions(actor, appointment.status).contains(&action) {
            return Ok(());
        }

        warn!(
            "Rejected {} of appointment {} by {} in status {}",
            action, appointment.id, actor, appointment.status
        );
        Err(AppointmentError::ActionNotAllowed {
            actor,
            action,
            status: appointment.status,
        })
    }

    pub async fn cancel<V>(
        &self,
        actor: Actor,
        appointment: &Appointment,
        view: &mut V,
    ) -> Result<TransitionOutcome, AppointmentError>
    where
        V: ReloadableView + ?Sized,
    {
        if let Err(e) = Self::validate_action(actor, AppointmentAction::Cancel, appointment) {
            view.notices().fail_with(e.to_string());
            return Err(e);
        }

        let prompt = match actor {
            Actor::Patient => PATIENT_CANCEL_PROMPT,
            Actor::Doctor => DOCTOR_CANCEL_PROMPT,
            Actor::Admin => ADMIN_CANCEL_PROMPT,
        };
        if !self.confirm.confirm(prompt) {
            debug!("Cancellation of appointment {} dismissed", appointment.id);
            return Ok(TransitionOutcome::Dismissed);
        }

        view.notices().begin();
        let result = match actor {
            Actor::Patient => {
                self.gateway
                    .delete(&format!("/patient/appointments/{}", appointment.id))
                    .await
            }
            Actor::Doctor => self.set_doctor_status(appointment.id, AppointmentStatus::Cancelled).await,
            Actor::Admin => {
                self.gateway
                    .put(
                        &format!("/admin/appointments/{}", appointment.id),
                        Some(json!({ "status": AppointmentStatus::Cancelled })),
                    )
                    .await
            }
        };

        let message = match actor {
            Actor::Doctor => DOCTOR_CANCELLED_MESSAGE,
            _ => CANCELLED_MESSAGE,
        };
        self.settle(result, message, view).await?;

        info!("Appointment {} cancelled by {}", appointment.id, actor);
        Ok(TransitionOutcome::Applied)
    }

    /// Save the treatment record, then mark the appointment completed.
    pub async fn complete<V>(
        &self,
        appointment: &Appointment,
        form: &TreatmentForm,
        view: &mut V,
    ) -> Result<TransitionOutcome, AppointmentError>
    where
        V: ReloadableView + ?Sized,
    {
        if let Err(e) = Self::validate_action(Actor::Doctor, AppointmentAction::Complete, appointment) {
            view.notices().fail_with(e.to_string());
            return Err(e);
        }

        if !form.is_complete() {
            let e = AppointmentError::IncompleteTreatment;
            view.notices().fail_with(e.to_string());
            return Err(e);
        }

        if !self.confirm.confirm(COMPLETE_PROMPT) {
            return Ok(TransitionOutcome::Dismissed);
        }

        view.notices().begin();

        let payload = TreatmentForm {
            appointment_id: appointment.id,
            ..form.clone()
        };
        let body = serde_json::to_value(&payload)
            .map_err(|e| ClientError::validation(format!("Invalid treatment form: {}", e)))?;

        // The status change only goes out once the treatment is stored.
        if let Err(e) = self.gateway.post("/doctor/patient-history", Some(body)).await {
            warn!("Treatment record for appointment {} failed: {}", appointment.id, e);
            view.notices().fail(&e);
            return Err(e.into());
        }

        let result = self.set_doctor_status(appointment.id, AppointmentStatus::Completed).await;
        self.settle(result, COMPLETED_MESSAGE, view)
            .await?;

        info!("Appointment {} completed", appointment.id);
        Ok(TransitionOutcome::Applied)
    }

    /// Move an appointment to a slot the doctor still offers.
    pub async fn reschedule<V>(
        &self,
        appointment: &Appointment,
        date: Option<NaiveDate>,
        time: Option<NaiveTime>,
        view: &mut V,
    ) -> Result<TransitionOutcome, AppointmentError>
    where
        V: ReloadableView + ?Sized,
    {
        if let Err(e) = Self::validate_action(Actor::Admin, AppointmentAction::Reschedule, appointment) {
            view.notices().fail_with(e.to_string());
            return Err(e);
        }

        let (date, time, doctor_id) = match (date, time, appointment.doctor_id) {
            (Some(date), Some(time), Some(doctor_id)) => (date, time, doctor_id),
            _ => {
                let e = AppointmentError::MissingRescheduleTarget;
                view.notices().fail_with(e.to_string());
                return Err(e);
            }
        };

        let offered = match self.slots.fetch_slots(doctor_id, date).await {
            Ok(slots) => slots
                .iter()
                .any(|slot| slot.is_bookable() && slot.appointment_time == time),
            Err(e) => {
                view.notices().fail(&e);
                return Err(e.into());
            }
        };
        if !offered {
            let e = AppointmentError::SlotNotOffered;
            view.notices().fail_with(e.to_string());
            return Err(e);
        }

        let prompt = format!(
            "Reschedule this appointment to {} at {}?",
            date.format("%Y-%m-%d"),
            time.format(hhmm::FORMAT)
        );
        if !self.confirm.confirm(&prompt) {
            return Ok(TransitionOutcome::Dismissed);
        }

        view.notices().begin();
        let result = self
            .gateway
            .put(
                &format!("/admin/appointments/{}", appointment.id),
                Some(json!({
                    "appointment_date": date.format("%Y-%m-%d").to_string(),
                    "appointment_time": time.format(hhmm::FORMAT).to_string(),
                    "status": AppointmentStatus::Booked,
                })),
            )
            .await;
        self.settle(result, RESCHEDULED_MESSAGE, view)
            .await?;

        info!("Appointment {} rescheduled to {} {}", appointment.id, date, time);
        Ok(TransitionOutcome::Applied)
    }

    async fn set_doctor_status(&self, appointment_id: i64, status: AppointmentStatus) -> ApiResult {
        self.gateway
            .put(
                &format!("/doctor/appointments/{}/status", appointment_id),
                Some(json!({ "status": status })),
            )
            .await
    }

    /// Surface the outcome and reload the view on success. The success
    /// text is always the client's own `message`.
    async fn settle<V>(&self, result: ApiResult, message: &str, view: &mut V) -> Result<(), AppointmentError>
    where
        V: ReloadableView + ?Sized,
    {
        match result {
            Ok(_) => {
                let notices = view.notices();
                notices.succeed(message);
                notices.finish();
                view.reload().await;
                Ok(())
            }
            Err(e) => {
                view.notices().fail(&e);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: 1,
            patient_id: Some(3),
            doctor_id: Some(2),
            appointment_date: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            appointment_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            status,
            notes: None,
            patient_name: None,
            doctor_name: None,
            doctor_specialization: None,
            consultation_fee: None,
            treatment: None,
        }
    }

    #[test]
    fn test_patient_actions() {
        assert_eq!(
            AppointmentLifecycleService::allowed_actions(Actor::Patient, AppointmentStatus::Booked),
            vec![AppointmentAction::Cancel]
        );
        assert!(AppointmentLifecycleService::allowed_actions(Actor::Patient, AppointmentStatus::Completed)
            .is_empty());
    }

    #[test]
    fn test_doctor_actions_only_on_booked() {
        assert_eq!(
            AppointmentLifecycleService::allowed_actions(Actor::Doctor, AppointmentStatus::Booked),
            vec![AppointmentAction::Complete, AppointmentAction::Cancel]
        );
        assert!(AppointmentLifecycleService::allowed_actions(Actor::Doctor, AppointmentStatus::Cancelled)
            .is_empty());
    }

    #[test]
    fn test_admin_blocked_outside_booked() {
        for status in [
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
            AppointmentStatus::Unknown,
        ] {
            assert!(AppointmentLifecycleService::allowed_actions(Actor::Admin, status).is_empty());
        }
        assert_eq!(
            AppointmentLifecycleService::allowed_actions(Actor::Admin, AppointmentStatus::Booked),
            vec![AppointmentAction::Cancel, AppointmentAction::Reschedule]
        );
    }

    #[test]
    fn test_validate_action_error_message() {
        let err = AppointmentLifecycleService::validate_action(
            Actor::Patient,
            AppointmentAction::Cancel,
            &appointment(AppointmentStatus::Completed),
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "A patient cannot cancel a completed appointment");
    }
}
