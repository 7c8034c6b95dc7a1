// libs/appointment-cell/src/services/admin_board.rs
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info, warn};

use shared_gateway::ApiGateway;
use shared_models::{ClientError, Notices, ReloadableView};
use shared_utils::Confirm;

use crate::models::{Actor, AdminPatient, Appointment, AppointmentError, Slot, TransitionOutcome};
use crate::services::lifecycle::AppointmentLifecycleService;

/// The admin's list of every appointment and patient in the hospital.
pub struct AdminAppointments {
    gateway: Arc<dyn ApiGateway>,
    pub appointments: Vec<Appointment>,
    pub patients: Vec<AdminPatient>,
    /// Appointments of the patient last opened with `load_patient_history`.
    pub patient_history: Vec<Appointment>,
    pub notices: Notices,
}

impl AdminAppointments {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            gateway,
            appointments: Vec::new(),
            patients: Vec::new(),
            patient_history: Vec::new(),
            notices: Notices::default(),
        }
    }

    pub async fn load_appointments(&mut self) -> Result<(), ClientError> {
        self.notices.loading = true;
        let result = async {
            let response = self.gateway.get("/admin/appointments").await?;
            response.optional_field::<Vec<Appointment>>("appointments")
        }
        .await;

        match result {
            Ok(appointments) => {
                self.appointments = appointments.unwrap_or_default();
                debug!("Loaded {} appointments", self.appointments.len());
                self.notices.finish();
                Ok(())
            }
            Err(e) => {
                error!("Failed to load appointments: {}", e);
                self.notices.fail(&e);
                Err(e)
            }
        }
    }

    pub async fn load_patients(&mut self) -> Result<(), ClientError> {
        let result = async {
            let response = self.gateway.get("/admin/patients").await?;
            response.optional_field::<Vec<AdminPatient>>("patients")
        }
        .await;

        match result {
            Ok(patients) => {
                self.patients = patients.unwrap_or_default();
                debug!("Loaded {} patients", self.patients.len());
                Ok(())
            }
            Err(e) => {
                error!("Failed to load patients: {}", e);
                self.notices.fail(&e);
                Err(e)
            }
        }
    }

    /// Every appointment of one patient, newest first. A failure leaves the
    /// history empty.
    pub async fn load_patient_history(&mut self, patient_id: i64) -> Result<(), ClientError> {
        let result = async {
            let response = self
                .gateway
                .get(&format!("/admin/patients/{}/history", patient_id))
                .await?;
            response.optional_field::<Vec<Appointment>>("appointments")
        }
        .await;

        match result {
            Ok(appointments) => {
                self.patient_history = appointments.unwrap_or_default();
                Ok(())
            }
            Err(e) => {
                warn!("No history loaded for patient {}: {}", patient_id, e);
                self.patient_history.clear();
                Err(e)
            }
        }
    }

    pub fn find(&self, appointment_id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }

    pub fn find_patient(&self, patient_id: i64) -> Option<&AdminPatient> {
        self.patients.iter().find(|p| p.id == patient_id)
    }
}

#[async_trait]
impl ReloadableView for AdminAppointments {
    async fn reload(&mut self) {
        let _ = self.load_appointments().await;
    }

    fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }
}

/// Admin cancel, reschedule and blacklist over [`AdminAppointments`].
pub struct AdminBoard {
    gateway: Arc<dyn ApiGateway>,
    confirm: Arc<dyn Confirm>,
    lifecycle: AppointmentLifecycleService,
    pub view: AdminAppointments,
}

impl AdminBoard {
    pub fn new(gateway: Arc<dyn ApiGateway>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            lifecycle: AppointmentLifecycleService::new(Arc::clone(&gateway), Arc::clone(&confirm)),
            view: AdminAppointments::new(Arc::clone(&gateway)),
            gateway,
            confirm,
        }
    }

    fn lookup(&mut self, appointment_id: i64) -> Result<Appointment, AppointmentError> {
        match self.view.find(appointment_id) {
            Some(appointment) => Ok(appointment.clone()),
            None => {
                let e = ClientError::validation(format!("Appointment {} not found", appointment_id));
                self.view.notices.fail(&e);
                Err(e.into())
            }
        }
    }

    pub async fn cancel(&mut self, appointment_id: i64) -> Result<TransitionOutcome, AppointmentError> {
        let appointment = self.lookup(appointment_id)?;
        self.lifecycle
            .cancel(Actor::Admin, &appointment, &mut self.view)
            .await
    }

    /// Open slots the appointment's doctor has on `date`.
    pub async fn reschedule_options(&mut self, appointment_id: i64, date: NaiveDate) -> Vec<Slot> {
        let doctor_id = match self.lookup(appointment_id) {
            Ok(appointment) => appointment.doctor_id,
            Err(_) => return Vec::new(),
        };

        let mut slots = Vec::new();
        self.lifecycle
            .slot_resolver()
            .refresh(doctor_id, Some(date), &mut slots)
            .await;
        slots
    }

    pub async fn reschedule(
        &mut self,
        appointment_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    ) -> Result<TransitionOutcome, AppointmentError> {
        let appointment = self.lookup(appointment_id)?;
        self.lifecycle
            .reschedule(&appointment, Some(date), Some(time), &mut self.view)
            .await
    }

    /// Flip a patient's blacklist flag. The server decides the new value;
    /// the patient list is reloaded afterwards.
    pub async fn toggle_patient_blacklist(&mut self, patient_id: i64) -> Result<TransitionOutcome, AppointmentError> {
        let patient = match self.view.find_patient(patient_id) {
            Some(patient) => patient.clone(),
            None => {
                let e = ClientError::validation(format!("Patient {} not found", patient_id));
                self.view.notices.fail(&e);
                return Err(e.into());
            }
        };

        let action = patient.blacklist_action();
        if !self
            .confirm
            .confirm(&format!("Are you sure you want to {} {}?", action, patient.name))
        {
            debug!("Blacklist change for patient {} dismissed", patient_id);
            return Ok(TransitionOutcome::Dismissed);
        }

        self.view.notices.begin();
        match self
            .gateway
            .put(&format!("/admin/patients/{}/blacklist", patient_id), None)
            .await
        {
            Ok(_) => {
                info!("Patient {} {}ed", patient_id, action);
                self.view.notices.succeed(format!("Patient {}ed successfully", action));
                self.view.notices.finish();
                let _ = self.view.load_patients().await;
                Ok(TransitionOutcome::Applied)
            }
            Err(e) => {
                warn!("Failed to {} patient {}: {}", action, patient_id, e);
                self.view.notices.fail(&e);
                Err(e.into())
            }
        }
    }
}
