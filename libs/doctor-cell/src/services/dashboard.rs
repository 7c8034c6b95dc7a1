use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;
use tracing::{debug, error, info, warn};

use appointment_cell::models::{Actor, Appointment, AppointmentError, TransitionOutcome, TreatmentForm};
use appointment_cell::services::AppointmentLifecycleService;
use shared_gateway::ApiGateway;
use shared_models::{ClientError, Notices, ReloadableView};
use shared_utils::Confirm;

use crate::models::{AppointmentFilter, AssignedPatient, DoctorStats, OpenSlot, PatientHistory};

pub const PATIENT_HISTORY_FAILED_MESSAGE: &str = "Failed to load patient history";
use crate::services::availability::AvailabilityManager;

/// Everything the doctor dashboard shows.
pub struct DoctorDashboard {
    gateway: Arc<dyn ApiGateway>,
    pub today: NaiveDate,
    pub stats: DoctorStats,
    pub filter: AppointmentFilter,
    pub appointments: Vec<Appointment>,
    pub patients: Vec<AssignedPatient>,
    pub open_slots: Vec<OpenSlot>,
    pub availability: AvailabilityManager,
    pub patient_history: Option<PatientHistory>,
    pub notices: Notices,
}

impl DoctorDashboard {
    pub fn new(gateway: Arc<dyn ApiGateway>, today: NaiveDate) -> Self {
        Self {
            availability: AvailabilityManager::new(Arc::clone(&gateway)),
            gateway,
            today,
            stats: DoctorStats::default(),
            filter: AppointmentFilter::default(),
            appointments: Vec::new(),
            patients: Vec::new(),
            open_slots: Vec::new(),
            patient_history: None,
            notices: Notices::default(),
        }
    }

    /// Full initial load: counters, lists and the availability table.
    pub async fn load_doctor_data(&mut self) {
        self.notices.loading = true;

        match self.load_dashboard().await {
            Ok(()) => debug!("Doctor dashboard counters loaded"),
            Err(e) => warn!("Doctor dashboard counters unavailable: {}", e),
        }
        let _ = self.load_appointments().await;
        let _ = self.load_patients().await;
        self.availability.load_availability_days(self.today).await;
        self.load_open_slots().await;

        self.notices.finish();
    }

    pub async fn load_dashboard(&mut self) -> Result<(), ClientError> {
        let response = self.gateway.get("/doctor/dashboard").await?;
        self.stats = response.decode()?;
        Ok(())
    }

    pub async fn load_appointments(&mut self) -> Result<(), ClientError> {
        let path = match self.filter.time_filter() {
            Some(filter) => format!("/doctor/appointments?time_filter={}", filter),
            None => "/doctor/appointments".to_string(),
        };

        let result = async {
            let response = self.gateway.get(&path).await?;
            response.field::<Vec<Appointment>>("appointments")
        }
        .await;

        match result {
            Ok(appointments) => {
                debug!("Loaded {} appointments ({:?})", appointments.len(), self.filter);
                self.appointments = appointments;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load appointments: {}", e);
                self.notices.fail_with("Failed to load appointments");
                Err(e)
            }
        }
    }

    pub async fn filter_appointments(&mut self, filter: AppointmentFilter) -> Result<(), ClientError> {
        self.filter = filter;
        self.load_appointments().await
    }

    pub async fn load_patients(&mut self) -> Result<(), ClientError> {
        let result = async {
            let response = self.gateway.get("/doctor/patients").await?;
            response.field::<Vec<AssignedPatient>>("patients")
        }
        .await;

        match result {
            Ok(patients) => {
                self.patients = patients;
                Ok(())
            }
            Err(e) => {
                error!("Failed to load patients: {}", e);
                self.notices.fail_with("Failed to load patients");
                Err(e)
            }
        }
    }

    /// Open rows the doctor still has; failures leave an empty list.
    pub async fn load_open_slots(&mut self) {
        let result = async {
            let response = self.gateway.get("/doctor/available-slots").await?;
            response.optional_field::<Vec<OpenSlot>>("slots")
        }
        .await;

        self.open_slots = match result {
            Ok(slots) => slots.unwrap_or_default(),
            Err(e) => {
                warn!("No open slots loaded: {}", e);
                Vec::new()
            }
        };
    }

    /// One patient's visits and treatments. The endpoint answers with the
    /// bare record rather than an envelope.
    pub async fn view_patient_history(&mut self, patient_id: i64) -> Result<(), ClientError> {
        self.notices.loading = true;
        let result = async {
            let response = self
                .gateway
                .get(&format!("/doctor/patient-history/{}", patient_id))
                .await?;
            response.decode::<PatientHistory>()
        }
        .await;

        match result {
            Ok(history) => {
                debug!("Loaded {} history entries for patient {}", history.appointments.len(), patient_id);
                self.patient_history = Some(history);
                self.notices.finish();
                Ok(())
            }
            Err(e) => {
                error!("Failed to load history of patient {}: {}", patient_id, e);
                self.patient_history = None;
                self.notices.fail_with(PATIENT_HISTORY_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    pub fn find(&self, appointment_id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }
}

#[async_trait]
impl ReloadableView for DoctorDashboard {
    async fn reload(&mut self) {
        let _ = self.load_appointments().await;
        let _ = self.load_dashboard().await;
    }

    fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }
}

/// Doctor-side actions over [`DoctorDashboard`].
pub struct DoctorWorkspace {
    gateway: Arc<dyn ApiGateway>,
    lifecycle: AppointmentLifecycleService,
    pub view: DoctorDashboard,
}

impl DoctorWorkspace {
    pub fn new(gateway: Arc<dyn ApiGateway>, confirm: Arc<dyn Confirm>, today: NaiveDate) -> Self {
        Self {
            lifecycle: AppointmentLifecycleService::new(Arc::clone(&gateway), confirm),
            view: DoctorDashboard::new(Arc::clone(&gateway), today),
            gateway,
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

    /// Treatment form prefilled from what the appointment already carries.
    pub fn open_treatment(&mut self, appointment_id: i64) -> Result<TreatmentForm, AppointmentError> {
        self.lookup(appointment_id)
            .map(|appointment| TreatmentForm::from_appointment(&appointment))
    }

    /// Save the treatment record without touching the appointment status.
    pub async fn submit_treatment(&mut self, form: &TreatmentForm) -> Result<(), ClientError> {
        self.view.notices.begin();
        let body = json!({
            "appointment_id": form.appointment_id,
            "visit_type": form.visit_type,
            "diagnosis": form.diagnosis,
            "prescription": form.prescription,
            "treatment_notes": form.treatment_notes,
        });

        match self.gateway.post("/doctor/patient-history", Some(body)).await {
            Ok(_) => {
                info!("Treatment record saved for appointment {}", form.appointment_id);
                if let Some(appointment) = self
                    .view
                    .appointments
                    .iter_mut()
                    .find(|a| a.id == form.appointment_id)
                {
                    appointment.treatment = Some(form.to_record());
                }
                self.view.notices.succeed("Treatment record updated successfully");
                self.view.notices.finish();
                Ok(())
            }
            Err(e) => {
                self.view.notices.fail(&e);
                Err(e)
            }
        }
    }

    pub async fn cancel(&mut self, appointment_id: i64) -> Result<TransitionOutcome, AppointmentError> {
        let appointment = self.lookup(appointment_id)?;
        self.lifecycle
            .cancel(Actor::Doctor, &appointment, &mut self.view)
            .await
    }

    pub async fn complete(
        &mut self,
        appointment_id: i64,
        form: &TreatmentForm,
    ) -> Result<TransitionOutcome, AppointmentError> {
        let appointment = self.lookup(appointment_id)?;
        self.lifecycle.complete(&appointment, form, &mut self.view).await
    }
}
