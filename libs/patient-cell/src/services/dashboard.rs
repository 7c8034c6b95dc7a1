use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use tracing::{debug, error, info, warn};

use appointment_cell::models::{Actor, Appointment, AppointmentError, TransitionOutcome};
use appointment_cell::services::{AppointmentLifecycleService, SlotRefresh};
use shared_gateway::ApiGateway;
use shared_models::{ClientError, Notices, ReloadableView};
use shared_utils::Confirm;

use crate::models::{Department, DoctorSummary, PatientStats, PatientTreatment};
use crate::services::booking::{BookingOrchestrator, SLOTS_FAILED_MESSAGE};

pub const EXPORT_STARTED_MESSAGE: &str = "History export started. You will receive an email shortly.";

/// Everything the patient dashboard shows.
pub struct PatientDashboard {
    gateway: Arc<dyn ApiGateway>,
    pub stats: PatientStats,
    pub departments: Vec<Department>,
    pub appointments: Vec<Appointment>,
    pub treatments: Vec<PatientTreatment>,
    pub notices: Notices,
}

impl PatientDashboard {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            gateway,
            stats: PatientStats::default(),
            departments: Vec::new(),
            appointments: Vec::new(),
            treatments: Vec::new(),
            notices: Notices::default(),
        }
    }

    /// Load every section; each one keeps its old data if its call fails.
    pub async fn load_patient_data(&mut self) {
        self.notices.loading = true;

        match self.gateway.get("/patient/dashboard").await.and_then(|r| r.decode()) {
            Ok(stats) => self.stats = stats,
            Err(e) => warn!("Patient dashboard counters unavailable: {}", e),
        }

        match self
            .gateway
            .get("/patient/departments")
            .await
            .and_then(|r| r.field::<Vec<Department>>("departments"))
        {
            Ok(departments) => self.departments = departments,
            Err(e) => warn!("Departments unavailable: {}", e),
        }

        match self
            .gateway
            .get("/patient/appointments")
            .await
            .and_then(|r| r.field::<Vec<Appointment>>("appointments"))
        {
            Ok(appointments) => self.appointments = appointments,
            Err(e) => {
                error!("Failed to load appointments: {}", e);
                self.notices.error = Some(e.to_string());
            }
        }

        match self
            .gateway
            .get("/patient/history")
            .await
            .and_then(|r| r.field::<Vec<PatientTreatment>>("treatments"))
        {
            Ok(treatments) => self.treatments = treatments,
            Err(e) => warn!("Treatment history unavailable: {}", e),
        }

        debug!(
            "Patient data loaded: {} departments, {} appointments, {} treatments",
            self.departments.len(),
            self.appointments.len(),
            self.treatments.len()
        );
        self.notices.finish();
    }

    pub async fn doctors_by_department(&self, department: &str) -> Result<Vec<DoctorSummary>, ClientError> {
        let path = format!("/patient/doctors?department={}", urlencoding::encode(department));
        let response = self.gateway.get(&path).await?;
        Ok(response.optional_field("doctors")?.unwrap_or_default())
    }

    /// Ask the server to mail the full history as CSV. Returns the
    /// background task id when the server reports one.
    pub async fn export_history(&mut self) -> Result<Option<String>, ClientError> {
        self.notices.begin();
        let result = async {
            let response = self.gateway.post("/patient/export-history", None).await?;
            response.optional_field::<String>("task_id")
        }
        .await;

        match result {
            Ok(task_id) => {
                info!("History export queued ({:?})", task_id);
                self.notices.succeed(EXPORT_STARTED_MESSAGE);
                self.notices.finish();
                Ok(task_id)
            }
            Err(e) => {
                warn!("History export failed: {}", e);
                self.notices.fail(&e);
                Err(e)
            }
        }
    }

    pub fn upcoming(&self, today: NaiveDate) -> Vec<&Appointment> {
        self.appointments.iter().filter(|a| a.is_upcoming(today)).collect()
    }

    pub fn department(&self, name: &str) -> Option<&Department> {
        self.departments
            .iter()
            .find(|d| d.name.eq_ignore_ascii_case(name) || d.id == name)
    }

    pub fn find(&self, appointment_id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == appointment_id)
    }
}

#[async_trait]
impl ReloadableView for PatientDashboard {
    async fn reload(&mut self) {
        self.load_patient_data().await;
    }

    fn notices(&mut self) -> &mut Notices {
        &mut self.notices
    }
}

/// Patient-side booking and cancellation over [`PatientDashboard`].
pub struct PatientWorkspace {
    lifecycle: AppointmentLifecycleService,
    pub booking: BookingOrchestrator,
    pub view: PatientDashboard,
}

impl PatientWorkspace {
    pub fn new(gateway: Arc<dyn ApiGateway>, confirm: Arc<dyn Confirm>) -> Self {
        Self {
            lifecycle: AppointmentLifecycleService::new(Arc::clone(&gateway), confirm),
            booking: BookingOrchestrator::new(Arc::clone(&gateway)),
            view: PatientDashboard::new(gateway),
        }
    }

    pub fn select_department(&mut self, name: &str) -> Result<(), ClientError> {
        match self.view.department(name) {
            Some(department) => {
                self.booking.select_department(department.clone());
                Ok(())
            }
            None => Err(ClientError::validation(format!("Unknown department: {}", name))),
        }
    }

    pub async fn select_doctor(&mut self, doctor_id: i64) -> Result<(), ClientError> {
        let doctor = self
            .booking
            .selected_department
            .as_ref()
            .and_then(|d| d.doctors.iter().find(|doc| doc.id == doctor_id))
            .cloned()
            .ok_or_else(|| ClientError::validation(format!("Doctor {} is not in this department", doctor_id)))?;

        let refresh = self.booking.select_doctor(doctor).await;
        self.report_refresh(refresh);
        Ok(())
    }

    pub async fn select_date(&mut self, date: NaiveDate) {
        let refresh = self.booking.select_date(date).await;
        self.report_refresh(refresh);
    }

    pub fn select_slot(&mut self, time: NaiveTime) -> Result<(), ClientError> {
        self.booking.select_slot(time)
    }

    fn report_refresh(&mut self, refresh: SlotRefresh) {
        if let SlotRefresh::Failed(e) = refresh {
            let message = match e {
                ClientError::Rejected(message) | ClientError::Http { message, .. } => message,
                _ => SLOTS_FAILED_MESSAGE.to_string(),
            };
            self.view.notices.error = Some(message);
        }
    }

    pub async fn book(&mut self, today: NaiveDate) -> Result<(), ClientError> {
        self.booking.book_appointment(today, &mut self.view).await
    }

    pub async fn cancel(&mut self, appointment_id: i64) -> Result<TransitionOutcome, AppointmentError> {
        let appointment = match self.view.find(appointment_id) {
            Some(appointment) => appointment.clone(),
            None => {
                let e = ClientError::validation(format!("Appointment {} not found", appointment_id));
                self.view.notices.fail(&e);
                return Err(e.into());
            }
        };

        self.lifecycle
            .cancel(Actor::Patient, &appointment, &mut self.view)
            .await
    }
}
