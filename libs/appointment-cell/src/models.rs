// libs/appointment-cell/src/models.rs
use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use shared_models::auth::UserRole;
use shared_models::wire::hhmm;
use shared_models::ClientError;

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Booked,
    Completed,
    #[serde(alias = "canceled")]
    Cancelled,
    #[serde(other)]
    Unknown,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::Unknown => "unknown",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, AppointmentStatus::Completed | AppointmentStatus::Cancelled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Treatment details attached to a completed visit.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentRecord {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub appointment_id: Option<i64>,
    #[serde(default)]
    pub visit_type: Option<String>,
    #[serde(default)]
    pub diagnosis: Option<String>,
    #[serde(default)]
    pub prescription: Option<String>,
    #[serde(default, alias = "notes")]
    pub treatment_notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: i64,
    #[serde(default)]
    pub patient_id: Option<i64>,
    #[serde(default)]
    pub doctor_id: Option<i64>,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub doctor_specialization: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
    #[serde(default)]
    pub treatment: Option<TreatmentRecord>,
}

impl Appointment {
    pub fn is_upcoming(&self, today: NaiveDate) -> bool {
        self.status == AppointmentStatus::Booked && self.appointment_date >= today
    }

    /// The bucket this appointment occupies, if its time falls inside one.
    pub fn bucket(&self) -> Option<SlotBucket> {
        SlotBucket::from_time(self.appointment_time)
    }
}

/// Form backing the doctor's treatment page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TreatmentForm {
    pub appointment_id: i64,
    pub visit_type: String,
    pub diagnosis: String,
    pub prescription: String,
    pub treatment_notes: String,
}

impl TreatmentForm {
    /// Prefill from the treatment already stored on the appointment, if any.
    pub fn from_appointment(appointment: &Appointment) -> Self {
        let treatment = appointment.treatment.clone().unwrap_or_default();
        Self {
            appointment_id: appointment.id,
            visit_type: treatment.visit_type.unwrap_or_default(),
            diagnosis: treatment.diagnosis.unwrap_or_default(),
            prescription: treatment.prescription.unwrap_or_default(),
            treatment_notes: treatment.treatment_notes.unwrap_or_default(),
        }
    }

    pub fn is_complete(&self) -> bool {
        [&self.visit_type, &self.diagnosis, &self.prescription, &self.treatment_notes]
            .iter()
            .all(|field| !field.trim().is_empty())
    }

    pub fn to_record(&self) -> TreatmentRecord {
        TreatmentRecord {
            appointment_id: Some(self.appointment_id),
            visit_type: Some(self.visit_type.clone()),
            diagnosis: Some(self.diagnosis.clone()),
            prescription: Some(self.prescription.clone()),
            treatment_notes: Some(self.treatment_notes.clone()),
            ..TreatmentRecord::default()
        }
    }
}

// ==============================================================================
// SLOT MODELS
// ==============================================================================

/// The two fixed daily windows a doctor can open.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SlotBucket {
    Morning,
    Evening,
}

impl SlotBucket {
    pub const ALL: [SlotBucket; 2] = [SlotBucket::Morning, SlotBucket::Evening];

    pub fn as_str(&self) -> &'static str {
        match self {
            SlotBucket::Morning => "morning",
            SlotBucket::Evening => "evening",
        }
    }

    /// Window bounds as `(start_hour, end_hour)`.
    pub fn hours(&self) -> (u32, u32) {
        match self {
            SlotBucket::Morning => (9, 13),
            SlotBucket::Evening => (15, 19),
        }
    }

    /// Canonical booking time for the bucket.
    pub fn start_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hours().0, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    pub fn from_time(time: NaiveTime) -> Option<Self> {
        let minutes = time.signed_duration_since(NaiveTime::MIN).num_minutes();
        Self::ALL.into_iter().find(|bucket| {
            let (start, end) = bucket.hours();
            minutes >= i64::from(start * 60) && minutes < i64::from(end * 60)
        })
    }

    pub fn label(&self) -> &'static str {
        match self {
            SlotBucket::Morning => "Morning (9:00 AM - 1:00 PM)",
            SlotBucket::Evening => "Evening (3:00 PM - 7:00 PM)",
        }
    }
}

impl fmt::Display for SlotBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotStatus {
    Available,
    Booked,
    #[serde(other)]
    Unavailable,
}

/// One bookable window for a doctor on a date, as resolved by the server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Slot {
    pub slot_type: SlotBucket,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub display: String,
    pub status: SlotStatus,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
}

impl Slot {
    pub fn is_bookable(&self) -> bool {
        self.status == SlotStatus::Available
    }

    pub fn display_label(&self) -> &str {
        if self.display.is_empty() {
            self.slot_type.label()
        } else {
            &self.display
        }
    }
}

// ==============================================================================
// ADMIN MODELS
// ==============================================================================

/// A patient row on the admin board.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminPatient {
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

impl AdminPatient {
    /// Verb for the blacklist toggle given the current flag.
    pub fn blacklist_action(&self) -> &'static str {
        if self.is_blacklisted {
            "unblacklist"
        } else {
            "blacklist"
        }
    }
}

// ==============================================================================
// LIFECYCLE MODELS
// ==============================================================================

/// Who is driving a lifecycle action. Each actor reaches a different endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actor {
    Patient,
    Doctor,
    Admin,
}

impl From<UserRole> for Actor {
    fn from(role: UserRole) -> Self {
        match role {
            UserRole::Patient => Actor::Patient,
            UserRole::Doctor => Actor::Doctor,
            UserRole::Admin => Actor::Admin,
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Actor::Patient => write!(f, "patient"),
            Actor::Doctor => write!(f, "doctor"),
            Actor::Admin => write!(f, "admin"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AppointmentAction {
    Cancel,
    Complete,
    Reschedule,
}

impl fmt::Display for AppointmentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppointmentAction::Cancel => write!(f, "cancel"),
            AppointmentAction::Complete => write!(f, "complete"),
            AppointmentAction::Reschedule => write!(f, "reschedule"),
        }
    }
}

/// Result of a confirmed-or-dismissed mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionOutcome {
    Applied,
    Dismissed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum AppointmentError {
    #[error("A {actor} cannot {action} a {status} appointment")]
    ActionNotAllowed {
        actor: Actor,
        action: AppointmentAction,
        status: AppointmentStatus,
    },

    #[error("Please complete all required fields before marking as completed")]
    IncompleteTreatment,

    #[error("The selected slot is no longer available")]
    SlotNotOffered,

    #[error("Please select a new date and time slot")]
    MissingRescheduleTarget,

    #[error("{0}")]
    Client(#[from] ClientError),
}
