use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use appointment_cell::models::{AppointmentStatus, SlotBucket, TreatmentRecord};
use shared_models::wire::hhmm;
use shared_utils::format::day_label;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DoctorProfile {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub experience: Option<i64>,
    #[serde(default)]
    pub qualification: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub consultation_fee: Option<f64>,
}

/// Counters shown on top of the doctor dashboard.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DoctorStats {
    #[serde(default)]
    pub doctor: Option<DoctorProfile>,
    #[serde(default)]
    pub today_appointments: u32,
    #[serde(default)]
    pub total_appointments: u32,
    #[serde(default)]
    pub total_patients: u32,
}

/// One row of the 7-day availability table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AvailabilityDay {
    pub date: NaiveDate,
    #[serde(default)]
    pub day_name: String,
    #[serde(default)]
    pub morning_available: bool,
    #[serde(default)]
    pub evening_available: bool,
}

impl AvailabilityDay {
    /// A day with neither window open.
    pub fn closed(date: NaiveDate) -> Self {
        Self {
            date,
            day_name: day_label(date),
            morning_available: false,
            evening_available: false,
        }
    }

    pub fn is_open(&self, bucket: SlotBucket) -> bool {
        match bucket {
            SlotBucket::Morning => self.morning_available,
            SlotBucket::Evening => self.evening_available,
        }
    }

    pub fn set_open(&mut self, bucket: SlotBucket, open: bool) {
        match bucket {
            SlotBucket::Morning => self.morning_available = open,
            SlotBucket::Evening => self.evening_available = open,
        }
    }

    pub fn open_buckets(&self) -> impl Iterator<Item = SlotBucket> + '_ {
        SlotBucket::ALL.into_iter().filter(move |bucket| self.is_open(*bucket))
    }
}

/// Entry of the `set-slots` payload. Only open windows are ever sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SlotSubmission {
    pub date: NaiveDate,
    pub slot_type: SlotBucket,
    pub is_available: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppointmentFilter {
    #[default]
    All,
    Today,
    Upcoming,
    Completed,
}

impl AppointmentFilter {
    /// Value of the `time_filter` query parameter; `All` sends none.
    pub fn time_filter(&self) -> Option<&'static str> {
        match self {
            AppointmentFilter::All => None,
            AppointmentFilter::Today => Some("today"),
            AppointmentFilter::Upcoming => Some("upcoming"),
            AppointmentFilter::Completed => Some("completed"),
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all" | "" => Some(AppointmentFilter::All),
            "today" => Some(AppointmentFilter::Today),
            "upcoming" => Some(AppointmentFilter::Upcoming),
            "completed" => Some(AppointmentFilter::Completed),
            _ => None,
        }
    }
}

/// A patient who has at least one appointment with this doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssignedPatient {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub is_blacklisted: bool,
}

/// An open appointment row the doctor still has on the books.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OpenSlot {
    pub id: i64,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    #[serde(default)]
    pub formatted_display: String,
}

/// Treating doctor as shown on a history row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VisitDoctor {
    pub name: String,
    #[serde(default)]
    pub specialization: Option<String>,
}

/// One past or upcoming visit with its latest treatment, if any.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub id: i64,
    pub appointment_date: NaiveDate,
    #[serde(with = "hhmm")]
    pub appointment_time: NaiveTime,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub doctor: Option<VisitDoctor>,
    #[serde(default)]
    pub treatment: Option<TreatmentRecord>,
}

/// A patient's record as the treating doctor sees it, newest visit first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientHistory {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub medical_history: Option<String>,
    #[serde(default)]
    pub appointments: Vec<HistoryEntry>,
}

impl PatientHistory {
    /// Visits that carry a treatment record.
    pub fn treated(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.appointments.iter().filter(|entry| entry.treatment.is_some())
    }
}
