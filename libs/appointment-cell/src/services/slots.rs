// libs/appointment-cell/src/services/slots.rs
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, warn};

use shared_gateway::ApiGateway;
use shared_models::ClientError;

use crate::models::Slot;

/// What a guarded refresh did to the caller's slot list.
#[derive(Debug, Clone, PartialEq)]
pub enum SlotRefresh {
    /// Doctor or date missing; the list was left as it was.
    Skipped,
    Loaded(usize),
    /// The call failed; the list was emptied.
    Failed(ClientError),
}

/// Reads the bookable slots a doctor still has on a date.
pub struct SlotResolver {
    gateway: Arc<dyn ApiGateway>,
}

impl SlotResolver {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    /// Every slot the server reports for the pair, booked ones included.
    pub async fn fetch_slots(&self, doctor_id: i64, date: NaiveDate) -> Result<Vec<Slot>, ClientError> {
        let path = format!(
            "/patient/available-slots?doctor_id={}&date={}",
            doctor_id,
            date.format("%Y-%m-%d")
        );

        let response = self.gateway.get(&path).await?;
        let slots: Vec<Slot> = response.optional_field("slots")?.unwrap_or_default();

        debug!("Fetched {} slots for doctor {} on {}", slots.len(), doctor_id, date);
        Ok(slots)
    }

    /// Slots still open for booking. Failures degrade to an empty list.
    pub async fn get_available_slots(&self, doctor_id: i64, date: NaiveDate) -> Vec<Slot> {
        match self.fetch_slots(doctor_id, date).await {
            Ok(slots) => slots.into_iter().filter(Slot::is_bookable).collect(),
            Err(e) => {
                warn!("Failed to load available slots for doctor {} on {}: {}", doctor_id, date, e);
                Vec::new()
            }
        }
    }

    /// Re-resolve into `slots` once both halves of the selection are known.
    pub async fn refresh(
        &self,
        doctor_id: Option<i64>,
        date: Option<NaiveDate>,
        slots: &mut Vec<Slot>,
    ) -> SlotRefresh {
        let (doctor_id, date) = match (doctor_id, date) {
            (Some(doctor_id), Some(date)) => (doctor_id, date),
            _ => {
                debug!("Slot refresh skipped, selection incomplete");
                return SlotRefresh::Skipped;
            }
        };

        match self.fetch_slots(doctor_id, date).await {
            Ok(fetched) => {
                *slots = fetched.into_iter().filter(Slot::is_bookable).collect();
                SlotRefresh::Loaded(slots.len())
            }
            Err(e) => {
                warn!("Failed to load available slots: {}", e);
                slots.clear();
                SlotRefresh::Failed(e)
            }
        }
    }
}
