use std::sync::Arc;

use chrono::{Duration, NaiveDate};
use serde_json::json;
use tracing::{debug, info, warn};

use appointment_cell::models::SlotBucket;
use shared_gateway::ApiGateway;
use shared_models::{ClientError, Notices};

use crate::models::{AvailabilityDay, SlotSubmission};

pub const AVAILABILITY_WINDOW_DAYS: i64 = 7;
pub const EMPTY_SELECTION_MESSAGE: &str = "Please select at least one slot";
pub const AVAILABILITY_SAVED_MESSAGE: &str = "Availability updated successfully!";

/// The doctor's editable 7-day availability table.
pub struct AvailabilityManager {
    gateway: Arc<dyn ApiGateway>,
    pub days: Vec<AvailabilityDay>,
    pub notices: Notices,
}

impl AvailabilityManager {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self {
            gateway,
            days: Vec::new(),
            notices: Notices::default(),
        }
    }

    /// Seven closed days starting at `today`.
    pub fn generate_days(today: NaiveDate) -> Vec<AvailabilityDay> {
        (0..AVAILABILITY_WINDOW_DAYS)
            .map(|offset| AvailabilityDay::closed(today + Duration::days(offset)))
            .collect()
    }

    /// Load the server's table, or a blank window when it cannot be had.
    pub async fn load_availability_days(&mut self, today: NaiveDate) {
        let loaded = match self.gateway.get("/doctor/availability").await {
            Ok(response) => response.optional_field::<Vec<AvailabilityDay>>("availability"),
            Err(e) => Err(e),
        };

        self.days = match loaded {
            Ok(Some(days)) if !days.is_empty() => {
                debug!("Loaded {} availability days", days.len());
                days
            }
            Ok(_) => {
                warn!("Availability response carried no table, generating an empty week");
                Self::generate_days(today)
            }
            Err(e) => {
                warn!("Failed to load availability, generating an empty week: {}", e);
                Self::generate_days(today)
            }
        };
    }

    /// Flip one checkbox. Returns false when the date is not in the table.
    pub fn toggle(&mut self, date: NaiveDate, bucket: SlotBucket, open: bool) -> bool {
        match self.days.iter_mut().find(|day| day.date == date) {
            Some(day) => {
                day.set_open(bucket, open);
                true
            }
            None => false,
        }
    }

    /// Flatten the table into the submitted entries, open windows only.
    pub fn expand(days: &[AvailabilityDay]) -> Vec<SlotSubmission> {
        days.iter()
            .flat_map(|day| {
                day.open_buckets().map(move |bucket| SlotSubmission {
                    date: day.date,
                    slot_type: bucket,
                    is_available: true,
                })
            })
            .collect()
    }

    /// Windows open in the loaded table that `requested` does not list.
    ///
    /// Saving only submits open windows, so a window the server already
    /// holds open stays open after a save that leaves it out.
    pub fn unrequested_open_windows(&self, requested: &[(NaiveDate, Vec<SlotBucket>)]) -> Vec<(NaiveDate, SlotBucket)> {
        self.days
            .iter()
            .flat_map(|day| day.open_buckets().map(move |bucket| (day.date, bucket)))
            .filter(|(date, bucket)| {
                !requested
                    .iter()
                    .any(|(wanted, buckets)| wanted == date && buckets.contains(bucket))
            })
            .collect()
    }

    /// Persist the table and reload it from the server.
    pub async fn save_availability(&mut self, today: NaiveDate) -> Result<(), ClientError> {
        self.notices.begin();

        let slots = Self::expand(&self.days);
        if slots.is_empty() {
            let e = ClientError::validation(EMPTY_SELECTION_MESSAGE);
            self.notices.fail(&e);
            return Err(e);
        }

        debug!("Submitting {} availability entries", slots.len());
        match self
            .gateway
            .post("/doctor/set-slots", Some(json!({ "slots": slots })))
            .await
        {
            Ok(_) => {
                info!("Availability saved with {} open windows", slots.len());
                self.notices.succeed(AVAILABILITY_SAVED_MESSAGE);
                self.load_availability_days(today).await;
                self.notices.finish();
                Ok(())
            }
            Err(e) => {
                warn!("Failed to save availability: {}", e);
                self.notices.fail(&e);
                Err(e)
            }
        }
    }
}
