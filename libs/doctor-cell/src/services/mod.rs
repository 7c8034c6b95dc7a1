pub mod availability;
pub mod dashboard;

pub use availability::AvailabilityManager;
pub use dashboard::{DoctorDashboard, DoctorWorkspace};
