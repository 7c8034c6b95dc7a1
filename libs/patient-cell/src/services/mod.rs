pub mod booking;
pub mod dashboard;

pub use booking::BookingOrchestrator;
pub use dashboard::{PatientDashboard, PatientWorkspace};
