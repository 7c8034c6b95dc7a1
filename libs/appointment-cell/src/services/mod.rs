pub mod admin_board;
pub mod lifecycle;
pub mod slots;

pub use admin_board::{AdminAppointments, AdminBoard};
pub use lifecycle::AppointmentLifecycleService;
pub use slots::{SlotRefresh, SlotResolver};
