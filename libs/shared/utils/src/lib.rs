pub mod confirm;
pub mod format;
pub mod test_utils;

pub use confirm::{AlwaysConfirm, Confirm};
