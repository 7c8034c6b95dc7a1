pub mod auth;
pub mod envelope;
pub mod error;
pub mod view;
pub mod wire;

pub use envelope::{ApiEnvelope, ApiResult, ApiSuccess};
pub use error::ClientError;
pub use view::{Notices, ReloadableView};
