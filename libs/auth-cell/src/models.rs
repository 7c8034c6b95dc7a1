use serde::{Deserialize, Serialize};

use shared_models::auth::User;

/// `data` of a successful login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    pub token: String,
    pub user: User,
}
