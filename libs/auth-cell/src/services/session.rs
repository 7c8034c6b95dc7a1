use std::sync::Arc;

use tracing::{debug, info, warn};

use shared_gateway::ApiGateway;
use shared_models::auth::{LoginRequest, RegisterRequest, User};
use shared_models::ClientError;

use crate::models::LoginPayload;

/// Login state on top of the gateway's token store.
pub struct SessionService {
    gateway: Arc<dyn ApiGateway>,
}

impl SessionService {
    pub fn new(gateway: Arc<dyn ApiGateway>) -> Self {
        Self { gateway }
    }

    pub fn has_token(&self) -> bool {
        self.gateway.tokens().load().is_some()
    }

    /// Authenticate and persist the returned token.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, ClientError> {
        debug!("Logging in as {}", username);
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| ClientError::validation(format!("Invalid login request: {}", e)))?;

        let response = self.gateway.post("/auth/login", Some(body)).await?;
        let payload: LoginPayload = response.decode()?;

        self.gateway.tokens().save(&payload.token)?;
        info!("Logged in as {} ({})", payload.user.username, payload.user.role);
        Ok(payload.user)
    }

    /// Create an account. Does not log in.
    pub async fn register(&self, request: &RegisterRequest) -> Result<String, ClientError> {
        let body = serde_json::to_value(request)
            .map_err(|e| ClientError::validation(format!("Invalid registration: {}", e)))?;

        let response = self.gateway.post("/auth/register", Some(body)).await?;
        info!("Registered {}", request.username);
        Ok(response.message_or("Registration successful"))
    }

    /// Who the stored token belongs to.
    ///
    /// A failed identity check drops the token. Transport failures keep it,
    /// since the server never judged it.
    pub async fn current_user(&self) -> Result<Option<User>, ClientError> {
        if !self.has_token() {
            return Ok(None);
        }

        match self.gateway.get("/auth/me").await.and_then(|r| r.field::<User>("user")) {
            Ok(user) => Ok(Some(user)),
            Err(e) if e.is_transport() => Err(e),
            Err(e) => {
                warn!("Identity check failed, clearing stored token: {}", e);
                self.gateway.tokens().clear();
                Ok(None)
            }
        }
    }

    /// Tell the server, then drop the token whatever it said.
    pub async fn logout(&self) -> Result<(), ClientError> {
        let result = self.gateway.post("/auth/logout", None).await;
        self.gateway.tokens().clear();

        match result {
            Ok(_) => {
                info!("Logged out");
                Ok(())
            }
            Err(e) => {
                warn!("Logout call failed, token cleared anyway: {}", e);
                Err(e)
            }
        }
    }
}
