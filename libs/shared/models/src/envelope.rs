use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::ClientError;

pub const EMPTY_RESPONSE_MESSAGE: &str = "Empty response from server";
pub const INVALID_RESPONSE_MESSAGE: &str = "Server returned invalid response. Please check server logs.";
pub const REQUEST_FAILED_MESSAGE: &str = "Request failed";
pub const NETWORK_ERROR_MESSAGE: &str = "Network error occurred";

/// The `{success, data?, message?}` body every endpoint answers with.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Payload of an accepted call. `data` is `Value::Null` when the server sent none.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiSuccess {
    pub data: Value,
    pub message: Option<String>,
}

pub type ApiResult = Result<ApiSuccess, ClientError>;

impl ApiSuccess {
    pub fn new(data: Value, message: Option<String>) -> Self {
        Self { data, message }
    }

    pub fn empty() -> Self {
        Self { data: Value::Null, message: None }
    }

    /// Deserialize `data.<key>`; a missing key is an invalid response.
    pub fn field<T: DeserializeOwned>(&self, key: &str) -> Result<T, ClientError> {
        match self.data.get(key) {
            Some(value) if !value.is_null() => decode_value(value.clone(), key),
            _ => Err(ClientError::InvalidResponse(format!("Response is missing `{}`", key))),
        }
    }

    /// Deserialize `data.<key>`, treating absent and `null` alike.
    pub fn optional_field<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ClientError> {
        match self.data.get(key) {
            Some(value) if !value.is_null() => decode_value(value.clone(), key).map(Some),
            _ => Ok(None),
        }
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ClientError> {
        decode_value(self.data.clone(), "data")
    }

    pub fn message_or(&self, fallback: &str) -> String {
        self.message.clone().unwrap_or_else(|| fallback.to_string())
    }
}

fn decode_value<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, ClientError> {
    serde_json::from_value(value)
        .map_err(|e| ClientError::InvalidResponse(format!("Malformed `{}` in response: {}", key, e)))
}

/// Fold an HTTP status and raw body into the uniform result shape.
pub fn normalize_response(status: u16, body: &str) -> ApiResult {
    if body.trim().is_empty() {
        return Err(ClientError::InvalidResponse(EMPTY_RESPONSE_MESSAGE.to_string()));
    }

    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(_) => return Err(ClientError::InvalidResponse(INVALID_RESPONSE_MESSAGE.to_string())),
    };

    // A few endpoints answer with the bare object instead of an envelope.
    let bare = value.as_object().is_some_and(|object| !object.contains_key("success"));
    if bare && (200..300).contains(&status) {
        return Ok(ApiSuccess::new(value, None));
    }

    let envelope: ApiEnvelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(_) => return Err(ClientError::InvalidResponse(INVALID_RESPONSE_MESSAGE.to_string())),
    };

    if !(200..300).contains(&status) {
        return Err(ClientError::Http {
            status,
            message: envelope.message.unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string()),
        });
    }

    if !envelope.success {
        return Err(ClientError::Rejected(
            envelope.message.unwrap_or_else(|| REQUEST_FAILED_MESSAGE.to_string()),
        ));
    }

    Ok(ApiSuccess {
        data: envelope.data.unwrap_or(Value::Null),
        message: envelope.message,
    })
}
