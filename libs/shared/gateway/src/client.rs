use std::sync::Arc;

use async_trait::async_trait;
use reqwest::{
    Client,
    header::{HeaderMap, HeaderValue, CONTENT_TYPE, AUTHORIZATION},
    Method,
};
use serde_json::Value;
use tracing::{debug, error, warn};

use shared_config::ClientConfig;
use shared_models::envelope::{normalize_response, NETWORK_ERROR_MESSAGE};
use shared_models::{ApiResult, ClientError};

use crate::token_store::{FileTokenStore, TokenStore};

/// The single call contract every component depends on.
///
/// Implementations attach stored credentials, send at most one attempt and
/// fold every failure into `ClientError`; nothing is thrown past them.
#[async_trait]
pub trait ApiGateway: Send + Sync {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult;

    fn tokens(&self) -> &dyn TokenStore;

    async fn get(&self, path: &str) -> ApiResult {
        self.request(Method::GET, path, None).await
    }

    async fn post(&self, path: &str, body: Option<Value>) -> ApiResult {
        self.request(Method::POST, path, body).await
    }

    async fn put(&self, path: &str, body: Option<Value>) -> ApiResult {
        self.request(Method::PUT, path, body).await
    }

    async fn delete(&self, path: &str) -> ApiResult {
        self.request(Method::DELETE, path, None).await
    }
}

pub struct ApiClient {
    client: Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            client: Client::new(),
            base_url: config.normalized_base_url().to_string(),
            tokens,
        }
    }

    /// Client backed by the durable token file under `config.token_dir`.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config, Arc::new(FileTokenStore::new(&config.token_dir)))
    }

    fn get_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if let Some(token) = self.tokens.load() {
            match HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => warn!("Stored token is not a valid header value, sending request without it"),
            }
        }

        headers
    }

    pub fn get_base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl ApiGateway for ApiClient {
    async fn request(&self, method: Method, path: &str, body: Option<Value>) -> ApiResult {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self.client.request(method, &url)
            .headers(self.get_headers());

        if let Some(body_data) = body {
            req = req.json(&body_data);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("API call failed: {}", e);
                return Err(transport_error(&e));
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                error!("Failed to read response body ({}): {}", status, e);
                return Err(transport_error(&e));
            }
        };

        let result = normalize_response(status, &text);

        match &result {
            Err(ClientError::InvalidResponse(_)) => {
                error!("Failed to parse response as JSON: {}", preview(&text));
            }
            Err(ClientError::Http { status, message }) => {
                error!("API error ({}): {}", status, message);
            }
            Err(e) => warn!("Request rejected: {}", e),
            Ok(_) => debug!("Request to {} succeeded", url),
        }

        result
    }

    fn tokens(&self) -> &dyn TokenStore {
        self.tokens.as_ref()
    }
}

fn transport_error(e: &reqwest::Error) -> ClientError {
    let message = e.to_string();
    if message.is_empty() {
        ClientError::Transport(NETWORK_ERROR_MESSAGE.to_string())
    } else {
        ClientError::Transport(message)
    }
}

fn preview(text: &str) -> &str {
    match text.char_indices().nth(200) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_truncates_long_bodies() {
        let body = "x".repeat(500);
        assert_eq!(preview(&body).len(), 200);
        assert_eq!(preview("short"), "short");
    }
}
