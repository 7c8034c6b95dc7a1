use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;
use tracing::warn;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
/// Last resort when the platform has no home directory to resolve.
pub const FALLBACK_TOKEN_DIR: &str = ".hms";

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the hospital REST API, including the `/api` prefix.
    pub api_base_url: String,
    /// Directory holding durable client storage (the credential token).
    pub token_dir: PathBuf,
}

impl ClientConfig {
    pub fn from_env() -> Self {
        let config = Self {
            api_base_url: env::var("HMS_API_URL")
                .unwrap_or_else(|_| {
                    warn!("HMS_API_URL not set, using default");
                    DEFAULT_API_URL.to_string()
                }),
            token_dir: env::var("HMS_TOKEN_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| default_token_dir()),
        };

        if !config.is_configured() {
            warn!("Client not fully configured - API base URL is empty");
        }

        config
    }

    pub fn new(api_base_url: impl Into<String>, token_dir: impl Into<PathBuf>) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            token_dir: token_dir.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_base_url.is_empty()
    }

    /// Base URL without a trailing slash, so paths can always start with `/`.
    pub fn normalized_base_url(&self) -> &str {
        self.api_base_url.trim_end_matches('/')
    }
}

/// Platform data directory, e.g. `~/.local/share/hms` on Linux.
pub fn default_token_dir() -> PathBuf {
    match ProjectDirs::from("org", "hms", "hms") {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            warn!("No home directory found, storing the token under {}", FALLBACK_TOKEN_DIR);
            PathBuf::from(FALLBACK_TOKEN_DIR)
        }
    }
}
