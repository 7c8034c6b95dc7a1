use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use tracing::{debug, warn};

use shared_models::ClientError;

/// Fixed key the credential is stored under.
pub const TOKEN_KEY: &str = "token";

/// Durable home of the opaque credential token.
pub trait TokenStore: Send + Sync {
    fn load(&self) -> Option<String>;

    fn save(&self, token: &str) -> Result<(), ClientError>;

    /// Removing an absent token is not an error.
    fn clear(&self);
}

#[derive(Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.read().ok().and_then(|guard| guard.clone())
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        let mut guard = self.token
            .write()
            .map_err(|_| ClientError::TokenStore("token lock poisoned".to_string()))?;
        *guard = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) {
        if let Ok(mut guard) = self.token.write() {
            *guard = None;
        }
    }
}

/// Stores the token as a file named [`TOKEN_KEY`] inside a directory.
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(TOKEN_KEY),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                if token.is_empty() {
                    None
                } else {
                    Some(token.to_string())
                }
            }
            Err(e) if e.kind() == ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", self.path.display(), e);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), ClientError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| ClientError::TokenStore(format!("{}: {}", parent.display(), e)))?;
        }
        fs::write(&self.path, token)
            .map_err(|e| ClientError::TokenStore(format!("{}: {}", self.path.display(), e)))?;
        debug!("Stored credential token at {}", self.path.display());
        Ok(())
    }

    fn clear(&self) {
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Removed credential token"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Failed to remove token file {}: {}", self.path.display(), e),
        }
    }
}
