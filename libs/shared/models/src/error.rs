use thiserror::Error;

/// Every failure a caller of the API can observe.
///
/// Display renders the user-facing message verbatim, so server rejections
/// and local validation gates share one error channel.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClientError {
    #[error("{0}")]
    Transport(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Rejected(String),

    #[error("{0}")]
    Validation(String),

    #[error("Token storage error: {0}")]
    TokenStore(String),
}

impl ClientError {
    pub fn kind(&self) -> &'static str {
        match self {
            ClientError::Transport(_) => "transport",
            ClientError::Http { .. } => "http",
            ClientError::InvalidResponse(_) => "invalid_response",
            ClientError::Rejected(_) => "rejected",
            ClientError::Validation(_) => "validation",
            ClientError::TokenStore(_) => "token_store",
        }
    }

    /// Failures that never reached the server or whose reply was unreadable.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }

    /// Failures raised by a client-side gate before any request was sent.
    pub fn is_local(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ClientError::Validation(message.into())
    }
}
