pub mod client;
pub mod token_store;

pub use client::{ApiClient, ApiGateway};
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenStore, TOKEN_KEY};
