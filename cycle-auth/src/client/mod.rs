pub mod auth_client;
mod config;
mod gateway;
mod session;
mod token_storage;

pub use auth_client::AuthClient;
pub use config::Settings;
pub use gateway::{Gateway, GatewayOptions};
pub use session::{CredentialStorage, MemoryCredentialStorage, SessionStore, StoredCredentials};
pub use token_storage::FileCredentialStorage;
