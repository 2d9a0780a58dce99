// Client-side session and authenticated transport for the cycle tracker
mod client;
mod error;

pub use client::{
    AuthClient, CredentialStorage, FileCredentialStorage, Gateway, GatewayOptions,
    MemoryCredentialStorage, SessionStore, Settings, StoredCredentials,
};
pub use error::{AuthError, RefreshError};
