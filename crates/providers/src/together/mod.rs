pub mod classify;
pub mod client;
pub mod config;
pub mod credentials;

pub use client::TogetherClient;
pub use config::TogetherConfig;
pub use credentials::{Credential, CredentialSet};
