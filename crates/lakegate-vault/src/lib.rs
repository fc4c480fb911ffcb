//! Minimal vault client: userpass login and KV v2 secret reads.
//!
//! Used by the `lakegate-vault` binary, which logs in with credentials from
//! the environment and prints the username and password stored in one secret.
//! Nothing here is shared with the gateway server.

pub mod cli;
mod client;
mod config;
mod error;

pub use client::{Credentials, VaultClient};
pub use config::{VaultConfig, DEFAULT_ADDRESS, DEFAULT_MOUNT, DEFAULT_SECRET_PATH};
pub use error::VaultError;
