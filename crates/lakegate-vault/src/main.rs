//! Prints the credentials stored in a vault secret.
//!
//! Reads `VAULT_PATH` (falling back to `VAULT_ADDR`, then
//! `http://localhost:8200`), `VAULT_USER` and `VAULT_PASSWORD` (a `.env` file
//! is honoured), logs in with userpass, and prints the `username` and `password`
//! fields of the secret named by the first argument, `VAULT_SECRET`, or the
//! default. Always exits successfully; failures are printed.

use lakegate_vault::{cli, VaultConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let config = VaultConfig::from_env(std::env::args().nth(1));
    tracing::debug!(?config, "vault cli configuration");

    let mut stdout = std::io::stdout().lock();
    if let Err(e) = cli::run(&config, &mut stdout).await {
        tracing::error!(error = %e, "failed to write output");
    }
}
