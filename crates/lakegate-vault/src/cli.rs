//! The CLI flow: log in, confirm the session, print one secret's credentials.
//!
//! Vault failures are reported on the output and never abort the run; only
//! failures writing to `out` are returned.

use crate::{VaultClient, VaultConfig};
use std::io::Write;

/// Runs the credential lookup described by `config`, writing every line of
/// user-facing output to `out`.
pub async fn run<W: Write>(config: &VaultConfig, out: &mut W) -> std::io::Result<()> {
    let Some((username, password)) = config.userpass() else {
        writeln!(out, "Vault user or password not set in environment variables.")?;
        return Ok(());
    };

    let Some(client) = login(&config.address, username, password, out).await? else {
        writeln!(out, "Failed to retrieve token.")?;
        return Ok(());
    };

    if let Some(token) = client.token() {
        writeln!(out, "Token: {token}")?;
    }

    let secret = &config.secret_path;
    match client.read_credentials(&config.mount, secret).await {
        Ok(credentials) => {
            writeln!(
                out,
                "{secret}.username: {}",
                credentials.username.as_deref().unwrap_or("None")
            )?;
            writeln!(
                out,
                "{secret}.password: {}",
                credentials.password.as_deref().unwrap_or("None")
            )?;
        }
        Err(e) => {
            writeln!(out, "Failed to read secret from {}/{secret}: {e}", config.mount)?;
        }
    }

    Ok(())
}

/// Logs in and confirms the token. Returns `None` when no usable session
/// was obtained.
async fn login<W: Write>(
    address: &str,
    username: &str,
    password: &str,
    out: &mut W,
) -> std::io::Result<Option<VaultClient>> {
    let mut client = VaultClient::new(address);

    if let Err(e) = client.login_userpass(username, password).await {
        tracing::warn!(error = %e, "vault login failed");
        writeln!(out, "Authentication failed")?;
        return Ok(None);
    }

    match client.is_authenticated().await {
        Ok(true) => {
            writeln!(out, "Authentication successful")?;
            Ok(Some(client))
        }
        Ok(false) => {
            writeln!(out, "Authentication failed")?;
            Ok(None)
        }
        Err(e) => {
            tracing::warn!(error = %e, "vault token lookup failed");
            writeln!(out, "Authentication failed")?;
            Ok(None)
        }
    }
}
