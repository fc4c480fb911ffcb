use std::fmt;

/// Vault address used when neither `VAULT_PATH` nor `VAULT_ADDR` is set.
pub const DEFAULT_ADDRESS: &str = "http://localhost:8200";

/// KV v2 mount read when `VAULT_MOUNT` is unset.
pub const DEFAULT_MOUNT: &str = "kv";

/// Secret read when neither a CLI argument nor `VAULT_SECRET` names one.
pub const DEFAULT_SECRET_PATH: &str = "kbmckenzie";

/// Settings for one CLI run, read from the environment.
#[derive(Clone)]
pub struct VaultConfig {
    /// Base URL of the vault server (`VAULT_PATH`, then `VAULT_ADDR`).
    pub address: String,
    /// Userpass login name (`VAULT_USER`).
    pub username: Option<String>,
    /// Userpass password (`VAULT_PASSWORD`).
    pub password: Option<String>,
    /// KV v2 mount point (`VAULT_MOUNT`).
    pub mount: String,
    /// Secret path under the mount (`VAULT_SECRET`, or the first CLI argument).
    pub secret_path: String,
}

impl VaultConfig {
    /// Reads settings from the process environment. `secret_override`, when
    /// non-empty, replaces the secret path.
    pub fn from_env(secret_override: Option<String>) -> Self {
        Self::from_lookup(|key| std::env::var(key).ok(), secret_override)
    }

    /// Like [`VaultConfig::from_env`], reading variables through `var`.
    /// Empty values count as unset.
    pub fn from_lookup<F>(var: F, secret_override: Option<String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        Self {
            address: get("VAULT_PATH")
                .or_else(|| get("VAULT_ADDR"))
                .unwrap_or_else(|| DEFAULT_ADDRESS.to_string()),
            username: get("VAULT_USER"),
            password: get("VAULT_PASSWORD"),
            mount: get("VAULT_MOUNT").unwrap_or_else(|| DEFAULT_MOUNT.to_string()),
            secret_path: secret_override
                .filter(|v| !v.trim().is_empty())
                .or_else(|| get("VAULT_SECRET"))
                .unwrap_or_else(|| DEFAULT_SECRET_PATH.to_string()),
        }
    }

    /// The login pair, if both halves are present.
    pub fn userpass(&self) -> Option<(&str, &str)> {
        match (&self.username, &self.password) {
            (Some(user), Some(password)) => Some((user.as_str(), password.as_str())),
            _ => None,
        }
    }
}

impl fmt::Debug for VaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultConfig")
            .field("address", &self.address)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("mount", &self.mount)
            .field("secret_path", &self.secret_path)
            .finish()
    }
}
