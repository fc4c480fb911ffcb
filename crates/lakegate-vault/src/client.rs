//! HTTP calls against the vault API.

use crate::error::VaultError;
use serde::Deserialize;
use serde_json::{Map, Value};

const TOKEN_HEADER: &str = "X-Vault-Token";

/// Username and password fields of a secret. Either may be absent.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Credentials {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    auth: Option<LoginAuth>,
}

#[derive(Debug, Deserialize)]
struct LoginAuth {
    client_token: String,
}

#[derive(Debug, Deserialize)]
struct KvReadResponse {
    data: KvReadData,
}

#[derive(Debug, Deserialize)]
struct KvReadData {
    data: Option<Map<String, Value>>,
}

/// Client for a single vault server, optionally holding a session token.
#[derive(Debug, Clone)]
pub struct VaultClient {
    http: reqwest::Client,
    address: String,
    token: Option<String>,
}

impl VaultClient {
    /// Creates an unauthenticated client for the server at `address`.
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        Self {
            http: reqwest::Client::new(),
            address: address.trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Returns a client that sends `token` with every request.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Builds `<address>/v1/<segments...>`, percent-encoding each segment so
    /// `/`, `?` and `#` inside a name never change the route.
    fn url<I>(&self, segments: I) -> Result<reqwest::Url, VaultError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let mut url = reqwest::Url::parse(&self.address)
            .map_err(|e| VaultError::InvalidAddress(format!("{}: {e}", self.address)))?;
        url.path_segments_mut()
            .map_err(|()| VaultError::InvalidAddress(self.address.clone()))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.token {
            Some(token) => request.header(TOKEN_HEADER, token),
            None => request,
        }
    }

    /// Logs in with the userpass auth method and keeps the returned token.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Status` if vault rejects the login, or
    /// `VaultError::MalformedResponse` if the reply carries no token.
    pub async fn login_userpass(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<String, VaultError> {
        let resp = self
            .http
            .post(self.url(["auth", "userpass", "login", username])?)
            .json(&serde_json::json!({ "password": password }))
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let login: LoginResponse = resp.json().await?;
        let token = login
            .auth
            .map(|auth| auth.client_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| VaultError::MalformedResponse("login reply has no client token".into()))?;

        tracing::debug!(username, "vault userpass login succeeded");
        self.token = Some(token.clone());
        Ok(token)
    }

    /// Whether the held token is accepted by vault.
    ///
    /// A client without a token, or one whose token is rejected with a 4xx
    /// status, is not authenticated.
    pub async fn is_authenticated(&self) -> Result<bool, VaultError> {
        if self.token.is_none() {
            return Ok(false);
        }

        let resp = self
            .authorized(self.http.get(self.url(["auth", "token", "lookup-self"])?))
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            Ok(true)
        } else if status.is_client_error() {
            Ok(false)
        } else {
            let body = resp.text().await.unwrap_or_default();
            Err(VaultError::Status { status, body })
        }
    }

    /// Reads the latest version of a KV v2 secret and returns its key/value data.
    ///
    /// # Errors
    ///
    /// Returns `VaultError::Status` for non-success replies (404 for a missing
    /// secret, 403 for a denied token) and `VaultError::MalformedResponse` if
    /// the secret has no data (for example, its latest version was deleted).
    pub async fn read_kv2(&self, mount: &str, path: &str) -> Result<Map<String, Value>, VaultError> {
        let segments = split_path(mount)
            .chain(["data"])
            .chain(split_path(path));
        let resp = self
            .authorized(self.http.get(self.url(segments)?))
            .send()
            .await?;
        let resp = check_status(resp).await?;

        let body: KvReadResponse = resp.json().await?;
        body.data
            .data
            .ok_or_else(|| VaultError::MalformedResponse(format!("secret {mount}/{path} has no data")))
    }

    /// Reads a KV v2 secret and extracts its `username` and `password` fields.
    pub async fn read_credentials(&self, mount: &str, path: &str) -> Result<Credentials, VaultError> {
        let data = self.read_kv2(mount, path).await?;
        Ok(Credentials {
            username: data.get("username").map(field_text),
            password: data.get("password").map(field_text),
        })
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, VaultError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(VaultError::Status { status, body })
}

/// Mount points and secret paths may be nested (`team/app`); each part is
/// its own segment.
fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.split('/').filter(|part| !part.is_empty())
}

fn field_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
